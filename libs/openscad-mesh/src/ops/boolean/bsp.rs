//! # BSP Tree
//!
//! Binary space partitioning tree for CSG booleans, after the csg.js
//! algorithm by Evan Wallace.
//!
//! ## Algorithm
//!
//! Each node holds a dividing plane, the polygons coplanar with it and
//! optional front and back subtrees. A missing back subtree means
//! "inside the solid"; a missing front subtree means "outside".
//!
//! ## Stack Safety
//!
//! Convex inputs produce trees as deep as their polygon count. Every
//! recursive walk runs under `stacker::maybe_grow`, and `Drop` unlinks
//! children iteratively.

use config::constants::{STACKER_RED_ZONE_BYTES, STACKER_STACK_SIZE_BYTES};

use super::plane::Plane;
use super::polygon::{Polygon, SplitOutput};

#[derive(Debug, Default)]
pub struct BspNode {
    plane: Option<Plane>,
    polygons: Vec<Polygon>,
    front: Option<Box<BspNode>>,
    back: Option<Box<BspNode>>,
}

#[inline]
fn grow<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(STACKER_RED_ZONE_BYTES, STACKER_STACK_SIZE_BYTES, f)
}

impl BspNode {
    /// Build a tree from polygons.
    pub fn new(polygons: Vec<Polygon>) -> Self {
        let mut node = Self::default();
        node.build(polygons);
        node
    }

    /// Insert polygons into the tree, splitting them as needed.
    pub fn build(&mut self, polygons: Vec<Polygon>) {
        if polygons.is_empty() {
            return;
        }
        grow(|| {
            let mut polygons = polygons.into_iter();
            let plane = match self.plane {
                Some(plane) => plane,
                None => match polygons.next() {
                    Some(first) => {
                        let plane = first.plane;
                        self.plane = Some(plane);
                        self.polygons.push(first);
                        plane
                    }
                    None => return,
                },
            };

            let mut out = SplitOutput::default();
            for polygon in polygons {
                polygon.split(&plane, &mut out);
            }
            self.polygons.append(&mut out.coplanar_front);
            self.polygons.append(&mut out.coplanar_back);

            if !out.front.is_empty() {
                self.front.get_or_insert_with(Box::default).build(out.front);
            }
            if !out.back.is_empty() {
                self.back.get_or_insert_with(Box::default).build(out.back);
            }
        })
    }

    /// Turn solid space into empty space and back.
    pub fn invert(&mut self) {
        grow(|| {
            for polygon in &mut self.polygons {
                polygon.flip();
            }
            if let Some(plane) = &mut self.plane {
                plane.flip();
            }
            if let Some(front) = &mut self.front {
                front.invert();
            }
            if let Some(back) = &mut self.back {
                back.invert();
            }
            std::mem::swap(&mut self.front, &mut self.back);
        })
    }

    /// Remove the parts of `polygons` inside this tree's solid.
    pub fn clip_polygons(&self, polygons: Vec<Polygon>) -> Vec<Polygon> {
        let Some(plane) = self.plane else {
            return polygons;
        };
        grow(|| {
            let mut out = SplitOutput::default();
            for polygon in polygons {
                polygon.split(&plane, &mut out);
            }
            let mut front = out.front;
            front.append(&mut out.coplanar_front);
            let mut back = out.back;
            back.append(&mut out.coplanar_back);

            let mut result = match &self.front {
                Some(node) => node.clip_polygons(front),
                None => front,
            };
            if let Some(node) = &self.back {
                result.extend(node.clip_polygons(back));
            }
            result
        })
    }

    /// Remove every polygon of this tree inside `other`.
    pub fn clip_to(&mut self, other: &BspNode) {
        grow(|| {
            self.polygons = other.clip_polygons(std::mem::take(&mut self.polygons));
            if let Some(front) = &mut self.front {
                front.clip_to(other);
            }
            if let Some(back) = &mut self.back {
                back.clip_to(other);
            }
        })
    }

    /// Collect the polygons of the whole tree.
    pub fn all_polygons(&self) -> Vec<Polygon> {
        let mut result = Vec::new();
        let mut stack: Vec<&BspNode> = vec![self];
        while let Some(node) = stack.pop() {
            result.extend(node.polygons.iter().cloned());
            stack.extend(node.front.as_deref());
            stack.extend(node.back.as_deref());
        }
        result
    }

    #[cfg(test)]
    pub fn polygon_count(&self) -> usize {
        self.all_polygons().len()
    }
}

impl Drop for BspNode {
    fn drop(&mut self) {
        let mut stack: Vec<Box<BspNode>> = Vec::new();
        stack.extend(self.front.take());
        stack.extend(self.back.take());
        while let Some(mut node) = stack.pop() {
            stack.extend(node.front.take());
            stack.extend(node.back.take());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;

    fn triangle(z: f64) -> Polygon {
        Polygon::new(vec![
            DVec3::new(0.0, 0.0, z),
            DVec3::new(1.0, 0.0, z),
            DVec3::new(0.0, 1.0, z),
        ])
        .unwrap()
    }

    #[test]
    fn test_build_keeps_every_polygon() {
        let tree = BspNode::new(vec![triangle(0.0), triangle(1.0), triangle(-1.0)]);
        assert_eq!(tree.polygon_count(), 3);
        assert_eq!(BspNode::new(Vec::new()).polygon_count(), 0);
    }

    #[test]
    fn test_invert_flips_normals() {
        let mut tree = BspNode::new(vec![triangle(0.0)]);
        tree.invert();
        assert_eq!(tree.all_polygons()[0].plane.normal, -DVec3::Z);
    }

    #[test]
    fn test_clip_keeps_front_drops_back() {
        let tree = BspNode::new(vec![triangle(0.0)]);
        assert_eq!(tree.clip_polygons(vec![triangle(1.0)]).len(), 1);
        assert!(tree.clip_polygons(vec![triangle(-1.0)]).is_empty());
    }

    #[test]
    fn test_deep_tree_drops_without_overflow() {
        // Stacked parallel planes give a chain as deep as the input.
        let polygons: Vec<Polygon> = (0..3_000).map(|i| triangle(-(i as f64))).collect();
        let tree = BspNode::new(polygons);
        assert_eq!(tree.polygon_count(), 3_000);
    }
}
