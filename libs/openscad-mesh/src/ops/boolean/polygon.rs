//! # BSP Polygon
//!
//! Convex planar polygon carrying the plane it was created on. Split
//! fragments inherit the parent plane so repeated splits do not drift.

use glam::DVec3;

use super::plane::{Classification, Plane};

#[derive(Debug, Clone)]
pub struct Polygon {
    pub vertices: Vec<DVec3>,
    pub plane: Plane,
}

/// Buckets filled by [`Polygon::split`].
#[derive(Debug, Default)]
pub struct SplitOutput {
    pub coplanar_front: Vec<Polygon>,
    pub coplanar_back: Vec<Polygon>,
    pub front: Vec<Polygon>,
    pub back: Vec<Polygon>,
}

impl Polygon {
    /// `None` for fewer than three vertices or no well-defined plane.
    pub fn new(vertices: Vec<DVec3>) -> Option<Self> {
        if vertices.len() < 3 {
            return None;
        }
        let plane = Plane::from_polygon(&vertices)?;
        Some(Self { vertices, plane })
    }

    pub fn flip(&mut self) {
        self.vertices.reverse();
        self.plane.flip();
    }

    /// Sort this polygon, or the pieces of it, into `out` relative to
    /// `plane`.
    pub fn split(self, plane: &Plane, out: &mut SplitOutput) {
        let sides: Vec<Classification> = self
            .vertices
            .iter()
            .map(|&v| plane.classify_point(v))
            .collect();
        let has_front = sides.contains(&Classification::Front);
        let has_back = sides.contains(&Classification::Back);

        match (has_front, has_back) {
            (false, false) => {
                if self.plane.normal.dot(plane.normal) > 0.0 {
                    out.coplanar_front.push(self);
                } else {
                    out.coplanar_back.push(self);
                }
            }
            (true, false) => out.front.push(self),
            (false, true) => out.back.push(self),
            (true, true) => {
                let n = self.vertices.len();
                let mut front = Vec::with_capacity(n + 1);
                let mut back = Vec::with_capacity(n + 1);
                for i in 0..n {
                    let j = (i + 1) % n;
                    let (vi, vj) = (self.vertices[i], self.vertices[j]);
                    let (ti, tj) = (sides[i], sides[j]);
                    if ti != Classification::Back {
                        front.push(vi);
                    }
                    if ti != Classification::Front {
                        back.push(vi);
                    }
                    let crosses = matches!(
                        (ti, tj),
                        (Classification::Front, Classification::Back)
                            | (Classification::Back, Classification::Front)
                    );
                    if crosses {
                        let t = (plane.w - plane.normal.dot(vi)) / plane.normal.dot(vj - vi);
                        let v = vi.lerp(vj, t);
                        front.push(v);
                        back.push(v);
                    }
                }
                if front.len() >= 3 {
                    out.front.push(Polygon {
                        vertices: front,
                        plane: self.plane,
                    });
                }
                if back.len() >= 3 {
                    out.back.push(Polygon {
                        vertices: back,
                        plane: self.plane,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle(z0: f64, z2: f64) -> Polygon {
        Polygon::new(vec![
            DVec3::new(0.0, 0.0, z0),
            DVec3::new(1.0, 0.0, z0),
            DVec3::new(0.5, 1.0, z2),
        ])
        .unwrap()
    }

    fn xy_plane() -> Plane {
        Plane {
            normal: DVec3::Z,
            w: 0.0,
        }
    }

    #[test]
    fn test_split_sides() {
        let mut out = SplitOutput::default();
        triangle(1.0, 1.0).split(&xy_plane(), &mut out);
        triangle(-1.0, -1.0).split(&xy_plane(), &mut out);
        assert_eq!(out.front.len(), 1);
        assert_eq!(out.back.len(), 1);
    }

    #[test]
    fn test_split_coplanar_by_facing() {
        let mut out = SplitOutput::default();
        let mut flipped = triangle(0.0, 0.0);
        flipped.flip();
        triangle(0.0, 0.0).split(&xy_plane(), &mut out);
        flipped.split(&xy_plane(), &mut out);
        assert_eq!(out.coplanar_front.len(), 1);
        assert_eq!(out.coplanar_back.len(), 1);
    }

    #[test]
    fn test_split_spanning() {
        let mut out = SplitOutput::default();
        triangle(-1.0, 1.0).split(&xy_plane(), &mut out);
        assert_eq!(out.front.len(), 1);
        assert_eq!(out.back.len(), 1);
        assert_eq!(out.front[0].vertices.len(), 3);
        assert_eq!(out.back[0].vertices.len(), 4);
        assert!(out.front[0].vertices.iter().all(|v| v.z >= -1e-12));
    }
}
