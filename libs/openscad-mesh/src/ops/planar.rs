//! # Planar Booleans
//!
//! 2D union, difference and intersection. Each region is extruded into a
//! slab spanning z ∈ [-1, 1], the slabs go through the 3D BSP booleans,
//! and the result is sliced back at z = 0. Slab caps never reach the
//! slicing plane, so the section sees only walls.

use openscad_eval::kernel::LinearExtrudeParams;

use crate::mesh::Mesh;
use crate::ops::boolean::{difference_all, intersection_all, union_all};
use crate::ops::extrude::linear_extrude;
use crate::ops::slice::slice;
use crate::region::Region;

const SLAB_HEIGHT: f64 = 2.0;

fn slab(region: &Region) -> Mesh {
    let params = LinearExtrudeParams {
        height: SLAB_HEIGHT,
        center: true,
        ..LinearExtrudeParams::default()
    };
    linear_extrude(region, &params)
}

fn section(mesh: &Mesh) -> Region {
    slice(mesh, 0.0)
}

pub fn union_regions(mut regions: Vec<Region>) -> Region {
    regions.retain(|r| !r.is_empty());
    if regions.len() <= 1 {
        return regions.pop().unwrap_or_default();
    }
    section(&union_all(regions.iter().map(slab).collect()))
}

/// First region minus all others.
pub fn difference_regions(first: &Region, rest: &[Region]) -> Region {
    let rest: Vec<Mesh> = rest.iter().filter(|r| !r.is_empty()).map(slab).collect();
    if first.is_empty() || rest.is_empty() {
        return first.clone();
    }
    section(&difference_all(slab(first), rest))
}

pub fn intersection_regions(regions: &[Region]) -> Region {
    if regions.iter().any(Region::is_empty) {
        let mut empty = Region::default();
        empty.set_color(regions.first().and_then(Region::color));
        return empty;
    }
    if regions.len() == 1 {
        return regions[0].clone();
    }
    section(&intersection_all(regions.iter().map(slab).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::{circle, square};
    use approx::assert_relative_eq;
    use glam::{DMat4, DVec2, DVec3};
    use openscad_eval::Resolution;

    fn square_at(x: f64, y: f64, size: f64) -> Region {
        let mut region = square(DVec2::splat(size), false);
        region.transform(&DMat4::from_translation(DVec3::new(x, y, 0.0)));
        region
    }

    #[test]
    fn test_union_overlapping_squares() {
        let result = union_regions(vec![square_at(0.0, 0.0, 2.0), square_at(1.0, 1.0, 2.0)]);
        assert_eq!(result.contours().len(), 1);
        assert_relative_eq!(result.area(), 7.0, epsilon = 1e-6);
    }

    #[test]
    fn test_union_disjoint_keeps_both() {
        let result = union_regions(vec![square_at(0.0, 0.0, 1.0), square_at(5.0, 0.0, 1.0)]);
        assert_eq!(result.contours().len(), 2);
        assert_relative_eq!(result.area(), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_difference_makes_hole() {
        let result = difference_regions(&square_at(0.0, 0.0, 4.0), &[square_at(1.0, 1.0, 2.0)]);
        assert_eq!(result.contours().len(), 2);
        assert_relative_eq!(result.area(), 12.0, epsilon = 1e-6);
        assert_eq!(result.polygons()[0].holes.len(), 1);
    }

    #[test]
    fn test_intersection_of_squares() {
        let result = intersection_regions(&[square_at(0.0, 0.0, 2.0), square_at(1.0, 1.0, 2.0)]);
        assert_relative_eq!(result.area(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_circle_minus_square() {
        let disc = circle(2.0, Resolution::segments(32));
        let cut = square(DVec2::splat(10.0), false);
        let result = difference_regions(&disc, &[cut]);
        assert_relative_eq!(result.area(), disc.area() * 0.75, epsilon = 1e-6);
    }
}
