//! # Minkowski Tests

use super::*;
use crate::ops::boolean::difference;
use crate::primitives::{cube, square};
use approx::assert_relative_eq;

#[test]
fn test_cube_plus_cube() {
    let sum = minkowski_meshes(vec![
        cube(DVec3::ONE, true),
        cube(DVec3::splat(2.0), true),
    ])
    .unwrap();
    assert_relative_eq!(sum.volume(), 27.0, epsilon = 1e-9);
    let (min, max) = sum.bounds().unwrap();
    assert_relative_eq!(min.x, -1.5);
    assert_relative_eq!(max.z, 1.5);
}

#[test]
fn test_non_convex_keeps_notch() {
    // A 4x4x1 slab with a 2x2 through-hole, grown by a 0.5 cube: the hole
    // shrinks to 1x1 instead of filling up.
    let slab = difference(
        &cube(DVec3::new(4.0, 4.0, 1.0), true),
        &cube(DVec3::new(2.0, 2.0, 4.0), true),
    );
    let sum = minkowski_meshes(vec![slab, cube(DVec3::splat(0.5), true)]).unwrap();
    let expected = 4.5 * 4.5 * 1.5 - 1.5 * 1.5 * 1.5;
    assert_relative_eq!(sum.volume(), expected, epsilon = 1e-5);
}

#[test]
fn test_single_operand_and_empty() {
    let only = minkowski_meshes(vec![cube(DVec3::ONE, false)]).unwrap();
    assert_relative_eq!(only.volume(), 1.0);
    assert!(minkowski_meshes(Vec::new()).unwrap().is_empty());
}

#[test]
fn test_region_square_plus_square() {
    let sum = minkowski_regions(vec![
        square(DVec2::ONE, false),
        square(DVec2::splat(2.0), true),
    ]);
    assert_relative_eq!(sum.area(), 9.0, epsilon = 1e-12);
}

#[test]
fn test_region_l_shape_stays_concave() {
    let l = Region::new(vec![vec![
        DVec2::new(0.0, 0.0),
        DVec2::new(4.0, 0.0),
        DVec2::new(4.0, 1.0),
        DVec2::new(1.0, 1.0),
        DVec2::new(1.0, 4.0),
        DVec2::new(0.0, 4.0),
    ]]);
    let small = square(DVec2::splat(0.5), true);
    let sum = minkowski_regions(vec![l, small]);
    // L of arm width 1.5 reaching 4.5 from a corner at -0.25.
    let expected = 4.5 * 1.5 * 2.0 - 1.5 * 1.5;
    assert_relative_eq!(sum.area(), expected, epsilon = 1e-5);
}
