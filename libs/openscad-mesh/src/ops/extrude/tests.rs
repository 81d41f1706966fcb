//! # Extrusion Tests

use std::f64::consts::PI;

use approx::assert_relative_eq;
use glam::DVec2;
use openscad_eval::kernel::{LinearExtrudeParams, RotateExtrudeParams};
use openscad_eval::Resolution;

use super::*;
use crate::primitives::{circle, square};
use crate::region::Region;

fn extrude(height: f64) -> LinearExtrudeParams {
    LinearExtrudeParams {
        height,
        ..LinearExtrudeParams::default()
    }
}

// =============================================================================
// LINEAR
// =============================================================================

#[test]
fn test_linear_square_prism() {
    let mesh = linear_extrude(&square(DVec2::new(2.0, 3.0), false), &extrude(4.0));
    assert!(mesh.is_closed());
    assert_relative_eq!(mesh.volume(), 24.0, epsilon = 1e-9);
}

#[test]
fn test_linear_centered() {
    let params = LinearExtrudeParams {
        center: true,
        ..extrude(2.0)
    };
    let mesh = linear_extrude(&square(DVec2::ONE, true), &params);
    let (min, max) = mesh.bounds().unwrap();
    assert_relative_eq!(min.z, -1.0);
    assert_relative_eq!(max.z, 1.0);
}

#[test]
fn test_linear_with_hole() {
    let ring = Region::new(vec![
        square(DVec2::splat(4.0), true).into_contours().remove(0),
        square(DVec2::splat(2.0), true).into_contours().remove(0),
    ]);
    let mesh = linear_extrude(&ring, &extrude(1.0));
    assert!(mesh.is_closed());
    assert_relative_eq!(mesh.volume(), 12.0, epsilon = 1e-9);
}

#[test]
fn test_linear_twist_keeps_volume() {
    // Twisting a centered circle keeps every layer's area; only the
    // triangulated walls bulge slightly.
    let base = circle(1.0, Resolution::segments(24));
    let params = LinearExtrudeParams {
        twist: 90.0,
        slices: 10,
        ..extrude(5.0)
    };
    let mesh = linear_extrude(&base, &params);
    assert!(mesh.is_closed());
    let expected = base.area() * 5.0;
    assert!((mesh.volume() - expected).abs() < 0.01 * expected);
}

#[test]
fn test_linear_scale_to_point_is_pyramid() {
    let params = LinearExtrudeParams {
        scale: DVec2::ZERO,
        ..extrude(3.0)
    };
    let mesh = linear_extrude(&square(DVec2::splat(2.0), true), &params);
    assert!(mesh.is_closed());
    assert_relative_eq!(mesh.volume(), 4.0, epsilon = 1e-9);
}

#[test]
fn test_linear_empty_inputs() {
    assert!(linear_extrude(&Region::default(), &extrude(1.0)).is_empty());
    assert!(linear_extrude(&square(DVec2::ONE, false), &extrude(0.0)).is_empty());
}

// =============================================================================
// ROTATE
// =============================================================================

fn revolve(angle: f64, fragments: u32) -> RotateExtrudeParams {
    RotateExtrudeParams {
        angle,
        resolution: Resolution::segments(fragments),
    }
}

fn offset_square() -> Region {
    // x in [1, 2], y in [0, 1]
    let mut region = square(DVec2::ONE, false);
    region.transform(&glam::DMat4::from_translation(glam::DVec3::X));
    region
}

#[test]
fn test_rotate_full_ring() {
    let mesh = rotate_extrude(&offset_square(), &revolve(360.0, 64)).unwrap();
    assert!(mesh.is_closed());
    // Pappus: area 1 swept around centroid radius 1.5.
    let exact = 2.0 * PI * 1.5;
    assert!(mesh.volume() > 0.99 * exact && mesh.volume() < exact);
}

#[test]
fn test_rotate_partial_has_caps() {
    let mesh = rotate_extrude(&offset_square(), &revolve(90.0, 64)).unwrap();
    assert!(mesh.is_closed());
    assert!(mesh.volume() > 0.0);
    let negative = rotate_extrude(&offset_square(), &revolve(-90.0, 64)).unwrap();
    assert!(negative.is_closed());
    assert_relative_eq!(negative.volume(), mesh.volume(), epsilon = 1e-9);
}

#[test]
fn test_rotate_negative_profile_is_mirrored() {
    let mut left = offset_square();
    left.transform(&glam::DMat4::from_scale(glam::DVec3::new(-1.0, 1.0, 1.0)));
    let mesh = rotate_extrude(&left, &revolve(360.0, 32)).unwrap();
    let reference = rotate_extrude(&offset_square(), &revolve(360.0, 32)).unwrap();
    assert_relative_eq!(mesh.volume(), reference.volume(), epsilon = 1e-9);
}

#[test]
fn test_rotate_rejects_axis_crossing() {
    let region = square(DVec2::ONE, true);
    assert!(rotate_extrude(&region, &revolve(360.0, 16)).is_err());
}
