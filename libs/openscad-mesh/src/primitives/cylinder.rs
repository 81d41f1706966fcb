//! # Cylinder Primitive
//!
//! Cylinders, cones and truncated cones.

use glam::DVec3;
use openscad_eval::kernel::CylinderParams;
use openscad_eval::Resolution;

use crate::mesh::Mesh;
use crate::primitives::circle_points;

/// Frustum along Z. A zero radius at either end collapses that ring
/// into an apex.
///
/// # Example
///
/// ```rust
/// use openscad_eval::kernel::CylinderParams;
/// use openscad_eval::Resolution;
/// use openscad_mesh::primitives::cylinder;
///
/// let cone = cylinder(
///     CylinderParams { height: 10.0, bottom_radius: 5.0, top_radius: 0.0, center: false },
///     Resolution::segments(32),
/// );
/// assert!(cone.is_closed());
/// ```
pub fn cylinder(params: CylinderParams, resolution: Resolution) -> Mesh {
    let CylinderParams {
        height,
        bottom_radius,
        top_radius,
        center,
    } = params;
    if height <= 0.0 || bottom_radius < 0.0 || top_radius < 0.0 {
        return Mesh::new();
    }
    if bottom_radius == 0.0 && top_radius == 0.0 {
        return Mesh::new();
    }

    let fragments = resolution.fragments(bottom_radius.max(top_radius)) as usize;
    let z0 = if center { -height / 2.0 } else { 0.0 };
    let z1 = z0 + height;
    let ring = |radius: f64, z: f64| -> Vec<DVec3> {
        circle_points(radius, fragments)
            .into_iter()
            .map(|p| p.extend(z))
            .collect()
    };
    let bottom = ring(bottom_radius, z0);
    let top = ring(top_radius, z1);

    let mut polygons: Vec<Vec<DVec3>> = Vec::with_capacity(fragments + 2);
    polygons.push(bottom.iter().rev().copied().collect());
    polygons.push(top.clone());
    for i in 0..fragments {
        let j = (i + 1) % fragments;
        polygons.push(vec![bottom[i], bottom[j], top[j], top[i]]);
    }
    Mesh::from_polygons(polygons.iter().map(Vec::as_slice))
}
