//! # Sphere Primitive
//!
//! Latitude/longitude tessellation without pole vertices.

use std::f64::consts::{PI, TAU};

use glam::DVec3;
use openscad_eval::Resolution;

use crate::mesh::Mesh;

/// Sphere of `radius` centered on the origin.
///
/// ## Algorithm
///
/// Follows OpenSCAD: `rings = (fragments + 1) / 2`, ring `i` sits at
/// polar angle `π (i + 0.5) / rings`, and the first and last rings are
/// closed with flat caps.
pub fn sphere(radius: f64, resolution: Resolution) -> Mesh {
    if radius <= 0.0 {
        return Mesh::new();
    }
    let fragments = resolution.fragments(radius) as usize;
    let ring_count = (fragments + 1) / 2;

    let rings: Vec<Vec<DVec3>> = (0..ring_count)
        .map(|i| {
            let phi = PI * (i as f64 + 0.5) / ring_count as f64;
            let (ring_radius, z) = (radius * phi.sin(), radius * phi.cos());
            (0..fragments)
                .map(|j| {
                    let theta = TAU * j as f64 / fragments as f64;
                    DVec3::new(ring_radius * theta.cos(), ring_radius * theta.sin(), z)
                })
                .collect()
        })
        .collect();

    let mut polygons: Vec<Vec<DVec3>> = Vec::with_capacity(ring_count * fragments + 2);
    if let Some(top) = rings.first() {
        polygons.push(top.clone());
    }
    for pair in rings.windows(2) {
        let (upper, lower) = (&pair[0], &pair[1]);
        for j in 0..fragments {
            let k = (j + 1) % fragments;
            polygons.push(vec![upper[j], lower[j], lower[k], upper[k]]);
        }
    }
    if let Some(bottom) = rings.last() {
        polygons.push(bottom.iter().rev().copied().collect());
    }
    Mesh::from_polygons(polygons.iter().map(Vec::as_slice))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_ring_layout() {
        let mesh = sphere(5.0, Resolution::segments(16));
        // Eight rings of sixteen vertices.
        assert_eq!(mesh.vertex_count(), 128);
        assert!(mesh.is_closed());
    }

    #[test]
    fn test_sphere_volume_approaches_exact() {
        let mesh = sphere(1.0, Resolution::segments(64));
        let exact = 4.0 / 3.0 * PI;
        assert!(mesh.volume() > 0.95 * exact && mesh.volume() < exact);
    }

    #[test]
    fn test_sphere_default_resolution() {
        // r = 10 with $fa = 12, $fs = 2 gives 30 fragments.
        let mesh = sphere(10.0, Resolution::default());
        assert_eq!(mesh.vertex_count(), 30 * 15);
    }

    #[test]
    fn test_sphere_zero_radius() {
        assert!(sphere(0.0, Resolution::default()).is_empty());
    }
}
