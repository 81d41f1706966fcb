//! # Linear Extrusion
//!
//! Each layer is the region rotated by `-twist · t` and scaled by
//! `lerp(1, scale, t)` at height fraction `t`.

use glam::{DMat2, DVec2, DVec3};
use openscad_eval::kernel::LinearExtrudeParams;

use crate::mesh::Mesh;
use crate::region::Region;
use crate::triangulate::triangulate;

/// Extrude `region` upward (or centered on z = 0).
///
/// A zero top scale collapses the top layer to a point; the top cap is
/// then omitted.
pub fn linear_extrude(region: &Region, params: &LinearExtrudeParams) -> Mesh {
    if params.height <= 0.0 || region.is_empty() {
        return Mesh::new();
    }
    let slices = params.slices.max(1) as usize;
    let z0 = if params.center { -params.height / 2.0 } else { 0.0 };

    let layer = |k: usize| {
        let t = k as f64 / slices as f64;
        let rotation = DMat2::from_angle((-params.twist * t).to_radians());
        let scale = DVec2::ONE.lerp(params.scale, t);
        let z = z0 + params.height * t;
        move |p: DVec2| (rotation * (p * scale)).extend(z)
    };

    let mut triangles: Vec<[DVec3; 3]> = Vec::new();
    for contour in region.contours() {
        let n = contour.len();
        for k in 0..slices {
            let (lower, upper) = (layer(k), layer(k + 1));
            for i in 0..n {
                let j = (i + 1) % n;
                let (b0, b1) = (lower(contour[i]), lower(contour[j]));
                let (t0, t1) = (upper(contour[i]), upper(contour[j]));
                triangles.push([b0, b1, t1]);
                triangles.push([b0, t1, t0]);
            }
        }
    }

    let caps = triangulate(region);
    let bottom = layer(0);
    triangles.extend(caps.iter().map(|[a, b, c]| [bottom(*a), bottom(*c), bottom(*b)]));
    if params.scale != DVec2::ZERO {
        let top = layer(slices);
        triangles.extend(caps.iter().map(|[a, b, c]| [top(*a), top(*b), top(*c)]));
    }

    let mut mesh = Mesh::from_triangles(triangles);
    mesh.set_color(region.color());
    mesh
}
