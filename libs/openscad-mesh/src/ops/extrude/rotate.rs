//! # Rotational Extrusion
//!
//! The region's X axis becomes the radius and its Y axis becomes Z.

use config::constants::EPSILON;
use glam::{DMat4, DVec2, DVec3};
use openscad_eval::kernel::RotateExtrudeParams;

use crate::error::{MeshError, MeshResult};
use crate::mesh::Mesh;
use crate::region::Region;
use crate::triangulate::triangulate;

/// Revolve `region` about the Z axis by `params.angle` degrees.
///
/// A profile entirely at `x <= 0` is mirrored first. A profile that
/// crosses the axis is an error. Partial sweeps get flat end caps.
pub fn rotate_extrude(region: &Region, params: &RotateExtrudeParams) -> MeshResult<Mesh> {
    if region.is_empty() || params.angle == 0.0 {
        return Ok(Mesh::new());
    }
    let has_positive = region.points().any(|p| p.x > EPSILON);
    let has_negative = region.points().any(|p| p.x < -EPSILON);
    if has_positive && has_negative {
        return Err(MeshError::invalid(
            "rotate_extrude: all points must have the same X coordinate sign",
        ));
    }
    let mut profile = region.clone();
    if has_negative {
        profile.transform(&DMat4::from_scale(DVec3::new(-1.0, 1.0, 1.0)));
    }
    let max_x = profile.points().map(|p| p.x).fold(0.0, f64::max);
    if max_x <= EPSILON {
        return Ok(Mesh::new());
    }

    let sweep = params.angle.abs().min(360.0);
    let full = sweep >= 360.0;
    let fragments = params.resolution.fragments(max_x) as f64;
    let steps = ((fragments * sweep / 360.0).ceil() as usize).max(if full { 3 } else { 1 });
    let sign = params.angle.signum();

    let place = |p: DVec2, k: usize| {
        let step = if full { k % steps } else { k };
        let phi = (sign * sweep * step as f64 / steps as f64).to_radians();
        DVec3::new(p.x * phi.cos(), p.x * phi.sin(), p.y)
    };

    let mut triangles: Vec<[DVec3; 3]> = Vec::new();
    for contour in profile.contours() {
        let n = contour.len();
        for k in 0..steps {
            for i in 0..n {
                let (p0, p1) = (contour[i], contour[(i + 1) % n]);
                let quad = [place(p1, k), place(p0, k), place(p0, k + 1), place(p1, k + 1)];
                triangles.push([quad[0], quad[1], quad[2]]);
                triangles.push([quad[0], quad[2], quad[3]]);
            }
        }
    }
    if !full {
        let caps = triangulate(&profile);
        triangles.extend(caps.iter().map(|[a, b, c]| [place(*a, 0), place(*b, 0), place(*c, 0)]));
        triangles.extend(
            caps.iter()
                .map(|[a, b, c]| [place(*a, steps), place(*c, steps), place(*b, steps)]),
        );
    }

    let mut mesh = Mesh::from_triangles(triangles);
    if sign < 0.0 {
        mesh.flip();
    }
    mesh.set_color(region.color());
    Ok(mesh)
}
