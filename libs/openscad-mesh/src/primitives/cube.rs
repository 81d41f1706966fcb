//! # Cube Primitive

use glam::DVec3;

use crate::mesh::Mesh;

/// Box from the origin to `size`, or centered on it.
///
/// Any non-positive extent gives an empty mesh.
///
/// # Example
///
/// ```rust
/// use glam::DVec3;
/// use openscad_mesh::primitives::cube;
///
/// let mesh = cube(DVec3::new(1.0, 2.0, 3.0), false);
/// assert_eq!(mesh.triangle_count(), 12);
/// assert!((mesh.volume() - 6.0).abs() < 1e-12);
/// ```
pub fn cube(size: DVec3, center: bool) -> Mesh {
    if size.min_element() <= 0.0 {
        return Mesh::new();
    }
    let min = if center { -size / 2.0 } else { DVec3::ZERO };
    let max = min + size;
    let corner = |x: bool, y: bool, z: bool| {
        DVec3::new(
            if x { max.x } else { min.x },
            if y { max.y } else { min.y },
            if z { max.z } else { min.z },
        )
    };
    let (f, t) = (false, true);
    let faces = [
        [corner(f, f, f), corner(f, t, f), corner(t, t, f), corner(t, f, f)],
        [corner(f, f, t), corner(t, f, t), corner(t, t, t), corner(f, t, t)],
        [corner(f, f, f), corner(t, f, f), corner(t, f, t), corner(f, f, t)],
        [corner(f, t, f), corner(f, t, t), corner(t, t, t), corner(t, t, f)],
        [corner(f, f, f), corner(f, f, t), corner(f, t, t), corner(f, t, f)],
        [corner(t, f, f), corner(t, t, f), corner(t, t, t), corner(t, f, t)],
    ];
    Mesh::from_polygons(faces.iter().map(|face| face.as_slice()))
}
