//! # Polyhedron Primitive

use glam::{DVec2, DVec3};

use crate::error::{MeshError, MeshResult};
use crate::mesh::Mesh;
use crate::triangulate::ear_clip;

/// Solid from explicit points and faces.
///
/// Faces list their points clockwise when seen from outside, as in
/// OpenSCAD. Faces with more than three points are triangulated in their
/// own plane, so they may be concave. A model with every face reversed is
/// turned inside out again.
pub fn polyhedron(points: &[DVec3], faces: &[Vec<usize>]) -> MeshResult<Mesh> {
    let mut triangles: Vec<[DVec3; 3]> = Vec::new();
    for (face_index, face) in faces.iter().enumerate() {
        let ring = face
            .iter()
            .rev()
            .map(|&i| {
                points.get(i).copied().ok_or_else(|| {
                    MeshError::invalid(format!(
                        "polyhedron face {face_index} refers to point {i}, but there are {} points",
                        points.len()
                    ))
                })
            })
            .collect::<MeshResult<Vec<DVec3>>>()?;
        if ring.len() < 3 {
            continue;
        }
        triangles.extend(triangulate_face(&ring));
    }

    let mut mesh = Mesh::from_triangles(triangles);
    if mesh.is_empty() {
        return Err(MeshError::degenerate("polyhedron has no faces with area"));
    }
    if mesh.volume() < 0.0 {
        mesh.flip();
    }
    Ok(mesh)
}

/// Triangles of a planar 3D face, keeping its winding.
fn triangulate_face(ring: &[DVec3]) -> Vec<[DVec3; 3]> {
    if ring.len() == 3 {
        return vec![[ring[0], ring[1], ring[2]]];
    }
    // Newell normal, then drop its dominant axis.
    let normal = (0..ring.len()).fold(DVec3::ZERO, |n, i| {
        let (a, b) = (ring[i], ring[(i + 1) % ring.len()]);
        n + DVec3::new(
            (a.y - b.y) * (a.z + b.z),
            (a.z - b.z) * (a.x + b.x),
            (a.x - b.x) * (a.y + b.y),
        )
    });
    let abs = normal.abs();
    let project: fn(DVec3) -> DVec2 = if abs.z >= abs.x && abs.z >= abs.y {
        |p| DVec2::new(p.x, p.y)
    } else if abs.x >= abs.y {
        |p| DVec2::new(p.y, p.z)
    } else {
        |p| DVec2::new(p.z, p.x)
    };
    let dominant = if abs.z >= abs.x && abs.z >= abs.y {
        normal.z
    } else if abs.x >= abs.y {
        normal.x
    } else {
        normal.y
    };
    let reversed = dominant < 0.0;
    let order: Vec<usize> = if reversed {
        (0..ring.len()).rev().collect()
    } else {
        (0..ring.len()).collect()
    };
    let flat: Vec<DVec2> = order.iter().map(|&i| project(ring[i])).collect();
    ear_clip(&flat)
        .into_iter()
        .map(|[a, b, c]| {
            let (a, b, c) = (ring[order[a]], ring[order[b]], ring[order[c]]);
            if reversed {
                [a, c, b]
            } else {
                [a, b, c]
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_cube_points() -> Vec<DVec3> {
        vec![
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(1.0, 1.0, 0.0),
            DVec3::new(0.0, 1.0, 0.0),
            DVec3::new(0.0, 0.0, 1.0),
            DVec3::new(1.0, 0.0, 1.0),
            DVec3::new(1.0, 1.0, 1.0),
            DVec3::new(0.0, 1.0, 1.0),
        ]
    }

    /// The cube from the OpenSCAD manual, faces clockwise from outside.
    fn unit_cube_faces() -> Vec<Vec<usize>> {
        vec![
            vec![0, 1, 2, 3],
            vec![4, 5, 1, 0],
            vec![7, 6, 5, 4],
            vec![5, 6, 2, 1],
            vec![6, 7, 3, 2],
            vec![7, 4, 0, 3],
        ]
    }

    #[test]
    fn test_polyhedron_cube() {
        let mesh = polyhedron(&unit_cube_points(), &unit_cube_faces()).unwrap();
        assert_eq!(mesh.triangle_count(), 12);
        assert!(mesh.is_closed());
        assert_relative_eq!(mesh.volume(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_polyhedron_inside_out_is_repaired() {
        let faces: Vec<Vec<usize>> = unit_cube_faces()
            .into_iter()
            .map(|f| f.into_iter().rev().collect())
            .collect();
        let mesh = polyhedron(&unit_cube_points(), &faces).unwrap();
        assert_relative_eq!(mesh.volume(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_polyhedron_bad_index() {
        let err = polyhedron(&unit_cube_points(), &[vec![0, 1, 42]]).unwrap_err();
        assert!(err.to_string().contains("point 42"));
    }
}
