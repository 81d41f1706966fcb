//! # Mesh Data Structure
//!
//! Indexed triangle mesh with an optional uniform color. Coordinates are
//! `f64` throughout; `f32` only appears in [`MeshBuffers`].

use std::collections::HashMap;

use config::constants::{DEFAULT_COLOR, EPSILON, VERTEX_MERGE_EPSILON};
use glam::{DMat4, DVec3};
use serde::Serialize;

/// A closed triangle mesh, counter-clockwise when seen from outside.
///
/// # Example
///
/// ```rust
/// use openscad_mesh::Mesh;
/// use glam::DVec3;
///
/// let mut mesh = Mesh::new();
/// let a = mesh.add_vertex(DVec3::ZERO);
/// let b = mesh.add_vertex(DVec3::X);
/// let c = mesh.add_vertex(DVec3::Y);
/// mesh.add_triangle(a, b, c);
/// assert_eq!(mesh.triangle_count(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    vertices: Vec<DVec3>,
    triangles: Vec<[u32; 3]>,
    color: Option<[f32; 4]>,
}

/// Counts and volume of a mesh.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeshStats {
    pub vertex_count: usize,
    pub face_count: usize,
    pub volume: f64,
}

/// Flat arrays for GPU upload.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeshBuffers {
    /// `[x, y, z, ...]`
    pub positions: Vec<f32>,
    /// `[nx, ny, nz, ...]`, one per vertex.
    pub normals: Vec<f32>,
    /// `[r, g, b, a, ...]`, one per vertex.
    pub colors: Vec<f32>,
    /// Three per triangle.
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(vertex_count: usize, triangle_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            triangles: Vec::with_capacity(triangle_count),
            color: None,
        }
    }

    /// Build a welded mesh from planar polygons.
    ///
    /// Each polygon is fan-triangulated, so it must be convex. Vertices
    /// closer than `VERTEX_MERGE_EPSILON` are merged and degenerate
    /// triangles dropped.
    pub fn from_polygons<'p>(polygons: impl IntoIterator<Item = &'p [DVec3]>) -> Self {
        let mut welder = Welder::default();
        for polygon in polygons {
            if polygon.len() < 3 {
                continue;
            }
            let first = welder.index(polygon[0]);
            for pair in polygon[1..].windows(2) {
                let b = welder.index(pair[0]);
                let c = welder.index(pair[1]);
                welder.triangle(first, b, c);
            }
        }
        welder.mesh
    }

    /// Build a welded mesh from explicit triangles.
    pub fn from_triangles(triangles: impl IntoIterator<Item = [DVec3; 3]>) -> Self {
        let mut welder = Welder::default();
        for [a, b, c] in triangles {
            let (a, b, c) = (welder.index(a), welder.index(b), welder.index(c));
            welder.triangle(a, b, c);
        }
        welder.mesh
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Adds a vertex and returns its index.
    pub fn add_vertex(&mut self, position: DVec3) -> u32 {
        let index = self.vertices.len() as u32;
        self.vertices.push(position);
        index
    }

    pub fn add_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.triangles.push([a, b, c]);
    }

    #[inline]
    pub fn vertices(&self) -> &[DVec3] {
        &self.vertices
    }

    #[inline]
    pub fn triangles(&self) -> &[[u32; 3]] {
        &self.triangles
    }

    /// Corner positions of every triangle.
    pub fn triangle_positions(&self) -> impl Iterator<Item = [DVec3; 3]> + '_ {
        self.triangles.iter().map(|t| {
            [
                self.vertices[t[0] as usize],
                self.vertices[t[1] as usize],
                self.vertices[t[2] as usize],
            ]
        })
    }

    pub fn color(&self) -> Option<[f32; 4]> {
        self.color
    }

    pub fn set_color(&mut self, color: Option<[f32; 4]>) {
        self.color = color;
    }

    /// Area-weighted vertex normals.
    pub fn normals(&self) -> Vec<DVec3> {
        let mut normals = vec![DVec3::ZERO; self.vertices.len()];
        for ([a, b, c], tri) in self.triangle_positions().zip(&self.triangles) {
            let normal = (b - a).cross(c - a);
            for &i in tri {
                normals[i as usize] += normal;
            }
        }
        for normal in &mut normals {
            *normal = normal.normalize_or_zero();
        }
        normals
    }

    /// Axis-aligned bounds, `None` when the mesh has no vertices.
    pub fn bounds(&self) -> Option<(DVec3, DVec3)> {
        let first = *self.vertices.first()?;
        Some(
            self.vertices
                .iter()
                .fold((first, first), |(min, max), v| (min.min(*v), max.max(*v))),
        )
    }

    /// Signed volume; positive for outward-facing triangles.
    pub fn volume(&self) -> f64 {
        self.triangle_positions()
            .map(|[a, b, c]| a.dot(b.cross(c)))
            .sum::<f64>()
            / 6.0
    }

    pub fn stats(&self) -> MeshStats {
        MeshStats {
            vertex_count: self.vertex_count(),
            face_count: self.triangle_count(),
            volume: self.volume(),
        }
    }

    /// Apply an affine matrix. A mirroring matrix also flips the winding
    /// so triangles stay outward-facing.
    pub fn transform(&mut self, matrix: &DMat4) {
        for v in &mut self.vertices {
            *v = matrix.transform_point3(*v);
        }
        if matrix.determinant() < 0.0 {
            self.flip();
        }
    }

    /// Reverse the winding of every triangle.
    pub fn flip(&mut self) {
        for tri in &mut self.triangles {
            tri.swap(1, 2);
        }
    }

    /// Append another mesh without welding.
    pub fn merge(&mut self, other: &Mesh) {
        let offset = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.triangles.extend(
            other
                .triangles
                .iter()
                .map(|t| [t[0] + offset, t[1] + offset, t[2] + offset]),
        );
        if self.color.is_none() {
            self.color = other.color;
        }
    }

    /// True when every index is in range and no triangle repeats a vertex.
    pub fn validate(&self) -> bool {
        let count = self.vertices.len() as u32;
        self.triangles.iter().all(|t| {
            t.iter().all(|&i| i < count) && t[0] != t[1] && t[1] != t[2] && t[0] != t[2]
        })
    }

    /// True when every edge is shared by exactly two triangles with
    /// opposite directions.
    pub fn is_closed(&self) -> bool {
        let mut edges: HashMap<(u32, u32), i32> = HashMap::new();
        for t in &self.triangles {
            for (a, b) in [(t[0], t[1]), (t[1], t[2]), (t[2], t[0])] {
                let (key, dir) = if a < b { ((a, b), 1) } else { ((b, a), -1) };
                *edges.entry(key).or_insert(0) += dir;
            }
        }
        edges.values().all(|&balance| balance == 0)
    }

    /// Flatten into GPU buffers.
    pub fn to_buffers(&self) -> MeshBuffers {
        let color = self.color.unwrap_or(DEFAULT_COLOR);
        let normals = self.normals();
        MeshBuffers {
            positions: self
                .vertices
                .iter()
                .flat_map(|v| [v.x as f32, v.y as f32, v.z as f32])
                .collect(),
            normals: normals
                .iter()
                .flat_map(|n| [n.x as f32, n.y as f32, n.z as f32])
                .collect(),
            colors: self.vertices.iter().flat_map(|_| color).collect(),
            indices: self.triangles.iter().flatten().copied().collect(),
        }
    }
}

// =============================================================================
// WELDING
// =============================================================================

type WeldKey = (i64, i64, i64);

/// Incremental mesh builder that merges coincident vertices.
#[derive(Default)]
struct Welder {
    mesh: Mesh,
    lookup: HashMap<WeldKey, u32>,
}

impl Welder {
    fn key(p: DVec3) -> WeldKey {
        let q = |v: f64| (v / VERTEX_MERGE_EPSILON).round() as i64;
        (q(p.x), q(p.y), q(p.z))
    }

    fn index(&mut self, p: DVec3) -> u32 {
        let key = Self::key(p);
        if let Some(&index) = self.lookup.get(&key) {
            return index;
        }
        let index = self.mesh.add_vertex(p);
        self.lookup.insert(key, index);
        index
    }

    fn triangle(&mut self, a: u32, b: u32, c: u32) {
        if a == b || b == c || a == c {
            return;
        }
        let v = &self.mesh.vertices;
        let (pa, pb, pc) = (v[a as usize], v[b as usize], v[c as usize]);
        if (pb - pa).cross(pc - pa).length_squared() <= EPSILON * EPSILON {
            return;
        }
        self.mesh.add_triangle(a, b, c);
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_square_quads() -> Vec<Vec<DVec3>> {
        // Unit cube as six outward quads.
        let p = |x: f64, y: f64, z: f64| DVec3::new(x, y, z);
        vec![
            vec![p(0., 0., 0.), p(0., 1., 0.), p(1., 1., 0.), p(1., 0., 0.)],
            vec![p(0., 0., 1.), p(1., 0., 1.), p(1., 1., 1.), p(0., 1., 1.)],
            vec![p(0., 0., 0.), p(1., 0., 0.), p(1., 0., 1.), p(0., 0., 1.)],
            vec![p(0., 1., 0.), p(0., 1., 1.), p(1., 1., 1.), p(1., 1., 0.)],
            vec![p(0., 0., 0.), p(0., 0., 1.), p(0., 1., 1.), p(0., 1., 0.)],
            vec![p(1., 0., 0.), p(1., 1., 0.), p(1., 1., 1.), p(1., 0., 1.)],
        ]
    }

    #[test]
    fn test_from_polygons_welds_vertices() {
        let quads = unit_square_quads();
        let mesh = Mesh::from_polygons(quads.iter().map(Vec::as_slice));
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.triangle_count(), 12);
        assert!(mesh.is_closed());
        assert_relative_eq!(mesh.volume(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_mirror_keeps_volume_positive() {
        let quads = unit_square_quads();
        let mut mesh = Mesh::from_polygons(quads.iter().map(Vec::as_slice));
        mesh.transform(&DMat4::from_scale(DVec3::new(-2.0, 1.0, 1.0)));
        assert_relative_eq!(mesh.volume(), 2.0, epsilon = 1e-12);
        let (min, max) = mesh.bounds().unwrap();
        assert_eq!(min, DVec3::new(-2.0, 0.0, 0.0));
        assert_eq!(max, DVec3::new(0.0, 1.0, 1.0));
    }

    #[test]
    fn test_degenerate_triangles_dropped() {
        let mesh = Mesh::from_triangles([[DVec3::ZERO, DVec3::X, DVec3::X * 2.0]]);
        assert!(mesh.is_empty());
    }

    #[test]
    fn test_validate_rejects_bad_index() {
        let mut mesh = Mesh::new();
        mesh.add_vertex(DVec3::ZERO);
        mesh.add_triangle(0, 1, 2);
        assert!(!mesh.validate());
    }

    #[test]
    fn test_buffers_layout() {
        let mut mesh = Mesh::from_triangles([[DVec3::ZERO, DVec3::X, DVec3::Y]]);
        mesh.set_color(Some([1.0, 0.0, 0.0, 1.0]));
        let buffers = mesh.to_buffers();
        assert_eq!(buffers.positions.len(), 9);
        assert_eq!(buffers.indices, vec![0, 1, 2]);
        assert_eq!(&buffers.colors[..4], &[1.0, 0.0, 0.0, 1.0]);
        assert_eq!(&buffers.normals[..3], &[0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_merge_offsets_indices() {
        let mut a = Mesh::from_triangles([[DVec3::ZERO, DVec3::X, DVec3::Y]]);
        let b = Mesh::from_triangles([[DVec3::Z, DVec3::X + DVec3::Z, DVec3::Y + DVec3::Z]]);
        a.merge(&b);
        assert_eq!(a.vertex_count(), 6);
        assert_eq!(a.triangles()[1], [3, 4, 5]);
    }
}
