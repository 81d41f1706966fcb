//! # Surface Primitive
//!
//! Heightfield solid: a triangulated top over a flat base one unit below
//! the lowest sample.

use glam::DVec3;

use crate::error::{MeshError, MeshResult};
use crate::mesh::Mesh;

/// `heights[row][col]` sampled at `(col, row)`.
pub fn surface(heights: &[Vec<f64>], center: bool) -> MeshResult<Mesh> {
    let rows = heights.len();
    let cols = heights.first().map_or(0, Vec::len);
    if rows < 2 || cols < 2 {
        return Err(MeshError::invalid(format!(
            "surface needs at least 2x2 samples, got {rows}x{cols}"
        )));
    }
    if heights.iter().any(|row| row.len() != cols) {
        return Err(MeshError::invalid("surface rows differ in length"));
    }

    let min = heights.iter().flatten().copied().fold(f64::INFINITY, f64::min);
    let base = min - 1.0;
    let shift = if center {
        DVec3::new(-((cols - 1) as f64) / 2.0, -((rows - 1) as f64) / 2.0, 0.0)
    } else {
        DVec3::ZERO
    };
    let top = |r: usize, c: usize| DVec3::new(c as f64, r as f64, heights[r][c]) + shift;
    let bottom = |r: usize, c: usize| DVec3::new(c as f64, r as f64, base) + shift;

    let mut triangles: Vec<[DVec3; 3]> = Vec::with_capacity(4 * rows * cols);
    for r in 0..rows - 1 {
        for c in 0..cols - 1 {
            let (a, b, d, e) = (top(r, c), top(r, c + 1), top(r + 1, c + 1), top(r + 1, c));
            triangles.push([a, b, d]);
            triangles.push([a, d, e]);
            let (a, b, d, e) = (
                bottom(r, c),
                bottom(r, c + 1),
                bottom(r + 1, c + 1),
                bottom(r + 1, c),
            );
            triangles.push([a, d, b]);
            triangles.push([a, e, d]);
        }
    }

    // Walk the rim counter-clockwise and drop a wall from each edge.
    let rim: Vec<(usize, usize)> = (0..cols)
        .map(|c| (0, c))
        .chain((1..rows).map(|r| (r, cols - 1)))
        .chain((0..cols - 1).rev().map(|c| (rows - 1, c)))
        .chain((1..rows - 1).rev().map(|r| (r, 0)))
        .collect();
    for k in 0..rim.len() {
        let (r0, c0) = rim[k];
        let (r1, c1) = rim[(k + 1) % rim.len()];
        let (b0, b1, t1, t0) = (bottom(r0, c0), bottom(r1, c1), top(r1, c1), top(r0, c0));
        triangles.push([b0, b1, t1]);
        triangles.push([b0, t1, t0]);
    }
    Ok(Mesh::from_triangles(triangles))
}
