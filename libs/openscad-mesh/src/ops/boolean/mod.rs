//! # Boolean Operations (CSG)
//!
//! Constructive solid geometry on closed meshes using BSP trees.
//!
//! ## Algorithm
//!
//! Based on the csg.js algorithm by Evan Wallace:
//! - Union: A.clipTo(B); B.clipTo(A); B.invert(); B.clipTo(A); B.invert(); combine
//! - Difference: A.invert(); A.clipTo(B); B.clipTo(A); B.invert(); B.clipTo(A); B.invert(); combine; invert
//! - Intersection: A.invert(); B.clipTo(A); B.invert(); A.clipTo(B); B.clipTo(A); combine; invert
//!
//! Operands whose bounding boxes do not touch skip the trees entirely.
//! N-ary unions reduce pairwise as a balanced tree on the rayon pool.
//!
//! ## Example
//!
//! ```rust
//! use glam::DVec3;
//! use openscad_mesh::ops::boolean::difference;
//! use openscad_mesh::primitives::cube;
//!
//! let a = cube(DVec3::splat(4.0), true);
//! let b = cube(DVec3::splat(2.0), true);
//! let hollow = difference(&a, &b);
//! assert!((hollow.volume() - 56.0).abs() < 1e-6);
//! ```

mod bsp;
mod plane;
mod polygon;


use config::constants::PLANE_EPSILON;

use crate::Mesh;
use bsp::BspNode;
use polygon::Polygon;

// =============================================================================
// BINARY OPERATIONS
// =============================================================================

/// `a ∪ b`. The result takes the color of `a`.
pub fn union(a: &Mesh, b: &Mesh) -> Mesh {
    if a.is_empty() {
        return b.clone();
    }
    if b.is_empty() || disjoint(a, b) {
        let mut result = a.clone();
        result.merge(b);
        return result;
    }

    let mut bsp_a = BspNode::new(to_polygons(a));
    let mut bsp_b = BspNode::new(to_polygons(b));
    bsp_a.clip_to(&bsp_b);
    bsp_b.clip_to(&bsp_a);
    bsp_b.invert();
    bsp_b.clip_to(&bsp_a);
    bsp_b.invert();

    let mut polygons = bsp_a.all_polygons();
    polygons.extend(bsp_b.all_polygons());
    to_mesh(&polygons, a.color())
}

/// `a − b`.
pub fn difference(a: &Mesh, b: &Mesh) -> Mesh {
    if a.is_empty() || b.is_empty() || disjoint(a, b) {
        return a.clone();
    }

    let mut bsp_a = BspNode::new(to_polygons(a));
    let mut bsp_b = BspNode::new(to_polygons(b));
    bsp_a.invert();
    bsp_a.clip_to(&bsp_b);
    bsp_b.clip_to(&bsp_a);
    bsp_b.invert();
    bsp_b.clip_to(&bsp_a);
    bsp_b.invert();

    let mut polygons = bsp_a.all_polygons();
    polygons.extend(bsp_b.all_polygons());
    polygons.iter_mut().for_each(Polygon::flip);
    to_mesh(&polygons, a.color())
}

/// `a ∩ b`.
pub fn intersection(a: &Mesh, b: &Mesh) -> Mesh {
    if a.is_empty() || b.is_empty() || disjoint(a, b) {
        let mut empty = Mesh::new();
        empty.set_color(a.color());
        return empty;
    }

    let mut bsp_a = BspNode::new(to_polygons(a));
    let mut bsp_b = BspNode::new(to_polygons(b));
    bsp_a.invert();
    bsp_b.clip_to(&bsp_a);
    bsp_b.invert();
    bsp_a.clip_to(&bsp_b);
    bsp_b.clip_to(&bsp_a);

    let mut polygons = bsp_a.all_polygons();
    polygons.extend(bsp_b.all_polygons());
    polygons.iter_mut().for_each(Polygon::flip);
    to_mesh(&polygons, a.color())
}

// =============================================================================
// N-ARY OPERATIONS
// =============================================================================

/// Union of any number of meshes, reduced as a balanced tree.
pub fn union_all(mut meshes: Vec<Mesh>) -> Mesh {
    match meshes.len() {
        0 => Mesh::new(),
        1 => meshes.pop().unwrap_or_default(),
        len => {
            let right = meshes.split_off(len / 2);
            let (left, right) = rayon::join(|| union_all(meshes), || union_all(right));
            union(&left, &right)
        }
    }
}

/// First mesh minus the union of the rest.
pub fn difference_all(first: Mesh, rest: Vec<Mesh>) -> Mesh {
    if rest.is_empty() {
        return first;
    }
    difference(&first, &union_all(rest))
}

/// Common volume of all meshes.
pub fn intersection_all(meshes: Vec<Mesh>) -> Mesh {
    let mut meshes = meshes.into_iter();
    let Some(first) = meshes.next() else {
        return Mesh::new();
    };
    meshes.fold(first, |acc, next| intersection(&acc, &next))
}

// =============================================================================
// CONVERSION HELPERS
// =============================================================================

fn to_polygons(mesh: &Mesh) -> Vec<Polygon> {
    mesh.triangle_positions()
        .filter_map(|tri| Polygon::new(tri.to_vec()))
        .collect()
}

fn to_mesh(polygons: &[Polygon], color: Option<[f32; 4]>) -> Mesh {
    let mut mesh = Mesh::from_polygons(polygons.iter().map(|p| p.vertices.as_slice()));
    mesh.set_color(color);
    mesh
}

/// Bounding boxes separated by more than the plane tolerance.
fn disjoint(a: &Mesh, b: &Mesh) -> bool {
    match (a.bounds(), b.bounds()) {
        (Some((min_a, max_a)), Some((min_b, max_b))) => {
            (0..3).any(|axis| {
                min_a[axis] > max_b[axis] + PLANE_EPSILON || min_b[axis] > max_a[axis] + PLANE_EPSILON
            })
        }
        _ => true,
    }
}
