//! # Minkowski Sum
//!
//! `minkowski() { ... }` folds the children left to right.
//!
//! ## Algorithm
//!
//! For a convex left operand the sum is the hull of all pairwise vertex
//! sums. Otherwise the left operand is split into its surface triangles
//! (or, in 2D, its triangulation): each piece is summed with the right
//! operand by hull, and the pieces are unioned together with the left
//! operand shifted by one of the right operand's points. The right
//! operand is treated as convex.

#[cfg(test)]
mod tests;

use config::constants::PLANE_EPSILON;
use glam::{DVec2, DVec3};

use crate::error::MeshResult;
use crate::mesh::Mesh;
use crate::ops::boolean::union_all;
use crate::ops::hull::{convex_hull, convex_hull_2d};
use crate::ops::planar::union_regions;
use crate::region::Region;
use crate::triangulate::triangulate;

/// Minkowski sum of every mesh, in order.
pub fn minkowski_meshes(meshes: Vec<Mesh>) -> MeshResult<Mesh> {
    let mut meshes = meshes.into_iter();
    let Some(first) = meshes.next() else {
        return Ok(Mesh::new());
    };
    let color = first.color();
    let mut result = meshes.try_fold(first, |acc, next| minkowski_pair(&acc, &next))?;
    result.set_color(color);
    Ok(result)
}

fn minkowski_pair(a: &Mesh, b: &Mesh) -> MeshResult<Mesh> {
    if a.is_empty() || b.is_empty() {
        return Ok(Mesh::new());
    }
    if is_convex(a) {
        return convex_hull(&pairwise_sums(a.vertices(), b.vertices()));
    }
    let mut pieces = a
        .triangle_positions()
        .map(|tri| convex_hull(&pairwise_sums(&tri, b.vertices())))
        .collect::<MeshResult<Vec<Mesh>>>()?;
    let mut core = a.clone();
    core.transform(&glam::DMat4::from_translation(b.vertices()[0]));
    pieces.push(core);
    Ok(union_all(pieces))
}

/// Minkowski sum of every region, in order.
pub fn minkowski_regions(regions: Vec<Region>) -> Region {
    let mut regions = regions.into_iter();
    let Some(first) = regions.next() else {
        return Region::default();
    };
    let color = first.color();
    let mut result = regions.fold(first, |acc, next| minkowski_region_pair(&acc, &next));
    result.set_color(color);
    result
}

fn minkowski_region_pair(a: &Region, b: &Region) -> Region {
    if a.is_empty() || b.is_empty() {
        return Region::default();
    }
    let b_points: Vec<DVec2> = b.points().collect();
    let a_points: Vec<DVec2> = a.points().collect();
    if a.contours().len() == 1 && convex_hull_2d(a_points.clone()).len() == a_points.len() {
        return Region::new(vec![convex_hull_2d(pairwise_sums(&a_points, &b_points))]);
    }
    let pieces: Vec<Region> = triangulate(a)
        .iter()
        .map(|tri| Region::new(vec![convex_hull_2d(pairwise_sums(tri, &b_points))]))
        .collect();
    union_regions(pieces)
}

fn pairwise_sums<V>(a: &[V], b: &[V]) -> Vec<V>
where
    V: Copy + std::ops::Add<Output = V>,
{
    a.iter()
        .flat_map(|&p| b.iter().map(move |&q| p + q))
        .collect()
}

/// Every vertex lies on or behind every triangle's plane.
fn is_convex(mesh: &Mesh) -> bool {
    mesh.triangle_positions().all(|[a, b, c]| {
        let normal = (b - a).cross(c - a).normalize_or_zero();
        normal == DVec3::ZERO
            || mesh
                .vertices()
                .iter()
                .all(|&v| normal.dot(v - a) <= PLANE_EPSILON)
    })
}
