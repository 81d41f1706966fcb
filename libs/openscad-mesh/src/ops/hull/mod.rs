//! # Convex Hull
//!
//! `hull() { ... }` over meshes (QuickHull) or regions (monotone chain).

mod quickhull;


pub use quickhull::convex_hull;

use glam::DVec2;

use crate::error::MeshResult;
use crate::mesh::Mesh;
use crate::region::Region;

/// Hull of every vertex of every mesh. No vertices gives an empty mesh.
pub fn hull_meshes(meshes: &[Mesh]) -> MeshResult<Mesh> {
    let points: Vec<_> = meshes.iter().flat_map(|m| m.vertices().iter().copied()).collect();
    if points.is_empty() {
        return Ok(Mesh::new());
    }
    let mut mesh = convex_hull(&points)?;
    mesh.set_color(meshes.first().and_then(Mesh::color));
    Ok(mesh)
}

/// Hull of every point of every region.
pub fn hull_regions(regions: &[Region]) -> Region {
    let points: Vec<DVec2> = regions.iter().flat_map(Region::points).collect();
    let mut region = Region::new(vec![convex_hull_2d(points)]);
    region.set_color(regions.first().and_then(Region::color));
    region
}

/// Andrew's monotone chain; counter-clockwise without collinear points.
pub fn convex_hull_2d(mut points: Vec<DVec2>) -> Vec<DVec2> {
    points.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    points.dedup();
    if points.len() < 3 {
        return points;
    }
    let turn = |o: DVec2, a: DVec2, b: DVec2| (a - o).perp_dot(b - o);

    let mut lower: Vec<DVec2> = Vec::with_capacity(points.len());
    for &p in &points {
        while lower.len() >= 2 && turn(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0.0 {
            lower.pop();
        }
        lower.push(p);
    }
    let mut upper: Vec<DVec2> = Vec::with_capacity(points.len());
    for &p in points.iter().rev() {
        while upper.len() >= 2 && turn(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0.0 {
            upper.pop();
        }
        upper.push(p);
    }
    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}
