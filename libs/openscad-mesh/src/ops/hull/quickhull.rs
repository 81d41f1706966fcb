//! # QuickHull Algorithm
//!
//! 3D convex hull after Barber, Dobkin and Huhdanpaa.
//!
//! ## Algorithm Steps
//!
//! 1. Pick extreme points and build an initial tetrahedron
//! 2. Assign every other point to one face it lies outside of
//! 3. Take the farthest outside point of some face
//! 4. Remove the faces it sees and fan new faces from the horizon to it
//! 5. Reassign the orphaned points; repeat until no point is outside
//!
//! Face orientation is checked against a point inside the initial
//! tetrahedron, which stays inside the growing hull.

use std::collections::{BTreeMap, HashSet};

use config::constants::{EPSILON, VERTEX_MERGE_EPSILON};
use glam::DVec3;

use crate::error::{MeshError, MeshResult};
use crate::mesh::Mesh;

/// Convex hull of a point cloud.
///
/// # Errors
///
/// [`MeshError::Degenerate`] when the points do not span a volume.
///
/// # Example
///
/// ```rust
/// use glam::DVec3;
/// use openscad_mesh::ops::hull::convex_hull;
///
/// let hull = convex_hull(&[
///     DVec3::ZERO,
///     DVec3::X,
///     DVec3::Y,
///     DVec3::Z,
///     DVec3::splat(0.1),
/// ])
/// .unwrap();
/// assert_eq!(hull.triangle_count(), 4);
/// ```
pub fn convex_hull(points: &[DVec3]) -> MeshResult<Mesh> {
    let points = unique_points(points);
    if points.len() < 4 {
        return Err(MeshError::degenerate(
            "convex hull needs at least 4 distinct points",
        ));
    }
    let extent = points
        .iter()
        .fold(0.0_f64, |m, p| m.max(p.abs().max_element()))
        .max(1.0);
    let tolerance = EPSILON * extent * 10.0;

    let simplex = initial_simplex(&points, tolerance)?;
    let interior = simplex.iter().map(|&i| points[i]).sum::<DVec3>() / 4.0;

    let mut hull = Hull {
        points: &points,
        interior,
        tolerance,
        faces: Vec::new(),
    };
    let [a, b, c, d] = simplex;
    for [i, j, k] in [[a, b, c], [a, c, d], [a, d, b], [b, d, c]] {
        hull.push_face(i, j, k);
    }
    let others: Vec<usize> = (0..points.len()).filter(|i| !simplex.contains(i)).collect();
    hull.assign(&others, 0);
    hull.expand();

    let triangles = hull
        .faces
        .iter()
        .filter(|f| f.alive)
        .map(|f| f.vertices.map(|i| points[i]));
    Ok(Mesh::from_triangles(triangles))
}

// =============================================================================
// HULL STATE
// =============================================================================

struct HullFace {
    vertices: [usize; 3],
    normal: DVec3,
    offset: f64,
    outside: Vec<usize>,
    alive: bool,
}

impl HullFace {
    fn distance(&self, p: DVec3) -> f64 {
        self.normal.dot(p) - self.offset
    }
}

struct Hull<'p> {
    points: &'p [DVec3],
    interior: DVec3,
    tolerance: f64,
    faces: Vec<HullFace>,
}

impl Hull<'_> {
    /// Add a face, flipping it if it would face the interior.
    fn push_face(&mut self, i: usize, j: usize, k: usize) {
        let (pi, pj, pk) = (self.points[i], self.points[j], self.points[k]);
        let mut normal = (pj - pi).cross(pk - pi).normalize_or_zero();
        let mut vertices = [i, j, k];
        if normal.dot(self.interior - pi) > 0.0 {
            normal = -normal;
            vertices.swap(1, 2);
        }
        self.faces.push(HullFace {
            vertices,
            normal,
            offset: normal.dot(pi),
            outside: Vec::new(),
            alive: true,
        });
    }

    /// Give each point to the first live face from `first_face` on that
    /// sees it. Points seen by none are inside and dropped.
    fn assign(&mut self, candidates: &[usize], first_face: usize) {
        for &p in candidates {
            let point = self.points[p];
            let tolerance = self.tolerance;
            if let Some(face) = self.faces[first_face..]
                .iter_mut()
                .find(|f| f.alive && f.distance(point) > tolerance)
            {
                face.outside.push(p);
            }
        }
    }

    fn expand(&mut self) {
        // Each round removes one point for good, so this bounds the work.
        let budget = self.points.len() * 4 + 16;
        for _ in 0..budget {
            let Some(face_index) = self
                .faces
                .iter()
                .position(|f| f.alive && !f.outside.is_empty())
            else {
                return;
            };
            let face = &self.faces[face_index];
            let Some(apex) = face
                .outside
                .iter()
                .copied()
                .max_by(|&a, &b| {
                    face.distance(self.points[a])
                        .total_cmp(&face.distance(self.points[b]))
                })
            else {
                return;
            };
            let apex_point = self.points[apex];

            let visible: Vec<usize> = (0..self.faces.len())
                .filter(|&i| {
                    self.faces[i].alive && self.faces[i].distance(apex_point) > self.tolerance
                })
                .collect();

            let mut edges: BTreeMap<(usize, usize), (usize, usize)> = BTreeMap::new();
            let mut orphans: HashSet<usize> = HashSet::new();
            for &i in &visible {
                let face = &mut self.faces[i];
                face.alive = false;
                orphans.extend(face.outside.drain(..));
                let [a, b, c] = face.vertices;
                for (u, v) in [(a, b), (b, c), (c, a)] {
                    let key = (u.min(v), u.max(v));
                    if edges.remove(&key).is_none() {
                        edges.insert(key, (u, v));
                    }
                }
            }
            orphans.remove(&apex);

            let first_new = self.faces.len();
            for (u, v) in edges.into_values() {
                self.push_face(u, v, apex);
            }
            let mut orphans: Vec<usize> = orphans.into_iter().collect();
            orphans.sort_unstable();
            self.assign(&orphans, first_new);
        }
    }
}

// =============================================================================
// SETUP
// =============================================================================

fn unique_points(points: &[DVec3]) -> Vec<DVec3> {
    let mut seen = HashSet::new();
    points
        .iter()
        .copied()
        .filter(|p| {
            let q = |v: f64| (v / VERTEX_MERGE_EPSILON).round() as i64;
            seen.insert((q(p.x), q(p.y), q(p.z)))
        })
        .collect()
}

fn initial_simplex(points: &[DVec3], tolerance: f64) -> MeshResult<[usize; 4]> {
    let mut extremes = Vec::with_capacity(6);
    for axis in 0..3 {
        let by_axis = |a: &usize, b: &usize| points[*a][axis].total_cmp(&points[*b][axis]);
        let indices = 0..points.len();
        extremes.extend(indices.clone().min_by(by_axis));
        extremes.extend(indices.max_by(by_axis));
    }

    let mut best = (extremes[0], extremes[1], -1.0);
    for (n, &a) in extremes.iter().enumerate() {
        for &b in &extremes[n + 1..] {
            let d = points[a].distance_squared(points[b]);
            if d > best.2 {
                best = (a, b, d);
            }
        }
    }
    let (p0, p1, _) = best;
    let axis = (points[p1] - points[p0]).normalize_or_zero();

    let line_distance = |i: usize| {
        let v = points[i] - points[p0];
        (v - axis * v.dot(axis)).length()
    };
    let p2 = (0..points.len())
        .max_by(|&a, &b| line_distance(a).total_cmp(&line_distance(b)))
        .filter(|&i| line_distance(i) > tolerance)
        .ok_or_else(|| MeshError::degenerate("hull points are collinear"))?;

    let normal = (points[p1] - points[p0])
        .cross(points[p2] - points[p0])
        .normalize_or_zero();
    let plane_distance = |i: usize| normal.dot(points[i] - points[p0]).abs();
    let p3 = (0..points.len())
        .max_by(|&a, &b| plane_distance(a).total_cmp(&plane_distance(b)))
        .filter(|&i| plane_distance(i) > tolerance)
        .ok_or_else(|| MeshError::degenerate("hull points are coplanar"))?;

    Ok([p0, p1, p2, p3])
}
