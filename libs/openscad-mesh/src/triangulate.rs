//! # Polygon Triangulation
//!
//! Ear clipping for planar regions. Holes are spliced into their outer
//! contour through a bridge edge, producing one weakly simple ring that
//! the clipper consumes.

use glam::DVec2;

use crate::region::{PolygonWithHoles, Region};

/// Counter-clockwise triangles covering `region`.
pub fn triangulate(region: &Region) -> Vec<[DVec2; 3]> {
    region
        .polygons()
        .iter()
        .flat_map(triangulate_polygon)
        .collect()
}

/// Triangulate one outer contour with its holes.
pub fn triangulate_polygon(polygon: &PolygonWithHoles) -> Vec<[DVec2; 3]> {
    let mut ring = polygon.outer.clone();
    let mut holes: Vec<&Vec<DVec2>> = polygon.holes.iter().filter(|h| h.len() >= 3).collect();
    // Bridge the rightmost hole first so later bridges cannot cross it.
    holes.sort_by(|a, b| max_x(b).total_cmp(&max_x(a)));
    for (i, hole) in holes.iter().enumerate() {
        bridge_hole(&mut ring, hole, &holes[i + 1..]);
    }
    ear_clip(&ring)
        .into_iter()
        .map(|[a, b, c]| [ring[a], ring[b], ring[c]])
        .collect()
}

fn max_x(contour: &[DVec2]) -> f64 {
    contour.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max)
}

// =============================================================================
// HOLE BRIDGING
// =============================================================================

fn bridge_hole(ring: &mut Vec<DVec2>, hole: &[DVec2], pending: &[&Vec<DVec2>]) {
    let Some((m_index, &m)) = hole
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.x.total_cmp(&b.x).then(b.y.total_cmp(&a.y)))
    else {
        return;
    };

    let current: &[DVec2] = ring.as_slice();
    let mut candidates: Vec<usize> = (0..current.len()).collect();
    candidates.sort_by(|&a, &b| {
        current[a]
            .distance_squared(m)
            .total_cmp(&current[b].distance_squared(m))
    });

    let blocked = |p: DVec2| {
        let crosses = |contour: &[DVec2]| {
            let n = contour.len();
            (0..n).any(|i| segments_cross(m, p, contour[i], contour[(i + 1) % n]))
        };
        crosses(current) || crosses(hole) || pending.iter().any(|h| crosses(h.as_slice()))
    };
    let Some(&target) = candidates
        .iter()
        .find(|&&c| !blocked(current[c]))
        .or(candidates.first())
    else {
        return;
    };

    let p = current[target];
    let mut spliced = Vec::with_capacity(current.len() + hole.len() + 2);
    spliced.extend_from_slice(&current[..=target]);
    spliced.extend(hole[m_index..].iter().chain(&hole[..m_index]).copied());
    spliced.push(m);
    spliced.push(p);
    spliced.extend_from_slice(&current[target + 1..]);
    *ring = spliced;
}

/// Proper crossing of `ab` and `cd`; shared endpoints do not count.
fn segments_cross(a: DVec2, b: DVec2, c: DVec2, d: DVec2) -> bool {
    if a == c || a == d || b == c || b == d {
        return false;
    }
    let d1 = orient(c, d, a);
    let d2 = orient(c, d, b);
    let d3 = orient(a, b, c);
    let d4 = orient(a, b, d);
    d1 * d2 < 0.0 && d3 * d4 < 0.0
}

#[inline]
fn orient(a: DVec2, b: DVec2, c: DVec2) -> f64 {
    (b - a).perp_dot(c - a)
}

// =============================================================================
// EAR CLIPPING
// =============================================================================

/// Ear clipping of a single counter-clockwise ring, returning index
/// triples into `ring`.
pub fn ear_clip(ring: &[DVec2]) -> Vec<[usize; 3]> {
    let mut indices: Vec<usize> = (0..ring.len()).collect();
    let mut triangles = Vec::with_capacity(ring.len().saturating_sub(2));

    while indices.len() >= 3 {
        let n = indices.len();
        let mut clipped = false;
        for i in 0..n {
            let (ia, ib, ic) = (indices[(i + n - 1) % n], indices[i], indices[(i + 1) % n]);
            let (a, b, c) = (ring[ia], ring[ib], ring[ic]);
            let area = orient(a, b, c);
            let scale = (b - a).length() * (c - b).length();
            if area.abs() <= 1e-12 * scale {
                // Collinear or doubled-back vertex: drop it without a triangle.
                indices.remove(i);
                clipped = true;
                break;
            }
            if area < 0.0 {
                continue;
            }
            let blocked = indices.iter().any(|&j| {
                let p = ring[j];
                p != a && p != b && p != c && in_triangle(p, a, b, c)
            });
            if !blocked {
                triangles.push([ia, ib, ic]);
                indices.remove(i);
                clipped = true;
                break;
            }
        }
        if !clipped {
            // Numerically stuck: fan the rest so the loop always ends.
            let first = indices[0];
            for pair in indices[1..].windows(2) {
                if orient(ring[first], ring[pair[0]], ring[pair[1]]) > 0.0 {
                    triangles.push([first, pair[0], pair[1]]);
                }
            }
            break;
        }
    }
    triangles
}

/// Inside or on the boundary of counter-clockwise triangle `abc`.
fn in_triangle(p: DVec2, a: DVec2, b: DVec2, c: DVec2) -> bool {
    orient(a, b, p) >= 0.0 && orient(b, c, p) >= 0.0 && orient(c, a, p) >= 0.0
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn area(triangles: &[[DVec2; 3]]) -> f64 {
        triangles
            .iter()
            .map(|[a, b, c]| orient(*a, *b, *c) / 2.0)
            .sum()
    }

    fn square(min: f64, max: f64) -> Vec<DVec2> {
        vec![
            DVec2::new(min, min),
            DVec2::new(max, min),
            DVec2::new(max, max),
            DVec2::new(min, max),
        ]
    }

    #[test]
    fn test_convex() {
        let triangles = triangulate(&Region::new(vec![square(0.0, 2.0)]));
        assert_eq!(triangles.len(), 2);
        assert_relative_eq!(area(&triangles), 4.0);
    }

    #[test]
    fn test_concave_l_shape() {
        let l = vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(2.0, 0.0),
            DVec2::new(2.0, 1.0),
            DVec2::new(1.0, 1.0),
            DVec2::new(1.0, 2.0),
            DVec2::new(0.0, 2.0),
        ];
        let triangles = triangulate(&Region::new(vec![l]));
        assert_eq!(triangles.len(), 4);
        assert_relative_eq!(area(&triangles), 3.0);
        assert!(triangles.iter().all(|[a, b, c]| orient(*a, *b, *c) > 0.0));
    }

    #[test]
    fn test_square_with_two_holes() {
        let region = Region::new(vec![
            square(0.0, 10.0),
            square(1.0, 3.0),
            vec![
                DVec2::new(6.0, 6.0),
                DVec2::new(9.0, 6.0),
                DVec2::new(7.5, 9.0),
            ],
        ]);
        let triangles = triangulate(&region);
        assert_relative_eq!(area(&triangles), 100.0 - 4.0 - 4.5, epsilon = 1e-9);
    }

    #[test]
    fn test_disjoint_outers() {
        let region = Region::new(vec![square(0.0, 1.0), square(5.0, 6.0)]);
        assert_relative_eq!(area(&triangulate(&region)), 2.0);
    }
}
