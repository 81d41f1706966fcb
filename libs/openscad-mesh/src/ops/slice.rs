//! # Plane Slicing
//!
//! Cross-section of a closed mesh with a horizontal plane, returned as a
//! [`Region`]. Used by `projection(cut = true)` and by the planar
//! booleans, which run on thin slabs.

use std::collections::HashMap;

use glam::{DVec2, DVec3};

use crate::region::Region;
use crate::Mesh;

/// Grid used to match segment endpoints.
const JOIN_TOLERANCE: f64 = 1e-7;

/// Section of `mesh` at height `z`.
///
/// Each crossing triangle contributes one segment directed so that the
/// solid lies on its left; chaining the segments yields counter-clockwise
/// outer contours and clockwise holes.
pub fn slice(mesh: &Mesh, z: f64) -> Region {
    let segments: Vec<(DVec2, DVec2)> = mesh
        .triangle_positions()
        .filter_map(|tri| triangle_segment(tri, z))
        .collect();
    let mut region = Region::new(chain(&segments));
    region.set_color(mesh.color());
    region
}

/// Vertices on the plane count as above it.
fn triangle_segment(tri: [DVec3; 3], z: f64) -> Option<(DVec2, DVec2)> {
    let above = tri.map(|v| v.z >= z);
    if above.iter().all(|&a| a) || above.iter().all(|&a| !a) {
        return None;
    }
    let mut start = None;
    let mut end = None;
    for i in 0..3 {
        let j = (i + 1) % 3;
        match (above[i], above[j]) {
            (true, false) => start = Some(crossing(tri[i], tri[j], z)),
            (false, true) => end = Some(crossing(tri[i], tri[j], z)),
            _ => {}
        }
    }
    let (start, end) = (start?, end?);
    (start.distance_squared(end) > 0.0).then_some((start, end))
}

/// Point where edge `ab` meets the plane, independent of edge direction
/// so both triangles sharing the edge agree exactly.
fn crossing(a: DVec3, b: DVec3, z: f64) -> DVec2 {
    let (p, q) = if (a.x, a.y, a.z) <= (b.x, b.y, b.z) {
        (a, b)
    } else {
        (b, a)
    };
    let t = (z - p.z) / (q.z - p.z);
    p.lerp(q, t).truncate()
}

type CellKey = (i64, i64);

fn cell(p: DVec2) -> CellKey {
    (
        (p.x / JOIN_TOLERANCE).round() as i64,
        (p.y / JOIN_TOLERANCE).round() as i64,
    )
}

/// Join directed segments end to start into closed loops. Open chains
/// are dropped.
fn chain(segments: &[(DVec2, DVec2)]) -> Vec<Vec<DVec2>> {
    let mut starts: HashMap<CellKey, Vec<usize>> = HashMap::new();
    for (i, (start, _)) in segments.iter().enumerate() {
        starts.entry(cell(*start)).or_default().push(i);
    }
    let mut used = vec![false; segments.len()];

    let mut next_from = |point: DVec2, used: &mut [bool]| -> Option<usize> {
        let (cx, cy) = cell(point);
        for dx in -1..=1 {
            for dy in -1..=1 {
                if let Some(list) = starts.get_mut(&(cx + dx, cy + dy)) {
                    if let Some(pos) = list.iter().position(|&i| !used[i]) {
                        let index = list.swap_remove(pos);
                        used[index] = true;
                        return Some(index);
                    }
                }
            }
        }
        None
    };

    let mut contours = Vec::new();
    for first in 0..segments.len() {
        if used[first] {
            continue;
        }
        used[first] = true;
        let origin = segments[first].0;
        let mut contour = vec![origin];
        let mut tip = segments[first].1;
        let mut closed = false;
        for _ in 0..segments.len() {
            if cell_distance(tip, origin) {
                closed = true;
                break;
            }
            contour.push(tip);
            match next_from(tip, &mut used) {
                Some(next) => tip = segments[next].1,
                None => break,
            }
        }
        if closed && contour.len() >= 3 {
            contours.push(contour);
        }
    }
    contours
}

fn cell_distance(a: DVec2, b: DVec2) -> bool {
    let (ka, kb) = (cell(a), cell(b));
    (ka.0 - kb.0).abs() <= 1 && (ka.1 - kb.1).abs() <= 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::boolean::difference;
    use crate::primitives::cube;
    use approx::assert_relative_eq;

    #[test]
    fn test_slice_cube() {
        let region = slice(&cube(DVec3::new(2.0, 3.0, 4.0), true), 0.0);
        assert_eq!(region.contours().len(), 1);
        assert_relative_eq!(region.area(), 6.0, epsilon = 1e-9);
    }

    #[test]
    fn test_slice_misses() {
        assert!(slice(&cube(DVec3::ONE, false), 5.0).is_empty());
    }

    #[test]
    fn test_slice_hollow_has_hole() {
        let outer = cube(DVec3::splat(4.0), true);
        let inner = cube(DVec3::new(2.0, 2.0, 8.0), true);
        let region = slice(&difference(&outer, &inner), 0.0);
        assert_eq!(region.contours().len(), 2);
        assert_relative_eq!(region.area(), 12.0, epsilon = 1e-6);
    }
}
