//! # 2D Offset
//!
//! `offset(r)` grows or shrinks a region with rounded corners;
//! `offset(delta)` moves every edge along its normal and keeps corners
//! sharp, or cuts them when `chamfer` is set.
//!
//! ## Algorithm
//!
//! Rounded offsets build a band of edge rectangles and vertex discs of
//! radius `|r|` and add it to (or subtract it from) the region through the
//! planar booleans. Delta offsets displace each contour vertex along its
//! miter vector; contours that turn inside out vanish.


use config::constants::EPSILON;
use glam::{DMat4, DVec2, DVec3};
use openscad_eval::kernel::Offset;
use openscad_eval::Resolution;

use crate::ops::planar::{difference_regions, union_regions};
use crate::primitives::circle;
use crate::region::{signed_area, Region};

pub fn offset(region: &Region, offset: &Offset) -> Region {
    let mut result = match *offset {
        Offset::Round { radius, resolution } => round_offset(region, radius, resolution),
        Offset::Delta { delta, chamfer } => delta_offset(region, delta, chamfer),
    };
    result.set_color(region.color());
    result
}

// =============================================================================
// ROUND
// =============================================================================

fn round_offset(region: &Region, radius: f64, resolution: Resolution) -> Region {
    if radius.abs() <= EPSILON || region.is_empty() {
        return region.clone();
    }
    let r = radius.abs();
    let disc = circle(r, resolution);

    let mut band: Vec<Region> = Vec::new();
    for contour in region.contours() {
        let n = contour.len();
        for i in 0..n {
            let (a, b) = (contour[i], contour[(i + 1) % n]);
            let normal = (b - a).perp().normalize_or_zero() * r;
            band.push(Region::new(vec![vec![
                a + normal,
                a - normal,
                b - normal,
                b + normal,
            ]]));
            let mut corner = disc.clone();
            corner.transform(&DMat4::from_translation(DVec3::new(a.x, a.y, 0.0)));
            band.push(corner);
        }
    }

    if radius > 0.0 {
        band.push(region.clone());
        union_regions(band)
    } else {
        difference_regions(region, &band)
    }
}

// =============================================================================
// DELTA
// =============================================================================

fn delta_offset(region: &Region, delta: f64, chamfer: bool) -> Region {
    if delta.abs() <= EPSILON {
        return region.clone();
    }
    let contours = region
        .contours()
        .iter()
        .filter_map(|contour| {
            let moved = offset_contour(contour, delta, chamfer);
            let same_turn = signed_area(contour).signum() == signed_area(&moved.points).signum();
            (same_turn && moved.forward_length > EPSILON).then_some(moved.points)
        })
        .collect();
    Region::new(contours)
}

struct MovedContour {
    points: Vec<DVec2>,
    /// Summed length of the displaced edges measured along the original
    /// edge directions; not positive once the contour collapsed past
    /// itself.
    forward_length: f64,
}

/// Displace one contour. Material lies to the left of every edge, so the
/// right-hand normal points away from it for outer contours and holes
/// alike.
fn offset_contour(contour: &[DVec2], delta: f64, chamfer: bool) -> MovedContour {
    let n = contour.len();
    let mut points = Vec::with_capacity(n * 2);
    // Index of the first and last displaced point of every vertex.
    let mut spans = Vec::with_capacity(n);
    for i in 0..n {
        let prev = contour[(i + n - 1) % n];
        let here = contour[i];
        let next = contour[(i + 1) % n];
        let (e1, e2) = (here - prev, next - here);
        let n1 = -e1.perp().normalize_or_zero();
        let n2 = -e2.perp().normalize_or_zero();

        let start = points.len();
        let sharp_outward = e1.perp_dot(e2) * delta > 0.0;
        let denominator = 1.0 + n1.dot(n2);
        if (chamfer && sharp_outward) || denominator <= EPSILON {
            points.push(here + n1 * delta);
            points.push(here + n2 * delta);
        } else {
            points.push(here + (n1 + n2) / denominator * delta);
        }
        spans.push((start, points.len() - 1));
    }

    let forward_length = (0..n)
        .map(|i| {
            let j = (i + 1) % n;
            let direction = (contour[j] - contour[i]).normalize_or_zero();
            (points[spans[j].0] - points[spans[i].1]).dot(direction)
        })
        .sum();
    MovedContour {
        points,
        forward_length,
    }
}
