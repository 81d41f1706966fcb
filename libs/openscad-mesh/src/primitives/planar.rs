//! # 2D Primitives

use std::f64::consts::TAU;

use glam::DVec2;
use openscad_eval::Resolution;

use crate::error::MeshResult;
use crate::region::Region;

/// `n` counter-clockwise points on a circle, starting on +X.
pub fn circle_points(radius: f64, n: usize) -> Vec<DVec2> {
    (0..n)
        .map(|i| {
            let theta = TAU * i as f64 / n as f64;
            DVec2::new(radius * theta.cos(), radius * theta.sin())
        })
        .collect()
}

pub fn circle(radius: f64, resolution: Resolution) -> Region {
    if radius <= 0.0 {
        return Region::default();
    }
    let n = resolution.fragments(radius) as usize;
    Region::new(vec![circle_points(radius, n)])
}

pub fn square(size: DVec2, center: bool) -> Region {
    if size.min_element() <= 0.0 {
        return Region::default();
    }
    let min = if center { -size / 2.0 } else { DVec2::ZERO };
    let max = min + size;
    Region::new(vec![vec![
        min,
        DVec2::new(max.x, min.y),
        max,
        DVec2::new(min.x, max.y),
    ]])
}

/// `polygon(points, paths)`; see [`Region::from_polygon`].
pub fn polygon(points: &[DVec2], paths: Option<&[Vec<usize>]>) -> MeshResult<Region> {
    Region::from_polygon(points, paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_circle_area() {
        let region = circle(1.0, Resolution::segments(4));
        assert_relative_eq!(region.area(), 2.0, epsilon = 1e-12);
        assert!(circle(0.0, Resolution::default()).is_empty());
    }

    #[test]
    fn test_square_centered() {
        let region = square(DVec2::new(4.0, 2.0), true);
        assert_eq!(
            region.bounds(),
            Some((DVec2::new(-2.0, -1.0), DVec2::new(2.0, 1.0)))
        );
        assert_relative_eq!(region.area(), 8.0);
    }

    #[test]
    fn test_polygon_clockwise_input_normalized() {
        let points = [
            DVec2::new(0.0, 0.0),
            DVec2::new(0.0, 1.0),
            DVec2::new(1.0, 0.0),
        ];
        let region = polygon(&points, None).unwrap();
        assert_relative_eq!(region.area(), 0.5);
    }
}
