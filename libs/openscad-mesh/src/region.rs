//! # Planar Regions
//!
//! A 2D shape as a set of closed contours in the XY plane. Outer
//! boundaries run counter-clockwise and holes clockwise; the orientation
//! of each contour follows from how deeply it is nested.

use config::constants::EPSILON;
use glam::{DMat4, DVec2, DVec3};

use crate::error::{MeshError, MeshResult};

/// Closed contours with nesting-derived orientation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Region {
    contours: Vec<Vec<DVec2>>,
    color: Option<[f32; 4]>,
}

/// One outer contour with the holes directly inside it.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonWithHoles {
    pub outer: Vec<DVec2>,
    pub holes: Vec<Vec<DVec2>>,
}

impl Region {
    /// Build a region from contours of any orientation.
    ///
    /// Repeated points and contours without area are dropped. A contour
    /// nested inside an odd number of others becomes a hole.
    pub fn new(contours: Vec<Vec<DVec2>>) -> Self {
        let mut contours: Vec<Vec<DVec2>> = contours
            .into_iter()
            .map(clean_contour)
            .filter(|c| c.len() >= 3 && signed_area(c).abs() > EPSILON)
            .collect();

        let depths: Vec<usize> = (0..contours.len())
            .map(|i| nesting_depth(&contours, i))
            .collect();
        for (contour, depth) in contours.iter_mut().zip(depths) {
            let ccw = signed_area(contour) > 0.0;
            if ccw != (depth % 2 == 0) {
                contour.reverse();
            }
        }
        Self {
            contours,
            color: None,
        }
    }

    /// `polygon(points, paths)`: without paths all points form one
    /// contour; with paths the first is the outline and the rest cut
    /// holes.
    pub fn from_polygon(points: &[DVec2], paths: Option<&[Vec<usize>]>) -> MeshResult<Self> {
        let contours = match paths {
            None => vec![points.to_vec()],
            Some(paths) => paths
                .iter()
                .map(|path| {
                    path.iter()
                        .map(|&i| {
                            points.get(i).copied().ok_or_else(|| {
                                MeshError::invalid(format!("polygon path index {i} out of range"))
                            })
                        })
                        .collect::<MeshResult<Vec<_>>>()
                })
                .collect::<MeshResult<Vec<_>>>()?,
        };
        Ok(Self::new(contours))
    }

    pub fn contours(&self) -> &[Vec<DVec2>] {
        &self.contours
    }

    pub fn into_contours(self) -> Vec<Vec<DVec2>> {
        self.contours
    }

    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }

    pub fn color(&self) -> Option<[f32; 4]> {
        self.color
    }

    pub fn set_color(&mut self, color: Option<[f32; 4]>) {
        self.color = color;
    }

    /// Enclosed area; holes count negative.
    pub fn area(&self) -> f64 {
        self.contours.iter().map(|c| signed_area(c)).sum()
    }

    pub fn points(&self) -> impl Iterator<Item = DVec2> + '_ {
        self.contours.iter().flatten().copied()
    }

    pub fn bounds(&self) -> Option<(DVec2, DVec2)> {
        let mut points = self.points();
        let first = points.next()?;
        Some(points.fold((first, first), |(min, max), p| (min.min(p), max.max(p))))
    }

    /// Apply the XY part of an affine matrix.
    pub fn transform(&mut self, matrix: &DMat4) {
        for contour in &mut self.contours {
            for p in contour.iter_mut() {
                *p = matrix.transform_point3(p.extend(0.0)).truncate();
            }
        }
        let linear = glam::DMat2::from_cols(
            matrix.x_axis.truncate().truncate(),
            matrix.y_axis.truncate().truncate(),
        );
        if linear.determinant() < 0.0 {
            for contour in &mut self.contours {
                contour.reverse();
            }
        }
    }

    /// True when `point` lies inside the region (even-odd rule).
    pub fn contains(&self, point: DVec2) -> bool {
        self.contours
            .iter()
            .filter(|c| point_in_contour(point, c))
            .count()
            % 2
            == 1
    }

    /// Group every outer contour with its direct holes.
    pub fn polygons(&self) -> Vec<PolygonWithHoles> {
        let depths: Vec<usize> = (0..self.contours.len())
            .map(|i| nesting_depth(&self.contours, i))
            .collect();

        let mut polygons: Vec<(usize, PolygonWithHoles)> = depths
            .iter()
            .enumerate()
            .filter(|(_, depth)| *depth % 2 == 0)
            .map(|(i, _)| {
                (
                    i,
                    PolygonWithHoles {
                        outer: self.contours[i].clone(),
                        holes: Vec::new(),
                    },
                )
            })
            .collect();

        for (i, depth) in depths.iter().enumerate() {
            if depth % 2 == 0 {
                continue;
            }
            let probe = self.contours[i][0];
            let parent = polygons
                .iter_mut()
                .filter(|(j, poly)| depths[*j] + 1 == *depth && point_in_contour(probe, &poly.outer))
                .min_by(|(_, a), (_, b)| {
                    signed_area(&a.outer).total_cmp(&signed_area(&b.outer))
                });
            if let Some((_, poly)) = parent {
                poly.holes.push(self.contours[i].clone());
            }
        }
        polygons.into_iter().map(|(_, poly)| poly).collect()
    }

    /// Lift onto the plane `z`.
    pub fn lift(contour: &[DVec2], z: f64) -> Vec<DVec3> {
        contour.iter().map(|p| p.extend(z)).collect()
    }
}

// =============================================================================
// CONTOUR HELPERS
// =============================================================================

/// Shoelace area, positive for counter-clockwise contours.
pub fn signed_area(contour: &[DVec2]) -> f64 {
    let n = contour.len();
    (0..n)
        .map(|i| contour[i].perp_dot(contour[(i + 1) % n]))
        .sum::<f64>()
        / 2.0
}

/// Even-odd point test against one contour.
pub fn point_in_contour(point: DVec2, contour: &[DVec2]) -> bool {
    let n = contour.len();
    let mut inside = false;
    let mut j = n.wrapping_sub(1);
    for i in 0..n {
        let (a, b) = (contour[i], contour[j]);
        if (a.y > point.y) != (b.y > point.y) {
            let x = a.x + (point.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if point.x < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

fn nesting_depth(contours: &[Vec<DVec2>], index: usize) -> usize {
    let probe = interior_probe(&contours[index]);
    contours
        .iter()
        .enumerate()
        .filter(|(j, other)| *j != index && point_in_contour(probe, other))
        .count()
}

/// A point just inside the contour next to its first edge; less likely
/// than a vertex to sit on another contour's boundary.
fn interior_probe(contour: &[DVec2]) -> DVec2 {
    let (a, b) = (contour[0], contour[1]);
    let mid = (a + b) / 2.0;
    let inward = (b - a).perp().normalize_or_zero() * signed_area(contour).signum();
    mid + inward * 1e-7
}

/// Drop repeated and collinear points.
pub fn clean_contour(contour: Vec<DVec2>) -> Vec<DVec2> {
    let mut points: Vec<DVec2> = Vec::with_capacity(contour.len());
    for p in contour {
        if points.last().map_or(true, |last| last.distance_squared(p) > EPSILON) {
            points.push(p);
        }
    }
    while points.len() > 1 && points[0].distance_squared(points[points.len() - 1]) <= EPSILON {
        points.pop();
    }

    let mut changed = true;
    while changed && points.len() >= 3 {
        changed = false;
        let n = points.len();
        for i in 0..n {
            let prev = points[(i + n - 1) % n];
            let next = points[(i + 1) % n];
            let cross = (points[i] - prev).perp_dot(next - points[i]);
            let scale = (points[i] - prev).length() * (next - points[i]).length();
            if cross.abs() <= 1e-12 * scale.max(EPSILON) {
                points.remove(i);
                changed = true;
                break;
            }
        }
    }
    points
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square(min: f64, max: f64) -> Vec<DVec2> {
        vec![
            DVec2::new(min, min),
            DVec2::new(max, min),
            DVec2::new(max, max),
            DVec2::new(min, max),
        ]
    }

    #[test]
    fn test_orientation_from_nesting() {
        let mut outer = square(0.0, 10.0);
        outer.reverse();
        let region = Region::new(vec![outer, square(2.0, 8.0)]);
        assert!(signed_area(&region.contours()[0]) > 0.0);
        assert!(signed_area(&region.contours()[1]) < 0.0);
        assert_relative_eq!(region.area(), 100.0 - 36.0);
        assert!(region.contains(DVec2::new(1.0, 1.0)));
        assert!(!region.contains(DVec2::new(5.0, 5.0)));
    }

    #[test]
    fn test_polygon_paths() {
        let points = [square(0.0, 4.0), square(1.0, 3.0)].concat();
        let region =
            Region::from_polygon(&points, Some(&[vec![0, 1, 2, 3], vec![4, 5, 6, 7]])).unwrap();
        let polygons = region.polygons();
        assert_eq!(polygons.len(), 1);
        assert_eq!(polygons[0].holes.len(), 1);
        assert!(Region::from_polygon(&points, Some(&[vec![0, 1, 9]])).is_err());
    }

    #[test]
    fn test_clean_drops_collinear_and_duplicates() {
        let contour = vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(2.0, 0.0),
            DVec2::new(2.0, 0.0),
            DVec2::new(2.0, 2.0),
            DVec2::new(0.0, 2.0),
            DVec2::new(0.0, 0.0),
        ];
        assert_eq!(clean_contour(contour).len(), 4);
    }

    #[test]
    fn test_mirror_keeps_orientation() {
        let mut region = Region::new(vec![square(0.0, 1.0)]);
        region.transform(&DMat4::from_scale(DVec3::new(-1.0, 1.0, 1.0)));
        assert!(region.area() > 0.0);
        let (min, max) = region.bounds().unwrap();
        assert_eq!(min, DVec2::new(-1.0, 0.0));
        assert_eq!(max, DVec2::new(0.0, 1.0));
    }
}
