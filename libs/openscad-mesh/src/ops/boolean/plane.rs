//! # Splitting Plane
//!
//! Oriented plane with point classification for the BSP tree.

use config::constants::PLANE_EPSILON;
use glam::DVec3;

/// Side of a plane a point or polygon lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Front,
    Back,
    Coplanar,
    /// Vertices on both sides.
    Spanning,
}

/// `normal · p = w`, with a unit normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: DVec3,
    pub w: f64,
}

impl Plane {
    /// Plane through three counter-clockwise points, `None` when they are
    /// collinear.
    pub fn from_points(a: DVec3, b: DVec3, c: DVec3) -> Option<Self> {
        let normal = (b - a).cross(c - a).try_normalize()?;
        Some(Self {
            normal,
            w: normal.dot(a),
        })
    }

    /// Plane of a polygon, using the first non-collinear vertex triple.
    pub fn from_polygon(vertices: &[DVec3]) -> Option<Self> {
        let a = *vertices.first()?;
        vertices
            .windows(2)
            .skip(1)
            .find_map(|pair| Self::from_points(a, pair[0], pair[1]))
    }

    pub fn flip(&mut self) {
        self.normal = -self.normal;
        self.w = -self.w;
    }

    #[inline]
    pub fn signed_distance(&self, point: DVec3) -> f64 {
        self.normal.dot(point) - self.w
    }

    pub fn classify_point(&self, point: DVec3) -> Classification {
        let distance = self.signed_distance(point);
        if distance > PLANE_EPSILON {
            Classification::Front
        } else if distance < -PLANE_EPSILON {
            Classification::Back
        } else {
            Classification::Coplanar
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plane_from_points() {
        let plane = Plane::from_points(DVec3::ZERO, DVec3::X, DVec3::Y).unwrap();
        assert_eq!(plane.normal, DVec3::Z);
        assert_eq!(plane.w, 0.0);
        assert!(Plane::from_points(DVec3::ZERO, DVec3::X, DVec3::X * 2.0).is_none());
    }

    #[test]
    fn test_plane_skips_collinear_prefix() {
        let plane = Plane::from_polygon(&[
            DVec3::ZERO,
            DVec3::X,
            DVec3::X * 2.0,
            DVec3::new(2.0, 1.0, 0.0),
        ])
        .unwrap();
        assert_eq!(plane.normal, DVec3::Z);
    }

    #[test]
    fn test_classify_and_flip() {
        let mut plane = Plane {
            normal: DVec3::Z,
            w: 0.0,
        };
        assert_eq!(plane.classify_point(DVec3::Z), Classification::Front);
        assert_eq!(plane.classify_point(-DVec3::Z), Classification::Back);
        assert_eq!(plane.classify_point(DVec3::X), Classification::Coplanar);
        plane.flip();
        assert_eq!(plane.classify_point(DVec3::Z), Classification::Back);
    }
}
