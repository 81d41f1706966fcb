//! # Degree Math and Transform Matrices
//!
//! OpenSCAD measures angles in degrees and expects `sin(180) == 0`
//! exactly, so multiples of 90 degrees are special-cased.

use glam::{DMat3, DMat4, DVec3};

/// Sine of an angle in degrees, exact at multiples of 90.
pub fn sin_degrees(degrees: f64) -> f64 {
    if !degrees.is_finite() {
        return f64::NAN;
    }
    let reduced = degrees.rem_euclid(360.0);
    if reduced.fract() == 0.0 && reduced as i64 % 90 == 0 {
        return match reduced as i64 {
            0 | 180 => 0.0,
            90 => 1.0,
            _ => -1.0,
        };
    }
    degrees.to_radians().sin()
}

/// Cosine of an angle in degrees, exact at multiples of 90.
pub fn cos_degrees(degrees: f64) -> f64 {
    if !degrees.is_finite() {
        return f64::NAN;
    }
    let reduced = degrees.rem_euclid(360.0);
    if reduced.fract() == 0.0 && reduced as i64 % 90 == 0 {
        return match reduced as i64 {
            0 => 1.0,
            180 => -1.0,
            _ => 0.0,
        };
    }
    degrees.to_radians().cos()
}

/// `rotate([x, y, z])`: about X, then Y, then Z.
pub fn rotation_xyz(angles: DVec3) -> DMat4 {
    let (sx, cx) = (sin_degrees(angles.x), cos_degrees(angles.x));
    let (sy, cy) = (sin_degrees(angles.y), cos_degrees(angles.y));
    let (sz, cz) = (sin_degrees(angles.z), cos_degrees(angles.z));

    let rx = DMat3::from_cols(
        DVec3::new(1.0, 0.0, 0.0),
        DVec3::new(0.0, cx, sx),
        DVec3::new(0.0, -sx, cx),
    );
    let ry = DMat3::from_cols(
        DVec3::new(cy, 0.0, -sy),
        DVec3::new(0.0, 1.0, 0.0),
        DVec3::new(sy, 0.0, cy),
    );
    let rz = DMat3::from_cols(
        DVec3::new(cz, sz, 0.0),
        DVec3::new(-sz, cz, 0.0),
        DVec3::new(0.0, 0.0, 1.0),
    );
    DMat4::from_mat3(rz * ry * rx)
}

/// `rotate(a, v)`: `a` degrees about axis `v`. A zero axis rotates about Z.
pub fn rotation_about_axis(degrees: f64, axis: DVec3) -> DMat4 {
    let axis = axis.try_normalize().unwrap_or(DVec3::Z);
    let (s, c) = (sin_degrees(degrees), cos_degrees(degrees));
    let t = 1.0 - c;
    let DVec3 { x, y, z } = axis;
    DMat4::from_mat3(DMat3::from_cols(
        DVec3::new(t * x * x + c, t * x * y + s * z, t * x * z - s * y),
        DVec3::new(t * x * y - s * z, t * y * y + c, t * y * z + s * x),
        DVec3::new(t * x * z + s * y, t * y * z - s * x, t * z * z + c),
    ))
}

/// Reflection across the plane through the origin with `normal`.
/// A zero normal leaves geometry unchanged.
pub fn mirror_matrix(normal: DVec3) -> DMat4 {
    let Some(n) = normal.try_normalize() else {
        return DMat4::IDENTITY;
    };
    DMat4::from_mat3(DMat3::from_cols(
        DVec3::new(1.0 - 2.0 * n.x * n.x, -2.0 * n.x * n.y, -2.0 * n.x * n.z),
        DVec3::new(-2.0 * n.x * n.y, 1.0 - 2.0 * n.y * n.y, -2.0 * n.y * n.z),
        DVec3::new(-2.0 * n.x * n.z, -2.0 * n.y * n.z, 1.0 - 2.0 * n.z * n.z),
    ))
}

/// Row-major 3x4 or 4x4 rows, as written in `multmatrix`, to a matrix.
pub fn matrix_from_rows(rows: &[Vec<f64>]) -> Option<DMat4> {
    if rows.len() < 3 || rows.len() > 4 {
        return None;
    }
    let mut cols = [[0.0; 4]; 4];
    cols[3][3] = 1.0;
    for (r, row) in rows.iter().enumerate() {
        if row.len() < 3 || row.len() > 4 {
            return None;
        }
        for (c, value) in row.iter().enumerate() {
            cols[c][r] = *value;
        }
    }
    Some(DMat4::from_cols_array_2d(&cols))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_exact_quadrants() {
        assert_eq!(sin_degrees(180.0), 0.0);
        assert_eq!(cos_degrees(90.0), 0.0);
        assert_eq!(sin_degrees(-90.0), -1.0);
        assert_eq!(cos_degrees(540.0), -1.0);
        assert_relative_eq!(sin_degrees(30.0), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_rotation_about_z() {
        let m = rotation_xyz(DVec3::new(0.0, 0.0, 90.0));
        let p = m.transform_point3(DVec3::X);
        assert_eq!(p, DVec3::Y);
    }

    #[test]
    fn test_rotation_order_x_then_z() {
        let m = rotation_xyz(DVec3::new(90.0, 0.0, 90.0));
        let p = m.transform_point3(DVec3::Y);
        assert_relative_eq!(p.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(p.y, 0.0, epsilon = 1e-12);
        assert_relative_eq!(p.z, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_axis_rotation_matches_euler() {
        let a = rotation_about_axis(90.0, DVec3::Z);
        let b = rotation_xyz(DVec3::new(0.0, 0.0, 90.0));
        assert!(a.abs_diff_eq(b, 1e-12));
    }

    #[test]
    fn test_mirror() {
        let m = mirror_matrix(DVec3::X);
        assert_eq!(m.transform_point3(DVec3::new(2.0, 1.0, 0.0)), DVec3::new(-2.0, 1.0, 0.0));
        assert_eq!(mirror_matrix(DVec3::ZERO), DMat4::IDENTITY);
    }

    #[test]
    fn test_matrix_from_rows() {
        let rows = vec![
            vec![1.0, 0.0, 0.0, 5.0],
            vec![0.0, 1.0, 0.0, 6.0],
            vec![0.0, 0.0, 1.0, 7.0],
        ];
        let m = matrix_from_rows(&rows).unwrap();
        assert_eq!(m.transform_point3(DVec3::ZERO), DVec3::new(5.0, 6.0, 7.0));
        assert!(matrix_from_rows(&[vec![1.0]]).is_none());
    }
}
