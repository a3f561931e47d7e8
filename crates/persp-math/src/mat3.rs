//! 3x3 matrix type for rotations and homogeneous 2D transforms.
//!
//! # Convention
//!
//! Matrices are stored in **row-major** order and use **column vectors**:
//!
//! ```text
//! | m00 m01 m02 |   | x |   | m00*x + m01*y + m02*z |
//! | m10 m11 m12 | * | y | = | m10*x + m11*y + m12*z |
//! | m20 m21 m22 |   | z |   | m20*x + m21*y + m22*z |
//! ```
//!
//! Composition reads right to left: `a * b` applies `b` first.

use crate::Vec3;
use std::ops::Mul;

/// A 3x3 matrix.
///
/// # Example
///
/// ```rust
/// use persp_math::{Mat3, Vec3};
///
/// let identity = Mat3::IDENTITY;
/// let v = Vec3::new(1.0, 2.0, 3.0);
/// assert_eq!(identity * v, v);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(C)]
pub struct Mat3 {
    /// Matrix elements in row-major order: [row0, row1, row2]
    pub m: [[f64; 3]; 3],
}

impl Mat3 {
    /// Identity matrix.
    pub const IDENTITY: Self = Self {
        m: [
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
        ],
    };

    /// Creates a matrix from row arrays.
    #[inline]
    pub const fn from_rows(rows: [[f64; 3]; 3]) -> Self {
        Self { m: rows }
    }

    /// Creates from a flat row-major array.
    #[inline]
    pub const fn from_row_slice(a: [f64; 9]) -> Self {
        Self::from_rows([[a[0], a[1], a[2]], [a[3], a[4], a[5]], [a[6], a[7], a[8]]])
    }

    /// Flattens to a row-major array.
    #[inline]
    pub const fn to_row_slice(&self) -> [f64; 9] {
        let m = &self.m;
        [
            m[0][0], m[0][1], m[0][2], m[1][0], m[1][1], m[1][2], m[2][0], m[2][1], m[2][2],
        ]
    }

    /// Rotation about the X axis (pitch), angle in radians.
    #[inline]
    pub fn rotation_x(angle: f64) -> Self {
        Self::from_glam(glam::DMat3::from_rotation_x(angle))
    }

    /// Rotation about the Y axis (yaw), angle in radians.
    #[inline]
    pub fn rotation_y(angle: f64) -> Self {
        Self::from_glam(glam::DMat3::from_rotation_y(angle))
    }

    /// Rotation about the Z axis (roll), angle in radians.
    #[inline]
    pub fn rotation_z(angle: f64) -> Self {
        Self::from_glam(glam::DMat3::from_rotation_z(angle))
    }

    /// Computes the determinant.
    #[inline]
    pub fn determinant(&self) -> f64 {
        let m = &self.m;
        m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    }

    /// Computes the inverse of this matrix.
    ///
    /// Returns `None` if the determinant is zero or not finite.
    pub fn inverse(&self) -> Option<Self> {
        let det = self.determinant();
        if det == 0.0 || !det.is_finite() {
            return None;
        }

        let m = &self.m;
        let inv_det = 1.0 / det;

        // Cofactor matrix, transposed and scaled by 1/det
        Some(Self::from_rows([
            [
                (m[1][1] * m[2][2] - m[1][2] * m[2][1]) * inv_det,
                (m[0][2] * m[2][1] - m[0][1] * m[2][2]) * inv_det,
                (m[0][1] * m[1][2] - m[0][2] * m[1][1]) * inv_det,
            ],
            [
                (m[1][2] * m[2][0] - m[1][0] * m[2][2]) * inv_det,
                (m[0][0] * m[2][2] - m[0][2] * m[2][0]) * inv_det,
                (m[0][2] * m[1][0] - m[0][0] * m[1][2]) * inv_det,
            ],
            [
                (m[1][0] * m[2][1] - m[1][1] * m[2][0]) * inv_det,
                (m[0][1] * m[2][0] - m[0][0] * m[2][1]) * inv_det,
                (m[0][0] * m[1][1] - m[0][1] * m[1][0]) * inv_det,
            ],
        ]))
    }

    /// Exact comparison against [`Mat3::IDENTITY`].
    ///
    /// No tolerance: `sin(0) == 0` and `cos(0) == 1` hold exactly, so a
    /// zero-angle rotation compares equal.
    #[inline]
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Converts from glam's column-major layout.
    #[inline]
    fn from_glam(m: glam::DMat3) -> Self {
        let c = m.to_cols_array_2d();
        Self::from_rows([
            [c[0][0], c[1][0], c[2][0]],
            [c[0][1], c[1][1], c[2][1]],
            [c[0][2], c[1][2], c[2][2]],
        ])
    }
}

impl Mul<Vec3> for Mat3 {
    type Output = Vec3;

    #[inline]
    fn mul(self, rhs: Vec3) -> Vec3 {
        let m = &self.m;
        Vec3::new(
            m[0][0] * rhs.x + m[0][1] * rhs.y + m[0][2] * rhs.z,
            m[1][0] * rhs.x + m[1][1] * rhs.y + m[1][2] * rhs.z,
            m[2][0] * rhs.x + m[2][1] * rhs.y + m[2][2] * rhs.z,
        )
    }
}

impl Mul for Mat3 {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        let mut m = [[0.0; 3]; 3];
        for (i, row) in m.iter_mut().enumerate() {
            for (j, v) in row.iter_mut().enumerate() {
                *v = (0..3).map(|k| self.m[i][k] * rhs.m[k][j]).sum();
            }
        }
        Self::from_rows(m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_mat3_identity() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(Mat3::IDENTITY * v, v);
    }

    #[test]
    fn test_zero_rotation_is_exact_identity() {
        let r = Mat3::rotation_z(0.0) * Mat3::rotation_y(0.0) * Mat3::rotation_x(0.0);
        assert!(r.is_identity());
    }

    #[test]
    fn test_rotation_directions() {
        let v = Mat3::rotation_z(FRAC_PI_2) * Vec3::new(1.0, 0.0, 0.0);
        assert_abs_diff_eq!(v.x, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(v.y, 1.0, epsilon = 1e-12);

        let v = Mat3::rotation_y(FRAC_PI_2) * Vec3::new(0.0, 0.0, 1.0);
        assert_abs_diff_eq!(v.x, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(v.z, 0.0, epsilon = 1e-12);

        let v = Mat3::rotation_x(FRAC_PI_2) * Vec3::new(0.0, 1.0, 0.0);
        assert_abs_diff_eq!(v.z, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_mat3_inverse() {
        let m = Mat3::from_rows([[2.0, 0.0, 5.0], [0.0, 4.0, -3.0], [0.0, 0.0, 1.0]]);
        let inv = m.inverse().unwrap();
        let p = m * inv;
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_abs_diff_eq!(p.m[i][j], expected, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_singular_has_no_inverse() {
        let m = Mat3::from_rows([[1.0, 2.0, 3.0], [2.0, 4.0, 6.0], [0.0, 0.0, 1.0]]);
        assert!(m.inverse().is_none());
    }

    #[test]
    fn test_rotation_is_row_major() {
        let r = Mat3::rotation_z(FRAC_PI_2);
        assert_abs_diff_eq!(r.m[0][1], -1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(r.m[1][0], 1.0, epsilon = 1e-12);
    }
}
