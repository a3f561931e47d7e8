//! Projective transforms between quadrilaterals.
//!
//! A [`Homography`] maps homogeneous 2D points:
//!
//! ```text
//! w  = h[6]*x + h[7]*y + h[8]
//! x' = (h[0]*x + h[1]*y + h[2]) / w
//! y' = (h[3]*x + h[4]*y + h[5]) / w
//! ```
//!
//! [`Homography::from_quads`] solves the 8 unknowns (h[8] fixed to 1) from
//! four point correspondences with Gaussian elimination and partial pivoting.

use crate::{Mat3, MathError, MathResult};

/// Relative pivot tolerance for the 8x8 solve.
const PIVOT_EPS: f64 = 1e-12;

/// Below this |w| a point maps to infinity.
const W_EPS: f64 = 1e-12;

/// A 2D point.
pub type Point2 = [f64; 2];

/// 3x3 projective transform with `h[8]` normalized to 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Homography {
    h: [f64; 9],
}

impl Default for Homography {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Homography {
    /// Identity transform.
    pub const IDENTITY: Self = Self {
        h: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
    };

    /// Pure translation.
    pub const fn translation(tx: f64, ty: f64) -> Self {
        Self {
            h: [1.0, 0.0, tx, 0.0, 1.0, ty, 0.0, 0.0, 1.0],
        }
    }

    /// Creates from a row-major 3x3 array, normalizing by `h[8]`.
    pub fn from_array(h: [f64; 9]) -> MathResult<Self> {
        Self::from_mat3(Mat3::from_row_slice(h))
    }

    fn from_mat3(m: Mat3) -> MathResult<Self> {
        let s = m.m[2][2];
        if s.abs() < W_EPS {
            return Err(MathError::Singular("h22 is zero"));
        }
        let mut h = m.to_row_slice();
        for v in &mut h {
            *v /= s;
        }
        if h.iter().any(|v| !v.is_finite()) {
            return Err(MathError::NonFinite);
        }
        Ok(Self { h })
    }

    /// Solves the transform carrying `src[i]` onto `dst[i]` for i in 0..4.
    ///
    /// Fails when three of the points are collinear in either quad, since
    /// the system then has no unique solution.
    ///
    /// # Example
    ///
    /// ```rust
    /// use persp_math::Homography;
    ///
    /// let src = [[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]];
    /// let dst = [[5.0, 5.0], [15.0, 5.0], [15.0, 15.0], [5.0, 15.0]];
    /// let h = Homography::from_quads(&src, &dst).unwrap();
    /// let (x, y) = h.map(10.0, 10.0).unwrap();
    /// assert!((x - 15.0).abs() < 1e-9 && (y - 15.0).abs() < 1e-9);
    /// ```
    pub fn from_quads(src: &[Point2; 4], dst: &[Point2; 4]) -> MathResult<Self> {
        let mut a = [[0.0f64; 9]; 8];
        for i in 0..4 {
            let [x, y] = src[i];
            let [u, v] = dst[i];
            a[2 * i] = [x, y, 1.0, 0.0, 0.0, 0.0, -x * u, -y * u, u];
            a[2 * i + 1] = [0.0, 0.0, 0.0, x, y, 1.0, -x * v, -y * v, v];
        }

        let sol = solve_8x8(&mut a)?;
        let hom = Self {
            h: [sol[0], sol[1], sol[2], sol[3], sol[4], sol[5], sol[6], sol[7], 1.0],
        };

        // A collapsed target quad still yields an exact (rank-deficient) fit.
        if hom.is_near_singular() {
            return Err(MathError::Singular("homography is rank deficient"));
        }
        for (s, d) in src.iter().zip(dst.iter()) {
            let (x, y) = hom
                .map(s[0], s[1])
                .ok_or(MathError::Singular("corner maps to infinity"))?;
            let tol = 1e-6 * (1.0 + d[0].abs().max(d[1].abs()));
            if (x - d[0]).abs() > tol || (y - d[1]).abs() > tol {
                return Err(MathError::Singular("correspondences are inconsistent"));
            }
        }
        Ok(hom)
    }

    /// Determinant small relative to the Hadamard bound of the rows.
    fn is_near_singular(&self) -> bool {
        let m = Mat3::from_row_slice(self.h);
        let bound: f64 = m
            .m
            .iter()
            .map(|r| (r[0] * r[0] + r[1] * r[1] + r[2] * r[2]).sqrt())
            .product();
        bound == 0.0 || m.determinant().abs() <= 1e-10 * bound
    }

    /// Maps a point. Returns `None` when it lands on the line at infinity.
    #[inline]
    pub fn map(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let h = &self.h;
        let w = h[6] * x + h[7] * y + h[8];
        if w.abs() < W_EPS {
            return None;
        }
        Some((
            (h[0] * x + h[1] * y + h[2]) / w,
            (h[3] * x + h[4] * y + h[5]) / w,
        ))
    }

    /// Inverse transform.
    pub fn inverse(&self) -> MathResult<Self> {
        let inv = Mat3::from_row_slice(self.h)
            .inverse()
            .ok_or(MathError::Singular("homography is not invertible"))?;
        Self::from_mat3(inv)
    }

    /// Row-major coefficients.
    #[inline]
    pub fn as_array(&self) -> &[f64; 9] {
        &self.h
    }

    /// Row-major coefficients narrowed for pixel kernels.
    pub fn to_f32(&self) -> [f32; 9] {
        self.h.map(|v| v as f32)
    }
}

/// Gaussian elimination on an augmented 8x9 system.
fn solve_8x8(a: &mut [[f64; 9]; 8]) -> MathResult<[f64; 8]> {
    let scale = a
        .iter()
        .flat_map(|row| row[..8].iter())
        .fold(0.0f64, |m, v| m.max(v.abs()));
    if scale == 0.0 {
        return Err(MathError::Singular("all-zero system"));
    }
    let tol = scale * PIVOT_EPS;

    for col in 0..8 {
        let mut pivot = col;
        for row in (col + 1)..8 {
            if a[row][col].abs() > a[pivot][col].abs() {
                pivot = row;
            }
        }
        if a[pivot][col].abs() <= tol {
            return Err(MathError::Singular("degenerate point configuration"));
        }
        a.swap(col, pivot);

        for row in (col + 1)..8 {
            let f = a[row][col] / a[col][col];
            if f == 0.0 {
                continue;
            }
            for k in col..9 {
                a[row][k] -= f * a[col][k];
            }
        }
    }

    let mut x = [0.0f64; 8];
    for row in (0..8).rev() {
        let mut sum = a[row][8];
        for k in (row + 1)..8 {
            sum -= a[row][k] * x[k];
        }
        x[row] = sum / a[row][row];
    }

    if x.iter().any(|v| !v.is_finite()) {
        return Err(MathError::NonFinite);
    }
    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const SQUARE: [Point2; 4] = [[0.0, 0.0], [100.0, 0.0], [100.0, 100.0], [0.0, 100.0]];

    #[test]
    fn test_translation_solve() {
        let dst = [[50.0, 50.0], [150.0, 50.0], [150.0, 150.0], [50.0, 150.0]];
        let h = Homography::from_quads(&SQUARE, &dst).unwrap();
        let expected = Homography::translation(50.0, 50.0);
        for (a, b) in h.as_array().iter().zip(expected.as_array()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_perspective_corners() {
        let dst = [[12.0, 30.0], [180.0, 8.0], [170.0, 190.0], [25.0, 160.0]];
        let h = Homography::from_quads(&SQUARE, &dst).unwrap();
        for (s, d) in SQUARE.iter().zip(dst.iter()) {
            let (x, y) = h.map(s[0], s[1]).unwrap();
            assert_abs_diff_eq!(x, d[0], epsilon = 1e-8);
            assert_abs_diff_eq!(y, d[1], epsilon = 1e-8);
        }
    }

    #[test]
    fn test_inverse_roundtrip() {
        let dst = [[12.0, 30.0], [180.0, 8.0], [170.0, 190.0], [25.0, 160.0]];
        let h = Homography::from_quads(&SQUARE, &dst).unwrap();
        let inv = h.inverse().unwrap();
        let (x, y) = h.map(37.0, 61.0).unwrap();
        let (bx, by) = inv.map(x, y).unwrap();
        assert_abs_diff_eq!(bx, 37.0, epsilon = 1e-8);
        assert_abs_diff_eq!(by, 61.0, epsilon = 1e-8);
    }

    #[test]
    fn test_collinear_rejected() {
        let dst = [[0.0, 0.0], [50.0, 0.0], [100.0, 0.0], [0.0, 100.0]];
        assert!(Homography::from_quads(&SQUARE, &dst).is_err());
    }

    #[test]
    fn test_collapsed_quad_rejected() {
        let dst = [[10.0, 10.0]; 4];
        assert!(Homography::from_quads(&SQUARE, &dst).is_err());
    }
}
