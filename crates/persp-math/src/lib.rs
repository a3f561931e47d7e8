//! # persp-math
//!
//! Math primitives for the perspective projection engine.
//!
//! - [`Vec3`] - 3D points and directions in camera space
//! - [`Mat3`] - 3x3 matrices (rotations, homogeneous 2D transforms)
//! - [`Homography`] - projective transform between two quadrilaterals
//!
//! # Design
//!
//! All types use `f64`. Projection and the 8x8 homography solve lose too
//! much precision in `f32` once coordinates reach a few thousand pixels;
//! values are narrowed to `f32` only when handed to pixel kernels.
//!
//! Matrices are stored **row-major** and act on **column vectors**:
//!
//! ```text
//! result = matrix * vector
//! ```
//!
//! Axis rotations are built with [`glam`] and converted into [`Mat3`].
//!
//! # Usage
//!
//! ```rust
//! use persp_math::{Mat3, Vec3};
//!
//! let r = Mat3::rotation_z(std::f64::consts::FRAC_PI_2);
//! let v = r * Vec3::new(1.0, 0.0, 0.0);
//! assert!((v.y - 1.0).abs() < 1e-12);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod homography;
mod mat3;
mod vec3;

pub use homography::*;
pub use mat3::*;
pub use vec3::*;

use thiserror::Error;

/// Errors from geometric solves.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    /// Linear system has no unique solution.
    #[error("singular system: {0}")]
    Singular(&'static str),

    /// Solution contains NaN or infinite values.
    #[error("non-finite result")]
    NonFinite,
}

/// Result type for math operations.
pub type MathResult<T> = Result<T, MathError>;
