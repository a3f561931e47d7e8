//! 3D vector type for camera-space points.
//!
//! [`Vec3`] holds corner positions before and after rotation.

use std::ops::Add;

/// A 3D vector in camera space (x right, y down, z forward).
///
/// # Example
///
/// ```rust
/// use persp_math::Vec3;
///
/// let a = Vec3::new(1.0, 2.0, 3.0);
/// let b = a + Vec3::new(0.0, 0.0, 10.0);
/// assert_eq!(b.z, 13.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[repr(C)]
pub struct Vec3 {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
    /// Z component (depth).
    pub z: f64,
}

impl Vec3 {
    /// Creates a new vector.
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

impl Add for Vec3 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}
