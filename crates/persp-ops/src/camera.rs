//! Camera model: rotation and placement of the source plane.
//!
//! The source image is a rectangle centred on the origin of its own plane.
//! It is rotated about that centre (pitch first, then yaw, then roll),
//! translated by `(tx, ty)` and pushed `distance` pixels along +Z:
//!
//! ```text
//! R = Rz(roll) * Ry(yaw) * Rx(pitch)
//! P = R * p + (tx, ty, distance)
//! ```
//!
//! Axes follow image conventions: X right, Y down, Z away from the viewer.

use persp_math::{Mat3, Vec3};

use crate::params::{EngineConfig, NodeParams};

/// Composed rotation `Rz(roll) * Ry(yaw) * Rx(pitch)`, angles in radians.
///
/// All-zero angles give exactly [`Mat3::IDENTITY`].
///
/// # Example
///
/// ```rust
/// use persp_ops::camera::rotation_matrix;
///
/// assert!(rotation_matrix(0.0, 0.0, 0.0).is_identity());
/// ```
pub fn rotation_matrix(pitch: f64, yaw: f64, roll: f64) -> Mat3 {
    Mat3::rotation_z(roll) * Mat3::rotation_y(yaw) * Mat3::rotation_x(pitch)
}

/// Resolved camera placement for one invocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// Rotation about X in radians.
    pub pitch: f64,
    /// Rotation about Y in radians.
    pub yaw: f64,
    /// Rotation about Z in radians.
    pub roll: f64,
    /// Horizontal translation in pixels.
    pub tx: f64,
    /// Vertical translation in pixels.
    pub ty: f64,
    /// Distance along +Z, always positive.
    pub distance: f64,
    /// Plane size multiplier, always positive.
    pub scale: f64,
}

impl Camera {
    /// Camera from node parameters (degrees, percent), with distance and
    /// scale clamped to positive values.
    pub fn from_params(params: &NodeParams) -> Self {
        Self {
            pitch: params.pitch.to_radians(),
            yaw: params.yaw.to_radians(),
            roll: params.roll.to_radians(),
            tx: params.tx,
            ty: params.ty,
            distance: params.clamped_distance(),
            scale: params.scale_factor(),
        }
    }

    /// Rotation matrix for this camera.
    pub fn rotation(&self) -> Mat3 {
        rotation_matrix(self.pitch, self.yaw, self.roll)
    }

    /// True when every parameter is at its default: no rotation or
    /// translation, default distance, unit scale. Compared exactly.
    pub fn is_identity(&self, config: &EngineConfig) -> bool {
        self.rotation().is_identity()
            && self.tx == 0.0
            && self.ty == 0.0
            && self.distance == config.default_distance
            && self.scale == 1.0
    }

    /// Focal length in pixels for this distance.
    pub fn focal_length(&self, config: &EngineConfig) -> f64 {
        config.focal_for(self.distance)
    }

    /// Camera-space corners of a `width` x `height` plane.
    ///
    /// Order is top-left, top-right, bottom-right, bottom-left.
    pub fn corners(&self, width: u32, height: u32) -> [Vec3; 4] {
        let hw = width as f64 * self.scale / 2.0;
        let hh = height as f64 * self.scale / 2.0;
        let local = [
            Vec3::new(-hw, -hh, 0.0),
            Vec3::new(hw, -hh, 0.0),
            Vec3::new(hw, hh, 0.0),
            Vec3::new(-hw, hh, 0.0),
        ];
        let r = self.rotation();
        let offset = Vec3::new(self.tx, self.ty, self.distance);
        local.map(|p| r * p + offset)
    }
}
