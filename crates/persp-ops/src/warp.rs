//! Warp planning: from a validated quad to the inverse map the kernels use.

use persp_math::{Homography, Point2};
use tracing::trace;

use crate::OpsResult;

/// Pixel-space corners of a `width` x `height` image, top-left first,
/// clockwise.
pub fn source_corners(width: u32, height: u32) -> [Point2; 4] {
    let (w, h) = (width as f64, height as f64);
    [[0.0, 0.0], [w, 0.0], [w, h], [0.0, h]]
}

/// Forward and inverse transforms for one warp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WarpPlan {
    /// Destination quad the source corners land on.
    pub quad: [Point2; 4],
    /// Source pixel -> destination pixel.
    pub forward: Homography,
    /// Destination pixel -> source pixel.
    pub inverse: Homography,
}

impl WarpPlan {
    /// Solves the transform carrying a `width` x `height` source onto `quad`.
    pub fn solve(width: u32, height: u32, quad: &[Point2; 4]) -> OpsResult<Self> {
        let forward = Homography::from_quads(&source_corners(width, height), quad)?;
        let inverse = forward.inverse()?;
        trace!(?forward, "warp solved");
        Ok(Self {
            quad: *quad,
            forward,
            inverse,
        })
    }

    /// Inverse coefficients narrowed for the pixel kernels.
    pub fn kernel_matrix(&self) -> [f32; 9] {
        self.inverse.to_f32()
    }
}
