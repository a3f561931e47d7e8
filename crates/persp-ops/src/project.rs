//! Pinhole projection and quadrilateral validity checks.
//!
//! ```text
//! x' = f * X / Z + W / 2
//! y' = f * Y / Z + H / 2
//! ```
//!
//! Corners at or behind the camera (`Z <= 0`) are replaced by a sentinel
//! far outside the canvas on the side given by the signs of X and Y, so
//! the bounds check rejects them without NaN or infinity ever appearing.

use persp_math::{Point2, Vec3};
use thiserror::Error;

use crate::params::EngineConfig;

/// Why a projected quadrilateral was rejected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Degeneracy {
    /// An edge is shorter than the minimum.
    #[error("edge {edge} is {length:.3}px, minimum {min}px")]
    EdgeTooShort {
        /// Index of the edge's starting corner.
        edge: usize,
        /// Edge length in pixels.
        length: f64,
        /// Required minimum.
        min: f64,
    },

    /// Area is below the minimum.
    #[error("area {area:.3}px^2 is below {min}px^2")]
    AreaTooSmall {
        /// Absolute shoelace area.
        area: f64,
        /// Required minimum.
        min: f64,
    },

    /// A corner left the permitted region around the canvas.
    #[error("corner {corner} at ({x:.1}, {y:.1}) is out of bounds")]
    OutOfBounds {
        /// Corner index.
        corner: usize,
        /// Projected x.
        x: f64,
        /// Projected y.
        y: f64,
    },
}

/// Pinhole projector onto a `width` x `height` canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projector {
    focal: f64,
    width: f64,
    height: f64,
    sentinel: f64,
}

impl Projector {
    /// Create a projector with focal length `focal` in pixels.
    pub fn new(focal: f64, width: u32, height: u32, config: &EngineConfig) -> Self {
        Self {
            focal,
            width: width as f64,
            height: height as f64,
            sentinel: config.sentinel,
        }
    }

    /// Focal length in pixels.
    pub fn focal(&self) -> f64 {
        self.focal
    }

    /// Projects one camera-space point.
    #[inline]
    pub fn project_point(&self, p: Vec3) -> Point2 {
        let (cx, cy) = (self.width / 2.0, self.height / 2.0);
        if p.z > 0.0 {
            [self.focal * p.x / p.z + cx, self.focal * p.y / p.z + cy]
        } else {
            let sx = if p.x < 0.0 { -1.0 } else { 1.0 };
            let sy = if p.y < 0.0 { -1.0 } else { 1.0 };
            [cx + sx * self.sentinel, cy + sy * self.sentinel]
        }
    }

    /// Projects four corners, keeping their order.
    pub fn project(&self, corners: &[Vec3; 4]) -> [Point2; 4] {
        corners.map(|p| self.project_point(p))
    }
}

/// Signed shoelace area; positive for clockwise order in image space.
pub fn shoelace_area(quad: &[Point2; 4]) -> f64 {
    let mut sum = 0.0;
    for i in 0..4 {
        let [x0, y0] = quad[i];
        let [x1, y1] = quad[(i + 1) % 4];
        sum += x0 * y1 - x1 * y0;
    }
    sum / 2.0
}

/// Checks a projected quad against a `width` x `height` canvas.
///
/// In order: every edge at least `min_edge` long, absolute area at least
/// `min_area`, every corner inside `[-W/2, 1.5W] x [-H/2, 1.5H]`.
/// Returns the absolute area on success.
pub fn validate_quad(
    quad: &[Point2; 4],
    width: u32,
    height: u32,
    config: &EngineConfig,
) -> Result<f64, Degeneracy> {
    for i in 0..4 {
        let [x0, y0] = quad[i];
        let [x1, y1] = quad[(i + 1) % 4];
        let length = (x1 - x0).hypot(y1 - y0);
        // Negated so NaN fails too.
        if !(length >= config.min_edge) {
            return Err(Degeneracy::EdgeTooShort {
                edge: i,
                length,
                min: config.min_edge,
            });
        }
    }

    let area = shoelace_area(quad).abs();
    if !(area >= config.min_area) {
        return Err(Degeneracy::AreaTooSmall {
            area,
            min: config.min_area,
        });
    }

    let (w, h) = (width as f64, height as f64);
    for (corner, &[x, y]) in quad.iter().enumerate() {
        let inside = x >= -w / 2.0 && x <= 1.5 * w && y >= -h / 2.0 && y <= 1.5 * h;
        if !inside {
            return Err(Degeneracy::OutOfBounds { corner, x, y });
        }
    }

    Ok(area)
}
