//! # persp-ops
//!
//! 3D perspective projection of an image onto a canvas.
//!
//! A source image is treated as a flat plane in front of a pinhole camera,
//! rotated and translated in 3D, projected onto the reference canvas and
//! composited over it.
//!
//! # Modules
//!
//! - [`camera`] - rotation matrix and 3D corner placement
//! - [`project`] - pinhole projection and quad validity checks
//! - [`warp`] - homography planning
//! - [`composite`] - centered composite for identity parameters
//! - [`params`] - node parameters (YAML) and engine constants
//! - [`node`] - [`PerspectiveNode`], the never-failing entry point
//!
//! # Pipeline
//!
//! ```text
//! NodeParams -> Camera -> corners -> Projector -> validate_quad
//!     -> WarpPlan (homography) -> Executor (warp, composite) -> output
//! ```
//!
//! Warp and composite run on the backend chosen in [`NodeParams`] and fall
//! back to serial execution when it is unavailable or fails.
//!
//! # Example
//!
//! ```rust
//! use persp_compute::ComputeImage;
//! use persp_ops::{NodeParams, PerspectiveNode};
//!
//! let src = ComputeImage::filled(100, 100, &[1.0, 1.0, 1.0]);
//! let canvas = ComputeImage::filled(200, 200, &[0.0, 0.0, 0.0]);
//!
//! let out = PerspectiveNode::new().process(Some(&src), Some(&canvas), &NodeParams::default());
//! assert_eq!(out.image.pixel(50, 50), &[1.0, 1.0, 1.0]);
//! assert_eq!(out.image.pixel(49, 50), &[0.0, 0.0, 0.0]);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
pub mod camera;
pub mod composite;
pub mod node;
pub mod params;
pub mod project;
pub mod warp;

pub use error::{OpsError, OpsResult};
pub use node::{NodeOutput, Outcome, PerspectiveNode, RunReport, error_image};
pub use params::{BackendChoice, EngineConfig, NodeParams, Quality};
