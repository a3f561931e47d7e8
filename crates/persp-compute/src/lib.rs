//! Execution backends for the perspective warp + composite pipeline.
//!
//! One algorithm, three ways to dispatch it:
//!
//! ```text
//! Executor<P: WarpPrimitives>
//!     +-- SerialPrimitives   (inline, one band)
//!     +-- ThreadedPrimitives (row bands on a per-call rayon pool)
//!     +-- WgpuPrimitives     (compute shaders, feature "wgpu")
//! ```
//!
//! [`Executor::run`] resamples the source once through an inverse
//! homography, copies the reference canvas, and composites the warped
//! buffer over the copy band by band. Backends only decide how the warp
//! and each band get executed.
//!
//! # Example
//!
//! ```rust
//! use persp_compute::{BackendRequest, ComputeImage, Filter, create_executor};
//!
//! let src = ComputeImage::filled(4, 4, &[1.0, 1.0, 1.0]);
//! let canvas = ComputeImage::filled(8, 8, &[0.0, 0.0, 0.0]);
//! let shift = [1.0, 0.0, -2.0, 0.0, 1.0, -2.0, 0.0, 0.0, 1.0];
//!
//! let exec = create_executor(&BackendRequest::serial()).unwrap();
//! let out = exec.run(&src, &canvas, &shift, Filter::Nearest).unwrap();
//! assert_eq!(out.pixel(2, 2), &[1.0, 1.0, 1.0]);
//! assert_eq!(out.pixel(0, 0), &[0.0, 0.0, 0.0]);
//! ```

pub mod backend;
pub mod executor;
pub mod image;
pub mod kernels;
#[cfg(feature = "wgpu")]
mod shaders;

pub use backend::{
    AccelGuard, Backend, BackendInfo, BackendRequest, RowBand, WarpPrimitives,
    acceleration_enabled, acceleration_holders, describe_backends, detect_backends,
    gpu_available, partition_rows,
};
pub use executor::{AnyExecutor, Executor, create_executor, plan_bands};
pub use image::ComputeImage;
pub use kernels::Filter;

use thiserror::Error;

/// Compute backend errors.
#[derive(Error, Debug)]
pub enum ComputeError {
    /// No GPU adapter could be acquired.
    #[error("No suitable GPU adapter found")]
    NoAdapter,

    /// Requested backend is not compiled in, not detected, or switched off.
    #[error("Backend not available: {0}")]
    BackendNotAvailable(String),

    /// Device creation failed.
    #[error("Failed to create device: {0}")]
    DeviceCreation(String),

    /// Pixel buffer length does not match its dimensions.
    #[error("Buffer size mismatch: expected {expected}, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    /// Image exceeds a device buffer limit.
    #[error("Image too large: {bytes} bytes exceeds device limit {limit}")]
    ImageTooLarge { bytes: u64, limit: u64 },

    /// Zero-sized image.
    #[error("Invalid dimensions: {0}x{1}")]
    InvalidDimensions(u32, u32),

    /// Channel count outside 1, 3 or 4.
    #[error("Unsupported channel count: {0}")]
    UnsupportedChannels(u32),

    /// Worker pool could not be built.
    #[error("Failed to build thread pool: {0}")]
    ThreadPool(String),

    /// Backend operation failed at runtime.
    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

/// Result type for compute operations.
pub type ComputeResult<T> = Result<T, ComputeError>;
