//! Execution backends for the warp + composite pipeline.
//!
//! # Architecture
//!
//! ```text
//! Executor<P: WarpPrimitives>
//!     +-- SerialPrimitives   (calling thread)
//!     +-- ThreadedPrimitives (row bands on a rayon pool)
//!     +-- WgpuPrimitives     (Vulkan/Metal/DX12)
//! ```
//!
//! Backends differ only in how work is dispatched. The pixel math lives in
//! [`crate::kernels`] and in the matching WGSL shaders.

mod band;
mod cpu_backend;
mod detect;
mod guard;
mod primitives;
mod threaded_backend;

#[cfg(feature = "wgpu")]
mod wgpu_backend;

pub use band::{MIN_PARTITION_ROWS, RowBand, partition_rows, split_bands, worker_count};
pub use cpu_backend::SerialPrimitives;
pub use detect::{BackendInfo, describe_backends, detect_backends, gpu_available, gpu_disabled_by_env};
pub use guard::{AccelGuard, acceleration_enabled, acceleration_holders};
pub use primitives::WarpPrimitives;
pub use threaded_backend::ThreadedPrimitives;

#[cfg(feature = "wgpu")]
pub use wgpu_backend::WgpuPrimitives;

/// Execution strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Backend {
    /// Everything on the calling thread.
    #[default]
    Serial,
    /// Warp and composite as GPU compute kernels.
    Gpu,
    /// Composite split into row bands on a worker pool.
    Threaded,
}

impl Backend {
    /// Check if this backend is usable on the current system.
    pub fn is_available(&self) -> bool {
        match self {
            Self::Serial | Self::Threaded => true,
            Self::Gpu => gpu_available(),
        }
    }

    /// Get human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Serial => "serial",
            Self::Gpu => "gpu",
            Self::Threaded => "threaded",
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Backend selection plus its worker count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendRequest {
    /// Requested strategy.
    pub backend: Backend,
    /// Requested worker count; only [`Backend::Threaded`] reads it.
    pub threads: usize,
}

impl BackendRequest {
    /// Serial execution.
    pub const fn serial() -> Self {
        Self {
            backend: Backend::Serial,
            threads: 1,
        }
    }

    /// GPU execution.
    pub const fn gpu() -> Self {
        Self {
            backend: Backend::Gpu,
            threads: 1,
        }
    }

    /// Threaded execution with `threads` workers.
    pub const fn threaded(threads: usize) -> Self {
        Self {
            backend: Backend::Threaded,
            threads,
        }
    }
}

impl Default for BackendRequest {
    fn default() -> Self {
        Self::serial()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_names() {
        assert_eq!(Backend::Serial.name(), "serial");
        assert_eq!(Backend::Gpu.to_string(), "gpu");
        assert_eq!(Backend::default(), Backend::Serial);
    }

    #[test]
    fn test_cpu_backends_always_available() {
        assert!(Backend::Serial.is_available());
        assert!(Backend::Threaded.is_available());
    }
}
