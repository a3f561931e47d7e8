//! Backend-agnostic warp + composite executor.
//!
//! [`Executor`] runs the same algorithm for every backend:
//!
//! 1. validate both images
//! 2. hold the acceleration flag if the backend is accelerated
//! 3. warp the source into canvas dimensions, once
//! 4. copy the canvas and composite the warped buffer over it, band by band
//!
//! [`AnyExecutor`] wraps the concrete executors for runtime selection.

use tracing::{debug, trace};

use crate::backend::{
    AccelGuard, Backend, BackendRequest, MIN_PARTITION_ROWS, RowBand, SerialPrimitives,
    ThreadedPrimitives, WarpPrimitives, partition_rows,
};
#[cfg(feature = "wgpu")]
use crate::backend::{WgpuPrimitives, gpu_available};
use crate::kernels::Filter;
use crate::{ComputeError, ComputeImage, ComputeResult};

/// Row bands for a canvas of `height` rows.
///
/// Partitions only when the canvas is taller than [`MIN_PARTITION_ROWS`]
/// and more than one band is requested.
pub fn plan_bands(height: u32, requested: usize) -> Vec<RowBand> {
    if height > MIN_PARTITION_ROWS && requested > 1 {
        partition_rows(height, requested)
    } else {
        vec![RowBand::full(height)]
    }
}

/// Warp + composite executor over a dispatch backend.
pub struct Executor<P: WarpPrimitives> {
    prims: P,
}

impl<P: WarpPrimitives> Executor<P> {
    /// Wrap a backend.
    pub fn new(prims: P) -> Self {
        Self { prims }
    }

    /// Underlying backend.
    pub fn primitives(&self) -> &P {
        &self.prims
    }

    /// Backend kind.
    pub fn backend(&self) -> Backend {
        self.prims.backend()
    }

    /// Warps `src` through `inv` and composites it over a copy of `canvas`.
    ///
    /// `inv` is the row-major destination-to-source homography. The result
    /// has the canvas dimensions and channel layout.
    pub fn run(
        &self,
        src: &ComputeImage,
        canvas: &ComputeImage,
        inv: &[f32; 9],
        filter: Filter,
    ) -> ComputeResult<ComputeImage> {
        src.validate()?;
        canvas.validate()?;
        let _accel = self.prims.uses_acceleration().then(AccelGuard::acquire);

        let (w, h) = (canvas.width, canvas.height);
        trace!(backend = self.prims.name(), ?filter, "warp {}x{} -> {}x{}", src.width, src.height, w, h);
        let warped = self.prims.warp(src, inv, filter, w, h)?;
        if warped.dimensions() != (w, h, src.channels) {
            return Err(ComputeError::BufferSizeMismatch {
                expected: (w as usize) * (h as usize) * (src.channels as usize),
                actual: warped.data.len(),
            });
        }

        let bands = plan_bands(h, self.prims.band_count());
        debug!(backend = self.prims.name(), bands = bands.len(), "composite");
        let mut out = canvas.clone();
        self.prims.composite_bands(&warped, &mut out, &bands)?;
        Ok(out)
    }
}

/// Runtime-selected executor.
pub enum AnyExecutor {
    /// Calling thread.
    Serial(Executor<SerialPrimitives>),
    /// Row bands on a rayon pool.
    Threaded(Executor<ThreadedPrimitives>),
    /// wgpu compute shaders.
    #[cfg(feature = "wgpu")]
    Gpu(Executor<WgpuPrimitives>),
}

impl AnyExecutor {
    /// Backend kind.
    pub fn backend(&self) -> Backend {
        match self {
            Self::Serial(e) => e.backend(),
            Self::Threaded(e) => e.backend(),
            #[cfg(feature = "wgpu")]
            Self::Gpu(e) => e.backend(),
        }
    }

    /// Backend name.
    pub fn name(&self) -> &'static str {
        self.backend().name()
    }

    /// See [`Executor::run`].
    pub fn run(
        &self,
        src: &ComputeImage,
        canvas: &ComputeImage,
        inv: &[f32; 9],
        filter: Filter,
    ) -> ComputeResult<ComputeImage> {
        match self {
            Self::Serial(e) => e.run(src, canvas, inv, filter),
            Self::Threaded(e) => e.run(src, canvas, inv, filter),
            #[cfg(feature = "wgpu")]
            Self::Gpu(e) => e.run(src, canvas, inv, filter),
        }
    }
}

impl std::fmt::Debug for AnyExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("AnyExecutor").field(&self.name()).finish()
    }
}

/// Create an executor for the requested backend.
///
/// Fails with [`ComputeError::BackendNotAvailable`] when the GPU is
/// requested but not compiled in, disabled, or not detected.
pub fn create_executor(request: &BackendRequest) -> ComputeResult<AnyExecutor> {
    match request.backend {
        Backend::Serial => Ok(AnyExecutor::Serial(Executor::new(SerialPrimitives::new()))),
        Backend::Threaded => Ok(AnyExecutor::Threaded(Executor::new(
            ThreadedPrimitives::new(request.threads),
        ))),
        Backend::Gpu => create_gpu_executor(),
    }
}

#[cfg(feature = "wgpu")]
fn create_gpu_executor() -> ComputeResult<AnyExecutor> {
    if !gpu_available() {
        return Err(ComputeError::BackendNotAvailable(
            "no usable GPU adapter".into(),
        ));
    }
    Ok(AnyExecutor::Gpu(Executor::new(WgpuPrimitives::new()?)))
}

#[cfg(not(feature = "wgpu"))]
fn create_gpu_executor() -> ComputeResult<AnyExecutor> {
    Err(ComputeError::BackendNotAvailable(
        "gpu support not compiled in (enable feature \"wgpu\")".into(),
    ))
}
