//! Threaded backend: composite bands on a rayon pool.
//!
//! The warp runs once on the calling thread. The composite fans out one
//! task per row band onto a pool built for the call and dropped after it,
//! so the global rayon pool is never touched.

use rayon::prelude::*;
use tracing::debug;

use super::primitives::band_slices;
use super::{Backend, RowBand, WarpPrimitives, split_bands, worker_count};
use crate::kernels::{self, Filter};
use crate::{ComputeError, ComputeImage, ComputeResult};

/// Row-band parallel composite.
#[derive(Debug, Clone, Copy)]
pub struct ThreadedPrimitives {
    threads: usize,
}

impl ThreadedPrimitives {
    /// Create with `threads` requested workers (at least 1).
    pub fn new(threads: usize) -> Self {
        Self {
            threads: threads.max(1),
        }
    }

    /// Requested worker count.
    pub fn threads(&self) -> usize {
        self.threads
    }
}

impl WarpPrimitives for ThreadedPrimitives {
    fn name(&self) -> &'static str {
        "threaded"
    }

    fn backend(&self) -> Backend {
        Backend::Threaded
    }

    fn band_count(&self) -> usize {
        self.threads
    }

    fn warp(
        &self,
        src: &ComputeImage,
        inv: &[f32; 9],
        filter: Filter,
        width: u32,
        height: u32,
    ) -> ComputeResult<ComputeImage> {
        Ok(kernels::warp(src, inv, filter, width, height))
    }

    fn composite_bands(
        &self,
        warped: &ComputeImage,
        canvas: &mut ComputeImage,
        bands: &[RowBand],
    ) -> ComputeResult<()> {
        let (sc, dc) = (warped.channels, canvas.channels);
        let stride = canvas.row_stride();
        let jobs: Vec<(&[f32], &mut [f32])> = band_slices(warped, bands)
            .into_iter()
            .zip(split_bands(&mut canvas.data, stride, bands))
            .collect();

        if jobs.len() <= 1 {
            for (s, d) in jobs {
                kernels::composite_rows(s, sc, d, dc);
            }
            return Ok(());
        }

        let workers = worker_count(self.threads, jobs.len());
        debug!(bands = jobs.len(), workers, "threaded composite");
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("persp-band-{i}"))
            .build()
            .map_err(|e| ComputeError::ThreadPool(e.to_string()))?;

        pool.install(|| {
            jobs.into_par_iter()
                .for_each(|(s, d)| kernels::composite_rows(s, sc, d, dc));
        });
        Ok(())
    }
}
