//! Serial backend: everything on the calling thread.

use super::primitives::band_slices;
use super::{Backend, RowBand, WarpPrimitives, split_bands};
use crate::kernels::{self, Filter};
use crate::{ComputeImage, ComputeResult};

/// Runs warp and composite inline.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialPrimitives;

impl SerialPrimitives {
    /// Create the serial backend.
    pub fn new() -> Self {
        Self
    }
}

impl WarpPrimitives for SerialPrimitives {
    fn name(&self) -> &'static str {
        "serial"
    }

    fn backend(&self) -> Backend {
        Backend::Serial
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
        let src_bands = band_slices(warped, bands);
        for (s, d) in src_bands.into_iter().zip(split_bands(&mut canvas.data, stride, bands)) {
            kernels::composite_rows(s, sc, d, dc);
        }
        Ok(())
    }
}
