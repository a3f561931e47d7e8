//! Dispatch abstraction shared by all backends.

use super::{Backend, RowBand};
use crate::kernels::Filter;
use crate::{ComputeImage, ComputeResult};

/// How a backend executes the two pipeline stages.
///
/// [`crate::Executor`] owns the algorithm: validate, warp once, copy the
/// canvas, composite band by band. Implementors only choose where each
/// stage runs.
pub trait WarpPrimitives: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &'static str;

    /// Backend kind.
    fn backend(&self) -> Backend;

    /// Whether runs on this backend hold the acceleration flag.
    fn uses_acceleration(&self) -> bool {
        false
    }

    /// Requested number of row bands for the composite.
    ///
    /// The executor only partitions above `MIN_PARTITION_ROWS` rows.
    fn band_count(&self) -> usize {
        1
    }

    /// Resamples `src` into a `width` x `height` buffer.
    ///
    /// `inv` maps destination pixels to source coordinates. The result has
    /// the source channel count and zeros wherever `inv` lands outside it.
    fn warp(
        &self,
        src: &ComputeImage,
        inv: &[f32; 9],
        filter: Filter,
        width: u32,
        height: u32,
    ) -> ComputeResult<ComputeImage>;

    /// Composites `warped` over `canvas` for each band.
    ///
    /// `bands` are contiguous and cover every canvas row.
    fn composite_bands(
        &self,
        warped: &ComputeImage,
        canvas: &mut ComputeImage,
        bands: &[RowBand],
    ) -> ComputeResult<()>;
}

/// Read-only row slices of `img`, one per band.
pub(crate) fn band_slices<'a>(img: &'a ComputeImage, bands: &[RowBand]) -> Vec<&'a [f32]> {
    let stride = img.row_stride();
    bands
        .iter()
        .map(|b| &img.data[b.y0 as usize * stride..b.y1 as usize * stride])
        .collect()
}
