//! Row-band partitioning for the composite step.
//!
//! A canvas is split into contiguous horizontal bands. Bands never overlap
//! and together cover every row, so workers can mutate them independently.

/// Canvases with this many rows or fewer are never partitioned.
pub const MIN_PARTITION_ROWS: u32 = 100;

/// Half-open row range `y0..y1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowBand {
    /// First row.
    pub y0: u32,
    /// One past the last row.
    pub y1: u32,
}

impl RowBand {
    /// Band covering `0..height`.
    pub const fn full(height: u32) -> Self {
        Self { y0: 0, y1: height }
    }

    /// Number of rows.
    #[inline]
    pub fn rows(&self) -> u32 {
        self.y1 - self.y0
    }
}

/// Splits `0..height` into at most `bands` contiguous bands.
///
/// Band heights differ by at most one row; earlier bands take the extra
/// rows. Never returns empty bands.
///
/// # Example
///
/// ```rust
/// use persp_compute::partition_rows;
///
/// let bands = partition_rows(10, 3);
/// let rows: Vec<u32> = bands.iter().map(|b| b.rows()).collect();
/// assert_eq!(rows, vec![4, 3, 3]);
/// ```
pub fn partition_rows(height: u32, bands: usize) -> Vec<RowBand> {
    let n = (bands.max(1) as u32).min(height.max(1));
    let base = height / n;
    let extra = height % n;
    let mut out = Vec::with_capacity(n as usize);
    let mut y = 0;
    for i in 0..n {
        let rows = base + u32::from(i < extra);
        out.push(RowBand { y0: y, y1: y + rows });
        y += rows;
    }
    out
}

/// Pool size for `requested` workers over `bands` bands.
///
/// Leaves one core for the calling thread and never exceeds the band count.
pub fn worker_count(requested: usize, bands: usize) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    requested
        .min(cores.saturating_sub(1).max(1))
        .min(bands)
        .max(1)
}

/// Splits a row-major buffer into disjoint mutable slices, one per band.
///
/// `stride` is the number of floats per row. `bands` must be sorted and
/// contiguous from row 0, as [`partition_rows`] returns them.
pub fn split_bands<'a>(mut data: &'a mut [f32], stride: usize, bands: &[RowBand]) -> Vec<&'a mut [f32]> {
    let mut out = Vec::with_capacity(bands.len());
    for band in bands {
        let len = (band.rows() as usize * stride).min(data.len());
        let (head, tail) = std::mem::take(&mut data).split_at_mut(len);
        out.push(head);
        data = tail;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_covers_all_rows() {
        for (height, n) in [(500, 4), (101, 8), (7, 3), (1, 4), (1000, 1)] {
            let bands = partition_rows(height, n);
            assert_eq!(bands[0].y0, 0);
            assert_eq!(bands.last().map(|b| b.y1), Some(height));
            for pair in bands.windows(2) {
                assert_eq!(pair[0].y1, pair[1].y0);
            }
            assert!(bands.iter().all(|b| b.rows() > 0));
        }
    }

    #[test]
    fn test_partition_even_split() {
        let bands = partition_rows(500, 4);
        assert_eq!(bands.len(), 4);
        assert!(bands.iter().all(|b| b.rows() == 125));
    }

    #[test]
    fn test_partition_more_bands_than_rows() {
        assert_eq!(partition_rows(3, 10).len(), 3);
    }

    #[test]
    fn test_worker_count_bounds() {
        assert_eq!(worker_count(8, 1), 1);
        assert_eq!(worker_count(0, 4), 1);
        assert!((1..=4).contains(&worker_count(4, 4)));
    }

    #[test]
    fn test_split_bands() {
        let mut data: Vec<f32> = (0..12).map(|v| v as f32).collect();
        let bands = partition_rows(6, 4);
        let slices = split_bands(&mut data, 2, &bands);
        let lens: Vec<usize> = slices.iter().map(|s| s.len()).collect();
        assert_eq!(lens, vec![4, 4, 2, 2]);
        assert_eq!(slices[1][0], 4.0);
    }
}
