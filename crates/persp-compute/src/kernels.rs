//! CPU pixel kernels shared by the serial and threaded backends.
//!
//! - [`warp_rows`] - inverse-mapped resampling with a constant zero border
//! - [`composite_rows`] - Porter-Duff over of a warped band onto a canvas band
//!
//! The WGSL shaders in `shaders` mirror these line for line so every
//! backend produces the same pixels.
//!
//! # Channel adaptation
//!
//! The composite keeps the canvas layout. Gray sources are replicated into
//! RGB canvases; RGB sources onto gray canvases are reduced with Rec.601
//! luma weights ([`LUMA`]).

use crate::ComputeImage;

/// Rec.601 luma weights.
pub const LUMA: [f32; 3] = [0.299, 0.587, 0.114];

/// Below this |w| a destination pixel maps to infinity.
const W_EPS: f32 = 1e-8;

/// Resampling filter used by the warp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter {
    /// Nearest-neighbor.
    Nearest,
    /// Bilinear interpolation.
    #[default]
    Bilinear,
    /// Bicubic (Keys, a = -0.5).
    Bicubic,
}

impl Filter {
    /// Filter support radius in pixels.
    pub fn support(&self) -> f32 {
        match self {
            Filter::Nearest => 0.5,
            Filter::Bilinear => 1.0,
            Filter::Bicubic => 2.0,
        }
    }

    /// Filter weight at distance `x`.
    pub fn weight(&self, x: f32) -> f32 {
        match self {
            Filter::Nearest => nearest_weight(x),
            Filter::Bilinear => bilinear_weight(x),
            Filter::Bicubic => bicubic_weight(x),
        }
    }

    /// Index passed to the warp shader.
    #[cfg(feature = "wgpu")]
    pub(crate) fn shader_index(&self) -> u32 {
        match self {
            Filter::Nearest => 0,
            Filter::Bilinear => 1,
            Filter::Bicubic => 2,
        }
    }
}

#[inline]
fn nearest_weight(x: f32) -> f32 {
    if x.abs() < 0.5 { 1.0 } else { 0.0 }
}

#[inline]
fn bilinear_weight(x: f32) -> f32 {
    let ax = x.abs();
    if ax < 1.0 { 1.0 - ax } else { 0.0 }
}

/// Keys cubic convolution, a = -0.5. Interpolating: w(0) = 1, w(n) = 0.
#[inline]
fn bicubic_weight(x: f32) -> f32 {
    const A: f32 = -0.5;
    let ax = x.abs();
    if ax <= 1.0 {
        ((A + 2.0) * ax - (A + 3.0)) * ax * ax + 1.0
    } else if ax < 2.0 {
        ((A * ax - 5.0 * A) * ax + 8.0 * A) * ax - 4.0 * A
    } else {
        0.0
    }
}

// ============================================================================
// Warp
// ============================================================================

/// Maps `(x, y)` through a row-major homography.
#[inline]
pub fn map_point(h: &[f32; 9], x: f32, y: f32) -> Option<(f32, f32)> {
    let w = h[6] * x + h[7] * y + h[8];
    if w.abs() < W_EPS {
        return None;
    }
    Some(((h[0] * x + h[1] * y + h[2]) / w, (h[3] * x + h[4] * y + h[5]) / w))
}

#[inline]
fn tap(src: &ComputeImage, x: i64, y: i64) -> Option<&[f32]> {
    if x < 0 || y < 0 || x >= src.width as i64 || y >= src.height as i64 {
        None
    } else {
        Some(src.pixel(x as u32, y as u32))
    }
}

/// Samples `src` at `(sx, sy)` into `out`. Taps outside the image read zero.
pub fn sample(src: &ComputeImage, sx: f32, sy: f32, filter: Filter, out: &mut [f32]) {
    out.fill(0.0);
    if !sx.is_finite() || !sy.is_finite() {
        return;
    }
    let r = filter.support();
    if sx < -r || sy < -r || sx > src.width as f32 + r || sy > src.height as f32 + r {
        return;
    }

    match filter {
        Filter::Nearest => {
            let x = (sx + 0.5).floor() as i64;
            let y = (sy + 0.5).floor() as i64;
            if let Some(px) = tap(src, x, y) {
                out.copy_from_slice(px);
            }
        }
        Filter::Bilinear | Filter::Bicubic => {
            let x0 = sx.floor();
            let y0 = sy.floor();
            let (fx, fy) = (sx - x0, sy - y0);
            let (x0, y0) = (x0 as i64, y0 as i64);
            let (lo, hi) = if filter == Filter::Bilinear { (0, 1) } else { (-1, 2) };
            for j in lo..=hi {
                let wy = filter.weight(fy - j as f32);
                if wy == 0.0 {
                    continue;
                }
                for i in lo..=hi {
                    let wx = filter.weight(fx - i as f32);
                    if let Some(px) = tap(src, x0 + i, y0 + j) {
                        let wgt = wx * wy;
                        for (o, v) in out.iter_mut().zip(px) {
                            *o += wgt * v;
                        }
                    }
                }
            }
            if filter == Filter::Bicubic {
                for o in out.iter_mut() {
                    *o = o.clamp(0.0, 1.0);
                }
            }
        }
    }
}

/// Resamples rows `y0..` of the destination into `out`.
///
/// `out` holds whole rows of `width` pixels with `src.channels` channels.
/// `inv` maps destination pixels back into source coordinates.
pub fn warp_rows(
    src: &ComputeImage,
    inv: &[f32; 9],
    filter: Filter,
    width: u32,
    y0: u32,
    out: &mut [f32],
) {
    let c = src.channels as usize;
    let stride = width as usize * c;
    if stride == 0 {
        return;
    }
    for (dy, row) in out.chunks_exact_mut(stride).enumerate() {
        let y = (y0 as usize + dy) as f32;
        for (x, px) in row.chunks_exact_mut(c).enumerate() {
            match map_point(inv, x as f32, y) {
                Some((sx, sy)) => sample(src, sx, sy, filter, px),
                None => px.fill(0.0),
            }
        }
    }
}

/// Resamples `src` into a `width` x `height` image.
pub fn warp(src: &ComputeImage, inv: &[f32; 9], filter: Filter, width: u32, height: u32) -> ComputeImage {
    let mut out = ComputeImage::new(width, height, src.channels);
    warp_rows(src, inv, filter, width, 0, &mut out.data);
    out
}

// ============================================================================
// Composite
// ============================================================================

/// Source color adapted to a canvas with `dst_color` color channels.
#[inline]
fn adapt_color(src: &[f32], dst_color: usize) -> [f32; 3] {
    let src_color = if src.len() >= 3 { 3 } else { 1 };
    match (src_color, dst_color) {
        (3, 1) => [LUMA[0] * src[0] + LUMA[1] * src[1] + LUMA[2] * src[2], 0.0, 0.0],
        (1, _) => [src[0]; 3],
        _ => [src[0], src[1], src[2]],
    }
}

/// Composites one warped source pixel over one canvas pixel.
///
/// RGBA sources blend with `over`; pixels with zero alpha are left alone.
/// Sources without alpha overwrite wherever any channel is non-zero.
#[inline]
pub fn composite_pixel(src: &[f32], dst: &mut [f32]) {
    let dst_alpha = dst.len() == 4;
    let dst_color = if dst.len() >= 3 { 3 } else { 1 };

    if src.len() == 4 {
        let sa = src[3];
        if sa <= 0.0 {
            return;
        }
        let da = if dst_alpha { dst[3] } else { 1.0 };
        let color = adapt_color(&src[..3], dst_color);
        let keep = da * (1.0 - sa);
        for (d, s) in dst[..dst_color].iter_mut().zip(color) {
            *d = s * sa + *d * keep;
        }
        if dst_alpha {
            dst[3] = sa + keep;
        }
    } else {
        if src.iter().all(|&v| v == 0.0) {
            return;
        }
        let color = adapt_color(src, dst_color);
        dst[..dst_color].copy_from_slice(&color[..dst_color]);
        if dst_alpha {
            dst[3] = 1.0;
        }
    }
}

/// Composites a warped band over the matching canvas band.
///
/// Both slices cover the same rows; channel counts may differ.
pub fn composite_rows(warped: &[f32], src_channels: u32, canvas: &mut [f32], dst_channels: u32) {
    let sc = src_channels as usize;
    let dc = dst_channels as usize;
    for (s, d) in warped.chunks_exact(sc).zip(canvas.chunks_exact_mut(dc)) {
        composite_pixel(s, d);
    }
}
