//! Centered composite for identity parameters.
//!
//! With no rotation, translation or scale the source lands unresampled in
//! the middle of the canvas. The overlap goes through the same per-pixel
//! rule as the warped path: RGBA sources blend with Porter-Duff over,
//! sources without alpha overwrite wherever any channel is non-zero.
//!
//! # Example
//!
//! ```rust
//! use persp_compute::ComputeImage;
//! use persp_ops::composite::composite_centered;
//!
//! let white = ComputeImage::filled(2, 2, &[1.0, 1.0, 1.0]);
//! let black = ComputeImage::filled(4, 4, &[0.0, 0.0, 0.0]);
//! let out = composite_centered(&white, &black);
//! assert_eq!(out.pixel(1, 1), &[1.0, 1.0, 1.0]);
//! assert_eq!(out.pixel(0, 0), &[0.0, 0.0, 0.0]);
//! ```

use persp_compute::ComputeImage;
use persp_compute::kernels::composite_pixel;
use tracing::trace;

/// Offset that centers a `src` extent inside a `dst` extent.
///
/// Negative when the source is larger; odd differences round toward
/// negative infinity.
pub fn center_offset(dst: u32, src: u32) -> i64 {
    (dst as i64 - src as i64).div_euclid(2)
}

/// Composites `src` centered on a copy of `reference`, clipped to the
/// overlap. The result keeps the reference layout.
pub fn composite_centered(src: &ComputeImage, reference: &ComputeImage) -> ComputeImage {
    let mut out = reference.clone();
    let ox = center_offset(reference.width, src.width);
    let oy = center_offset(reference.height, src.height);

    let x0 = ox.max(0);
    let y0 = oy.max(0);
    let x1 = (ox + src.width as i64).min(reference.width as i64);
    let y1 = (oy + src.height as i64).min(reference.height as i64);
    if x0 >= x1 || y0 >= y1 {
        return out;
    }
    trace!(ox, oy, "centered composite over [{x0}, {x1}) x [{y0}, {y1})");

    for dy in y0..y1 {
        let sy = (dy - oy) as u32;
        for dx in x0..x1 {
            let sx = (dx - ox) as u32;
            let s = src.pixel(sx, sy);
            composite_pixel(s, out.pixel_mut(dx as u32, dy as u32));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_offset() {
        assert_eq!(center_offset(200, 100), 50);
        assert_eq!(center_offset(101, 100), 0);
        assert_eq!(center_offset(100, 101), -1);
        assert_eq!(center_offset(100, 300), -100);
    }

    #[test]
    fn test_white_square_on_black() {
        let white = ComputeImage::filled(100, 100, &[1.0, 1.0, 1.0]);
        let black = ComputeImage::filled(200, 200, &[0.0, 0.0, 0.0]);
        let out = composite_centered(&white, &black);
        for y in 0..200 {
            for x in 0..200 {
                let inside = (50..150).contains(&x) && (50..150).contains(&y);
                let v: f32 = if inside { 1.0 } else { 0.0 };
                assert_eq!(out.pixel(x, y), &[v, v, v], "pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_larger_source_is_clipped() {
        let mut src = ComputeImage::new(6, 6, 1);
        for y in 0..6 {
            for x in 0..6 {
                src.pixel_mut(x, y)[0] = (y * 6 + x) as f32 / 36.0;
            }
        }
        let canvas = ComputeImage::new(2, 2, 1);
        let out = composite_centered(&src, &canvas);
        assert_eq!(out.pixel(0, 0), src.pixel(2, 2));
        assert_eq!(out.pixel(1, 1), src.pixel(3, 3));
    }

    #[test]
    fn test_black_without_alpha_is_skipped() {
        let mut src = ComputeImage::filled(2, 2, &[0.0, 0.0, 0.0]);
        src.pixel_mut(1, 1).copy_from_slice(&[0.0, 0.8, 0.0]);
        let canvas = ComputeImage::filled(2, 2, &[0.5, 0.5, 0.5, 0.5]);
        let out = composite_centered(&src, &canvas);
        assert_eq!(out.pixel(0, 0), &[0.5, 0.5, 0.5, 0.5]);
        assert_eq!(out.pixel(1, 1), &[0.0, 0.8, 0.0, 1.0]);
    }

    #[test]
    fn test_alpha_source_blends() {
        let src = ComputeImage::filled(2, 2, &[1.0, 1.0, 1.0, 0.0]);
        let canvas = ComputeImage::filled(4, 4, &[0.2, 0.2, 0.2]);
        let out = composite_centered(&src, &canvas);
        assert_eq!(out, canvas);
    }
}
