//! CLI command implementations

pub mod backends;
pub mod project;

use anyhow::{Context, Result};
use image::{DynamicImage, GrayImage, RgbImage, RgbaImage};
use persp_compute::ComputeImage;
use std::path::Path;

/// Load an 8-bit image as normalized f32.
pub fn load_image(path: &Path) -> Result<ComputeImage> {
    let img = image::open(path).with_context(|| format!("Failed to load: {}", path.display()))?;
    to_compute(img).with_context(|| format!("Failed to convert: {}", path.display()))
}

/// Save an f32 image as 8-bit in its own channel layout.
pub fn save_image(path: &Path, image: &ComputeImage) -> Result<()> {
    from_compute(image)?
        .save(path)
        .with_context(|| format!("Failed to save: {}", path.display()))
}

/// Gray, RGB and RGBA map directly; other layouts are widened to RGB or RGBA.
pub fn to_compute(img: DynamicImage) -> Result<ComputeImage> {
    let (width, height) = (img.width(), img.height());
    let (bytes, channels) = match img {
        DynamicImage::ImageLuma8(buf) => (buf.into_raw(), 1),
        DynamicImage::ImageRgb8(buf) => (buf.into_raw(), 3),
        DynamicImage::ImageRgba8(buf) => (buf.into_raw(), 4),
        other if other.color().has_alpha() => (other.to_rgba8().into_raw(), 4),
        other => (other.to_rgb8().into_raw(), 3),
    };
    let data = bytes.iter().map(|&b| b as f32 / 255.0).collect();
    Ok(ComputeImage::from_f32(data, width, height, channels)?)
}

/// Quantizes to 8 bits with rounding and clamping.
pub fn from_compute(image: &ComputeImage) -> Result<DynamicImage> {
    let (width, height, channels) = image.dimensions();
    let bytes: Vec<u8> = image
        .data()
        .iter()
        .map(|&v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
        .collect();
    let img = match channels {
        1 => GrayImage::from_raw(width, height, bytes).map(DynamicImage::ImageLuma8),
        3 => RgbImage::from_raw(width, height, bytes).map(DynamicImage::ImageRgb8),
        4 => RgbaImage::from_raw(width, height, bytes).map(DynamicImage::ImageRgba8),
        _ => None,
    };
    img.with_context(|| format!("Cannot encode {width}x{height} image with {channels} channels"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gray_to_compute() {
        let buf = GrayImage::from_raw(2, 1, vec![0, 255]).unwrap();
        let img = to_compute(DynamicImage::ImageLuma8(buf)).unwrap();
        assert_eq!(img.dimensions(), (2, 1, 1));
        assert_eq!(img.data(), &[0.0, 1.0]);
    }

    #[test]
    fn test_gray_alpha_widens_to_rgba() {
        let buf = image::GrayAlphaImage::from_raw(1, 1, vec![255, 0]).unwrap();
        let img = to_compute(DynamicImage::ImageLumaA8(buf)).unwrap();
        assert_eq!(img.dimensions(), (1, 1, 4));
        assert_eq!(img.data(), &[1.0, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_quantize_clamps() {
        let img = ComputeImage::from_f32(vec![-0.5, 0.5, 2.0], 1, 1, 3).unwrap();
        let out = from_compute(&img).unwrap().to_rgb8();
        assert_eq!(out.into_raw(), vec![0, 128, 255]);
    }

    #[test]
    fn test_png_keeps_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rgba.png");
        let img = ComputeImage::filled(3, 2, &[1.0, 0.0, 0.0, 1.0]);
        save_image(&path, &img).unwrap();
        let back = load_image(&path).unwrap();
        assert_eq!(back, img);
    }

    #[test]
    fn test_missing_file_has_context() {
        let err = load_image(Path::new("/nonexistent/persp.png")).unwrap_err();
        assert!(err.to_string().contains("Failed to load"));
    }
}
