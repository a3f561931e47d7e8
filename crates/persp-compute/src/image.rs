//! Interleaved f32 images passed between backends.

use crate::{ComputeError, ComputeResult};

/// Interleaved f32 image, channel values nominally in `[0, 1]`.
///
/// 1 channel is gray, 3 is RGB, 4 is RGBA with straight alpha.
#[derive(Clone, PartialEq)]
pub struct ComputeImage {
    pub(crate) data: Vec<f32>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Number of channels (1, 3 or 4).
    pub channels: u32,
}

impl ComputeImage {
    /// Create from f32 data.
    pub fn from_f32(data: Vec<f32>, width: u32, height: u32, channels: u32) -> ComputeResult<Self> {
        let expected = (width as usize) * (height as usize) * (channels as usize);
        if data.len() != expected {
            return Err(ComputeError::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            channels,
        })
    }

    /// Create empty image filled with zeros.
    pub fn new(width: u32, height: u32, channels: u32) -> Self {
        let size = (width as usize) * (height as usize) * (channels as usize);
        Self {
            data: vec![0.0; size],
            width,
            height,
            channels,
        }
    }

    /// Image where every pixel equals `pixel`; the channel count is `pixel.len()`.
    pub fn filled(width: u32, height: u32, pixel: &[f32]) -> Self {
        let count = (width as usize) * (height as usize);
        Self {
            data: pixel.repeat(count),
            width,
            height,
            channels: pixel.len() as u32,
        }
    }

    /// Get pixel data.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Get mutable pixel data.
    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Consume into the raw buffer.
    pub fn into_data(self) -> Vec<f32> {
        self.data
    }

    /// Image dimensions.
    pub fn dimensions(&self) -> (u32, u32, u32) {
        (self.width, self.height, self.channels)
    }

    /// Floats per row.
    #[inline]
    pub fn row_stride(&self) -> usize {
        self.width as usize * self.channels as usize
    }

    /// Channel values of pixel `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics when `(x, y)` lies outside the image.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> &[f32] {
        let c = self.channels as usize;
        let i = (y as usize * self.width as usize + x as usize) * c;
        &self.data[i..i + c]
    }

    /// Mutable channel values of pixel `(x, y)`.
    #[inline]
    pub fn pixel_mut(&mut self, x: u32, y: u32) -> &mut [f32] {
        let c = self.channels as usize;
        let i = (y as usize * self.width as usize + x as usize) * c;
        &mut self.data[i..i + c]
    }

    /// Last channel carries alpha.
    #[inline]
    pub fn has_alpha(&self) -> bool {
        self.channels == 4
    }

    /// Size in bytes.
    pub fn size_bytes(&self) -> usize {
        self.data.len() * 4
    }

    /// Rejects zero-sized images and unsupported channel layouts.
    pub fn validate(&self) -> ComputeResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ComputeError::InvalidDimensions(self.width, self.height));
        }
        if !matches!(self.channels, 1 | 3 | 4) {
            return Err(ComputeError::UnsupportedChannels(self.channels));
        }
        let expected = (self.width as usize) * (self.height as usize) * (self.channels as usize);
        if self.data.len() != expected {
            return Err(ComputeError::BufferSizeMismatch {
                expected,
                actual: self.data.len(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for ComputeImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComputeImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("channels", &self.channels)
            .field("size_bytes", &self.size_bytes())
            .finish()
    }
}
