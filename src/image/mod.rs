//! Owned raster images and pixel-level conversions.
//!
//! `Image` is an immutable, contiguous, row-major buffer with interleaved
//! channels (1 = luma, 3 = RGB, 4 = RGBA). Every transform returns a new
//! image; nothing is modified in place once decoded.

use crate::geometry::BoundingBox;
use crate::util::{VisionError, VisionResult};

pub mod io;
pub mod resize;

/// Encoding an image was decoded from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Bmp,
    /// Built in memory (captures, conversions, diff masks).
    Raw,
}

/// Owned contiguous image buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Image {
    data: Vec<u8>,
    width: usize,
    height: usize,
    channels: usize,
    format: ImageFormat,
}

impl Image {
    /// Creates an image from a contiguous interleaved buffer.
    pub fn new(data: Vec<u8>, width: usize, height: usize, channels: usize) -> VisionResult<Self> {
        if width == 0 || height == 0 {
            return Err(VisionError::InvalidDimensions { width, height });
        }
        if !matches!(channels, 1 | 3 | 4) {
            return Err(VisionError::invalid_argument(format!(
                "unsupported channel count {channels}; expected 1, 3 or 4"
            )));
        }
        let needed = width
            .checked_mul(height)
            .and_then(|v| v.checked_mul(channels))
            .ok_or(VisionError::InvalidDimensions { width, height })?;
        if data.len() != needed {
            return Err(VisionError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            channels,
            format: ImageFormat::Raw,
        })
    }

    /// Creates an image where every pixel equals `pixel` (its length sets the channel count).
    pub fn filled(width: usize, height: usize, pixel: &[u8]) -> VisionResult<Self> {
        let count = width
            .checked_mul(height)
            .ok_or(VisionError::InvalidDimensions { width, height })?;
        let data = pixel.repeat(count);
        Self::new(data, width, height, pixel.len())
    }

    pub(crate) fn with_format(mut self, format: ImageFormat) -> Self {
        self.format = format;
        self
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of interleaved channels per pixel.
    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// Returns `(width, height)`.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Raw interleaved samples.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// Samples of row `y` (`width * channels` bytes).
    pub fn row(&self, y: usize) -> Option<&[u8]> {
        if y >= self.height {
            return None;
        }
        let len = self.width * self.channels;
        let start = y * len;
        self.data.get(start..start + len)
    }

    /// Samples of the pixel at `(x, y)`.
    pub fn pixel(&self, x: usize, y: usize) -> Option<&[u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let start = (y * self.width + x) * self.channels;
        self.data.get(start..start + self.channels)
    }

    /// Converts to single-channel luma (BT.601 weights, alpha ignored).
    pub fn to_gray(&self) -> Image {
        if self.channels == 1 {
            return self.clone();
        }
        let data = self
            .data
            .chunks_exact(self.channels)
            .map(|px| luma(px[0], px[1], px[2]))
            .collect();
        self.derived(data, 1)
    }

    /// Converts to three-channel RGB, dropping alpha.
    pub fn to_rgb(&self) -> Image {
        match self.channels {
            3 => self.clone(),
            1 => {
                let data = self.data.iter().flat_map(|&v| [v, v, v]).collect();
                self.derived(data, 3)
            }
            _ => {
                let data = self
                    .data
                    .chunks_exact(4)
                    .flat_map(|px| [px[0], px[1], px[2]])
                    .collect();
                self.derived(data, 3)
            }
        }
    }

    /// Converts to four-channel RGBA with opaque alpha where none existed.
    pub fn to_rgba(&self) -> Image {
        match self.channels {
            4 => self.clone(),
            1 => {
                let data = self.data.iter().flat_map(|&v| [v, v, v, 255]).collect();
                self.derived(data, 4)
            }
            _ => {
                let data = self
                    .data
                    .chunks_exact(3)
                    .flat_map(|px| [px[0], px[1], px[2], 255])
                    .collect();
                self.derived(data, 4)
            }
        }
    }

    /// Copies the region `bbox` into a new image.
    pub fn crop(&self, bbox: &BoundingBox) -> VisionResult<Image> {
        let width = bbox.width as usize;
        let height = bbox.height as usize;
        if width == 0 || height == 0 {
            return Err(VisionError::InvalidDimensions { width, height });
        }
        let out_of_bounds = VisionError::RoiOutOfBounds {
            x: i64::from(bbox.x),
            y: i64::from(bbox.y),
            width,
            height,
            img_width: self.width,
            img_height: self.height,
        };
        if bbox.x < 0
            || bbox.y < 0
            || bbox.right() > self.width as i64
            || bbox.bottom() > self.height as i64
        {
            return Err(out_of_bounds);
        }

        let x0 = bbox.x as usize;
        let y0 = bbox.y as usize;
        let mut data = Vec::with_capacity(width * height * self.channels);
        for y in y0..y0 + height {
            let row = self.row(y).ok_or(out_of_bounds.clone())?;
            data.extend_from_slice(&row[x0 * self.channels..(x0 + width) * self.channels]);
        }
        Image::new(data, width, height, self.channels)
    }

    /// Resizes with the crate's fixed bilinear policy.
    pub fn resize(&self, width: usize, height: usize) -> VisionResult<Image> {
        resize::resize_bilinear(self, width, height)
    }

    fn derived(&self, data: Vec<u8>, channels: usize) -> Image {
        Image {
            data,
            width: self.width,
            height: self.height,
            channels,
            format: ImageFormat::Raw,
        }
    }
}

/// BT.601 luma with integer rounding.
#[inline]
pub(crate) fn luma(r: u8, g: u8, b: u8) -> u8 {
    let sum = 299 * u32::from(r) + 587 * u32::from(g) + 114 * u32::from(b);
    ((sum + 500) / 1000) as u8
}
