//! Deterministic bilinear resampling.
//!
//! Destination pixel centers map to source coordinates with
//! `src = (dst + 0.5) * scale - 0.5`, clamped to the valid range. Each channel
//! is interpolated independently and rounded to the nearest integer. This is
//! the only resampling policy used by the crate.

use crate::image::Image;
use crate::util::{VisionError, VisionResult};

/// Resizes `src` to `width x height` with bilinear sampling.
pub fn resize_bilinear(src: &Image, width: usize, height: usize) -> VisionResult<Image> {
    if width == 0 || height == 0 {
        return Err(VisionError::InvalidDimensions { width, height });
    }
    if src.dimensions() == (width, height) {
        return Ok(src.clone());
    }

    let channels = src.channels();
    let src_w = src.width();
    let src_h = src.height();
    let scale_x = src_w as f32 / width as f32;
    let scale_y = src_h as f32 / height as f32;
    let max_x = (src_w - 1) as f32;
    let max_y = (src_h - 1) as f32;
    let data = src.data();
    let src_stride = src_w * channels;

    let mut out = Vec::with_capacity(width * height * channels);
    for y in 0..height {
        let sy = ((y as f32 + 0.5) * scale_y - 0.5).clamp(0.0, max_y);
        let y0 = sy.floor() as usize;
        let y1 = (y0 + 1).min(src_h - 1);
        let fy = sy - y0 as f32;
        for x in 0..width {
            let sx = ((x as f32 + 0.5) * scale_x - 0.5).clamp(0.0, max_x);
            let x0 = sx.floor() as usize;
            let x1 = (x0 + 1).min(src_w - 1);
            let fx = sx - x0 as f32;

            let w00 = (1.0 - fx) * (1.0 - fy);
            let w10 = fx * (1.0 - fy);
            let w01 = (1.0 - fx) * fy;
            let w11 = fx * fy;
            for c in 0..channels {
                let a = data[y0 * src_stride + x0 * channels + c] as f32;
                let b = data[y0 * src_stride + x1 * channels + c] as f32;
                let d = data[y1 * src_stride + x0 * channels + c] as f32;
                let e = data[y1 * src_stride + x1 * channels + c] as f32;
                let value = a * w00 + b * w10 + d * w01 + e * w11;
                out.push(value.round().clamp(0.0, 255.0) as u8);
            }
        }
    }

    Image::new(out, width, height, channels)
}

#[cfg(test)]
mod tests {
    use super::resize_bilinear;
    use crate::image::Image;

    #[test]
    fn upscale_of_flat_image_stays_flat() {
        let img = Image::filled(3, 2, &[10, 20, 30]).unwrap();
        let out = resize_bilinear(&img, 7, 5).unwrap();
        assert_eq!(out.dimensions(), (7, 5));
        assert!(out.data().chunks_exact(3).all(|px| px == [10, 20, 30]));
    }

    #[test]
    fn downscale_by_two_averages_blocks() {
        let img = Image::new(vec![0, 100, 0, 100, 0, 100, 0, 100], 4, 2, 1).unwrap();
        let out = resize_bilinear(&img, 2, 1).unwrap();
        assert_eq!(out.data(), &[50u8, 50]);
    }

    #[test]
    fn same_size_is_identity() {
        let img = Image::new((0u8..12).collect(), 4, 3, 1).unwrap();
        assert_eq!(resize_bilinear(&img, 4, 3).unwrap(), img);
    }
}
