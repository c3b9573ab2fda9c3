//! Fixed OCR preprocessing: luma, upscaling of short images, Otsu binarization.
//!
//! Output is always dark text on a light background. Upscaling uses an
//! integer factor so boxes map back to the source image exactly.

use crate::geometry::BoundingBox;
use crate::image::Image;
use crate::util::VisionResult;

/// Images shorter than this are upscaled before recognition.
pub const MIN_OCR_HEIGHT: usize = 64;

const MAX_UPSCALE: usize = 8;

/// Preprocessed image plus the factor it was enlarged by.
pub(crate) struct Prepared {
    pub image: Image,
    pub scale: usize,
}

impl Prepared {
    /// Maps a box from preprocessed coordinates back to the source image.
    pub fn to_source(&self, bbox: BoundingBox) -> BoundingBox {
        if self.scale == 1 {
            return bbox;
        }
        let s = self.scale as i64;
        let x0 = i64::from(bbox.x).div_euclid(s);
        let y0 = i64::from(bbox.y).div_euclid(s);
        let x1 = (bbox.right() + s - 1).div_euclid(s);
        let y1 = (bbox.bottom() + s - 1).div_euclid(s);
        BoundingBox::new(x0 as i32, y0 as i32, (x1 - x0) as u32, (y1 - y0) as u32)
    }
}

/// Runs the pipeline.
pub(crate) fn prepare(image: &Image) -> VisionResult<Prepared> {
    let gray = image.to_gray();
    let scale = upscale_factor(gray.height());
    let gray = if scale > 1 {
        gray.resize(gray.width() * scale, gray.height() * scale)?
    } else {
        gray
    };
    Ok(Prepared {
        image: binarize(&gray),
        scale,
    })
}

fn upscale_factor(height: usize) -> usize {
    if height >= MIN_OCR_HEIGHT {
        1
    } else {
        MIN_OCR_HEIGHT.div_ceil(height).min(MAX_UPSCALE)
    }
}

/// Otsu threshold of a luma image (pixels `> t` are foreground-light).
pub(crate) fn otsu_threshold(gray: &Image) -> u8 {
    let mut hist = [0u64; 256];
    for &v in gray.data() {
        hist[usize::from(v)] += 1;
    }
    let total = gray.data().len() as f64;
    let sum_all: f64 = hist
        .iter()
        .enumerate()
        .map(|(i, &c)| i as f64 * c as f64)
        .sum();

    let mut best_t = 0u8;
    let mut best_var = -1.0f64;
    let mut weight_bg = 0.0f64;
    let mut sum_bg = 0.0f64;
    for (t, &count) in hist.iter().enumerate() {
        weight_bg += count as f64;
        if weight_bg == 0.0 {
            continue;
        }
        let weight_fg = total - weight_bg;
        if weight_fg == 0.0 {
            break;
        }
        sum_bg += t as f64 * count as f64;
        let mean_bg = sum_bg / weight_bg;
        let mean_fg = (sum_all - sum_bg) / weight_fg;
        let between = weight_bg * weight_fg * (mean_bg - mean_fg) * (mean_bg - mean_fg);
        if between > best_var {
            best_var = between;
            best_t = t as u8;
        }
    }
    best_t
}

/// Thresholds at Otsu's level and inverts when the background came out dark.
fn binarize(gray: &Image) -> Image {
    let t = otsu_threshold(gray);
    let mut data: Vec<u8> = gray
        .data()
        .iter()
        .map(|&v| if v > t { 255 } else { 0 })
        .collect();
    let dark = data.iter().filter(|&&v| v == 0).count();
    if dark * 2 > data.len() {
        for v in data.iter_mut() {
            *v = 255 - *v;
        }
    }
    Image::new(data, gray.width(), gray.height(), 1).expect("binarized image keeps its shape")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn otsu_splits_bimodal_histogram() {
        let mut data = vec![30u8; 50];
        data.extend(vec![220u8; 50]);
        let img = Image::new(data, 10, 10, 1).unwrap();
        let t = otsu_threshold(&img);
        assert!((30..220).contains(&t));
    }

    #[test]
    fn light_text_on_dark_background_is_inverted() {
        let mut data = vec![10u8; 100 * 80];
        for v in data.iter_mut().take(400) {
            *v = 240;
        }
        let img = Image::new(data, 100, 80, 1).unwrap();
        let prepared = prepare(&img).unwrap();
        assert_eq!(prepared.scale, 1);
        assert_eq!(prepared.image.pixel(0, 0), Some(&[0u8][..]));
        assert_eq!(prepared.image.pixel(99, 79), Some(&[255u8][..]));
    }

    #[test]
    fn short_images_are_upscaled_and_boxes_map_back() {
        let img = Image::filled(40, 20, &[200, 200, 200]).unwrap();
        let prepared = prepare(&img).unwrap();
        assert_eq!(prepared.scale, 4);
        assert_eq!(prepared.image.dimensions(), (160, 80));

        let mapped = prepared.to_source(BoundingBox::new(10, 8, 21, 40));
        assert_eq!(mapped, BoundingBox::new(2, 2, 6, 10));
    }
}
