//! Pixel difference masks and highlighted overlays.

use crate::compare::check_aspect;
use crate::compare::CompareConfig;
use crate::image::Image;
use crate::util::VisionResult;

/// Per-pixel difference (max over channels) at or above which a pixel counts as changed.
pub const DIFF_THRESHOLD: u8 = 32;

/// Binary mask of changed pixels, with `img_a`'s dimensions.
///
/// `img_b` is resized to `img_a` under the default aspect tolerance.
pub fn diff_mask(img_a: &Image, img_b: &Image) -> VisionResult<Image> {
    let (a, b) = align_to_first(img_a, img_b)?;
    Ok(mask_aligned(&a, &b))
}

/// Paints every changed pixel of `img_a` with `color`.
///
/// The output is an RGB copy of `img_a` (RGBA when `img_a` has alpha, which is
/// preserved); unchanged pixels keep their original values.
pub fn highlight_differences(
    img_a: &Image,
    img_b: &Image,
    color: [u8; 3],
) -> VisionResult<Image> {
    let mask = diff_mask(img_a, img_b)?;
    let base = if img_a.channels() == 4 {
        img_a.clone()
    } else {
        img_a.to_rgb()
    };
    let channels = base.channels();
    let (width, height) = base.dimensions();
    let mut data = base.into_raw();
    for (px, &m) in data.chunks_exact_mut(channels).zip(mask.data()) {
        if m != 0 {
            px[..3].copy_from_slice(&color);
        }
    }
    Image::new(data, width, height, channels)
}

/// Mask over two images already sharing size and channel layout.
pub(crate) fn mask_aligned(a: &Image, b: &Image) -> Image {
    let channels = a.channels();
    let data: Vec<u8> = a
        .data()
        .chunks_exact(channels)
        .zip(b.data().chunks_exact(channels))
        .map(|(pa, pb)| {
            let delta = pa
                .iter()
                .zip(pb)
                .map(|(&va, &vb)| va.abs_diff(vb))
                .max()
                .unwrap_or(0);
            if delta >= DIFF_THRESHOLD {
                255
            } else {
                0
            }
        })
        .collect();
    Image::new(data, a.width(), a.height(), 1).expect("mask shape follows the aligned input")
}

fn align_to_first(img_a: &Image, img_b: &Image) -> VisionResult<(Image, Image)> {
    let (a, b) = if img_a.channels() == img_b.channels() {
        (img_a.clone(), img_b.clone())
    } else {
        (img_a.to_rgb(), img_b.to_rgb())
    };
    if a.dimensions() == b.dimensions() {
        return Ok((a, b));
    }
    check_aspect(&a, &b, CompareConfig::default().aspect_tolerance)?;
    let b = b.resize(a.width(), a.height())?;
    Ok((a, b))
}
