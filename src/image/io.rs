//! Decoding and encoding through the `image` crate.
//!
//! PNG, JPEG and BMP are recognised. Unknown encodings map to
//! `UnsupportedFormat`; recognised but broken data maps to `ImageDecode`.

use crate::image::{Image, ImageFormat};
use crate::util::{VisionError, VisionResult};
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageError};
use std::path::Path;

/// Decodes an encoded buffer.
pub fn decode(bytes: &[u8]) -> VisionResult<Image> {
    let format = image::guess_format(bytes).map_err(map_image_error)?;
    let tag = match format {
        image::ImageFormat::Png => ImageFormat::Png,
        image::ImageFormat::Jpeg => ImageFormat::Jpeg,
        image::ImageFormat::Bmp => ImageFormat::Bmp,
        other => {
            return Err(VisionError::UnsupportedFormat {
                reason: format!("{other:?}"),
            })
        }
    };
    let dynamic = image::load_from_memory_with_format(bytes, format).map_err(map_image_error)?;
    Ok(from_dynamic(&dynamic)?.with_format(tag))
}

/// Reads and decodes an image file.
pub fn open<P: AsRef<Path>>(path: P) -> VisionResult<Image> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|err| VisionError::ImageDecode {
        reason: format!("{}: {err}", path.display()),
    })?;
    decode(&bytes)
}

/// Converts a `DynamicImage`, keeping luma as one channel and alpha when present.
pub fn from_dynamic(img: &DynamicImage) -> VisionResult<Image> {
    let width = img.width() as usize;
    let height = img.height() as usize;
    let color = img.color();
    if color.has_alpha() {
        Image::new(img.to_rgba8().into_raw(), width, height, 4)
    } else if color.has_color() {
        Image::new(img.to_rgb8().into_raw(), width, height, 3)
    } else {
        Image::new(img.to_luma8().into_raw(), width, height, 1)
    }
}

/// Encodes an image as PNG.
pub fn encode_png(img: &Image) -> VisionResult<Vec<u8>> {
    let mut out = Vec::new();
    image::codecs::png::PngEncoder::new(&mut out)
        .write_image(
            img.data(),
            img.width() as u32,
            img.height() as u32,
            color_type(img),
        )
        .map_err(|err| VisionError::ImageEncode {
            reason: err.to_string(),
        })?;
    Ok(out)
}

/// Writes an image; the encoding follows the file extension.
pub fn save<P: AsRef<Path>>(img: &Image, path: P) -> VisionResult<()> {
    let path = path.as_ref();
    let format =
        image::ImageFormat::from_path(path).map_err(|err| VisionError::UnsupportedFormat {
            reason: format!("{}: {err}", path.display()),
        })?;
    image::save_buffer_with_format(
        path,
        img.data(),
        img.width() as u32,
        img.height() as u32,
        color_type(img),
        format,
    )
    .map_err(|err| VisionError::ImageEncode {
        reason: format!("{}: {err}", path.display()),
    })
}

fn color_type(img: &Image) -> ExtendedColorType {
    match img.channels() {
        1 => ExtendedColorType::L8,
        3 => ExtendedColorType::Rgb8,
        _ => ExtendedColorType::Rgba8,
    }
}

fn map_image_error(err: ImageError) -> VisionError {
    match err {
        ImageError::Unsupported(inner) => VisionError::UnsupportedFormat {
            reason: inner.to_string(),
        },
        other => VisionError::ImageDecode {
            reason: other.to_string(),
        },
    }
}
