//! Error types for visverify.

use thiserror::Error;

/// Result alias for visverify operations.
pub type VisionResult<T> = std::result::Result<T, VisionError>;

/// Errors that can occur while decoding, comparing, matching or reading images.
///
/// A search that finds nothing is not an error: lookups return `Option`.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum VisionError {
    /// The input bytes or file could not be decoded into an image.
    #[error("image decode failed: {reason}")]
    ImageDecode { reason: String },
    /// The input uses an encoding this crate does not recognise.
    #[error("unsupported image format: {reason}")]
    UnsupportedFormat { reason: String },
    /// An image could not be encoded or written.
    #[error("image encode failed: {reason}")]
    ImageEncode { reason: String },
    /// Two images have incompatible aspect ratios for a comparison.
    #[error(
        "dimension mismatch: {width_a}x{height_a} vs {width_b}x{height_b} exceeds aspect tolerance"
    )]
    DimensionMismatch {
        width_a: usize,
        height_a: usize,
        width_b: usize,
        height_b: usize,
    },
    /// A caller-supplied argument violates an input constraint.
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },
    /// Width or height is zero or overflows.
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// Pixel buffer length does not match the declared shape.
    #[error("buffer length mismatch: needed {needed}, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// A region does not fit inside the image.
    #[error(
        "region out of bounds: x={x}, y={y}, width={width}, height={height}, image={img_width}x{img_height}"
    )]
    RoiOutOfBounds {
        x: i64,
        y: i64,
        width: usize,
        height: usize,
        img_width: usize,
        img_height: usize,
    },
    /// The OCR backend (binary or language data) cannot be located.
    #[error("OCR engine unavailable: {reason}")]
    EngineUnavailable { reason: String },
    /// The OCR backend ran but failed.
    #[error("OCR engine failed: {reason}")]
    Engine { reason: String },
}

impl VisionError {
    pub(crate) fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }
}
