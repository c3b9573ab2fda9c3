//! OCR backend abstraction.

use crate::geometry::BoundingBox;
use crate::image::Image;
use crate::ocr::OcrConfig;
use crate::util::VisionResult;

/// A word as reported by an OCR backend, before filtering and ordering.
#[derive(Clone, Debug, PartialEq)]
pub struct OcrWord {
    pub text: String,
    /// Box in the coordinates of the image passed to [`OcrEngine::recognize`].
    pub bbox: BoundingBox,
    /// `[0, 100]`; negative for entries the backend did not score.
    pub confidence: f32,
}

/// Recognises words in an image.
///
/// Implementations receive the already preprocessed image and must not
/// reorder or filter words beyond what the backend itself does.
pub trait OcrEngine {
    fn recognize(&self, image: &Image, cfg: &OcrConfig) -> VisionResult<Vec<OcrWord>>;
}

impl<E: OcrEngine + ?Sized> OcrEngine for &E {
    fn recognize(&self, image: &Image, cfg: &OcrConfig) -> VisionResult<Vec<OcrWord>> {
        (**self).recognize(image, cfg)
    }
}

impl<E: OcrEngine + ?Sized> OcrEngine for Box<E> {
    fn recognize(&self, image: &Image, cfg: &OcrConfig) -> VisionResult<Vec<OcrWord>> {
        (**self).recognize(image, cfg)
    }
}
