//! Text extraction from rendered images.
//!
//! [`TextExtractor`] wraps an explicit [`OcrEngine`] handle together with an
//! [`OcrConfig`]. It owns preprocessing, confidence filtering, reading order
//! and text search; the engine only turns pixels into words. Absent text is
//! reported as `None`/`false`, never as an error; errors mean the engine
//! could not run.

use crate::geometry::BoundingBox;
use crate::image::Image;
use crate::search::{ConfidenceScale, MatchLocation};
use crate::trace::{trace_event, trace_span};
use crate::util::{VisionError, VisionResult};
use std::str::FromStr;

pub mod engine;
mod layout;
pub mod preprocess;
pub mod tesseract;

pub use engine::{OcrEngine, OcrWord};
pub use preprocess::MIN_OCR_HEIGHT;
pub use tesseract::TesseractEngine;

/// Characters the engine may emit while reading numbers. Numbers are unsigned.
const NUMERIC_WHITELIST: &str = "0123456789.,";

/// Tesseract page segmentation modes that make sense for UI captures.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageSegMode {
    /// Fully automatic layout analysis (3).
    Auto,
    /// A single column of variable-size text (4).
    SingleColumn,
    /// A single uniform block of text (6).
    SingleBlock,
    /// A single text line (7).
    SingleLine,
    /// A single word (8).
    SingleWord,
    /// As much text as possible, in no particular order (11).
    SparseText,
}

impl PageSegMode {
    /// Numeric `--psm` value.
    pub fn code(&self) -> u8 {
        match self {
            PageSegMode::Auto => 3,
            PageSegMode::SingleColumn => 4,
            PageSegMode::SingleBlock => 6,
            PageSegMode::SingleLine => 7,
            PageSegMode::SingleWord => 8,
            PageSegMode::SparseText => 11,
        }
    }
}

impl FromStr for PageSegMode {
    type Err = VisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "3" | "auto" => Ok(PageSegMode::Auto),
            "4" | "single_column" => Ok(PageSegMode::SingleColumn),
            "6" | "single_block" => Ok(PageSegMode::SingleBlock),
            "7" | "single_line" => Ok(PageSegMode::SingleLine),
            "8" | "single_word" => Ok(PageSegMode::SingleWord),
            "11" | "sparse_text" => Ok(PageSegMode::SparseText),
            other => Err(VisionError::invalid_argument(format!(
                "unknown page segmentation mode {other:?}"
            ))),
        }
    }
}

/// OCR options passed explicitly with every extraction.
#[derive(Clone, Debug, PartialEq)]
pub struct OcrConfig {
    /// Engine language code(s), e.g. `eng` or `eng+deu`.
    pub language: String,
    pub psm: PageSegMode,
    /// Run the fixed preprocessing pipeline before recognition.
    pub preprocess: bool,
    /// Tokens below this confidence (`[0, 100]`) are dropped.
    pub confidence_floor: f32,
    /// Restrict recognised characters.
    pub char_whitelist: Option<String>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            psm: PageSegMode::SingleBlock,
            preprocess: true,
            confidence_floor: 0.0,
            char_whitelist: None,
        }
    }
}

/// A recognised word in source-image coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct TextToken {
    pub text: String,
    pub bbox: BoundingBox,
    /// `[0, 100]`.
    pub confidence: f32,
}

/// OCR front end over an engine handle.
pub struct TextExtractor<E> {
    engine: E,
    cfg: OcrConfig,
}

impl<E: OcrEngine> TextExtractor<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            cfg: OcrConfig::default(),
        }
    }

    pub fn with_config(mut self, cfg: OcrConfig) -> Self {
        self.cfg = cfg;
        self
    }

    pub fn config(&self) -> &OcrConfig {
        &self.cfg
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Plain text, one line per recognised text line.
    pub fn extract_text(&self, image: &Image) -> VisionResult<String> {
        let lines = layout::into_lines(self.tokens(image, &self.cfg)?);
        Ok(layout::lines_to_text(&lines).trim().to_string())
    }

    /// Tokens at or above the confidence floor, in reading order.
    pub fn extract_text_with_details(&self, image: &Image) -> VisionResult<Vec<TextToken>> {
        let lines = layout::into_lines(self.tokens(image, &self.cfg)?);
        Ok(lines.into_iter().flatten().collect())
    }

    /// First reading-order occurrence of `target_text`.
    ///
    /// Multi-word targets are matched against runs of consecutive tokens on
    /// one line joined by single spaces; a run matches when it contains the
    /// target. The location covers the run; its confidence is the lowest
    /// token confidence in the run, on the `Percent` scale.
    pub fn find_text_location(
        &self,
        image: &Image,
        target_text: &str,
        case_sensitive: bool,
    ) -> VisionResult<Option<MatchLocation>> {
        let target = layout::normalize_whitespace(target_text);
        if target.is_empty() {
            return Err(VisionError::invalid_argument("target text is empty"));
        }
        let target = fold_case(&target, case_sensitive);
        let words = target.split(' ').count();

        let lines = layout::into_lines(self.tokens(image, &self.cfg)?);
        for line in &lines {
            if line.len() < words {
                continue;
            }
            for run in line.windows(words) {
                let joined = run
                    .iter()
                    .map(|t| t.text.as_str())
                    .collect::<Vec<_>>()
                    .join(" ");
                if fold_case(&joined, case_sensitive).contains(&target) {
                    let bbox = run[1..]
                        .iter()
                        .fold(run[0].bbox, |acc, t| acc.union(&t.bbox));
                    let confidence = run
                        .iter()
                        .map(|t| t.confidence)
                        .fold(f32::INFINITY, f32::min);
                    return Ok(Some(MatchLocation {
                        bbox,
                        confidence,
                        scale: ConfidenceScale::Percent,
                    }));
                }
            }
        }
        Ok(None)
    }

    /// True iff [`find_text_location`](Self::find_text_location) finds the text.
    pub fn verify_text_present(
        &self,
        image: &Image,
        target_text: &str,
        case_sensitive: bool,
    ) -> VisionResult<bool> {
        Ok(self
            .find_text_location(image, target_text, case_sensitive)?
            .is_some())
    }

    /// Numeric substrings in reading order.
    ///
    /// Recognition is restricted to digits and separators; a digit run keeps
    /// its inner `.`/`,` separators as one value.
    pub fn extract_numbers(&self, image: &Image) -> VisionResult<Vec<String>> {
        let cfg = OcrConfig {
            char_whitelist: Some(NUMERIC_WHITELIST.to_string()),
            ..self.cfg.clone()
        };
        let lines = layout::into_lines(self.tokens(image, &cfg)?);
        Ok(layout::numeric_runs(&layout::lines_to_text(&lines)))
    }

    /// Plain text inside `region` only.
    pub fn extract_text_from_region(
        &self,
        image: &Image,
        region: &BoundingBox,
    ) -> VisionResult<String> {
        self.extract_text(&image.crop(region)?)
    }

    /// Compares extracted text with `expected`.
    ///
    /// With `exact` the strings must be equal; otherwise whitespace runs are
    /// collapsed on both sides first.
    pub fn compare_text(&self, image: &Image, expected: &str, exact: bool) -> VisionResult<bool> {
        let text = self.extract_text(image)?;
        if exact {
            Ok(text == expected)
        } else {
            Ok(layout::normalize_whitespace(&text) == layout::normalize_whitespace(expected))
        }
    }

    /// Recognised, filtered tokens in source coordinates (unordered).
    fn tokens(&self, image: &Image, cfg: &OcrConfig) -> VisionResult<Vec<TextToken>> {
        let _span = trace_span!("ocr_recognize", language = cfg.language.as_str()).entered();

        let (words, prepared) = if cfg.preprocess {
            let prepared = preprocess::prepare(image)?;
            (self.engine.recognize(&prepared.image, cfg)?, Some(prepared))
        } else {
            (self.engine.recognize(image, cfg)?, None)
        };

        let tokens: Vec<TextToken> = words
            .into_iter()
            .filter(|w| w.confidence >= 0.0 && !w.text.trim().is_empty())
            .filter(|w| w.confidence >= cfg.confidence_floor)
            .map(|w| TextToken {
                text: w.text.trim().to_string(),
                bbox: match &prepared {
                    Some(p) => p.to_source(w.bbox),
                    None => w.bbox,
                },
                confidence: w.confidence.min(100.0),
            })
            .collect();

        trace_event!("tokens", count = tokens.len());
        Ok(tokens)
    }
}

fn fold_case(text: &str, case_sensitive: bool) -> String {
    if case_sensitive {
        text.to_string()
    } else {
        text.to_lowercase()
    }
}
