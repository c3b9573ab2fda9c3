//! Whole-image similarity scoring.
//!
//! Two images are scored with one of three metrics and the score is compared
//! against a caller threshold. Differently sized inputs are aligned first:
//! the smaller image (by pixel count) is resized to the larger one's
//! dimensions with the crate's bilinear policy, unless their aspect ratios
//! differ by more than [`CompareConfig::aspect_tolerance`], in which case the
//! comparison fails with `DimensionMismatch`. Inputs with different channel
//! counts are both converted to RGB.

use crate::image::Image;
use crate::trace::{trace_event, trace_span};
use crate::util::{VisionError, VisionResult};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

mod diff;
mod histogram;
mod mse;
mod ssim;

pub use diff::{diff_mask, highlight_differences, DIFF_THRESHOLD};

/// Similarity metric.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
    /// Windowed structural similarity on luma.
    Ssim,
    /// `1 - mse / 255^2` over all channel samples.
    Mse,
    /// Correlation of color histograms.
    Histogram,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Ssim => "ssim",
            Method::Mse => "mse",
            Method::Histogram => "histogram",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = VisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ssim" => Ok(Method::Ssim),
            "mse" => Ok(Method::Mse),
            "histogram" => Ok(Method::Histogram),
            other => Err(VisionError::invalid_argument(format!(
                "unknown comparison method {other:?}; expected ssim, mse or histogram"
            ))),
        }
    }
}

/// Upper bound for [`CompareConfig::histogram_bins`]; one bin per 8-bit level.
pub const MAX_HISTOGRAM_BINS: usize = 256;

/// Tuning for [`Comparator`].
#[derive(Clone, Copy, Debug)]
pub struct CompareConfig {
    /// Side of the square SSIM window.
    pub ssim_window: usize,
    /// Histogram bins per channel (joint over RGB), at most [`MAX_HISTOGRAM_BINS`].
    pub histogram_bins: usize,
    /// Maximum relative aspect-ratio difference tolerated before resizing.
    pub aspect_tolerance: f64,
    /// Attach a binary difference mask to each result.
    pub with_diff_mask: bool,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            ssim_window: 7,
            histogram_bins: 32,
            aspect_tolerance: 0.05,
            with_diff_mask: false,
        }
    }
}

/// Outcome of one comparison.
#[derive(Clone, Debug, PartialEq)]
pub struct ComparisonResult {
    /// Score in `[0, 1]`; 1 means identical under the metric.
    pub similarity: f64,
    /// `similarity >= threshold`.
    pub is_match: bool,
    pub method: Method,
    pub threshold: f64,
    /// Single-channel mask, 255 where pixels differ by at least [`DIFF_THRESHOLD`].
    pub diff_mask: Option<Image>,
}

/// Reusable comparator carrying a [`CompareConfig`].
#[derive(Clone, Debug, Default)]
pub struct Comparator {
    cfg: CompareConfig,
}

impl Comparator {
    pub fn new(cfg: CompareConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &CompareConfig {
        &self.cfg
    }

    /// Scores `img_a` against `img_b` and applies `threshold`.
    pub fn compare(
        &self,
        img_a: &Image,
        img_b: &Image,
        method: Method,
        threshold: f64,
    ) -> VisionResult<ComparisonResult> {
        if !threshold.is_finite() {
            return Err(VisionError::invalid_argument("threshold must be finite"));
        }
        if self.cfg.ssim_window == 0 {
            return Err(VisionError::invalid_argument("ssim_window must be positive"));
        }
        if !(1..=MAX_HISTOGRAM_BINS).contains(&self.cfg.histogram_bins) {
            return Err(VisionError::invalid_argument(format!(
                "histogram_bins must be in 1..={MAX_HISTOGRAM_BINS}, got {}",
                self.cfg.histogram_bins
            )));
        }
        let _span = trace_span!("compare", method = method.as_str()).entered();

        let (a, b) = align_pair(img_a, img_b, self.cfg.aspect_tolerance)?;
        let similarity = match method {
            Method::Ssim => ssim::mean_ssim(&a.to_gray(), &b.to_gray(), self.cfg.ssim_window),
            Method::Mse => mse::mse_similarity(&a, &b),
            Method::Histogram => histogram::histogram_similarity(&a, &b, self.cfg.histogram_bins),
        };
        let diff_mask = if self.cfg.with_diff_mask {
            Some(diff::mask_aligned(&a, &b))
        } else {
            None
        };

        trace_event!("similarity", score = similarity, threshold = threshold);
        Ok(ComparisonResult {
            similarity,
            is_match: similarity >= threshold,
            method,
            threshold,
            diff_mask,
        })
    }
}

/// Compares two images with the default configuration.
pub fn compare(
    img_a: &Image,
    img_b: &Image,
    method: Method,
    threshold: f64,
) -> VisionResult<ComparisonResult> {
    Comparator::default().compare(img_a, img_b, method, threshold)
}

/// Fails with `DimensionMismatch` when the aspect ratios are too far apart.
pub(crate) fn check_aspect(a: &Image, b: &Image, tolerance: f64) -> VisionResult<()> {
    let ar_a = a.width() as f64 / a.height() as f64;
    let ar_b = b.width() as f64 / b.height() as f64;
    let rel = (ar_a - ar_b).abs() / ar_a.max(ar_b);
    if rel > tolerance {
        return Err(VisionError::DimensionMismatch {
            width_a: a.width(),
            height_a: a.height(),
            width_b: b.width(),
            height_b: b.height(),
        });
    }
    Ok(())
}

/// Brings both images to a common channel layout and size.
fn align_pair<'a>(
    a: &'a Image,
    b: &'a Image,
    tolerance: f64,
) -> VisionResult<(Cow<'a, Image>, Cow<'a, Image>)> {
    let (mut a, mut b) = if a.channels() == b.channels() {
        (Cow::Borrowed(a), Cow::Borrowed(b))
    } else {
        (Cow::Owned(a.to_rgb()), Cow::Owned(b.to_rgb()))
    };
    if a.dimensions() == b.dimensions() {
        return Ok((a, b));
    }

    check_aspect(&a, &b, tolerance)?;
    let area_a = a.width() * a.height();
    let area_b = b.width() * b.height();
    if area_b <= area_a {
        b = Cow::Owned(b.resize(a.width(), a.height())?);
    } else {
        a = Cow::Owned(a.resize(b.width(), b.height())?);
    }
    Ok((a, b))
}
