//! Locating a needle image inside a haystack image.
//!
//! Matching runs zero-mean normalized cross-correlation at every valid offset.
//! When both images carry color the RGB channels are correlated jointly, so a
//! shape that only changed hue does not match; otherwise both sides are
//! reduced to luma. The best offset wins; equal scores resolve in reading order
//! (smallest `y`, then smallest `x`).

use crate::candidate::nms::nms_2d;
use crate::geometry::{BoundingBox, Point};
use crate::image::Image;
use crate::template::TemplatePlan;
use crate::trace::{trace_event, trace_span};
use crate::util::{VisionError, VisionResult};

pub mod scan;

pub use crate::candidate::topk::Peak;
pub use scan::{scan_ncc, ScanParams};

/// Range a [`MatchLocation::confidence`] is expressed in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfidenceScale {
    /// Correlation score in `[0, 1]` (template matching).
    Unit,
    /// OCR confidence in `[0, 100]`.
    Percent,
}

/// Where something was found and how sure the finder is.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MatchLocation {
    pub bbox: BoundingBox,
    pub confidence: f32,
    pub scale: ConfidenceScale,
}

impl MatchLocation {
    /// Click point at the center of the match.
    pub fn center(&self) -> Point {
        self.bbox.center()
    }
}

/// Matcher configuration.
#[derive(Clone, Copy, Debug)]
pub struct MatchConfig {
    /// Minimum correlation for a location to be reported.
    pub confidence_threshold: f32,
    /// Upper bound on locations returned by [`Matcher::find_all`].
    pub max_results: usize,
    /// Suppression radius for [`Matcher::find_all`]; `None` uses half the
    /// needle's smaller side.
    pub nms_radius: Option<usize>,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.8,
            max_results: 16,
            nms_radius: None,
        }
    }
}

/// Template matcher with a precomputed needle plan.
pub struct Matcher {
    plan: TemplatePlan,
    /// Luma fallback for color needles searched in gray haystacks.
    luma: Option<TemplatePlan>,
    cfg: MatchConfig,
}

impl Matcher {
    /// Prepares `needle` for repeated searches.
    pub fn new(needle: &Image) -> Self {
        let plan = TemplatePlan::from_image(needle);
        let luma = (plan.channels() > 1).then(|| TemplatePlan::from_luma(needle));
        Self {
            plan,
            luma,
            cfg: MatchConfig::default(),
        }
    }

    /// Overrides the matcher configuration.
    pub fn with_config(mut self, cfg: MatchConfig) -> Self {
        self.cfg = cfg;
        self
    }

    pub fn config(&self) -> &MatchConfig {
        &self.cfg
    }

    pub fn plan(&self) -> &TemplatePlan {
        &self.plan
    }

    /// Best location of the needle, or `None` when it scores below the threshold.
    pub fn find(&self, haystack: &Image) -> VisionResult<Option<MatchLocation>> {
        check_threshold(self.cfg.confidence_threshold)?;
        let _span = trace_span!(
            "template_scan",
            haystack_w = haystack.width(),
            haystack_h = haystack.height(),
            needle_w = self.plan.width(),
            needle_h = self.plan.height()
        )
        .entered();

        let (pixels, plan) = self.prepare(haystack);
        let params = ScanParams {
            topk: 1,
            min_score: f32::NEG_INFINITY,
        };
        let best = scan_ncc(&pixels, plan, params)?.into_iter().next();
        let Some(best) = best else {
            return Ok(None);
        };

        trace_event!("best_score", score = best.score, x = best.x, y = best.y);
        if best.score < self.cfg.confidence_threshold {
            return Ok(None);
        }
        Ok(Some(self.location(best.x, best.y, best.score)))
    }

    /// Every distinct location scoring at or above the threshold, best first.
    ///
    /// Overlapping hits are collapsed with Chebyshev non-maximum suppression.
    pub fn find_all(&self, haystack: &Image) -> VisionResult<Vec<MatchLocation>> {
        check_threshold(self.cfg.confidence_threshold)?;
        let _span = trace_span!("template_scan_all", max_results = self.cfg.max_results).entered();

        let (pixels, plan) = self.prepare(haystack);
        let params = ScanParams {
            topk: usize::MAX,
            min_score: self.cfg.confidence_threshold,
        };
        let mut peaks = scan_ncc(&pixels, plan, params)?;
        let radius = self
            .cfg
            .nms_radius
            .unwrap_or_else(|| self.plan.width().min(self.plan.height()) / 2);
        let mut kept = nms_2d(&mut peaks, radius);
        kept.truncate(self.cfg.max_results);

        trace_event!("matches", count = kept.len());
        Ok(kept
            .into_iter()
            .map(|peak| self.location(peak.x, peak.y, peak.score))
            .collect())
    }

    /// Picks the plan for this haystack and converts the haystack to match.
    fn prepare(&self, haystack: &Image) -> (Image, &TemplatePlan) {
        match &self.luma {
            Some(luma) if haystack.channels() == 1 => (haystack.clone(), luma),
            Some(_) => (haystack.to_rgb(), &self.plan),
            None => (haystack.to_gray(), &self.plan),
        }
    }

    fn location(&self, x: usize, y: usize, score: f32) -> MatchLocation {
        MatchLocation {
            bbox: BoundingBox::new(
                x as i32,
                y as i32,
                self.plan.width() as u32,
                self.plan.height() as u32,
            ),
            confidence: score,
            scale: ConfidenceScale::Unit,
        }
    }
}

/// Finds the best location of `needle` in `haystack`.
///
/// Returns `Ok(None)` when the best correlation is below `confidence_threshold`,
/// and `InvalidArgument` when the needle is larger than the haystack.
pub fn find(
    haystack: &Image,
    needle: &Image,
    confidence_threshold: f32,
) -> VisionResult<Option<MatchLocation>> {
    Matcher::new(needle)
        .with_config(MatchConfig {
            confidence_threshold,
            ..MatchConfig::default()
        })
        .find(haystack)
}

/// Finds up to `max_results` non-overlapping locations of `needle`.
pub fn find_all(
    haystack: &Image,
    needle: &Image,
    confidence_threshold: f32,
    max_results: usize,
) -> VisionResult<Vec<MatchLocation>> {
    Matcher::new(needle)
        .with_config(MatchConfig {
            confidence_threshold,
            max_results,
            nms_radius: None,
        })
        .find_all(haystack)
}

fn check_threshold(threshold: f32) -> VisionResult<()> {
    if threshold.is_nan() {
        return Err(VisionError::invalid_argument(
            "confidence threshold must not be NaN",
        ));
    }
    Ok(())
}
