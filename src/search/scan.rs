//! Dense normalized cross-correlation over every valid offset.
//!
//! For an offset `(x, y)` the score is
//! `sum(t' * I) / sqrt(var_t * var_i)` where `t'` is the zero-mean needle,
//! `var_t` its squared deviation sum and `var_i` the window's squared
//! deviation sum. With several channels each one is centered on its own mean
//! and the dot products and deviation sums are added across channels. Window
//! sums come from per-channel summed-area tables. Scores are clamped to
//! `[0, 1]`.
//!
//! Flat inputs have no correlation defined: a flat needle scores 1 against a
//! flat window whose channel means are all within half a grey level of the
//! needle's and 0 otherwise; a textured needle scores 0 against a flat window.

use crate::candidate::topk::{Peak, TopK};
use crate::image::Image;
use crate::template::TemplatePlan;
use crate::util::math::SummedArea;
use crate::util::{VisionError, VisionResult};

/// Scan configuration.
#[derive(Clone, Copy, Debug)]
pub struct ScanParams {
    /// Maximum number of peaks to retain (`usize::MAX` keeps all).
    pub topk: usize,
    /// Peaks scoring below this value are discarded.
    pub min_score: f32,
}

/// Scans `haystack` with `plan` and returns the best peaks, best first.
///
/// `haystack` must have the same channel count as the plan.
pub fn scan_ncc(
    haystack: &Image,
    plan: &TemplatePlan,
    params: ScanParams,
) -> VisionResult<Vec<Peak>> {
    let channels = plan.channels();
    if haystack.channels() != channels {
        return Err(VisionError::invalid_argument(format!(
            "haystack has {} channels, needle plan has {channels}",
            haystack.channels()
        )));
    }
    let img_width = haystack.width();
    let img_height = haystack.height();
    let tpl_width = plan.width();
    let tpl_height = plan.height();
    if tpl_width > img_width || tpl_height > img_height {
        return Err(VisionError::invalid_argument(format!(
            "needle {tpl_width}x{tpl_height} is larger than haystack {img_width}x{img_height}"
        )));
    }
    if params.topk == 0 {
        return Ok(Vec::new());
    }

    let pixels = haystack.data();
    let stride = img_width * channels;
    let sums: Vec<(SummedArea, SummedArea)> = (0..channels)
        .map(|c| {
            let at = move |x: usize, y: usize| u64::from(pixels[y * stride + x * channels + c]);
            (
                SummedArea::build(img_width, img_height, at),
                SummedArea::build(img_width, img_height, |x, y| at(x, y) * at(x, y)),
            )
        })
        .collect();

    let n = (tpl_width * tpl_height) as u128;
    let t_prime = plan.zero_mean();
    let row_len = tpl_width * channels;
    let var_t = plan.var_t();
    let flat_needle = plan.is_flat();
    let max_x = img_width - tpl_width;
    let max_y = img_height - tpl_height;

    let mut means = vec![0.0f64; channels];
    let mut topk = TopK::new(params.topk);
    for y in 0..=max_y {
        for x in 0..=max_x {
            // n * var_i summed over channels, exact in integers so flat windows are exactly zero.
            let mut var_i_n = 0u128;
            for (c, (sum_i, sum_i2)) in sums.iter().enumerate() {
                let s = u128::from(sum_i.window(x, y, tpl_width, tpl_height));
                let s2 = u128::from(sum_i2.window(x, y, tpl_width, tpl_height));
                var_i_n += n * s2 - s * s;
                means[c] = s as f64 / n as f64;
            }

            let score = if flat_needle || var_i_n == 0 {
                let same_level = means
                    .iter()
                    .zip(plan.means())
                    .all(|(mean_i, mean_t)| (mean_i - mean_t).abs() <= 0.5);
                if flat_needle && var_i_n == 0 && same_level {
                    1.0
                } else {
                    0.0
                }
            } else {
                let mut dot = 0.0f64;
                for ty in 0..tpl_height {
                    let start = (y + ty) * stride + x * channels;
                    let img_row = &pixels[start..start + row_len];
                    let tpl_row = &t_prime[ty * row_len..(ty + 1) * row_len];
                    for (&t, &v) in tpl_row.iter().zip(img_row) {
                        dot += t * f64::from(v);
                    }
                }
                let var_i = var_i_n as f64 / n as f64;
                (dot / (var_t * var_i).sqrt()).clamp(0.0, 1.0)
            };

            let score = score as f32;
            if score.is_finite() && score >= params.min_score {
                topk.push(Peak { x, y, score });
            }
        }
    }

    Ok(topk.into_sorted_desc())
}
