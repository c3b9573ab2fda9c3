//! Mean structural similarity over sliding square windows.
//!
//! Uniform `win x win` windows at stride 1, sample (n - 1) covariance and the
//! usual stabilisers `C1 = (0.01 * 255)^2`, `C2 = (0.03 * 255)^2`. Window
//! statistics come from summed-area tables, so cost is linear in pixel count.

use crate::image::Image;
use crate::util::math::{clamp_unit, SummedArea};

const C1: f64 = (0.01 * 255.0) * (0.01 * 255.0);
const C2: f64 = (0.03 * 255.0) * (0.03 * 255.0);

/// Mean SSIM of two same-sized luma images, clamped to `[0, 1]`.
///
/// The window shrinks to the smaller image side when the image is tinier than
/// `window`.
pub(crate) fn mean_ssim(a: &Image, b: &Image, window: usize) -> f64 {
    debug_assert_eq!(a.dimensions(), b.dimensions());
    debug_assert!(a.channels() == 1 && b.channels() == 1);

    let (width, height) = a.dimensions();
    let win = window.min(width).min(height).max(1);
    let pa = a.data();
    let pb = b.data();
    let at = |p: &[u8], x: usize, y: usize| u64::from(p[y * width + x]);

    let sum_a = SummedArea::build(width, height, |x, y| at(pa, x, y));
    let sum_b = SummedArea::build(width, height, |x, y| at(pb, x, y));
    let sum_aa = SummedArea::build(width, height, |x, y| at(pa, x, y) * at(pa, x, y));
    let sum_bb = SummedArea::build(width, height, |x, y| at(pb, x, y) * at(pb, x, y));
    let sum_ab = SummedArea::build(width, height, |x, y| at(pa, x, y) * at(pb, x, y));

    let n = (win * win) as f64;
    let dof = if win * win > 1 { n - 1.0 } else { 1.0 };
    let mut total = 0.0f64;
    let mut count = 0usize;
    for y in 0..=(height - win) {
        for x in 0..=(width - win) {
            let sa = sum_a.window(x, y, win, win) as f64;
            let sb = sum_b.window(x, y, win, win) as f64;
            let saa = sum_aa.window(x, y, win, win) as f64;
            let sbb = sum_bb.window(x, y, win, win) as f64;
            let sab = sum_ab.window(x, y, win, win) as f64;

            let mu_a = sa / n;
            let mu_b = sb / n;
            let var_a = (saa - sa * sa / n) / dof;
            let var_b = (sbb - sb * sb / n) / dof;
            let cov = (sab - sa * sb / n) / dof;

            let num = (2.0 * mu_a * mu_b + C1) * (2.0 * cov + C2);
            let den = (mu_a * mu_a + mu_b * mu_b + C1) * (var_a + var_b + C2);
            total += num / den;
            count += 1;
        }
    }

    clamp_unit(total / count as f64)
}
