//! Mean squared error inverted into a similarity score.

use crate::image::Image;
use crate::util::math::clamp_unit;

const MAX_SQ_DIFF: f64 = 255.0 * 255.0;

/// `1 - mse / 255^2` over every channel sample of two aligned images.
pub(crate) fn mse_similarity(a: &Image, b: &Image) -> f64 {
    debug_assert_eq!(a.data().len(), b.data().len());
    let sse: u64 = a
        .data()
        .iter()
        .zip(b.data())
        .map(|(&va, &vb)| {
            let d = i64::from(va) - i64::from(vb);
            (d * d) as u64
        })
        .sum();
    let mse = sse as f64 / a.data().len() as f64;
    clamp_unit(1.0 - mse / MAX_SQ_DIFF)
}
