//! Numeric helpers shared by the comparison and matching kernels.

/// Summed-area table over a single-channel plane.
///
/// Stores `(width + 1) * (height + 1)` prefix sums so any axis-aligned window
/// sum is four lookups. Sums are exact (`u64`).
pub(crate) struct SummedArea {
    stride: usize,
    table: Vec<u64>,
}

impl SummedArea {
    /// Builds a table where each cell contributes `f(x, y)`.
    pub(crate) fn build(width: usize, height: usize, f: impl Fn(usize, usize) -> u64) -> Self {
        let stride = width + 1;
        let mut table = vec![0u64; stride * (height + 1)];
        for y in 0..height {
            let mut row_sum = 0u64;
            for x in 0..width {
                row_sum += f(x, y);
                table[(y + 1) * stride + x + 1] = table[y * stride + x + 1] + row_sum;
            }
        }
        Self { stride, table }
    }

    /// Sum over the window with top-left `(x, y)` and size `w x h`.
    #[inline]
    pub(crate) fn window(&self, x: usize, y: usize, w: usize, h: usize) -> u64 {
        let s = self.stride;
        let a = self.table[y * s + x];
        let b = self.table[y * s + x + w];
        let c = self.table[(y + h) * s + x];
        let d = self.table[(y + h) * s + x + w];
        d + a - b - c
    }
}

/// Pearson correlation of two equal-length series.
///
/// Returns `None` when either series has zero variance.
pub(crate) fn pearson(a: &[f64], b: &[f64]) -> Option<f64> {
    debug_assert_eq!(a.len(), b.len());
    let n = a.len() as f64;
    if a.is_empty() {
        return None;
    }
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;
    let mut cov = 0.0f64;
    let mut var_a = 0.0f64;
    let mut var_b = 0.0f64;
    for (&va, &vb) in a.iter().zip(b) {
        let da = va - mean_a;
        let db = vb - mean_b;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }
    if var_a <= f64::EPSILON || var_b <= f64::EPSILON {
        return None;
    }
    Some(cov / (var_a * var_b).sqrt())
}

/// Clamps a score into `[0, 1]`, mapping NaN to 0.
#[inline]
pub(crate) fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
