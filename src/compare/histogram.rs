//! Color-histogram correlation.
//!
//! Pixels are binned jointly over their color channels (alpha ignored), with
//! `bins` buckets per channel, and the two histograms are compared with the
//! Pearson correlation coefficient. A joint histogram keeps channels that are
//! constant in both images (e.g. the green channel of pure red vs pure blue)
//! from inflating the score.

use crate::image::Image;
use crate::util::math::{clamp_unit, pearson};

/// Correlation of the joint color histograms of two aligned images, in `[0, 1]`.
pub(crate) fn histogram_similarity(a: &Image, b: &Image, bins: usize) -> f64 {
    let ha = joint_histogram(a, bins);
    let hb = joint_histogram(b, bins);
    if ha == hb {
        return 1.0;
    }
    match pearson(&ha, &hb) {
        Some(r) => clamp_unit(r),
        None => 0.0,
    }
}

/// Normalised joint histogram (bucket frequencies summing to 1).
fn joint_histogram(img: &Image, bins: usize) -> Vec<f64> {
    let color_channels = img.channels().min(3);
    let size = bins.pow(color_channels as u32);
    let mut hist = vec![0.0f64; size];
    for px in img.data().chunks_exact(img.channels()) {
        let mut idx = 0usize;
        for &value in &px[..color_channels] {
            idx = idx * bins + usize::from(value) * bins / 256;
        }
        hist[idx] += 1.0;
    }
    let total = (img.width() * img.height()) as f64;
    for v in hist.iter_mut() {
        *v /= total;
    }
    hist
}

#[cfg(test)]
mod tests {
    use super::histogram_similarity;
    use crate::image::Image;

    #[test]
    fn solid_red_and_blue_do_not_correlate() {
        let red = Image::filled(10, 10, &[255, 0, 0]).unwrap();
        let blue = Image::filled(10, 10, &[0, 0, 255]).unwrap();
        assert!(histogram_similarity(&red, &blue, 32) < 0.01);
    }

    #[test]
    fn shuffled_pixels_share_a_histogram() {
        let a = Image::new(vec![0, 50, 100, 150, 200, 250], 3, 2, 1).unwrap();
        let b = Image::new(vec![250, 200, 150, 100, 50, 0], 3, 2, 1).unwrap();
        assert_eq!(histogram_similarity(&a, &b, 32), 1.0);
    }
}
