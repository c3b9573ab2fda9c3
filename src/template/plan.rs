//! Needle precomputation for normalized cross-correlation.

use crate::image::Image;

/// Zero-mean needle buffer and statistics, computed once per needle.
///
/// Gray needles keep one channel. Color needles keep RGB (alpha is dropped)
/// so a scan can tell apart shapes that share a luma profile.
pub struct TemplatePlan {
    width: usize,
    height: usize,
    channels: usize,
    means: Vec<f64>,
    var_t: f64,
    zero_mean: Vec<f64>,
}

impl TemplatePlan {
    /// Builds a plan in the needle's own layout: luma for gray, RGB for color.
    pub fn from_image(needle: &Image) -> Self {
        if needle.channels() == 1 {
            Self::from_pixels(needle)
        } else {
            Self::from_pixels(&needle.to_rgb())
        }
    }

    /// Builds a single-channel plan from the needle's luma.
    pub fn from_luma(needle: &Image) -> Self {
        Self::from_pixels(&needle.to_gray())
    }

    fn from_pixels(image: &Image) -> Self {
        let (width, height) = image.dimensions();
        let channels = image.channels();
        let count = (width * height) as f64;
        let data = image.data();

        let means: Vec<f64> = (0..channels)
            .map(|c| {
                let sum: f64 = data.iter().skip(c).step_by(channels).map(|&v| f64::from(v)).sum();
                sum / count
            })
            .collect();
        let zero_mean: Vec<f64> = data
            .iter()
            .enumerate()
            .map(|(i, &v)| f64::from(v) - means[i % channels])
            .collect();
        let var_t = zero_mean.iter().map(|v| v * v).sum();

        Self {
            width,
            height,
            channels,
            means,
            var_t,
            zero_mean,
        }
    }

    /// Returns the needle width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the needle height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of correlated channels, 1 or 3.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Mean intensity of each channel.
    pub fn means(&self) -> &[f64] {
        &self.means
    }

    /// Sum of squared deviations over all channels (not divided by the count).
    pub fn var_t(&self) -> f64 {
        self.var_t
    }

    /// True when every channel is constant across the needle.
    pub fn is_flat(&self) -> bool {
        self.var_t <= 1e-9
    }

    /// Zero-mean needle samples, row-major with interleaved channels.
    pub fn zero_mean(&self) -> &[f64] {
        &self.zero_mean
    }
}

#[cfg(test)]
mod tests {
    use super::TemplatePlan;
    use crate::image::Image;

    #[test]
    fn plan_matches_known_stats() {
        let needle = Image::new(vec![0u8, 1, 2, 3], 2, 2, 1).unwrap();
        let plan = TemplatePlan::from_image(&needle);
        assert_eq!((plan.width(), plan.height(), plan.channels()), (2, 2, 1));
        assert!((plan.means()[0] - 1.5).abs() < 1e-12);
        assert!((plan.var_t() - 5.0).abs() < 1e-12);
        assert_eq!(plan.zero_mean(), &[-1.5, -0.5, 0.5, 1.5]);
        assert!(!plan.is_flat());
    }

    #[test]
    fn color_plan_centers_each_channel() {
        let needle = Image::new(vec![10, 0, 255, 255, 30, 4, 255, 255], 2, 1, 4).unwrap();
        let plan = TemplatePlan::from_image(&needle);
        assert_eq!(plan.channels(), 3);
        assert_eq!(plan.means(), &[20.0, 2.0, 255.0]);
        assert_eq!(plan.zero_mean(), &[-10.0, -2.0, 0.0, 10.0, 2.0, 0.0]);
        assert!((plan.var_t() - 208.0).abs() < 1e-12);

        assert_eq!(TemplatePlan::from_luma(&needle).channels(), 1);
    }

    #[test]
    fn flat_needle_is_flagged() {
        let needle = Image::filled(3, 3, &[40, 40, 40]).unwrap();
        assert!(TemplatePlan::from_image(&needle).is_flat());
    }
}
