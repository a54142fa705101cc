//! Log-attenuation mapping.
//!
//! Maps a raw value (LiDAR intensity, |Radar velocity|) to a colormap position:
//!
//! `p = 1 - ln(v) / ln(exp(-coefficient * reference_range))`
//!
//! With the defaults (0.004, 100 m) the denominator is `-0.4`. `v` is clamped to
//! `min_value` before the log so zero, negative and NaN inputs all land on the
//! same finite position.

use contracts::AttenuationConfig;

/// Attenuation model for one sensor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttenuationModel {
    min_value: f64,
    /// ln(exp(-coefficient * reference_range))
    denominator: f64,
}

impl AttenuationModel {
    /// Build a model. `coefficient` and `reference_range` must be positive
    /// (checked by the config validator).
    pub fn new(coefficient: f64, reference_range: f64, min_value: f64) -> Self {
        Self {
            min_value,
            denominator: -coefficient * reference_range,
        }
    }

    /// Colormap position of `value`. Not clamped to [0, 1]; the table does that.
    #[inline]
    pub fn position(&self, value: f64) -> f64 {
        let v = if value.is_nan() {
            self.min_value
        } else {
            value.max(self.min_value)
        };
        1.0 - v.ln() / self.denominator
    }

    pub fn min_value(&self) -> f64 {
        self.min_value
    }
}

impl Default for AttenuationModel {
    fn default() -> Self {
        Self::from(&AttenuationConfig::default())
    }
}

impl From<&AttenuationConfig> for AttenuationModel {
    fn from(config: &AttenuationConfig) -> Self {
        Self::new(config.coefficient, config.reference_range, config.min_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_value_maps_to_one() {
        let model = AttenuationModel::default();
        assert!((model.position(1.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn default_denominator_is_minus_point_four() {
        let model = AttenuationModel::default();
        let expected = 1.0 - 0.5f64.ln() / -0.4;
        assert!((model.position(0.5) - expected).abs() < 1e-12);
    }

    #[test]
    fn position_non_increasing_as_value_decreases() {
        let model = AttenuationModel::default();
        let mut prev = model.position(1.0);
        let mut v = 1.0;
        while v > 1e-8 {
            v *= 0.9;
            let p = model.position(v);
            assert!(p <= prev, "p({v}) = {p} > previous {prev}");
            prev = p;
        }
    }

    #[test]
    fn zero_negative_and_nan_use_epsilon() {
        let model = AttenuationModel::default();
        let at_eps = model.position(model.min_value());
        assert!(at_eps.is_finite());
        assert_eq!(model.position(0.0), at_eps);
        assert_eq!(model.position(-3.0), at_eps);
        assert_eq!(model.position(f64::NAN), at_eps);
    }

    #[test]
    fn custom_config() {
        let model = AttenuationModel::from(&AttenuationConfig {
            coefficient: 0.01,
            reference_range: 50.0,
            min_value: 1e-3,
        });
        let expected = 1.0 - 0.25f64.ln() / -0.5;
        assert!((model.position(0.25) - expected).abs() < 1e-12);
    }
}
