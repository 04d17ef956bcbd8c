//! Change classification
//!
//! Two cuts: a noise floor (`min`) and an alert floor (`max`). Only moves whose
//! magnitude strictly exceeds the alert floor are reportable; everything at or
//! below it, including the band between the two floors, is suppressed.

use crate::error::ConfigError;
use crate::types::Classification;

/// Classify a percentage move against the two thresholds.
///
/// Pure and total: NaN compares false everywhere and falls through to
/// `Suppressed`.
pub fn classify(percent_change: f64, min_threshold: f64, max_threshold: f64) -> Classification {
    if percent_change.abs() <= min_threshold {
        Classification::Suppressed
    } else if percent_change > max_threshold {
        Classification::Up
    } else if percent_change < -max_threshold {
        Classification::Down
    } else {
        Classification::Suppressed
    }
}

/// Percentage change from `previous` to `current`; 0 when there is no baseline price
pub fn percent_change(previous: f64, current: f64) -> f64 {
    if previous == 0.0 {
        return 0.0;
    }
    (current - previous) / previous * 100.0
}

/// Validated threshold pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    min: f64,
    max: f64,
}

impl Thresholds {
    pub fn new(min: f64, max: f64) -> Result<Self, ConfigError> {
        if min.is_nan() || max.is_nan() || min < 0.0 || max < 0.0 {
            return Err(ConfigError::NegativeThreshold { min, max });
        }
        if min >= max {
            return Err(ConfigError::ThresholdOrder { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn classify(&self, percent_change: f64) -> Classification {
        classify(percent_change, self.min, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIN: f64 = 0.1;
    const MAX: f64 = 1.0;

    #[test]
    fn test_noise_floor_is_suppressed() {
        for pct in [0.0, 0.05, -0.05, 0.1, -0.1] {
            assert_eq!(classify(pct, MIN, MAX), Classification::Suppressed, "pct={}", pct);
        }
    }

    #[test]
    fn test_mid_band_is_suppressed() {
        for pct in [0.11, 0.5, 1.0, -0.11, -0.5, -1.0] {
            assert_eq!(classify(pct, MIN, MAX), Classification::Suppressed, "pct={}", pct);
        }
    }

    #[test]
    fn test_above_alert_floor() {
        assert_eq!(classify(1.0001, MIN, MAX), Classification::Up);
        assert_eq!(classify(2.0, MIN, MAX), Classification::Up);
        assert_eq!(classify(-1.0001, MIN, MAX), Classification::Down);
        assert_eq!(classify(-50.0, MIN, MAX), Classification::Down);
    }

    #[test]
    fn test_non_finite_inputs() {
        assert_eq!(classify(f64::NAN, MIN, MAX), Classification::Suppressed);
        assert_eq!(classify(f64::INFINITY, MIN, MAX), Classification::Up);
        assert_eq!(classify(f64::NEG_INFINITY, MIN, MAX), Classification::Down);
    }

    #[test]
    fn test_percent_change() {
        assert!((percent_change(100.0, 101.0) - 1.0).abs() < 1e-12);
        assert!((percent_change(100.0, 102.0) - 2.0).abs() < 1e-12);
        assert!((percent_change(100.0, 95.0) + 5.0).abs() < 1e-12);
        assert_eq!(percent_change(0.0, 50.0), 0.0);
    }

    #[test]
    fn test_exact_alert_floor_not_reported() {
        // 100 -> 101 is exactly +1%, which is not strictly above the alert floor
        let t = Thresholds::new(MIN, MAX).unwrap();
        assert_eq!(t.classify(percent_change(100.0, 101.0)), Classification::Suppressed);
        assert_eq!(t.classify(percent_change(100.0, 102.0)), Classification::Up);
    }

    #[test]
    fn test_thresholds_validation() {
        assert!(Thresholds::new(0.001, 0.01).is_ok());
        assert_eq!(
            Thresholds::new(1.0, 0.5),
            Err(ConfigError::ThresholdOrder { min: 1.0, max: 0.5 })
        );
        assert!(matches!(
            Thresholds::new(0.5, 0.5),
            Err(ConfigError::ThresholdOrder { .. })
        ));
        assert!(matches!(
            Thresholds::new(-0.1, 0.5),
            Err(ConfigError::NegativeThreshold { .. })
        ));
        assert!(Thresholds::new(f64::NAN, 0.5).is_err());
    }
}
