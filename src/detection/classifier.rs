use super::Baseline;
use serde::{Deserialize, Serialize};

/// Multipliers of the standard deviation that bound warnings and alarms.
///
/// `strong_multiplier >= weak_multiplier` is expected but not enforced; when it
/// does not hold the strong limit still takes precedence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdParameters {
    #[serde(rename = "outliersMultiplier")]
    pub weak_multiplier: f64,
    #[serde(rename = "strongOutliersMultiplier")]
    pub strong_multiplier: f64,
}

impl Default for ThresholdParameters {
    fn default() -> Self {
        Self {
            weak_multiplier: 2.0,
            strong_multiplier: 3.0,
        }
    }
}

impl ThresholdParameters {
    pub fn new(weak_multiplier: f64, strong_multiplier: f64) -> Self {
        Self {
            weak_multiplier,
            strong_multiplier,
        }
    }
}

/// Outlier class of a single sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    Normal,
    /// Beyond the weak limit: part of a warning.
    Weak,
    /// Beyond the strong limit: part of an alarm.
    Strong,
}

impl Classification {
    pub fn is_outlier(self) -> bool {
        !matches!(self, Classification::Normal)
    }
}

/// Classifies values against limits derived from a baseline.
#[derive(Debug, Clone, Copy)]
pub struct ThresholdClassifier {
    mean: f64,
    weak_limit: f64,
    strong_limit: f64,
}

impl ThresholdClassifier {
    pub fn new(baseline: &Baseline, params: &ThresholdParameters) -> Self {
        Self {
            mean: baseline.mean,
            weak_limit: params.weak_multiplier * baseline.stddev,
            strong_limit: params.strong_multiplier * baseline.stddev,
        }
    }

    pub fn weak_limit(&self) -> f64 {
        self.weak_limit
    }

    pub fn strong_limit(&self) -> f64 {
        self.strong_limit
    }

    /// Comparisons are strict: a deviation equal to a limit stays on the
    /// lower side. Strong is checked first.
    pub fn classify(&self, value: f64) -> Classification {
        let deviation = (value - self.mean).abs();

        if deviation > self.strong_limit {
            Classification::Strong
        } else if deviation > self.weak_limit {
            Classification::Weak
        } else {
            Classification::Normal
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn baseline(mean: f64, stddev: f64) -> Baseline {
        Baseline {
            mean,
            stddev,
            sample_count: 10,
        }
    }

    #[test]
    fn test_limits_scale_with_stddev() {
        let classifier =
            ThresholdClassifier::new(&baseline(100.0, 10.0), &ThresholdParameters::new(2.0, 3.0));
        assert_eq!(classifier.weak_limit(), 20.0);
        assert_eq!(classifier.strong_limit(), 30.0);
    }

    #[test]
    fn test_classification_bands() {
        let classifier =
            ThresholdClassifier::new(&baseline(100.0, 10.0), &ThresholdParameters::new(2.0, 3.0));
        assert_eq!(classifier.classify(105.0), Classification::Normal);
        assert_eq!(classifier.classify(125.0), Classification::Weak);
        assert_eq!(classifier.classify(75.0), Classification::Weak);
        assert_eq!(classifier.classify(131.0), Classification::Strong);
        assert_eq!(classifier.classify(60.0), Classification::Strong);
    }

    #[test]
    fn test_values_on_a_limit_are_not_promoted() {
        let classifier =
            ThresholdClassifier::new(&baseline(100.0, 10.0), &ThresholdParameters::new(2.0, 3.0));
        assert_eq!(classifier.classify(120.0), Classification::Normal);
        assert_eq!(classifier.classify(80.0), Classification::Normal);
        assert_eq!(classifier.classify(130.0), Classification::Weak);
        assert_eq!(classifier.classify(70.0), Classification::Weak);
    }

    #[test]
    fn test_zero_stddev_flags_any_deviation() {
        let classifier =
            ThresholdClassifier::new(&baseline(5.0, 0.0), &ThresholdParameters::new(2.0, 3.0));
        assert_eq!(classifier.classify(5.0), Classification::Normal);
        assert_eq!(classifier.classify(5.001), Classification::Strong);
        assert_eq!(classifier.classify(4.999), Classification::Strong);
    }

    #[test]
    fn test_strong_wins_when_multipliers_are_inverted() {
        let classifier =
            ThresholdClassifier::new(&baseline(0.0, 1.0), &ThresholdParameters::new(3.0, 1.0));
        // Beyond the strong limit (1.0) but inside the weak one (3.0)
        assert_eq!(classifier.classify(2.0), Classification::Strong);
        assert_eq!(classifier.classify(0.5), Classification::Normal);
    }

    #[test]
    fn test_parameters_use_config_field_names() {
        let json = r#"{"outliersMultiplier": 2.5, "strongOutliersMultiplier": 4}"#;
        let params: ThresholdParameters = serde_json::from_str(json).unwrap();
        assert_eq!(params, ThresholdParameters::new(2.5, 4.0));
    }
}
