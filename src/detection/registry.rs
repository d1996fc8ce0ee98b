use super::{DetectError, Detection, OutlierDetector, ThreeSigmaDetector, THREE_SIGMAS};
use crate::data::Sample;
use crate::utils::config::DetectionMethodsConfig;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::{warn, Span};

/// Detection methods keyed by their configured name.
#[derive(Default)]
pub struct DetectorRegistry {
    detectors: HashMap<String, Box<dyn OutlierDetector>>,
}

impl DetectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in method with its configured parameters.
    pub fn from_config(methods: &DetectionMethodsConfig) -> Self {
        let mut registry = Self::new();
        registry.register(THREE_SIGMAS, ThreeSigmaDetector::new(methods.three_sigmas));
        registry
    }

    /// Add or replace the detector behind `name`.
    pub fn register(&mut self, name: impl Into<String>, detector: impl OutlierDetector + 'static) {
        self.detectors.insert(name.into(), Box::new(detector));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.detectors.contains_key(name)
    }

    /// Registered method names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.detectors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn detect(
        &self,
        method: &str,
        series: &[Sample],
        series_end: DateTime<Utc>,
    ) -> Result<Detection, DetectError> {
        let detector = self
            .detectors
            .get(method)
            .ok_or_else(|| DetectError::UnknownMethod(method.to_string()))?;
        detector.detect(series, series_end)
    }

    /// Like `detect`, but a failure only costs this series: it is logged
    /// under `span` and an empty detection is returned.
    pub fn run(
        &self,
        method: &str,
        series: &[Sample],
        series_end: DateTime<Utc>,
        span: &Span,
    ) -> Detection {
        match self.detect(method, series, series_end) {
            Ok(detection) => detection,
            Err(e) => {
                warn!(parent: span, method, error = %e, "Detection skipped");
                Detection::default()
            }
        }
    }
}

impl std::fmt::Debug for DetectorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetectorRegistry")
            .field("methods", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::{EventPeriod, ThresholdParameters};
    use chrono::{Duration, TimeZone};

    fn series(values: &[f64]) -> Vec<Sample> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| Sample::new(start + Duration::hours(i as i64), v, 1))
            .collect()
    }

    /// Flags every sample as one alarm, for dispatch tests.
    struct EverythingIsAnAlarm;

    impl OutlierDetector for EverythingIsAnAlarm {
        fn detect(
            &self,
            series: &[Sample],
            series_end: DateTime<Utc>,
        ) -> Result<Detection, DetectError> {
            let first = series.first().ok_or(DetectError::EmptySeries)?;
            Ok(Detection {
                warnings: vec![],
                alarms: vec![EventPeriod {
                    start: first.timestamp,
                    end: series_end,
                }],
            })
        }
    }

    #[test]
    fn test_builtin_methods_are_registered() {
        let registry = DetectorRegistry::from_config(&DetectionMethodsConfig::default());
        assert!(registry.contains(THREE_SIGMAS));
        assert_eq!(registry.names(), vec![THREE_SIGMAS]);
    }

    #[test]
    fn test_unknown_method_is_an_error() {
        let registry = DetectorRegistry::from_config(&DetectionMethodsConfig::default());
        let data = series(&[1.0, 2.0, 3.0]);
        let result = registry.detect("isolation-forest", &data, data[2].timestamp);
        assert_eq!(
            result,
            Err(DetectError::UnknownMethod("isolation-forest".to_string()))
        );
    }

    #[test]
    fn test_run_swallows_failures() {
        let registry = DetectorRegistry::from_config(&DetectionMethodsConfig::default());
        let data = series(&[1.0, 2.0, 3.0]);
        let span = Span::none();

        assert!(registry.run("isolation-forest", &data, data[2].timestamp, &span).is_empty());
        assert!(registry.run(THREE_SIGMAS, &[], data[2].timestamp, &span).is_empty());
    }

    #[test]
    fn test_registered_method_is_dispatched() {
        let mut registry = DetectorRegistry::new();
        registry.register("always", EverythingIsAnAlarm);
        let data = series(&[1.0, 1.0]);
        let end = data[1].timestamp + Duration::hours(1);

        let detection = registry.detect("always", &data, end).unwrap();
        assert_eq!(detection.alarms.len(), 1);
        assert_eq!(detection.alarms[0].end, end);
    }

    #[test]
    fn test_configured_parameters_reach_the_detector() {
        let methods = DetectionMethodsConfig {
            three_sigmas: ThresholdParameters::new(0.5, 100.0),
        };
        let registry = DetectorRegistry::from_config(&methods);
        let data = series(&[10.0, 10.0, 10.0, 20.0, 10.0, 10.0]);

        let detection = registry.detect(THREE_SIGMAS, &data, data[5].timestamp).unwrap();
        assert!(detection.alarms.is_empty());
        assert_eq!(detection.warnings.len(), 1);
        assert_eq!(detection.warnings[0].start, data[3].timestamp);
        assert_eq!(detection.warnings[0].end, data[4].timestamp);
    }
}
