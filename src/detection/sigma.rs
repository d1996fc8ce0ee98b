use super::{
    Baseline, DetectError, Detection, OutlierDetector, PeriodTracker, ThresholdClassifier,
    ThresholdParameters,
};
use crate::data::Sample;
use chrono::{DateTime, Utc};

/// Registry name of the standard-deviation method.
pub const THREE_SIGMAS: &str = "3-sigmas";

/// Standard-deviation threshold detector
///
/// Algorithm:
/// 1. Compute mean and population stddev over the whole series
/// 2. Derive weak and strong limits as multiples of the stddev
/// 3. Classify every sample by its distance from the mean
/// 4. Merge consecutive samples of the same class into periods
#[derive(Debug, Clone, Copy)]
pub struct ThreeSigmaDetector {
    params: ThresholdParameters,
}

impl ThreeSigmaDetector {
    pub fn new(params: ThresholdParameters) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ThresholdParameters {
        &self.params
    }
}

impl OutlierDetector for ThreeSigmaDetector {
    fn detect(
        &self,
        series: &[Sample],
        series_end: DateTime<Utc>,
    ) -> Result<Detection, DetectError> {
        let baseline = Baseline::from_series(series)?;
        let classifier = ThresholdClassifier::new(&baseline, &self.params);

        let mut tracker = PeriodTracker::new();
        for (index, sample) in series.iter().enumerate() {
            tracker.observe(index, sample.timestamp, classifier.classify(sample.value));
        }

        Ok(tracker.finish(series_end))
    }
}
