//! Outlier detection: baselines, threshold classification and event periods.

pub mod baseline;
pub mod classifier;
pub mod periods;
pub mod registry;
pub mod sigma;

use crate::data::Sample;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use baseline::Baseline;
pub use classifier::{Classification, ThresholdClassifier, ThresholdParameters};
pub use periods::PeriodTracker;
pub use registry::DetectorRegistry;
pub use sigma::{ThreeSigmaDetector, THREE_SIGMAS};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DetectError {
    #[error("cannot compute a baseline over an empty series")]
    EmptySeries,
    #[error("detection method {0:?} is not implemented")]
    UnknownMethod(String),
}

/// A bounded time interval during which samples shared one outlier class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPeriod {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Output of one detection run over one series.
///
/// Both lists are in close order, which is chronological.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Detection {
    pub warnings: Vec<EventPeriod>,
    pub alarms: Vec<EventPeriod>,
}

impl Detection {
    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty() && self.alarms.is_empty()
    }
}

/// A detection strategy registered under a method name.
///
/// `series_end` closes any period still open after the last sample; it is
/// usually the end of the collection window, not the last sample's timestamp.
pub trait OutlierDetector: Send + Sync {
    fn detect(
        &self,
        series: &[Sample],
        series_end: DateTime<Utc>,
    ) -> Result<Detection, DetectError>;
}
