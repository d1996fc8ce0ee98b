pub mod collector;
pub mod data;
pub mod detection;
pub mod report;
pub mod utils;

// Re-export commonly used types
pub use data::{MetricData, Sample, Series, SiteData};
pub use detection::{
    Baseline, Classification, DetectError, Detection, DetectorRegistry, EventPeriod,
    OutlierDetector, PeriodTracker, ThreeSigmaDetector, ThresholdClassifier,
    ThresholdParameters,
};
pub use report::{OutlierEvent, OutlierReport, ReportAssembler};
pub use utils::AppConfig;
