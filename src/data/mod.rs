//! Collected metric data shared by the collector, the detectors and the reports.

pub mod sample;
pub mod site;

pub use sample::{total_weight, Sample, Series};
pub use site::{
    attribute_level, attribute_parent, attribute_root, MetricData, SiteData, PATH_SEPARATOR,
    TOTAL_ATTRIBUTE,
};
