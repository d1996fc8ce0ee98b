use super::sample::{total_weight, Sample};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Key of the series that carries the metric without any breakdown.
pub const TOTAL_ATTRIBUTE: &str = "Total";

/// Separator between the levels of an attribute path.
pub const PATH_SEPARATOR: char = '>';

/// Everything collected for one site over one window.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteData {
    pub site_id: String,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub metrics: Vec<MetricData>,
}

/// All series of one metric, broken down by attribute path.
///
/// `attributes` fixes the iteration order; `attribute_data` holds the series.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricData {
    pub metric: String,
    pub unit: String,
    pub attributes: Vec<String>,
    pub attribute_data: HashMap<String, Vec<Sample>>,
}

impl MetricData {
    pub fn new(metric: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            metric: metric.into(),
            unit: unit.into(),
            ..Default::default()
        }
    }

    /// Append a series, keeping the insertion order of attributes.
    pub fn push_series(&mut self, attribute: impl Into<String>, series: Vec<Sample>) {
        let attribute = attribute.into();
        if self.attribute_data.insert(attribute.clone(), series).is_none() {
            self.attributes.push(attribute);
        }
    }

    pub fn series(&self, attribute: &str) -> Option<&[Sample]> {
        self.attribute_data.get(attribute).map(Vec::as_slice)
    }

    /// Attributes in source order paired with their series.
    /// Attributes listed without data are skipped.
    pub fn iter_series(&self) -> impl Iterator<Item = (&str, &[Sample])> {
        self.attributes.iter().filter_map(move |attribute| {
            self.attribute_data
                .get(attribute)
                .map(|series| (attribute.as_str(), series.as_slice()))
        })
    }

    /// Summed weight of one attribute's series (0 when absent).
    pub fn samples_count(&self, attribute: &str) -> u64 {
        self.series(attribute).map(total_weight).unwrap_or(0)
    }

    /// Rank of an attribute among its siblings, 1-based.
    ///
    /// Siblings share the same parent path. Higher total weight ranks first;
    /// equal weights fall back to alphabetical order.
    pub fn rank(&self, attribute: &str) -> usize {
        let parent = attribute_parent(attribute);
        let own = self.samples_count(attribute);

        1 + self
            .attributes
            .iter()
            .filter(|other| other.as_str() != attribute)
            .filter(|other| attribute_parent(other) == parent)
            .filter(|other| {
                let theirs = self.samples_count(other);
                theirs > own || (theirs == own && other.as_str() < attribute)
            })
            .count()
    }

    /// Remove an attribute together with its series.
    pub fn remove_attribute(&mut self, attribute: &str) {
        self.attributes.retain(|a| a != attribute);
        self.attribute_data.remove(attribute);
    }
}

/// Depth of an attribute path: `"Total"` is 0, `"Browser>Chrome>v2"` is 2.
pub fn attribute_level(attribute: &str) -> usize {
    attribute.matches(PATH_SEPARATOR).count()
}

/// First segment of an attribute path.
pub fn attribute_root(attribute: &str) -> &str {
    attribute.split(PATH_SEPARATOR).next().unwrap_or(attribute)
}

/// Path without its last segment, or `""` for a top-level attribute.
pub fn attribute_parent(attribute: &str) -> &str {
    attribute
        .rfind(PATH_SEPARATOR)
        .map(|idx| &attribute[..idx])
        .unwrap_or("")
}
