use crate::data::{attribute_level, attribute_root, MetricData, TOTAL_ATTRIBUTE};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Rules deciding which attribute series are worth analysing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectFilters {
    /// Minimum average weight per time step; scaled by the number of steps.
    #[serde(default)]
    pub min_visitors_per_time_step: u64,
    /// Per root attribute (e.g. `"Browser"`) depth and rank limits.
    #[serde(default)]
    pub attributes_filter_params: HashMap<String, FilterParams>,
}

/// Limits for one attribute tree. Zero disables a limit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterParams {
    /// Deepest level kept.
    #[serde(default)]
    pub level: usize,
    /// Number of best-ranked siblings kept at `level`.
    #[serde(default)]
    pub top: usize,
}

/// Why an attribute was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterReason {
    TooDeep { level: usize, limit: usize },
    NotInTop { rank: usize, top: usize },
    TooFewSamples { samples: u64, min: u64 },
}

/// Drop attributes that fail `filters`, returning what was removed.
///
/// All decisions are taken against the unfiltered metric, so ranks are not
/// affected by removals made in the same pass.
pub fn filter_metric(
    metric: &mut MetricData,
    filters: &CollectFilters,
) -> Vec<(String, FilterReason)> {
    let steps = metric.series(TOTAL_ATTRIBUTE).map(<[_]>::len).unwrap_or(0) as u64;
    let min_samples = filters.min_visitors_per_time_step * steps;

    let removed: Vec<(String, FilterReason)> = metric
        .attributes
        .iter()
        .filter_map(|attribute| {
            rejection(metric, attribute, filters, min_samples)
                .map(|reason| (attribute.clone(), reason))
        })
        .collect();

    for (attribute, reason) in &removed {
        debug!(metric = %metric.metric, %attribute, ?reason, "Filtering attribute");
        metric.remove_attribute(attribute);
    }

    removed
}

fn rejection(
    metric: &MetricData,
    attribute: &str,
    filters: &CollectFilters,
    min_samples: u64,
) -> Option<FilterReason> {
    let level = attribute_level(attribute);
    let params = filters
        .attributes_filter_params
        .get(attribute_root(attribute))
        .copied()
        .unwrap_or_default();

    if params.level != 0 && level > params.level {
        return Some(FilterReason::TooDeep {
            level,
            limit: params.level,
        });
    }

    if params.level != 0 && params.top != 0 && level == params.level {
        let rank = metric.rank(attribute);
        if rank > params.top {
            return Some(FilterReason::NotInTop {
                rank,
                top: params.top,
            });
        }
    }

    let samples = metric.samples_count(attribute);
    if samples < min_samples {
        return Some(FilterReason::TooFewSamples {
            samples,
            min: min_samples,
        });
    }

    None
}
