//! Collection layer: turns a dataset configuration into `SiteData`.
//!
//! There is no upstream analytics store, so series are simulated by
//! `generator` and trimmed by `filter` the way a real query would be.

pub mod filter;
pub mod generator;

use crate::data::SiteData;
use crate::utils::config::DatasetConfig;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::{info, warn};

pub use filter::{filter_metric, CollectFilters, FilterParams, FilterReason};
pub use generator::{generate_metric, profile, supported_metrics, MetricKind, MetricProfile};

/// Metric names a dataset asks for, with `"all"` expanded.
pub fn requested_metrics(dataset: &DatasetConfig) -> Vec<String> {
    match dataset.metrics.first() {
        Some(first) if first.eq_ignore_ascii_case("all") => {
            supported_metrics().map(str::to_string).collect()
        }
        _ => dataset.metrics.clone(),
    }
}

/// Collect every requested metric of one site over `[now - timeAgo, now)`.
pub fn collect_site<R: Rng>(
    dataset: &DatasetConfig,
    general_filters: &CollectFilters,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Result<SiteData> {
    let time_ago = dataset
        .time_ago_duration()
        .with_context(|| format!("site {}: timeAgo", dataset.site_id))?;
    let time_step = dataset
        .time_step_duration()
        .with_context(|| format!("site {}: timeStep", dataset.site_id))?;
    let filters = dataset.collect_filters(general_filters);

    let mut site = SiteData {
        site_id: dataset.site_id.clone(),
        window_start: now - time_ago,
        window_end: now,
        metrics: Vec::new(),
    };

    for name in requested_metrics(dataset) {
        let Some(profile) = profile(&name) else {
            warn!(site_id = %dataset.site_id, metric = %name, "Unsupported metric, skipping");
            continue;
        };

        info!(site_id = %dataset.site_id, metric = profile.name, "Collecting data");
        let mut metric =
            generate_metric(profile, site.window_start, site.window_end, time_step, rng)?;
        let removed = filter_metric(&mut metric, filters);
        info!(
            site_id = %dataset.site_id,
            metric = profile.name,
            kept = metric.attributes.len(),
            filtered = removed.len(),
            "Collected metric"
        );

        site.metrics.push(metric);
    }

    Ok(site)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn dataset(metrics: &[&str]) -> DatasetConfig {
        DatasetConfig {
            site_id: "shop-eu".to_string(),
            time_ago: "14d".to_string(),
            time_step: "1d".to_string(),
            outliers_detection_method: "3-sigmas".to_string(),
            metrics: metrics.iter().map(|m| m.to_string()).collect(),
            site_collect_filters: None,
        }
    }

    #[test]
    fn test_all_expands_to_every_metric() {
        assert_eq!(
            requested_metrics(&dataset(&["ALL"])),
            vec!["Revenue", "Basket", "Visits"]
        );
        assert_eq!(requested_metrics(&dataset(&["Visits"])), vec!["Visits"]);
    }

    #[test]
    fn test_collect_site_window_and_metrics() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let mut rng = StdRng::seed_from_u64(1);

        let config = dataset(&["Revenue", "Pageviews", "Visits"]);
        let site = collect_site(&config, &CollectFilters::default(), now, &mut rng).unwrap();

        assert_eq!(site.window_end, now);
        assert_eq!(site.window_start, now - Duration::days(14));
        let names: Vec<&str> = site.metrics.iter().map(|m| m.metric.as_str()).collect();
        assert_eq!(names, vec!["Revenue", "Visits"]);
        assert_eq!(site.metrics[0].series("Total").unwrap().len(), 14);
    }

    #[test]
    fn test_bad_duration_is_reported() {
        let mut config = dataset(&["all"]);
        config.time_step = "daily".to_string();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(collect_site(&config, &CollectFilters::default(), Utc::now(), &mut rng).is_err());
    }
}
