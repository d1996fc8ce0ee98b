use crate::data::{
    attribute_level, attribute_parent, MetricData, Sample, PATH_SEPARATOR, TOTAL_ATTRIBUTE,
};
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use statrs::distribution::Normal;
use tracing::debug;

/// Probability that an outlier burst starts at a given step of the total series.
const OUTLIER_PROBABILITY: f64 = 0.02;
/// Longest burst, in steps.
const OUTLIER_MAX_LEN: usize = 6;
/// Burst height in standard deviations of the metric value.
const OUTLIER_SIGMAS: f64 = 8.0;
/// Relative jitter applied when splitting weights between siblings.
const WEIGHT_JITTER: f64 = 0.2;
/// Relative jitter applied when splitting values between siblings.
const VALUE_JITTER: f64 = 0.4;

/// How a metric's value relates to its weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// Value adds up across siblings (revenue).
    Sum,
    /// Value is a per-visit average (basket size).
    Average,
    /// Value is the weight itself (visits).
    Count,
}

/// Distribution parameters of one simulated metric.
#[derive(Debug, Clone, Copy)]
pub struct MetricProfile {
    pub name: &'static str,
    pub unit: &'static str,
    pub kind: MetricKind,
    pub value_mean: f64,
    pub value_stddev: f64,
    pub weight_mean: f64,
    pub weight_stddev: f64,
}

pub const PROFILES: [MetricProfile; 3] = [
    MetricProfile {
        name: "Revenue",
        unit: "Total Orders (EUR)",
        kind: MetricKind::Sum,
        value_mean: 100_000.0,
        value_stddev: 20_000.0,
        weight_mean: 1_500.0,
        weight_stddev: 300.0,
    },
    MetricProfile {
        name: "Basket",
        unit: "Average Basket Value (EUR)",
        kind: MetricKind::Average,
        value_mean: 400.0,
        value_stddev: 80.0,
        weight_mean: 1_500.0,
        weight_stddev: 300.0,
    },
    MetricProfile {
        name: "Visits",
        unit: "Number of Sessions",
        kind: MetricKind::Count,
        value_mean: 20_000.0,
        value_stddev: 4_000.0,
        weight_mean: 20_000.0,
        weight_stddev: 4_000.0,
    },
];

/// A node of the simulated attribute breakdown.
#[derive(Debug)]
pub struct AttributeNode {
    pub name: &'static str,
    /// Relative share among siblings.
    pub share: f64,
    pub children: &'static [AttributeNode],
}

const fn leaf(name: &'static str, share: f64) -> AttributeNode {
    AttributeNode {
        name,
        share,
        children: &[],
    }
}

pub static ATTRIBUTE_TREE: [AttributeNode; 2] = [
    AttributeNode {
        name: "DeviceType",
        share: 1.0,
        children: &[leaf("Desktop", 50.0), leaf("Tablet", 10.0), leaf("Mobile", 40.0)],
    },
    AttributeNode {
        name: "Browser",
        share: 1.0,
        children: &[
            AttributeNode {
                name: "Chrome",
                share: 50.0,
                children: &[leaf("v1", 5.0), leaf("v2", 15.0), leaf("v3", 80.0)],
            },
            leaf("Edge", 20.0),
            leaf("Firefox", 10.0),
            leaf("Safari", 20.0),
        ],
    },
];

pub fn profile(metric: &str) -> Option<&'static MetricProfile> {
    PROFILES.iter().find(|p| p.name.eq_ignore_ascii_case(metric))
}

pub fn supported_metrics() -> impl Iterator<Item = &'static str> {
    PROFILES.iter().map(|p| p.name)
}

/// Start of every step in `[start, end)`.
pub fn step_timestamps(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    step: Duration,
) -> Vec<DateTime<Utc>> {
    let mut timestamps = Vec::new();
    if step <= Duration::zero() {
        return timestamps;
    }
    let mut t = start;
    while t < end {
        timestamps.push(t);
        t += step;
    }
    timestamps
}

/// Simulate one metric for a site over `[start, end)`.
///
/// The total series is drawn from normal distributions and split down the
/// attribute tree. Every series then gets occasional bursts of outliers,
/// which are pushed up into its ancestors: a deviation in
/// `Browser>Chrome>v2` also shows in `Browser>Chrome` and `Total`.
pub fn generate_metric<R: Rng>(
    profile: &MetricProfile,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    step: Duration,
    rng: &mut R,
) -> Result<MetricData> {
    let timestamps = step_timestamps(start, end, step);
    let value_dist = Normal::new(profile.value_mean, profile.value_stddev)?;
    let weight_dist = Normal::new(profile.weight_mean, profile.weight_stddev)?;

    let mut metric = MetricData::new(profile.name, profile.unit);

    let total: Vec<Sample> = timestamps
        .iter()
        .map(|&t| {
            let drawn_weight: f64 = rng.sample(weight_dist);
            let weight = drawn_weight.round().max(0.0) as u64;
            let value = match profile.kind {
                MetricKind::Count => weight as f64,
                MetricKind::Sum | MetricKind::Average => {
                    let drawn: f64 = rng.sample(value_dist);
                    drawn.max(0.0)
                }
            };
            Sample::new(t, value, weight)
        })
        .collect();
    metric.push_series(TOTAL_ATTRIBUTE, total);

    for root in ATTRIBUTE_TREE.iter() {
        split_children(&mut metric, profile.kind, TOTAL_ATTRIBUTE, root.name, root.children, rng);
    }

    let attributes = metric.attributes.clone();
    for attribute in &attributes {
        // Deeper breakdowns get rarer and smaller bursts
        let halvings = 2f64.powi(attribute_level(attribute) as i32);
        let probability = OUTLIER_PROBABILITY / (halvings * halvings);
        let shift = OUTLIER_SIGMAS * profile.value_stddev / halvings;
        inject_bursts(&mut metric, profile.kind, attribute, probability, shift, rng);
    }

    Ok(metric)
}

/// Split the `parent` series between `children`, recursing into subtrees.
fn split_children<R: Rng>(
    metric: &mut MetricData,
    kind: MetricKind,
    parent: &str,
    path: &str,
    children: &[AttributeNode],
    rng: &mut R,
) {
    if children.is_empty() {
        return;
    }

    let parent_series = match metric.series(parent) {
        Some(series) => series.to_vec(),
        None => return,
    };
    let share_total: f64 = children.iter().map(|c| c.share).sum();
    let mut child_series: Vec<Vec<Sample>> =
        vec![Vec::with_capacity(parent_series.len()); children.len()];

    for sample in &parent_series {
        let mut weight_left = sample.weight;
        let mut value_left = sample.value;
        let last = children.len() - 1;

        for (i, child) in children.iter().enumerate() {
            let nominal = child.share / share_total;
            let weight = if i == last {
                weight_left
            } else {
                let jitter = rng.gen_range(-WEIGHT_JITTER / 2.0..WEIGHT_JITTER / 2.0);
                let jittered = nominal * (1.0 + jitter);
                ((jittered * sample.weight as f64).round() as u64).min(weight_left)
            };
            weight_left -= weight;

            let value = match kind {
                MetricKind::Count => weight as f64,
                MetricKind::Average => {
                    sample.value * (1.0 + rng.gen_range(-VALUE_JITTER / 2.0..VALUE_JITTER / 2.0))
                }
                MetricKind::Sum if i == last => value_left.max(0.0),
                MetricKind::Sum => {
                    let ratio = if sample.weight == 0 {
                        nominal
                    } else {
                        weight as f64 / sample.weight as f64
                    };
                    let part = ratio
                        * sample.value
                        * (1.0 + rng.gen_range(-VALUE_JITTER / 2.0..VALUE_JITTER / 2.0));
                    let part = part.clamp(0.0, value_left.max(0.0));
                    value_left -= part;
                    part
                }
            };

            child_series[i].push(Sample::new(sample.timestamp, value, weight));
        }
    }

    for (child, series) in children.iter().zip(child_series) {
        let child_path = format!("{}{}{}", path, PATH_SEPARATOR, child.name);
        metric.push_series(child_path.clone(), series);
        split_children(metric, kind, &child_path, &child_path, child.children, rng);
    }
}

/// Randomly shift runs of samples of `attribute` and of its ancestors.
fn inject_bursts<R: Rng>(
    metric: &mut MetricData,
    kind: MetricKind,
    attribute: &str,
    probability: f64,
    shift: f64,
    rng: &mut R,
) {
    let len = metric.series(attribute).map(<[_]>::len).unwrap_or(0);
    let paths = lineage(attribute);

    let mut step = 0;
    while step < len {
        if !rng.gen_bool(probability.clamp(0.0, 1.0)) {
            step += 1;
            continue;
        }

        let burst = rng.gen_range(1..=OUTLIER_MAX_LEN).min(len - step);
        let signed = if rng.gen_bool(0.5) { shift } else { -shift };
        debug!(
            metric = %metric.metric,
            attribute,
            from = step,
            steps = burst,
            "Injected outlier burst"
        );

        for i in step..step + burst {
            let own_weight = metric.series(attribute).map(|s| s[i].weight).unwrap_or(0);
            for path in &paths {
                let Some(series) = metric.attribute_data.get_mut(path) else {
                    continue;
                };
                let sample = &mut series[i];
                let delta = match kind {
                    MetricKind::Average if path != attribute && sample.weight > 0 => {
                        signed * own_weight as f64 / sample.weight as f64
                    }
                    MetricKind::Count => signed.round(),
                    _ => signed,
                };
                sample.value = (sample.value + delta).max(0.0);
                if kind == MetricKind::Count {
                    sample.weight = sample.value as u64;
                }
            }
        }
        step += burst;
    }
}

/// `attribute` followed by each ancestor series up to `Total`.
fn lineage(attribute: &str) -> Vec<String> {
    let mut paths = vec![attribute.to_string()];
    if attribute == TOTAL_ATTRIBUTE {
        return paths;
    }
    let mut parent = attribute_parent(attribute);
    while parent.contains(PATH_SEPARATOR) {
        paths.push(parent.to_string());
        parent = attribute_parent(parent);
    }
    paths.push(TOTAL_ATTRIBUTE.to_string());
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn daily(name: &str, start: DateTime<Utc>, end: DateTime<Utc>, rng: &mut StdRng) -> MetricData {
        generate_metric(profile(name).unwrap(), start, end, Duration::days(1), rng).unwrap()
    }

    fn window() -> (DateTime<Utc>, DateTime<Utc>) {
        let end = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        (end - Duration::days(30), end)
    }

    #[test]
    fn test_step_timestamps_cover_half_open_window() {
        let (start, end) = window();
        let steps = step_timestamps(start, end, Duration::days(1));
        assert_eq!(steps.len(), 30);
        assert_eq!(steps[0], start);
        assert_eq!(*steps.last().unwrap(), end - Duration::days(1));

        assert_eq!(step_timestamps(start, end, Duration::hours(7)).len(), 103);
        assert!(step_timestamps(start, end, Duration::zero()).is_empty());
    }

    #[test]
    fn test_generated_tree_layout() {
        let (start, end) = window();
        let mut rng = StdRng::seed_from_u64(7);
        let metric = daily("Revenue", start, end, &mut rng);

        assert_eq!(metric.attributes[0], TOTAL_ATTRIBUTE);
        assert_eq!(metric.attributes.len(), 1 + 3 + 4 + 3);
        assert!(metric.series("Browser>Chrome>v3").is_some());
        assert!(metric.series("DeviceType>Mobile").is_some());
        for (_, series) in metric.iter_series() {
            assert_eq!(series.len(), 30);
        }
    }

    #[test]
    fn test_weights_split_exactly_between_siblings() {
        let (start, end) = window();
        let mut rng = StdRng::seed_from_u64(11);
        let metric = daily("Basket", start, end, &mut rng);

        let total = metric.series("Total").unwrap();
        let devices = ["DeviceType>Desktop", "DeviceType>Tablet", "DeviceType>Mobile"];
        for i in 0..total.len() {
            let sum: u64 = devices.iter().map(|d| metric.series(d).unwrap()[i].weight).sum();
            assert_eq!(sum, total[i].weight);
        }
    }

    #[test]
    fn test_count_values_track_weights() {
        let (start, end) = window();
        let mut rng = StdRng::seed_from_u64(3);
        let metric = daily("visits", start, end, &mut rng);

        for (_, series) in metric.iter_series() {
            for sample in series {
                assert_eq!(sample.value, sample.weight as f64);
            }
        }
    }

    #[test]
    fn test_lineage_walks_up_to_total() {
        assert_eq!(
            lineage("Browser>Chrome>v2"),
            vec!["Browser>Chrome>v2", "Browser>Chrome", "Total"]
        );
        assert_eq!(lineage("DeviceType>Mobile"), vec!["DeviceType>Mobile", "Total"]);
        assert_eq!(lineage("Total"), vec!["Total"]);
    }

    #[test]
    fn test_unknown_profile() {
        assert!(profile("Bounces").is_none());
        assert_eq!(supported_metrics().count(), 3);
    }
}
