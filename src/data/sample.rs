use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One time step of a metric series.
///
/// `weight` is the number of underlying observations (e.g. visits) that
/// produced `value`. Detection ignores it; the collection filters use it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    pub weight: u64,
}

impl Sample {
    pub fn new(timestamp: DateTime<Utc>, value: f64, weight: u64) -> Self {
        Self {
            timestamp,
            value,
            weight,
        }
    }
}

/// Chronologically ordered samples for one (metric, attribute) pair.
pub type Series = Vec<Sample>;

/// Sum of the sample weights of a series.
pub fn total_weight(series: &[Sample]) -> u64 {
    series.iter().map(|s| s.weight).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_sample_serializes_camel_case() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let json = serde_json::to_value(Sample::new(ts, 12.5, 7)).unwrap();

        assert_eq!(json["value"], 12.5);
        assert_eq!(json["weight"], 7);
        assert_eq!(json["timestamp"], "2024-01-01T00:00:00Z");
    }

    #[test]
    fn test_total_weight() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let series = vec![Sample::new(ts, 1.0, 3), Sample::new(ts, 2.0, 4)];
        assert_eq!(total_weight(&series), 7);
        assert_eq!(total_weight(&[]), 0);
    }
}
