use super::DetectError;
use crate::data::Sample;

/// Mean and population standard deviation of a whole series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Baseline {
    pub mean: f64,
    pub stddev: f64,
    pub sample_count: usize,
}

impl Baseline {
    /// Compute the baseline over every sample of `series`.
    ///
    /// Two passes: the mean first, then the deviation around it with
    /// divisor N (population), not N - 1.
    pub fn from_series(series: &[Sample]) -> Result<Self, DetectError> {
        if series.is_empty() {
            return Err(DetectError::EmptySeries);
        }

        let mean = calculate_mean(series);
        let stddev = calculate_stddev(series, mean);

        Ok(Self {
            mean,
            stddev,
            sample_count: series.len(),
        })
    }

    /// Distance of a value from the mean.
    pub fn deviation(&self, value: f64) -> f64 {
        (value - self.mean).abs()
    }
}

/// Plain sum divided by the count.
fn calculate_mean(series: &[Sample]) -> f64 {
    series.iter().map(|s| s.value).sum::<f64>() / series.len() as f64
}

fn calculate_stddev(series: &[Sample], mean: f64) -> f64 {
    let variance = series
        .iter()
        .map(|s| (s.value - mean).powi(2))
        .sum::<f64>()
        / series.len() as f64;

    variance.sqrt()
}
