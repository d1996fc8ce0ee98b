use crate::collector::CollectFilters;
use crate::detection::ThresholdParameters;
use crate::utils::duration::{parse_duration, DurationError};
use anyhow::{ensure, Context, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    pub datasets: Vec<DatasetConfig>,
    #[serde(default)]
    pub detection_methods: DetectionMethodsConfig,
    #[serde(default)]
    pub gen_collect_filters: CollectFilters,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

/// What to collect and how to analyse it for one site.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetConfig {
    pub site_id: String,
    /// How far back the collection window reaches, e.g. `"30d"`.
    pub time_ago: String,
    /// Width of one sample, e.g. `"1d"`.
    pub time_step: String,
    pub outliers_detection_method: String,
    /// Metric names, or `["all"]`.
    #[serde(alias = "metricesList")]
    pub metrics: Vec<String>,
    /// Overrides `genCollectFilters` for this site.
    #[serde(default)]
    pub site_collect_filters: Option<CollectFilters>,
}

impl DatasetConfig {
    pub fn time_ago_duration(&self) -> Result<Duration, DurationError> {
        parse_duration(&self.time_ago)
    }

    pub fn time_step_duration(&self) -> Result<Duration, DurationError> {
        parse_duration(&self.time_step)
    }

    /// The site's own filters, falling back to the general ones.
    pub fn collect_filters<'a>(&'a self, general: &'a CollectFilters) -> &'a CollectFilters {
        self.site_collect_filters.as_ref().unwrap_or(general)
    }
}

/// Parameters of every detection method, keyed by method name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectionMethodsConfig {
    #[serde(rename = "3-sigmas", default)]
    pub three_sigmas: ThresholdParameters,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    pub level: String,
    /// `"json"` or `"pretty"`.
    pub output: String,
    /// Empty for stdout.
    #[serde(default)]
    pub file_path: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            output: "pretty".to_string(),
            file_path: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisConfig {
    /// Worker threads per report; 1 runs sequentially.
    pub workers: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self { workers: 1 }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file, or JSON when the extension is `.json`
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;

        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let config: AppConfig = if is_json {
            serde_json::from_str(&contents)
                .with_context(|| format!("parsing JSON config {}", path.display()))?
        } else {
            toml::from_str(&contents)
                .with_context(|| format!("parsing TOML config {}", path.display()))?
        };

        config.validate()?;
        Ok(config)
    }

    /// `CONFIG_FILE` from the environment, else `config.toml`
    pub fn default_path() -> String {
        std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".to_string())
    }

    /// Load from environment variable or default path
    pub fn load() -> Result<Self> {
        Self::from_file(Self::default_path())
    }

    /// Reject values the collector or detectors cannot work with.
    pub fn validate(&self) -> Result<()> {
        let params = &self.detection_methods.three_sigmas;
        ensure!(
            params.weak_multiplier >= 0.0 && params.strong_multiplier >= 0.0,
            "3-sigmas multipliers must be non-negative (got {} and {})",
            params.weak_multiplier,
            params.strong_multiplier
        );
        ensure!(self.analysis.workers >= 1, "analysis.workers must be at least 1");

        for dataset in &self.datasets {
            let step = dataset
                .time_step_duration()
                .with_context(|| format!("site {}: timeStep", dataset.site_id))?;
            dataset
                .time_ago_duration()
                .with_context(|| format!("site {}: timeAgo", dataset.site_id))?;
            ensure!(
                step > Duration::zero(),
                "site {}: timeStep must be positive",
                dataset.site_id
            );
        }

        Ok(())
    }
}
