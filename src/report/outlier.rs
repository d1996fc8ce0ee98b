use crate::data::PATH_SEPARATOR;
use crate::detection::EventPeriod;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An event period labeled with the series it was found in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlierEvent {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub metric: String,
    pub attribute: String,
}

impl OutlierEvent {
    pub fn new(period: EventPeriod, metric: &str, attribute: &str) -> Self {
        Self {
            start: period.start,
            end: period.end,
            metric: metric.to_string(),
            attribute: attribute.to_string(),
        }
    }

    /// True for `prefix` itself and for every path below it.
    pub fn matches_attribute_prefix(&self, prefix: &str) -> bool {
        match self.attribute.strip_prefix(prefix) {
            Some(rest) => rest.is_empty() || rest.starts_with(PATH_SEPARATOR),
            None => false,
        }
    }
}

/// Every warning and alarm found for one site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlierReport {
    pub site_id: String,
    pub method_name: String,
    /// Wall-clock start of the analysis.
    pub check_start: DateTime<Utc>,
    /// Wall-clock end of the analysis.
    pub check_end: DateTime<Utc>,
    pub time_ago: String,
    pub time_step: String,
    /// Collection window of the analysed data.
    pub series_start: DateTime<Utc>,
    pub series_end: DateTime<Utc>,
    pub warnings: Vec<OutlierEvent>,
    pub alarms: Vec<OutlierEvent>,
}

impl OutlierReport {
    /// Alarms of one metric, optionally restricted to an attribute subtree,
    /// in report order.
    pub fn alarms_for<'a>(
        &'a self,
        metric: &'a str,
        attribute_prefix: Option<&'a str>,
    ) -> impl Iterator<Item = &'a OutlierEvent> + 'a {
        self.alarms.iter().filter(move |event| {
            event.metric == metric
                && attribute_prefix.map_or(true, |prefix| event.matches_attribute_prefix(prefix))
        })
    }

    /// Warnings counterpart of `alarms_for`.
    pub fn warnings_for<'a>(
        &'a self,
        metric: &'a str,
        attribute_prefix: Option<&'a str>,
    ) -> impl Iterator<Item = &'a OutlierEvent> + 'a {
        self.warnings.iter().filter(move |event| {
            event.metric == metric
                && attribute_prefix.map_or(true, |prefix| event.matches_attribute_prefix(prefix))
        })
    }

    pub fn check_duration(&self) -> chrono::Duration {
        self.check_end - self.check_start
    }

    /// Print report summary
    pub fn print_summary(&self) {
        println!("\n╔════════════════════════════════════════════════╗");
        println!("║         OUTLIER REPORT SUMMARY                 ║");
        println!("╠════════════════════════════════════════════════╣");
        println!("║ Site: {:<41} ║", self.site_id);
        println!("║ Method: {:<39} ║", self.method_name);
        let window = format!(
            "{} ({} steps of {})",
            self.time_ago,
            self.series_steps(),
            self.time_step
        );
        println!("║ Window: {:<39} ║", window);
        println!("║ From: {:<41} ║", self.series_start.format("%Y-%m-%d %H:%M"));
        println!("║ To: {:<43} ║", self.series_end.format("%Y-%m-%d %H:%M"));
        println!("╠════════════════════════════════════════════════╣");
        println!("║ Warnings: {:<37} ║", self.warnings.len());
        println!("║ Alarms: {:<39} ║", self.alarms.len());
        println!("║ Check Time: {:<32} ms ║", self.check_duration().num_milliseconds());
        println!("╚════════════════════════════════════════════════╝");

        for alarm in &self.alarms {
            println!(
                "  ALARM   {} / {}: {} -> {}",
                alarm.metric,
                alarm.attribute,
                alarm.start.format("%Y-%m-%d %H:%M"),
                alarm.end.format("%Y-%m-%d %H:%M")
            );
        }
        println!();
    }

    fn series_steps(&self) -> String {
        match crate::utils::parse_duration(&self.time_step) {
            Ok(step) if step > chrono::Duration::zero() => {
                let window = self.series_end - self.series_start;
                let steps = window.num_nanoseconds().zip(step.num_nanoseconds());
                steps
                    .map(|(w, s)| ((w + s - 1) / s).to_string())
                    .unwrap_or_else(|| "?".to_string())
            }
            _ => "?".to_string(),
        }
    }
}
