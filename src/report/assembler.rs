use super::{OutlierEvent, OutlierReport};
use crate::data::{Sample, SiteData};
use crate::detection::{Detection, DetectorRegistry};
use crate::utils::config::DatasetConfig;
use chrono::{DateTime, Utc};
use tracing::{debug, error, info, Span};

/// One (metric, attribute) series waiting for detection.
struct Job<'a> {
    metric: &'a str,
    attribute: &'a str,
    series: &'a [Sample],
}

/// Runs the configured detection method over every series of a site.
///
/// Diagnostics are emitted under the injected span. With more than one
/// worker the series are spread over scoped threads; results are put back
/// in (metric, attribute) source order before the report is built.
#[derive(Debug)]
pub struct ReportAssembler {
    registry: DetectorRegistry,
    workers: usize,
    span: Span,
}

impl ReportAssembler {
    pub fn new(registry: DetectorRegistry) -> Self {
        Self {
            registry,
            workers: 1,
            span: Span::none(),
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn registry(&self) -> &DetectorRegistry {
        &self.registry
    }

    /// Build the outlier report of one site.
    pub fn assemble(&self, site: &SiteData, dataset: &DatasetConfig) -> OutlierReport {
        let method = dataset.outliers_detection_method.as_str();
        let check_start = Utc::now();

        let jobs: Vec<Job<'_>> = site
            .metrics
            .iter()
            .flat_map(|metric| {
                metric.iter_series().map(move |(attribute, series)| Job {
                    metric: metric.metric.as_str(),
                    attribute,
                    series,
                })
            })
            .collect();

        info!(
            parent: &self.span,
            site_id = %site.site_id,
            method,
            series = jobs.len(),
            workers = self.workers,
            "Analysing site"
        );

        let detections = if self.workers > 1 && jobs.len() > 1 {
            self.detect_parallel(method, &jobs, site.window_end)
        } else {
            self.detect_sequential(method, &jobs, site.window_end)
        };

        let mut warnings = Vec::new();
        let mut alarms = Vec::new();
        for (job, detection) in jobs.iter().zip(detections) {
            if !detection.is_empty() {
                debug!(
                    parent: &self.span,
                    metric = job.metric,
                    attribute = job.attribute,
                    warnings = detection.warnings.len(),
                    alarms = detection.alarms.len(),
                    "Outliers detected"
                );
            }
            warnings.extend(
                detection
                    .warnings
                    .into_iter()
                    .map(|period| OutlierEvent::new(period, job.metric, job.attribute)),
            );
            alarms.extend(
                detection
                    .alarms
                    .into_iter()
                    .map(|period| OutlierEvent::new(period, job.metric, job.attribute)),
            );
        }

        let check_end = Utc::now();
        info!(
            parent: &self.span,
            site_id = %site.site_id,
            warnings = warnings.len(),
            alarms = alarms.len(),
            elapsed_ms = (check_end - check_start).num_milliseconds(),
            "Report assembled"
        );

        OutlierReport {
            site_id: site.site_id.clone(),
            method_name: dataset.outliers_detection_method.clone(),
            check_start,
            check_end,
            time_ago: dataset.time_ago.clone(),
            time_step: dataset.time_step.clone(),
            series_start: site.window_start,
            series_end: site.window_end,
            warnings,
            alarms,
        }
    }

    fn detect_one(&self, method: &str, job: &Job<'_>, series_end: DateTime<Utc>) -> Detection {
        self.registry.run(method, job.series, series_end, &self.span)
    }

    fn detect_sequential(
        &self,
        method: &str,
        jobs: &[Job<'_>],
        series_end: DateTime<Utc>,
    ) -> Vec<Detection> {
        jobs.iter()
            .map(|job| self.detect_one(method, job, series_end))
            .collect()
    }

    /// Worker `w` takes jobs `w, w + n, w + 2n, ...`; the results are sorted
    /// back by job index.
    fn detect_parallel(
        &self,
        method: &str,
        jobs: &[Job<'_>],
        series_end: DateTime<Utc>,
    ) -> Vec<Detection> {
        let workers = self.workers.min(jobs.len());

        let outcome = crossbeam::thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|worker| {
                    scope.spawn(move |_| {
                        jobs.iter()
                            .enumerate()
                            .skip(worker)
                            .step_by(workers)
                            .map(|(index, job)| (index, self.detect_one(method, job, series_end)))
                            .collect::<Vec<_>>()
                    })
                })
                .collect();

            handles
                .into_iter()
                .map(|handle| handle.join())
                .collect::<Result<Vec<_>, _>>()
        });

        match outcome {
            Ok(Ok(parts)) => {
                let mut indexed: Vec<(usize, Detection)> = parts.into_iter().flatten().collect();
                indexed.sort_by_key(|(index, _)| *index);
                indexed.into_iter().map(|(_, detection)| detection).collect()
            }
            _ => {
                error!(parent: &self.span, "Detection worker panicked, rerunning sequentially");
                self.detect_sequential(method, jobs, series_end)
            }
        }
    }
}
