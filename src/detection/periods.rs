use super::{Classification, Detection, EventPeriod};
use chrono::{DateTime, Utc};

/// A period that has started but not yet been closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenPeriod {
    start_index: usize,
    start: DateTime<Utc>,
    strong: bool,
}

/// Merges a stream of classified samples into warning and alarm periods.
///
/// Samples must be fed in chronological order. A period closed by a later
/// sample ends at that sample's timestamp: the closing sample belongs to the
/// next period (or to none). A period still open after the last sample is
/// closed by `finish` at the caller's boundary.
#[derive(Debug, Default)]
pub struct PeriodTracker {
    open: Option<OpenPeriod>,
    warnings: Vec<EventPeriod>,
    alarms: Vec<EventPeriod>,
}

impl PeriodTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the sample at `index` with its timestamp and class.
    pub fn observe(&mut self, index: usize, timestamp: DateTime<Utc>, class: Classification) {
        match (self.open, class) {
            (None, Classification::Normal) => {}
            (None, Classification::Weak) => self.start(index, timestamp, false),
            (None, Classification::Strong) => self.start(index, timestamp, true),

            (Some(open), Classification::Weak) if !open.strong => {}
            (Some(open), Classification::Strong) if open.strong => {}

            (Some(_), Classification::Normal) => self.close(timestamp),
            (Some(_), Classification::Weak) => {
                self.close(timestamp);
                self.start(index, timestamp, false);
            }
            (Some(_), Classification::Strong) => {
                self.close(timestamp);
                self.start(index, timestamp, true);
            }
        }
    }

    /// Close the open period, if any, at `end`.
    ///
    /// The end is always passed in: interior closes use the triggering
    /// sample's timestamp, the final close uses the series boundary.
    pub fn close(&mut self, end: DateTime<Utc>) {
        if let Some(open) = self.open.take() {
            let period = EventPeriod {
                start: open.start,
                end,
            };
            if open.strong {
                self.alarms.push(period);
            } else {
                self.warnings.push(period);
            }
        }
    }

    /// Close whatever is still open at `series_end` and return the periods.
    pub fn finish(mut self, series_end: DateTime<Utc>) -> Detection {
        self.close(series_end);
        Detection {
            warnings: self.warnings,
            alarms: self.alarms,
        }
    }

    /// Index and class of the period currently open.
    pub fn open_period(&self) -> Option<(usize, Classification)> {
        self.open.map(|open| {
            let class = if open.strong {
                Classification::Strong
            } else {
                Classification::Weak
            };
            (open.start_index, class)
        })
    }

    fn start(&mut self, index: usize, timestamp: DateTime<Utc>, strong: bool) {
        self.open = Some(OpenPeriod {
            start_index: index,
            start: timestamp,
            strong,
        });
    }
}
