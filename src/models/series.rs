//! Hour buckets, per-day cumulative series and the snapshot document.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use super::department::Department;

/// Inclusive operating-hour window of the venue (e.g. 10..=22).
///
/// The window is a configuration constant, never derived from data: series
/// lengths and chart labels follow it no matter how few transactions exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HourRange {
    start: u32,
    end: u32,
}

impl HourRange {
    /// Build a range; `None` when inverted or past the end of the day.
    pub fn new(start: u32, end: u32) -> Option<Self> {
        if start <= end && end <= 23 {
            Some(Self { start, end })
        } else {
            None
        }
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    /// Number of hour buckets in the window.
    pub fn len(&self) -> usize {
        (self.end - self.start + 1) as usize
    }

    pub fn is_empty(&self) -> bool {
        false // construction guarantees start <= end
    }

    /// Hours of the window in order.
    pub fn hours(&self) -> impl Iterator<Item = u32> {
        self.start..=self.end
    }

    /// Chart labels, one per bucket ("10:00", "11:00", ...).
    pub fn labels(&self) -> Vec<String> {
        self.hours().map(|h| format!("{h:02}:00")).collect()
    }

    /// Bucket index for an hour-of-day, `None` outside the window.
    pub fn index_of(&self, hour: u32) -> Option<usize> {
        if hour >= self.start && hour <= self.end {
            Some((hour - self.start) as usize)
        } else {
            None
        }
    }

    /// How many buckets are at or before `hour` — the length the current day's
    /// series is clipped to so an in-progress day never claims future hours.
    pub fn clip_len(&self, hour: u32) -> usize {
        if hour < self.start {
            0
        } else if hour >= self.end {
            self.len()
        } else {
            (hour - self.start + 1) as usize
        }
    }
}

/// Cumulative per-department series for exactly one calendar day.
///
/// Invariants: every department vector is non-decreasing and label-aligned;
/// the reference day spans the full configured window, the current day may be
/// truncated to the wall-clock hour.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySeries {
    pub date: NaiveDate,
    pub labels: Vec<String>,
    pub per_department: BTreeMap<Department, Vec<f64>>,
}

impl DailySeries {
    pub fn new(
        date: NaiveDate,
        hours: HourRange,
        per_department: BTreeMap<Department, Vec<f64>>,
    ) -> Self {
        Self {
            date,
            labels: hours.labels(),
            per_department,
        }
    }

    /// Zero-filled full-window series, the degraded form of a failed fetch.
    pub fn empty(date: NaiveDate, hours: HourRange) -> Self {
        let per_department = Department::ALL
            .iter()
            .map(|d| (*d, vec![0.0; hours.len()]))
            .collect();
        Self::new(date, hours, per_department)
    }

    /// Clip the series to the first `len` buckets (current-day truncation).
    pub fn truncated(mut self, len: usize) -> Self {
        self.labels.truncate(len);
        for series in self.per_department.values_mut() {
            series.truncate(len);
        }
        self
    }

    /// Day total for a department: the last cumulative value, 0 when clipped
    /// to nothing.
    pub fn department_total(&self, department: Department) -> f64 {
        self.per_department
            .get(&department)
            .and_then(|series| series.last())
            .copied()
            .unwrap_or(0.0)
    }
}

/// Same-day versus reference-day totals for one table row.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PeriodTotals {
    pub current: f64,
    pub reference: f64,
}

/// The snapshot document the presentation layer polls.
///
/// Produced whole by the dashboard service and replaced whole on refresh;
/// readers always see an internally consistent value. `generated_at` is the
/// refresh instant, so a consumer can tell how stale a served snapshot is
/// during an upstream outage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub generated_at: NaiveDateTime,
    pub current: DailySeries,
    pub reference: DailySeries,
    /// Category-name keyed totals from the sales summary endpoint.
    pub categories: BTreeMap<String, PeriodTotals>,
    /// Department totals from the transaction path (last cumulative values).
    pub department_totals: BTreeMap<Department, PeriodTotals>,
}
