//! Scalar summary metrics over a record set.

use chrono::{DateTime, Datelike, Local, NaiveDate, Utc};
use serde::Serialize;
use std::collections::HashSet;

use crate::record::FineRecord;

/// Shown in place of `last_query_date` when no record has one.
pub const UNAVAILABLE: &str = "unavailable";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Metrics {
    /// Distinct citations.
    pub total_fines: usize,
    /// Sum of `amount_due` over unpaid records only.
    pub total_amount_due: f64,
    /// Distinct citations whose infraction falls in the current month.
    pub fines_current_month: usize,
    /// Latest query date; `None` when every query date is missing.
    pub last_query_date: Option<NaiveDate>,
}

impl Metrics {
    pub fn last_query_label(&self) -> String {
        self.last_query_date
            .map(|d| d.format("%d/%m/%Y").to_string())
            .unwrap_or_else(|| UNAVAILABLE.to_string())
    }
}

/// Today on the local calendar. Current month and year roll over at local
/// midnight.
pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

/// Metrics "as of now": the current month is read from the local clock on
/// every call.
pub fn compute_metrics(records: &[FineRecord]) -> Metrics {
    compute_metrics_at(records, local_today())
}

/// Metrics with `today`, a local calendar date, deciding which month counts
/// as current.
pub fn compute_metrics_at(records: &[FineRecord], today: NaiveDate) -> Metrics {
    let total_fines = records
        .iter()
        .map(|r| r.citation_id.as_str())
        .collect::<HashSet<_>>()
        .len();

    let total_amount_due = records
        .iter()
        .filter(|r| r.is_unpaid())
        .map(|r| r.amount_due)
        .sum();

    let fines_current_month = records
        .iter()
        .filter(|r| {
            r.infraction_date
                .is_some_and(|d| d.year() == today.year() && d.month() == today.month())
        })
        .map(|r| r.citation_id.as_str())
        .collect::<HashSet<_>>()
        .len();

    let last_query_date = records.iter().filter_map(|r| r.query_date).max();

    Metrics {
        total_fines,
        total_amount_due,
        fines_current_month,
        last_query_date,
    }
}

/// One row of a metrics history file.
#[derive(Debug, Default, Serialize)]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub source: Option<String>,
    pub total_fines: usize,
    pub total_amount_due: f64,
    pub fines_current_month: usize,
    pub last_query_date: Option<NaiveDate>,
}

impl MetricsSnapshot {
    pub fn from_metrics(metrics: &Metrics) -> Self {
        MetricsSnapshot {
            timestamp: Utc::now(),
            source: None,
            total_fines: metrics.total_fines,
            total_amount_due: metrics.total_amount_due,
            fines_current_month: metrics.fines_current_month,
            last_query_date: metrics.last_query_date,
        }
    }

    /// Set the input the snapshot was computed from
    pub fn with_source(mut self, source: &str) -> Self {
        self.source = Some(source.to_string());
        self
    }
}
