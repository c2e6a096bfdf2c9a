//! Subset selection over a record set: by payment status or by date window.

use chrono::NaiveDate;

use crate::record::{FineRecord, PaymentStatus};

/// Which of the two record dates a period filter looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateField {
    Infraction,
    Query,
}

impl DateField {
    pub fn of(self, record: &FineRecord) -> Option<NaiveDate> {
        match self {
            DateField::Infraction => record.infraction_date,
            DateField::Query => record.query_date,
        }
    }
}

/// Records whose status equals `status`. Paid fines never reach an
/// outstanding-balance sum through this filter with `Unpaid`.
pub fn filter_by_status(records: &[FineRecord], status: &PaymentStatus) -> Vec<FineRecord> {
    records
        .iter()
        .filter(|r| r.payment_status == *status)
        .cloned()
        .collect()
}

/// Records whose `date_field` falls in `start..=end`. Records without that
/// date are left out.
pub fn filter_by_period(
    records: &[FineRecord],
    start: NaiveDate,
    end: NaiveDate,
    date_field: DateField,
) -> Vec<FineRecord> {
    records
        .iter()
        .filter(|r| date_field.of(r).is_some_and(|d| d >= start && d <= end))
        .cloned()
        .collect()
}
