//! The canonical fine record produced by the pipeline.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

use crate::normalize::normalize_label;

/// Location recorded when the source leaves the site blank.
pub const UNKNOWN_LOCATION: &str = "Unknown";

/// Payment status after case and whitespace normalization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub enum PaymentStatus {
    Paid,
    Unpaid,
    /// Any other label, kept upper-cased and trimmed.
    Other(String),
}

impl PaymentStatus {
    pub fn parse(raw: &str) -> Self {
        let label = normalize_label(raw);
        match label.as_str() {
            "PAID" | "PAGO" => PaymentStatus::Paid,
            "UNPAID" | "NÃO PAGO" | "NAO PAGO" => PaymentStatus::Unpaid,
            _ => PaymentStatus::Other(label),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            PaymentStatus::Paid => "PAID",
            PaymentStatus::Unpaid => "UNPAID",
            PaymentStatus::Other(label) => label,
        }
    }
}

impl From<String> for PaymentStatus {
    fn from(raw: String) -> Self {
        PaymentStatus::parse(&raw)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for PaymentStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// One traffic fine. Built only by the pipeline and never mutated after.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FineRecord {
    pub citation_id: String,
    pub infraction_date: Option<NaiveDate>,
    pub query_date: Option<NaiveDate>,
    pub amount_due: f64,
    pub payment_status: PaymentStatus,
    pub location: String,
    pub vehicle_plate: Option<String>,
    pub infraction_code: Option<String>,
    pub infraction_description: Option<String>,
    pub original_amount: Option<f64>,
}

impl FineRecord {
    pub fn is_unpaid(&self) -> bool {
        self.payment_status == PaymentStatus::Unpaid
    }
}
