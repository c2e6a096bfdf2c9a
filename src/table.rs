//! The raw tabular extract handed to the pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic columns the pipeline understands, independent of the literal
/// header text a spreadsheet uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    CitationId,
    InfractionDate,
    QueryDate,
    AmountDue,
    PaymentStatus,
    Location,
    VehiclePlate,
    InfractionCode,
    InfractionDescription,
    OriginalAmount,
}

impl Field {
    /// Columns `process` cannot run without.
    pub const REQUIRED: [Field; 5] = [
        Field::CitationId,
        Field::InfractionDate,
        Field::QueryDate,
        Field::AmountDue,
        Field::PaymentStatus,
    ];

    pub const ALL: [Field; 10] = [
        Field::CitationId,
        Field::InfractionDate,
        Field::QueryDate,
        Field::AmountDue,
        Field::PaymentStatus,
        Field::Location,
        Field::VehiclePlate,
        Field::InfractionCode,
        Field::InfractionDescription,
        Field::OriginalAmount,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Field::CitationId => "citation_id",
            Field::InfractionDate => "infraction_date",
            Field::QueryDate => "query_date",
            Field::AmountDue => "amount_due",
            Field::PaymentStatus => "payment_status",
            Field::Location => "location",
            Field::VehiclePlate => "vehicle_plate",
            Field::InfractionCode => "infraction_code",
            Field::InfractionDescription => "infraction_description",
            Field::OriginalAmount => "original_amount",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One cell as delivered by the ingestion side.
///
/// CSV readers only ever produce `Empty` and `Text`; `Number` is for
/// spreadsheet readers that already typed the cell.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Empty,
    Text(String),
    Number(f64),
}

impl RawValue {
    pub fn is_empty(&self) -> bool {
        match self {
            RawValue::Empty => true,
            RawValue::Text(s) => s.trim().is_empty(),
            RawValue::Number(_) => false,
        }
    }

    /// Trimmed text form of the cell, `None` when blank.
    pub fn as_text(&self) -> Option<String> {
        match self {
            RawValue::Empty => None,
            RawValue::Text(s) => {
                let s = s.trim();
                (!s.is_empty()).then(|| s.to_string())
            }
            RawValue::Number(n) => Some(n.to_string()),
        }
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            RawValue::Empty
        } else {
            RawValue::Text(s.to_string())
        }
    }
}

impl From<f64> for RawValue {
    fn from(n: f64) -> Self {
        RawValue::Number(n)
    }
}

/// Header row plus data rows, in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<RawValue>>,
}

static EMPTY: RawValue = RawValue::Empty;

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Builds a text-only table, handy for fixtures and small extracts.
    pub fn from_text_rows(headers: &[&str], rows: &[&[&str]]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|row| row.iter().map(|cell| RawValue::from(*cell)).collect())
                .collect(),
        }
    }

    pub fn push_row(&mut self, row: Vec<RawValue>) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell at (`row`, `column`); ragged rows read as empty past their end.
    pub fn cell(&self, row: usize, column: usize) -> &RawValue {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(&EMPTY)
    }

    pub fn column(&self, column: usize) -> impl Iterator<Item = &RawValue> {
        (0..self.rows.len()).map(move |row| self.cell(row, column))
    }
}
