//! Structural errors raised by the fines pipeline.
//!
//! Only table-level problems surface here. Bad cells never do: they degrade
//! to zero amounts or missing dates inside the record.

use thiserror::Error;

use crate::table::Field;

#[derive(Debug, Error, PartialEq)]
pub enum FinesError {
    #[error("missing required columns: {}", join_fields(.missing))]
    MissingColumns { missing: Vec<Field> },

    #[error("column '{header}' ({field}) has no parseable values")]
    UnparseableColumn { field: Field, header: String },
}

pub type FinesResult<T> = Result<T, FinesError>;

fn join_fields(fields: &[Field]) -> String {
    fields
        .iter()
        .map(|f| f.name())
        .collect::<Vec<_>>()
        .join(", ")
}
