//! Column presence and type checks run before any normalization.

use std::collections::BTreeMap;

use crate::config::ColumnMapping;
use crate::error::{FinesError, FinesResult};
use crate::normalize::{amount_from_cell, date_from_cell};
use crate::table::{Field, Table};

/// Column index of every field found in the header row.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedColumns {
    columns: BTreeMap<Field, usize>,
    headers: Vec<String>,
}

impl ResolvedColumns {
    pub fn index(&self, field: Field) -> Option<usize> {
        self.columns.get(&field).copied()
    }

    /// Literal header text the field was matched to.
    pub fn header(&self, field: Field) -> Option<&str> {
        self.index(field).map(|i| self.headers[i].as_str())
    }
}

/// Resolves every known field against `headers` and fails with
/// [`FinesError::MissingColumns`] if any of `required` is absent.
///
/// Missing fields are reported in [`Field`] order, whatever order `required`
/// was given in.
pub fn validate(
    headers: &[String],
    mapping: &ColumnMapping,
    required: &[Field],
) -> FinesResult<ResolvedColumns> {
    let columns: BTreeMap<Field, usize> = Field::ALL
        .iter()
        .filter_map(|&field| mapping.find(field, headers).map(|idx| (field, idx)))
        .collect();

    let mut missing: Vec<Field> = required
        .iter()
        .copied()
        .filter(|field| !columns.contains_key(field))
        .collect();
    missing.sort();
    missing.dedup();

    if !missing.is_empty() {
        return Err(FinesError::MissingColumns { missing });
    }

    Ok(ResolvedColumns {
        columns,
        headers: headers.to_vec(),
    })
}

/// Whole-column check: every resolved date and amount column in `fields`
/// must hold at least one readable cell. Empty tables always pass.
pub fn check_parseable(
    table: &Table,
    resolved: &ResolvedColumns,
    fields: &[Field],
) -> FinesResult<()> {
    if table.is_empty() {
        return Ok(());
    }

    for &field in fields {
        let Some(idx) = resolved.index(field) else {
            continue;
        };
        let mut cells = table.column(idx);
        let readable = match field {
            Field::InfractionDate | Field::QueryDate => {
                cells.any(|cell| date_from_cell(cell).is_some())
            }
            Field::AmountDue | Field::OriginalAmount => {
                cells.any(|cell| amount_from_cell(cell).is_some())
            }
            _ => true,
        };
        if !readable {
            return Err(FinesError::UnparseableColumn {
                field,
                header: resolved.header(field).unwrap_or_default().to_string(),
            });
        }
    }

    Ok(())
}
