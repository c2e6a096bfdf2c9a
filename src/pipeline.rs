//! Raw table to canonical record set.
//!
//! Stages run in a fixed order: validate columns, normalize cells, drop rows
//! by policy, deduplicate by citation, optionally keep one payment status.
//! Only column validation can fail; every later stage tolerates bad rows.

use chrono::NaiveDate;
use serde::Serialize;
use std::ops::Deref;
use tracing::{debug, info, warn};

use crate::config::PipelineConfig;
use crate::dedup::deduplicate;
use crate::error::FinesResult;
use crate::filter::filter_by_status;
use crate::normalize::{amount_from_cell, date_from_cell};
use crate::record::{FineRecord, PaymentStatus, UNKNOWN_LOCATION};
use crate::schema::{ResolvedColumns, check_parseable, validate};
use crate::table::{Field, Table};

/// What happened to the rows on the way through the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProcessReport {
    pub total_rows: usize,
    /// Rows dropped because the citation id was blank.
    pub blank_citations: usize,
    /// Non-blank amount cells that read as zero.
    pub unparsed_amounts: usize,
    /// Non-blank infraction or query date cells that read as missing.
    pub unparsed_dates: usize,
    pub dropped_undated: usize,
    pub duplicates_collapsed: usize,
    pub filtered_by_status: usize,
}

/// Deduplicated, validated records, read-only once built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanonicalRecordSet {
    records: Vec<FineRecord>,
    report: ProcessReport,
}

impl CanonicalRecordSet {
    pub fn report(&self) -> &ProcessReport {
        &self.report
    }

    pub fn into_records(self) -> Vec<FineRecord> {
        self.records
    }
}

impl Deref for CanonicalRecordSet {
    type Target = [FineRecord];

    fn deref(&self) -> &[FineRecord] {
        &self.records
    }
}

/// Runs `table` through the pipeline with the default configuration.
pub fn process(table: &Table) -> FinesResult<CanonicalRecordSet> {
    Pipeline::default().process(table)
}

#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Builds the canonical record set. Same table in, same records out.
    #[tracing::instrument(skip_all, fields(rows = table.len()))]
    pub fn process(&self, table: &Table) -> FinesResult<CanonicalRecordSet> {
        let columns = validate(&table.headers, &self.config.columns, &Field::REQUIRED)?;
        if self.config.strict_columns {
            check_parseable(
                table,
                &columns,
                &[Field::InfractionDate, Field::QueryDate, Field::AmountDue],
            )?;
        }
        debug!("Columns resolved");

        let mut report = ProcessReport {
            total_rows: table.len(),
            ..Default::default()
        };

        let mut records = Vec::with_capacity(table.len());
        for row in 0..table.len() {
            if let Some(record) = normalize_row(table, row, &columns, &mut report) {
                records.push(record);
            }
        }
        if report.blank_citations > 0 {
            warn!(count = report.blank_citations, "Dropped rows without citation id");
        }

        if self.config.drop_undated {
            let before = records.len();
            records.retain(|r| r.infraction_date.is_some() && r.query_date.is_some());
            report.dropped_undated = before - records.len();
            if report.dropped_undated > 0 {
                warn!(count = report.dropped_undated, "Dropped rows without valid dates");
            }
        }

        let before = records.len();
        let mut records = deduplicate(records);
        report.duplicates_collapsed = before - records.len();
        debug!(collapsed = report.duplicates_collapsed, "Deduplicated by citation");

        if let Some(status) = &self.config.status {
            let before = records.len();
            records = filter_by_status(&records, status);
            report.filtered_by_status = before - records.len();
        }

        info!(
            total_rows = report.total_rows,
            records = records.len(),
            unparsed_amounts = report.unparsed_amounts,
            unparsed_dates = report.unparsed_dates,
            "Pipeline finished"
        );

        Ok(CanonicalRecordSet { records, report })
    }
}

fn text(table: &Table, row: usize, columns: &ResolvedColumns, field: Field) -> Option<String> {
    columns
        .index(field)
        .and_then(|idx| table.cell(row, idx).as_text())
}

fn normalize_row(
    table: &Table,
    row: usize,
    columns: &ResolvedColumns,
    report: &mut ProcessReport,
) -> Option<FineRecord> {
    let Some(citation_id) = text(table, row, columns, Field::CitationId) else {
        report.blank_citations += 1;
        return None;
    };

    let mut read_date = |field: Field| -> Option<NaiveDate> {
        let cell = table.cell(row, columns.index(field)?);
        let date = date_from_cell(cell);
        if date.is_none() && !cell.is_empty() {
            report.unparsed_dates += 1;
        }
        date
    };
    let infraction_date = read_date(Field::InfractionDate);
    let query_date = read_date(Field::QueryDate);

    let amount_due = match columns.index(Field::AmountDue).map(|idx| table.cell(row, idx)) {
        Some(cell) if !cell.is_empty() => amount_from_cell(cell).unwrap_or_else(|| {
            report.unparsed_amounts += 1;
            0.0
        }),
        _ => 0.0,
    };

    let original_amount = columns
        .index(Field::OriginalAmount)
        .and_then(|idx| amount_from_cell(table.cell(row, idx)));

    let payment_status = PaymentStatus::parse(
        &text(table, row, columns, Field::PaymentStatus).unwrap_or_default(),
    );

    Some(FineRecord {
        citation_id,
        infraction_date,
        query_date,
        amount_due,
        payment_status,
        location: text(table, row, columns, Field::Location)
            .unwrap_or_else(|| UNKNOWN_LOCATION.to_string()),
        vehicle_plate: text(table, row, columns, Field::VehiclePlate),
        infraction_code: text(table, row, columns, Field::InfractionCode),
        infraction_description: text(table, row, columns, Field::InfractionDescription),
        original_amount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FinesError;
    use crate::metrics::compute_metrics;
    use crate::table::RawValue;
    use std::collections::HashSet;

    const HEADERS: [&str; 6] = [
        "Auto de Infração",
        "Data da Infração",
        "Dia da Consulta",
        "Valor a ser pago R$",
        "Status de Pagamento",
        "Local da Infração",
    ];

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn scenario() -> Table {
        Table::from_text_rows(
            &HEADERS,
            &[
                &["A1", "10/12/2023", "01/01/2024", "100,00", "UNPAID", "Av. Brasil"],
                &["A1", "10/12/2023", "01/02/2024", "100,00", "PAID", "Av. Brasil"],
                &["B2", "05/01/2024", "15/01/2024", "50,00", "UNPAID", ""],
            ],
        )
    }

    #[test]
    fn test_end_to_end_scenario() {
        let set = process(&scenario()).unwrap();
        assert_eq!(set.len(), 2);

        let a1 = set.iter().find(|r| r.citation_id == "A1").unwrap();
        assert_eq!(a1.query_date, Some(ymd(2024, 2, 1)));
        assert_eq!(a1.payment_status, PaymentStatus::Paid);

        let b2 = set.iter().find(|r| r.citation_id == "B2").unwrap();
        assert_eq!(b2.amount_due, 50.0);
        assert_eq!(b2.location, UNKNOWN_LOCATION);

        let unpaid = filter_by_status(&set, &PaymentStatus::Unpaid);
        assert_eq!(compute_metrics(&unpaid).total_amount_due, 50.0);
        assert_eq!(set.report().duplicates_collapsed, 1);
    }

    #[test]
    fn test_process_is_idempotent() {
        let table = scenario();
        let first = process(&table).unwrap();
        let second = process(&table).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_citations_are_unique() {
        let set = process(&scenario()).unwrap();
        let ids: HashSet<_> = set.iter().map(|r| r.citation_id.as_str()).collect();
        assert_eq!(ids.len(), set.len());
    }

    #[test]
    fn test_missing_amount_column_fails() {
        let table = Table::from_text_rows(
            &["Auto de Infração", "Data da Infração", "Dia da Consulta", "Status de Pagamento"],
            &[&["A1", "01/01/2024", "01/01/2024", "PAGO"]],
        );
        assert_eq!(
            process(&table).unwrap_err(),
            FinesError::MissingColumns {
                missing: vec![Field::AmountDue]
            }
        );
    }

    #[test]
    fn test_bad_cells_degrade_without_failing() {
        let table = Table::from_text_rows(
            &HEADERS,
            &[
                &["C1", "31/02/2024", "ontem", "isento", "não pago", "Rua A"],
                &["", "01/01/2024", "01/01/2024", "10,00", "PAGO", "Rua B"],
                &["C2", "", "", "", "pago", "Rua C"],
            ],
        );
        let set = process(&table).unwrap();
        assert_eq!(set.len(), 2);

        let c1 = &set[0];
        assert_eq!(c1.infraction_date, None);
        assert_eq!(c1.query_date, None);
        assert_eq!(c1.amount_due, 0.0);
        assert!(c1.is_unpaid());

        let report = set.report();
        assert_eq!(report.total_rows, 3);
        assert_eq!(report.blank_citations, 1);
        assert_eq!(report.unparsed_dates, 2);
        assert_eq!(report.unparsed_amounts, 1);
    }

    #[test]
    fn test_drop_undated_policy() {
        let table = Table::from_text_rows(
            &HEADERS,
            &[
                &["C1", "31/02/2024", "01/03/2024", "10,00", "PAGO", ""],
                &["C2", "01/02/2024", "01/03/2024", "10,00", "PAGO", ""],
            ],
        );
        let config = PipelineConfig {
            drop_undated: true,
            ..Default::default()
        };
        let set = Pipeline::new(config).process(&table).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set[0].citation_id, "C2");
        assert_eq!(set.report().dropped_undated, 1);
    }

    #[test]
    fn test_status_policy_runs_after_dedup() {
        let config = PipelineConfig::default().with_status(PaymentStatus::Unpaid);
        let set = Pipeline::new(config).process(&scenario()).unwrap();
        let ids: Vec<_> = set.iter().map(|r| r.citation_id.as_str()).collect();
        assert_eq!(ids, vec!["B2"]);
        assert_eq!(set.report().filtered_by_status, 1);
    }

    #[test]
    fn test_strict_columns_rejects_unreadable_amounts() {
        let table = Table::from_text_rows(
            &HEADERS,
            &[&["C1", "01/02/2024", "01/03/2024", "isento", "PAGO", ""]],
        );
        let config = PipelineConfig {
            strict_columns: true,
            ..Default::default()
        };
        let err = Pipeline::new(config).process(&table).unwrap_err();
        assert!(matches!(
            err,
            FinesError::UnparseableColumn {
                field: Field::AmountDue,
                ..
            }
        ));
        assert!(process(&table).is_ok());
    }

    #[test]
    fn test_optional_columns_and_numeric_cells() {
        let mut table = Table::new(
            [
                "citation_id",
                "infraction_date",
                "query_date",
                "amount_due",
                "payment_status",
                "Placa",
                "Enquadramento da Infração",
                "Descrição",
                "Valor original R$",
            ]
            .iter()
            .map(|h| h.to_string())
            .collect(),
        );
        table.push_row(vec![
            "Z9".into(),
            RawValue::Number(45292.0),
            "2024-01-03".into(),
            RawValue::Number(130.16),
            "Unpaid".into(),
            " ABC1D23 ".into(),
            "745-50".into(),
            "Avançar sinal vermelho".into(),
            "R$ 195,23".into(),
        ]);
        let set = process(&table).unwrap();
        let record = &set[0];
        assert_eq!(record.infraction_date, Some(ymd(2024, 1, 1)));
        assert_eq!(record.amount_due, 130.16);
        assert_eq!(record.vehicle_plate.as_deref(), Some("ABC1D23"));
        assert_eq!(record.infraction_code.as_deref(), Some("745-50"));
        assert_eq!(record.original_amount, Some(195.23));
        assert_eq!(record.location, UNKNOWN_LOCATION);
    }

    #[test]
    fn test_empty_table_is_not_an_error() {
        let table = Table::from_text_rows(&HEADERS, &[]);
        let set = process(&table).unwrap();
        assert!(set.is_empty());
        assert_eq!(compute_metrics(&set).total_fines, 0);
    }
}
