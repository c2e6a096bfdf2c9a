//! Output formatting and persistence for records, rollups and metrics.
//!
//! Supports pretty-printing, JSON files, canonical CSV export and CSV append.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info};

use crate::metrics::MetricsSnapshot;
use crate::record::FineRecord;
use csv::WriterBuilder;
use std::fs::{File, OpenOptions};
use std::path::Path;

/// Logs any value using Rust's debug pretty-print format.
pub fn print_pretty(value: &impl std::fmt::Debug) {
    debug!("{:#?}", value);
}

/// Writes a value to stdout as pretty-printed JSON.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Serializes a value as pretty JSON into `path`, replacing any existing file.
pub fn write_json(path: &str, value: &impl Serialize) -> Result<()> {
    let file = File::create(path).with_context(|| format!("failed to create '{path}'"))?;
    serde_json::to_writer_pretty(file, value)?;
    info!(path, "JSON written");
    Ok(())
}

/// Writes the canonical record set as CSV with a header row.
pub fn write_records(path: &str, records: &[FineRecord]) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("failed to create '{path}'"))?;

    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    info!(path, records = records.len(), "Records written");
    Ok(())
}

/// Adds one [`MetricsSnapshot`] row to a CSV history file.
///
/// A missing file is created and gets the column names first.
pub fn append_record(path: &str, snapshot: &MetricsSnapshot) -> Result<()> {
    let new_file = !Path::new(path).exists();
    let file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .with_context(|| format!("failed to open history '{path}'"))?;

    let mut writer = WriterBuilder::new()
        .has_headers(new_file)
        .from_writer(file);
    writer.serialize(snapshot)?;
    writer.flush()?;

    debug!(path, new_file, "Metrics snapshot appended");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::Metrics;
    use crate::record::PaymentStatus;
    use chrono::NaiveDate;
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    fn record(id: &str) -> FineRecord {
        FineRecord {
            citation_id: id.to_string(),
            infraction_date: NaiveDate::from_ymd_opt(2024, 3, 15),
            query_date: None,
            amount_due: 130.16,
            payment_status: PaymentStatus::Unpaid,
            location: "Av. Brasil".to_string(),
            vehicle_plate: Some("ABC1D23".to_string()),
            infraction_code: None,
            infraction_description: None,
            original_amount: None,
        }
    }

    #[test]
    fn test_print_pretty_does_not_panic() {
        print_pretty(&MetricsSnapshot::default());
    }

    #[test]
    fn test_print_json_does_not_panic() {
        print_json(&MetricsSnapshot::default()).unwrap();
    }

    #[test]
    fn test_write_json_roundtrips_as_value() {
        let path = temp_path("traffic_fines_test_report.json");
        write_json(&path, &record("A1")).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["citation_id"], "A1");
        assert_eq!(value["payment_status"], "UNPAID");
        assert_eq!(value["infraction_date"], "2024-03-15");
        assert!(value["query_date"].is_null());

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_records_header_and_rows() {
        let path = temp_path("traffic_fines_test_records.csv");
        write_records(&path, &[record("A1"), record("B2")]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("citation_id,infraction_date,query_date,amount_due"));
        assert!(lines[1].starts_with("A1,2024-03-15,,130.16,UNPAID,Av. Brasil,ABC1D23"));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_append_record_starts_history_with_columns() {
        let path = temp_path("traffic_fines_test_history.csv");
        if Path::new(&path).exists() {
            fs::remove_file(&path).unwrap();
        }

        let metrics = Metrics {
            total_fines: 4,
            ..Default::default()
        };
        append_record(&path, &MetricsSnapshot::from_metrics(&metrics)).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        let header = concat!(
            "timestamp,source,total_fines,",
            "total_amount_due,fines_current_month,last_query_date"
        );
        assert_eq!(lines.next(), Some(header));
        let row: Vec<_> = lines.next().unwrap().split(',').collect();
        assert_eq!(row[1], "");
        assert_eq!(row[2], "4");
        assert_eq!(lines.next(), None);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_append_record_writes_header_once() {
        let path = temp_path("traffic_fines_test_header.csv");
        if Path::new(&path).exists() {
            fs::remove_file(&path).unwrap();
        }

        let snapshot = MetricsSnapshot::default().with_source("fines.csv");
        append_record(&path, &snapshot).unwrap();
        append_record(&path, &snapshot).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines.iter().filter(|l| l.contains("timestamp")).count(), 1);
        assert!(lines[1].contains("fines.csv"));

        fs::remove_file(&path).unwrap();
    }
}
