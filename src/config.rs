//! Pipeline configuration: header aliases and row policies.
//!
//! Stored as a JSON object on disk; every key is optional:
//! ```json
//! {
//!   "columns": { "citation_id": ["Nº do Auto"], "amount_due": ["Valor"] },
//!   "drop_undated": false,
//!   "strict_columns": false,
//!   "status": "NÃO PAGO"
//! }
//! ```
//! Aliases given under `columns` are tried before the built-in ones.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::record::PaymentStatus;
use crate::table::Field;

/// Literal header names seen in the source spreadsheets, per field.
static DEFAULT_ALIASES: &[(Field, &[&str])] = &[
    (Field::CitationId, &["Auto de Infração", "Auto de Infracao", "citation_id"]),
    (Field::InfractionDate, &["Data da Infração", "Data da Infracao", "infraction_date"]),
    (Field::QueryDate, &["Dia da Consulta", "Data da Consulta", "query_date"]),
    (
        Field::AmountDue,
        &["Valor a ser pago R$", "Valor a Pagar (R$)", "Valor a Pagar", "amount_due"],
    ),
    (Field::PaymentStatus, &["Status de Pagamento", "Status", "payment_status"]),
    (Field::Location, &["Local da Infração", "Local da Infracao", "Local", "location"]),
    (Field::VehiclePlate, &["Placa Relacionada", "Placa", "vehicle_plate"]),
    (
        Field::InfractionCode,
        &["Enquadramento da Infração", "Enquadramento", "infraction_code"],
    ),
    (
        Field::InfractionDescription,
        &["Descrição", "Descricao", "infraction_description"],
    ),
    (Field::OriginalAmount, &["Valor original R$", "Valor Original R$", "original_amount"]),
];

/// Case- and whitespace-insensitive form used to compare headers.
pub fn header_key(header: &str) -> String {
    header
        .trim_start_matches('\u{feff}')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Maps each semantic field to the header aliases that may carry it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "BTreeMap<Field, Vec<String>>")]
pub struct ColumnMapping {
    aliases: BTreeMap<Field, Vec<String>>,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        let aliases = DEFAULT_ALIASES
            .iter()
            .map(|(field, names)| (*field, names.iter().map(|n| n.to_string()).collect()))
            .collect();
        Self { aliases }
    }
}

impl From<BTreeMap<Field, Vec<String>>> for ColumnMapping {
    fn from(overrides: BTreeMap<Field, Vec<String>>) -> Self {
        let mut mapping = ColumnMapping::default();
        for (field, names) in overrides {
            mapping.prepend(field, names);
        }
        mapping
    }
}

impl ColumnMapping {
    /// Adds aliases for `field`, ahead of the existing ones.
    pub fn prepend(&mut self, field: Field, names: Vec<String>) {
        let entry = self.aliases.entry(field).or_default();
        let mut merged = names;
        merged.extend(entry.drain(..));
        *entry = merged;
    }

    pub fn aliases(&self, field: Field) -> &[String] {
        self.aliases.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Index of the first header matching one of `field`'s aliases, trying
    /// aliases in order.
    pub fn find(&self, field: Field, headers: &[String]) -> Option<usize> {
        let keys: Vec<String> = headers.iter().map(|h| header_key(h)).collect();
        self.aliases(field).iter().find_map(|alias| {
            let alias = header_key(alias);
            keys.iter().position(|k| *k == alias)
        })
    }
}

/// Settings for one pipeline run.
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(default)]
pub struct PipelineConfig {
    pub columns: ColumnMapping,
    /// Drop rows whose infraction or query date could not be read.
    pub drop_undated: bool,
    /// Fail when a required date or amount column has no readable cell.
    pub strict_columns: bool,
    /// Keep only records with this payment status.
    pub status: Option<PaymentStatus>,
}

impl PipelineConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config '{}'", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("invalid config '{}'", path.display()))
    }

    pub fn with_status(mut self, status: PaymentStatus) -> Self {
        self.status = Some(status);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_find_ignores_case_and_spacing() {
        let mapping = ColumnMapping::default();
        let h = headers(&["  auto de  INFRAÇÃO ", "Placa"]);
        assert_eq!(mapping.find(Field::CitationId, &h), Some(0));
        assert_eq!(mapping.find(Field::VehiclePlate, &h), Some(1));
        assert_eq!(mapping.find(Field::Location, &h), None);
    }

    #[test]
    fn test_find_strips_bom() {
        let mapping = ColumnMapping::default();
        let h = headers(&["\u{feff}Auto de Infração"]);
        assert_eq!(mapping.find(Field::CitationId, &h), Some(0));
    }

    #[test]
    fn test_earlier_alias_wins() {
        let mapping = ColumnMapping::default();
        let h = headers(&["Placa", "Placa Relacionada"]);
        assert_eq!(mapping.find(Field::VehiclePlate, &h), Some(1));
    }

    #[test]
    fn test_overrides_take_precedence() {
        let config: PipelineConfig = serde_json::from_str(
            r#"{ "columns": { "amount_due": ["Valor"] }, "status": "não pago" }"#,
        )
        .unwrap();
        let h = headers(&["Valor a ser pago R$", "Valor"]);
        assert_eq!(config.columns.find(Field::AmountDue, &h), Some(1));
        assert_eq!(config.columns.aliases(Field::AmountDue)[1], "Valor a ser pago R$");
        assert_eq!(config.status, Some(PaymentStatus::Unpaid));
        assert!(!config.drop_undated);
    }

    #[test]
    fn test_empty_config_is_default() {
        let config: PipelineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn test_load_missing_file_fails() {
        assert!(PipelineConfig::load("/nonexistent/fines_config.json").is_err());
    }
}
