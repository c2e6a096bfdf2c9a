//! Delimited-text reader for spreadsheet exports.

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use flate2::read::GzDecoder;
use std::borrow::Cow;
use std::io::Read;
use std::path::Path;
use tracing::debug;

use crate::table::{RawValue, Table};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Windows-1252 code points for bytes 0x80..=0x9F. Unassigned bytes map to
/// the C1 control of the same value.
const CP1252_HIGH: [char; 32] = [
    '\u{20AC}', '\u{81}', '\u{201A}', '\u{192}', '\u{201E}', '\u{2026}', '\u{2020}', '\u{2021}',
    '\u{2C6}', '\u{2030}', '\u{160}', '\u{2039}', '\u{152}', '\u{8D}', '\u{17D}', '\u{8F}',
    '\u{90}', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '\u{2022}', '\u{2013}', '\u{2014}',
    '\u{2DC}', '\u{2122}', '\u{161}', '\u{203A}', '\u{153}', '\u{9D}', '\u{17E}', '\u{178}',
];

fn cp1252_char(byte: u8) -> char {
    match byte {
        0x80..=0x9F => CP1252_HIGH[usize::from(byte - 0x80)],
        _ => char::from(byte),
    }
}

/// Export text. Bytes that are not valid UTF-8 are read as Windows-1252,
/// which is what Excel writes on Brazilian Windows installs.
fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => {
            debug!("Input is not UTF-8, decoding as Windows-1252");
            Cow::Owned(bytes.iter().copied().map(cp1252_char).collect())
        }
    }
}

/// Picks the delimiter occurring most often in the header line. Brazilian
/// exports usually use `;` because `,` is the decimal separator.
fn detect_delimiter(bytes: &[u8]) -> u8 {
    let header = bytes.split(|b| *b == b'\n').next().unwrap_or_default();
    [b';', b',', b'\t']
        .into_iter()
        .max_by_key(|d| header.iter().filter(|b| *b == d).count())
        .filter(|d| header.contains(d))
        .unwrap_or(b',')
}

/// Decodes CSV (or `;`/tab separated) bytes into a [`Table`].
///
/// The first record is the header row. Rows may be ragged. Input is UTF-8
/// (with or without BOM) or, failing that, Windows-1252.
///
/// # Errors
///
/// Returns an error if the text is not well-formed delimited data.
pub fn parse_table(bytes: &[u8]) -> Result<Table> {
    let text = decode_text(bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes));
    let bytes = text.as_bytes();
    let delimiter = detect_delimiter(bytes);

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .context("failed to read header row")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    let mut table = Table::new(headers);

    for (line, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("malformed row {}", line + 1))?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        table.push_row(record.iter().map(RawValue::from).collect());
    }

    debug!(
        delimiter = %(delimiter as char).escape_default(),
        columns = table.headers.len(),
        rows = table.len(),
        "Table parsed"
    );
    Ok(table)
}

/// Reads a table from a file. Paths ending in `.gz` are decompressed first.
#[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_table(path: impl AsRef<Path>) -> Result<Table> {
    let path = path.as_ref();
    let raw = std::fs::read(path).with_context(|| format!("failed to read '{}'", path.display()))?;

    let bytes = if path.extension().and_then(|e| e.to_str()) == Some("gz") {
        let mut decoded = Vec::new();
        GzDecoder::new(raw.as_slice())
            .read_to_end(&mut decoded)
            .with_context(|| format!("failed to decompress '{}'", path.display()))?;
        decoded
    } else {
        raw
    };

    parse_table(&bytes)
}
