//! Locale-formatted money strings ("R$ 1.234,56") to `f64`.

use crate::table::RawValue;

/// Parses a monetary string written with `.` as thousands separator and `,`
/// as decimal separator.
///
/// Currency symbols, letters and whitespace are discarded first. Returns
/// `None` for blank input, unparseable leftovers and negative amounts.
pub fn parse_currency(raw: &str) -> Option<f64> {
    let kept: Vec<char> = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '-'))
        .collect();

    if kept.is_empty() {
        return None;
    }

    let mut cleaned = String::with_capacity(kept.len());
    for (i, &c) in kept.iter().enumerate() {
        if c == '.' && is_thousands_separator(&kept[i + 1..]) {
            continue;
        }
        cleaned.push(if c == ',' { '.' } else { c });
    }

    match cleaned.parse::<f64>() {
        // `+ 0.0` folds "-0,00" into positive zero.
        Ok(v) if v.is_finite() && v >= 0.0 => Some(v + 0.0),
        _ => None,
    }
}

/// A period is a thousands separator when exactly three digits follow it,
/// then either the end of the string or another separator.
fn is_thousands_separator(rest: &[char]) -> bool {
    rest.len() >= 3
        && rest[..3].iter().all(|c| c.is_ascii_digit())
        && rest.get(3).is_none_or(|c| matches!(c, '.' | ','))
}

/// Total over any input: anything unparseable becomes `0.0`.
pub fn normalize_currency(raw: &str) -> f64 {
    parse_currency(raw).unwrap_or(0.0)
}

/// Reads an amount cell. Already-numeric cells pass through when finite and
/// non-negative.
pub fn amount_from_cell(cell: &RawValue) -> Option<f64> {
    match cell {
        RawValue::Empty => None,
        RawValue::Text(s) => parse_currency(s),
        RawValue::Number(n) if n.is_finite() && *n >= 0.0 => Some(*n + 0.0),
        RawValue::Number(_) => None,
    }
}
