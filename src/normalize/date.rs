//! Day-first date strings ("03/04/2024" is the 3rd of April) to `NaiveDate`.

use chrono::{Days, NaiveDate, NaiveTime};

use crate::table::RawValue;

/// Spreadsheet serial dates count days from this epoch.
const SERIAL_EPOCH: (i32, u32, u32) = (1899, 12, 30);
/// 9999-12-31 as a serial date.
const MAX_SERIAL: f64 = 2_958_465.0;

/// Parses a date written day-first (`DD/MM/YYYY`, `DD-MM-YYYY`, `DD.MM.YYYY`,
/// `DD/MM/YY`) or as ISO `YYYY-MM-DD`, optionally followed by a time of day.
///
/// Returns `None` for anything else, including impossible calendar dates
/// such as `31/02/2024`.
pub fn normalize_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let (date_part, time_part) = match raw.find([' ', 'T']) {
        Some(idx) => (&raw[..idx], Some(raw[idx + 1..].trim())),
        None => (raw, None),
    };

    if let Some(time) = time_part {
        if !is_time_of_day(time) {
            return None;
        }
    }

    let parts: Vec<&str> = date_part.split(['/', '-', '.']).collect();
    let all_digits = |p: &&str| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit());
    if parts.len() != 3 || !parts.iter().all(all_digits) {
        return None;
    }

    // Year-first only when the leading group is unmistakably a year.
    let (year, month, day) = if parts[0].len() == 4 {
        (parts[0], parts[1], parts[2])
    } else {
        (parts[2], parts[1], parts[0])
    };

    if day.len() > 2 || month.len() > 2 {
        return None;
    }

    let year = match year.len() {
        4 => year.parse::<i32>().ok()?,
        2 => expand_two_digit_year(year.parse::<i32>().ok()?),
        _ => return None,
    };

    NaiveDate::from_ymd_opt(year, month.parse().ok()?, day.parse().ok()?)
}

fn expand_two_digit_year(yy: i32) -> i32 {
    if yy < 70 { 2000 + yy } else { 1900 + yy }
}

fn is_time_of_day(s: &str) -> bool {
    ["%H:%M:%S%.f", "%H:%M:%S", "%H:%M"]
        .iter()
        .any(|fmt| NaiveTime::parse_from_str(s, fmt).is_ok())
}

/// Reads a date cell. Numeric cells are treated as spreadsheet serial dates.
pub fn date_from_cell(cell: &RawValue) -> Option<NaiveDate> {
    match cell {
        RawValue::Empty => None,
        RawValue::Text(s) => normalize_date(s),
        RawValue::Number(n) => from_serial(*n),
    }
}

fn from_serial(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || !(1.0..=MAX_SERIAL).contains(&serial) {
        return None;
    }
    let (y, m, d) = SERIAL_EPOCH;
    NaiveDate::from_ymd_opt(y, m, d)?.checked_add_days(Days::new(serial.trunc() as u64))
}
