//! Cell-level normalizers.
//!
//! Every function here is total: a cell that cannot be read yields `None`
//! (or zero for the `normalize_*` currency helper), never an error.

pub mod currency;
pub mod date;

pub use currency::{amount_from_cell, normalize_currency, parse_currency};
pub use date::{date_from_cell, normalize_date};

/// Upper-cases, trims and collapses inner whitespace runs to a single space.
pub fn normalize_label(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}
