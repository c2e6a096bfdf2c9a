//! Grouped rollups over the canonical record set.
//!
//! Every function here is a pure read of an immutable record slice, so the
//! rollups can be computed in any order, repeatedly, or side by side.

pub mod aggregate;
pub mod report;
pub mod types;
