pub mod analyzers;
pub mod config;
pub mod dedup;
pub mod error;
pub mod filter;
pub mod metrics;
pub mod normalize;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod record;
pub mod schema;
pub mod services;
pub mod table;

pub use error::{FinesError, FinesResult};
pub use pipeline::{CanonicalRecordSet, Pipeline, ProcessReport, process};
pub use record::{FineRecord, PaymentStatus};
pub use table::{Field, RawValue, Table};
