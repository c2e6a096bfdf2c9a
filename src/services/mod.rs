//! Outside capabilities the pipeline can be handed.

pub mod geocode;
