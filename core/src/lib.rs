//! Shared data model, configuration, and error types for every stage of the
//! ForecastBench question lifecycle (source adapters, question bank,
//! curator, resolution engine, scoring).

pub mod config;
pub mod dates;
pub mod error;
pub mod ids;
pub mod model;

pub use error::CoreError;
pub use model::*;
