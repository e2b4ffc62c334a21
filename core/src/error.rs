//! Error types shared by the core crates.
//!
//! Mirrors the teacher's pattern (`extract/src/platforms.rs::MarketError`):
//! a hand-written enum with manual `Display`/`Error` impls so callers match
//! on variant to decide severity, rather than opaque `anyhow::Error` at
//! every layer. `spec.md` §7 splits errors into three kinds; only the first
//! is represented here as a typed enum, since the second (availability) is a
//! collaborator concern and the third (semantic uncertainty) is not an error
//! at all — it is the `NaN` sentinel threaded through `resolve()`.

use std::fmt;

/// Data-integrity errors: fatal, abort the job.
#[derive(Debug)]
pub enum CoreError {
    /// A question id could not be hashed or reconstructed from its key dict.
    UnhashableId { detail: String },
    /// Two rows in a resolution series claim the same (id, date) with
    /// different values.
    DuplicateSeriesPoint { id: String, date: String },
    /// A resolution series is missing a day between its start and the
    /// expected end, i.e. it is not contiguous.
    NonContiguousSeries { id: String, gap_start: String },
    /// A forecast file violates the (id, source, resolution_date, direction)
    /// uniqueness invariant for dataset rows.
    DuplicateForecastRow {
        id: String,
        resolution_date: String,
    },
    /// A forecast file is missing a required top-level key.
    MalformedForecastFile { missing_key: &'static str },
    /// A submitted forecast references a source outside the closed set.
    UnknownSource { source: String },
    /// A submitted forecast value falls outside [0, 1].
    ForecastOutOfRange { id: String, value: f64 },
    /// The resolution-date on a dataset row is not in the question's
    /// allowed horizon set.
    InvalidResolutionDate { id: String, resolution_date: String },
    /// The market-source resolution data backing a curation run is stale
    /// (last row older than yesterday UTC).
    StaleResolutionData { source: String, last_date: String },
    /// A reference model required for Brier Skill Score or the x%-oracle
    /// family is absent from the input set.
    MissingReferenceModel { model: &'static str },
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::UnhashableId { detail } => {
                write!(f, "could not hash question id: {detail}")
            }
            CoreError::DuplicateSeriesPoint { id, date } => {
                write!(f, "duplicate resolution series point for {id} on {date}")
            }
            CoreError::NonContiguousSeries { id, gap_start } => {
                write!(f, "resolution series for {id} has a gap starting {gap_start}")
            }
            CoreError::DuplicateForecastRow { id, resolution_date } => write!(
                f,
                "duplicate forecast row for {id} at resolution date {resolution_date}"
            ),
            CoreError::MalformedForecastFile { missing_key } => {
                write!(f, "forecast file missing required key `{missing_key}`")
            }
            CoreError::UnknownSource { source } => write!(f, "unknown source `{source}`"),
            CoreError::ForecastOutOfRange { id, value } => {
                write!(f, "forecast for {id} out of range [0,1]: {value}")
            }
            CoreError::InvalidResolutionDate { id, resolution_date } => write!(
                f,
                "resolution date {resolution_date} for {id} is not an allowed horizon"
            ),
            CoreError::StaleResolutionData { source, last_date } => write!(
                f,
                "resolution data for `{source}` is stale: last row is {last_date}"
            ),
            CoreError::MissingReferenceModel { model } => {
                write!(f, "required reference model `{model}` not present in input")
            }
        }
    }
}

impl std::error::Error for CoreError {}
