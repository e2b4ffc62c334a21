//! Adapter-level errors, in the teacher's style
//! (`extract/src/platforms.rs::MarketError`): one enum, manual `Display`,
//! variants split by severity so the caller (`extract/src/main.rs`'s
//! pattern, here `curate`/`bank`) can decide whether to `trace!` or
//! `error!`.

use std::fmt;

#[derive(Debug)]
pub enum AdapterError {
    /// The raw record does not describe a question at all (e.g. a
    /// cancelled draft, a non-binary market). Expected, logged at `trace!`.
    NotAQuestion(String),
    /// The question exists but has no resolvable outcome yet.
    NotYetResolvable(String),
    /// The upstream record was withdrawn or annulled.
    Cancelled(String),
    /// The raw record's shape didn't match what this adapter expects.
    DeserializationError { id: String, detail: String },
    /// The record parsed, but contains an internally inconsistent value
    /// (e.g. a negative event count, a close time before the open time).
    DataInvalid { id: String, detail: String },
    /// A downstream computation failed in a way that indicates a bug
    /// rather than bad input (e.g. an empty resolution series made it past
    /// validation).
    ProcessingError { id: String, detail: String },
}

impl fmt::Display for AdapterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdapterError::NotAQuestion(id) => write!(f, "{id}: not a question"),
            AdapterError::NotYetResolvable(id) => write!(f, "{id}: not yet resolvable"),
            AdapterError::Cancelled(id) => write!(f, "{id}: cancelled/annulled"),
            AdapterError::DeserializationError { id, detail } => {
                write!(f, "{id}: deserialization error: {detail}")
            }
            AdapterError::DataInvalid { id, detail } => {
                write!(f, "{id}: invalid data: {detail}")
            }
            AdapterError::ProcessingError { id, detail } => {
                write!(f, "{id}: processing error: {detail}")
            }
        }
    }
}

impl std::error::Error for AdapterError {}

impl AdapterError {
    /// Expected/informational errors log at `trace!`; everything else is a
    /// real problem worth `error!` (`spec.md` §7's severity split, applied
    /// at the adapter boundary exactly as `extract/src/main.rs` does for
    /// `MarketError`).
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            AdapterError::NotAQuestion(_)
                | AdapterError::NotYetResolvable(_)
                | AdapterError::Cancelled(_)
        )
    }
}
