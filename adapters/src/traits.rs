//! The Source Adapter Contract (`spec.md` §4.A): three pure operations per
//! source family. The fetch plumbing (HTTP, retries, rate limiting) is an
//! external collaborator — these traits take already-fetched raw records
//! and already-built resolution series as input.

use chrono::NaiveDate;
use forecastbench_core::{Question, QuestionId, SeriesPoint};

use crate::error::AdapterError;

/// Implemented once per source family (market, numeric, event-count,
/// encyclopedic-table). `spec.md` §9's redesign note turns the original's
/// string-keyed source dispatch into dispatch on this trait, selected by
/// matching on the `Question` variant.
pub trait SourceAdapter {
    /// The adapter's raw input shape, as produced by the (external) fetcher.
    type Raw;

    /// Produce the canonical question record, including category
    /// assignment and the freeze-time observed value.
    fn normalize(&self, raw: Self::Raw) -> Result<Question, AdapterError>;

    /// Produce a contiguous, forward-filled daily series ending at
    /// yesterday UTC, starting no earlier than this source's epoch.
    fn resolution_series(
        &self,
        id: &QuestionId,
        today: NaiveDate,
        observations: &[SeriesPoint],
        epoch: NaiveDate,
    ) -> Result<Vec<SeriesPoint>, AdapterError>;

    /// Resolve a single (id, forecast_due_date, resolution_date) against a
    /// series already produced by [`SourceAdapter::resolution_series`].
    /// Returns `NaN` for semantic uncertainty (`spec.md` §7) — never an
    /// error for that case.
    fn resolve(
        &self,
        question: &Question,
        forecast_due_date: NaiveDate,
        resolution_date: NaiveDate,
        series: &[SeriesPoint],
    ) -> f64;
}
