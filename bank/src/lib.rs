//! The Question Bank (`spec.md` §4.B): question table, resolution store,
//! hash-mapping table, and the id-remap/nullify overrides that sit in front
//! of every adapter lookup.

pub mod hash_mapping;
pub mod question_table;
pub mod remap;
pub mod series_store;

pub use hash_mapping::HashMapping;
pub use question_table::QuestionTable;
pub use remap::{NullifyTable, RemapTable};
pub use series_store::ResolutionStore;

use chrono::NaiveDate;
use forecastbench_adapters::traits::SourceAdapter;
use forecastbench_core::{Question, SeriesPoint};

/// Apply the global remap and nullify tables before delegating to a
/// source's `resolve`, per `spec.md` §4.A: "Adapters must apply the global
/// id-remap and nullify tables before lookup."
pub fn resolve_with_overrides<A: SourceAdapter>(
    adapter: &A,
    remap: &RemapTable,
    nullify: &NullifyTable,
    raw_id: &str,
    question: &Question,
    forecast_due_date: NaiveDate,
    resolution_date: NaiveDate,
    series: &[SeriesPoint],
) -> f64 {
    let canonical_id = remap.resolve(raw_id);
    if nullify.is_nullified(canonical_id, forecast_due_date) {
        return f64::NAN;
    }
    adapter.resolve(question, forecast_due_date, resolution_date, series)
}
