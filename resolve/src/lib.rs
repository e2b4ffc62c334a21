//! The Resolution Engine (`spec.md` §4.D): validates a model's submitted
//! forecast file against its question set, joins it with imputed rows for
//! every expected target, resolves every target's ground truth via the
//! Source Adapter Contract, and emits a processed forecast set plus a
//! ground-truth-only resolution set.

pub mod dispatch;
pub mod process;
pub mod resolution_set;
pub mod resolved_values;
pub mod validate;

pub use process::{expected_targets, imputed_fraction, process_forecast_set};
pub use resolution_set::build_resolution_set;
pub use resolved_values::{ResolutionContext, ResolvedValues};
pub use validate::{validate_forecast_rows, ValidationOutcome};
