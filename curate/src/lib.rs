//! The Question-Set Curator (`spec.md` §4.C): filter -> allocate -> sample
//! -> expand -> derive human set, with per-source telemetry logged along
//! the way (`spec.md` §4.C "Telemetry").

pub mod allocate;
pub mod bins;
pub mod filter;
pub mod stratify;

pub use allocate::allocate_evenly;
pub use bins::{composite_bin_weights, horizon_bin, market_value_bin, validate_axis_weights, CompositeBin};
pub use filter::filter_candidates;
pub use stratify::stratified_sample;
