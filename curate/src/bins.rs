//! Bin assignment and composite-bin weight normalization for market-question
//! stratified sampling (`spec.md` §4.C step 3).
//!
//! Grounded in
//! `original_source/src/curate_questions/create_question_set/main.py`
//! (`get_market_value_bin`, `get_time_horizon_bin`, `add_bin_columns`,
//! `create_composite_bins`, `calculate_bin_weights`). Weight tables live in
//! `forecastbench_core::config` (`MARKET_VALUE_BINS`, `HORIZON_BINS`).

use std::collections::BTreeMap;

use forecastbench_core::config::{HORIZON_BINS, MARKET_VALUE_BINS, WEIGHT_DENOM};

/// A composite bin identifier: (market-value bin index, horizon bin index).
pub type CompositeBin = (usize, usize);

/// Assign a market probability in `[0,1]` to one of the 12 market-value
/// bins. Values exactly at `1.0` land in the last bin (`[0.99, 1.00]` is
/// inclusive on both ends).
pub fn market_value_bin(value: f64) -> usize {
    for (i, bin) in MARKET_VALUE_BINS.iter().enumerate() {
        let in_bin = if i == MARKET_VALUE_BINS.len() - 1 {
            value >= bin.low && value <= bin.high
        } else {
            value >= bin.low && value < bin.high
        };
        if in_bin {
            return i;
        }
    }
    MARKET_VALUE_BINS.len() - 1
}

/// Assign a days-to-close count to one of the 7 horizon bins.
pub fn horizon_bin(days_to_close: i64) -> usize {
    for (i, bin) in HORIZON_BINS.iter().enumerate() {
        let low = bin.low_days as i64;
        match bin.high_days {
            Some(high) if days_to_close >= low && days_to_close <= high as i64 => return i,
            None if days_to_close >= low => return i,
            _ => {}
        }
    }
    HORIZON_BINS.len() - 1
}

/// Composite weight = product of the two axis weights, re-normalized over
/// only the bins that have at least one observed candidate (the original's
/// `calculate_bin_weights` normalizes over observed bins, not the full
/// Cartesian product, so an empty bin doesn't silently steal weight from
/// the rest).
pub fn composite_bin_weights(observed: &[CompositeBin]) -> BTreeMap<CompositeBin, f64> {
    let raw: BTreeMap<CompositeBin, f64> = observed
        .iter()
        .map(|&(mv, h)| {
            let w = MARKET_VALUE_BINS[mv].numerator as f64 * HORIZON_BINS[h].numerator as f64;
            ((mv, h), w)
        })
        .collect();
    let total: f64 = raw.values().sum();
    if total == 0.0 {
        return raw;
    }
    raw.into_iter().map(|(k, w)| (k, w / total)).collect()
}

/// `spec.md` §8 property 4: each axis' weights sum to exactly 1 under
/// exact-rational arithmetic. `MARKET_VALUE_BINS`/`HORIZON_BINS` store
/// integer numerators over the shared `WEIGHT_DENOM`, so this is an exact
/// integer check, not a float comparison.
pub fn validate_axis_weights() -> anyhow::Result<()> {
    let mv_sum: u64 = MARKET_VALUE_BINS.iter().map(|b| b.numerator).sum();
    let h_sum: u64 = HORIZON_BINS.iter().map(|b| b.numerator).sum();
    if mv_sum != WEIGHT_DENOM {
        anyhow::bail!("market value bin weights sum to {mv_sum}, expected {WEIGHT_DENOM}");
    }
    if h_sum != WEIGHT_DENOM {
        anyhow::bail!("horizon bin weights sum to {h_sum}, expected {WEIGHT_DENOM}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_weights_sum_to_exactly_one() {
        validate_axis_weights().unwrap();
    }

    #[test]
    fn boundary_values_assign_to_expected_bin() {
        assert_eq!(market_value_bin(0.0), 0);
        assert_eq!(market_value_bin(0.005), 0);
        assert_eq!(market_value_bin(0.01), 1);
        assert_eq!(market_value_bin(1.0), 11);
        assert_eq!(market_value_bin(0.99), 11);
    }

    #[test]
    fn horizon_bin_covers_all_ranges() {
        assert_eq!(horizon_bin(0), 0);
        assert_eq!(horizon_bin(7), 0);
        assert_eq!(horizon_bin(8), 1);
        assert_eq!(horizon_bin(365), 5);
        assert_eq!(horizon_bin(366), 6);
        assert_eq!(horizon_bin(10_000), 6);
    }

    #[test]
    fn composite_weights_normalize_over_observed_bins_only() {
        let observed = vec![(0usize, 0usize), (1, 0)];
        let weights = composite_bin_weights(&observed);
        let total: f64 = weights.values().sum();
        assert!((total - 1.0).abs() < 1e-12);
    }
}
