//! Integration test for `spec.md` §8 property 4: "market-value bin weights
//! and horizon-bin weights each sum to exactly 1 under rational
//! arithmetic." Exercised at the crate-boundary level against the bin
//! tables `forecastbench_core::config` publishes, independent of how
//! `forecastbench-curate` happens to consume them.

use forecastbench_core::config::{validate_bin_weights, HORIZON_BINS, MARKET_VALUE_BINS, WEIGHT_DENOM};

#[test]
fn market_value_bin_numerators_sum_to_exactly_one() {
    let numerators: Vec<u64> = MARKET_VALUE_BINS.iter().map(|b| b.numerator).collect();
    validate_bin_weights(&numerators).expect("market value bin weights must sum to WEIGHT_DENOM");
    let sum: u64 = numerators.iter().sum();
    assert_eq!(sum, WEIGHT_DENOM);
}

#[test]
fn horizon_bin_numerators_sum_to_exactly_one() {
    let numerators: Vec<u64> = HORIZON_BINS.iter().map(|b| b.numerator).collect();
    validate_bin_weights(&numerators).expect("horizon bin weights must sum to WEIGHT_DENOM");
    let sum: u64 = numerators.iter().sum();
    assert_eq!(sum, WEIGHT_DENOM);
}

#[test]
fn bin_tables_have_the_expected_cardinality() {
    // 12 market-value bins, 7 horizon bins (spec.md §4.C step 3).
    assert_eq!(MARKET_VALUE_BINS.len(), 12);
    assert_eq!(HORIZON_BINS.len(), 7);
}
