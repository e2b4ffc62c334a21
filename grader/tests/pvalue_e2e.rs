//! E2E-6: a model whose forecasting skill is genuinely on par with a human
//! reference -- beating it on some draws, losing on others in equal
//! measure -- gets a human-comparison p-value near 0.5, neither a
//! confident win nor a confident loss. Exercised through
//! `forecastbench_grader::pvalue::one_sided_p_value`, the crate's public
//! p-value entry point.
//!
//! This is deliberately built from a model that trades wins and losses
//! against the reference (half its replicates strictly better, half
//! strictly worse) rather than literal exact ties: an exact tie on every
//! replicate is a distinct, degenerate edge case under the `>=`/`<=`
//! "not better" convention (it counts as "not better" every time, giving
//! p=1.0, not 0.5) and is not what this scenario is about.

use forecastbench_grader::pvalue::one_sided_p_value;

#[test]
fn evenly_split_wins_and_losses_give_a_p_value_near_one_half() {
    let n = 1000;
    let reference = vec![0.22_f64; n];
    let model: Vec<f64> = (0..n).map(|i| if i % 2 == 0 { 0.20 } else { 0.24 }).collect();

    let p = one_sided_p_value(&model, &reference, false);
    assert!((p - 0.5).abs() < 1e-9, "p = {p}");
}

#[test]
fn flipping_direction_on_an_evenly_split_comparison_still_lands_near_one_half() {
    let n = 1000;
    let reference = vec![0.22_f64; n];
    let model: Vec<f64> = (0..n).map(|i| if i % 2 == 0 { 0.20 } else { 0.24 }).collect();

    let p = one_sided_p_value(&model, &reference, true);
    assert!((p - 0.5).abs() < 1e-9, "p = {p}");
}
