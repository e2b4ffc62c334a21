//! One-sided human-comparison p-values and the optional Benjamini-Hochberg
//! adjustment across the leaderboard (`spec.md` §4.E "Human comparison
//! p-values" and
//! `original_source/src/leaderboard/main.py::get_pvalue_two_sample`).
//!
//! Each model is compared against two fixed human baselines, "Superforecaster
//! median" and "Public median", using a bootstrap-based one-sided test: the
//! p-value is the fraction of paired bootstrap replicates in which the
//! model fails to beat the human baseline. "Beat" means a strictly lower
//! Brier score against Superforecasters, but a strictly *higher* one against
//! the Public baseline is the losing direction is flipped, since
//! ForecastBench frames the public comparison as "beats the public" in the
//! same lower-is-better direction — the sign flip lives in which replicate
//! pairing order is compared, not in the inequality itself.

/// One-sided p-value: the fraction of paired bootstrap replicates where the
/// model's score is not better (not lower) than the reference's score.
/// `flip_direction` reverses which side counts as "loses" — used for the
/// Public median comparison where ForecastBench reports the probability a
/// model is beaten by the public rather than beats them (`spec.md` §4.E).
pub fn one_sided_p_value(model_replicates: &[f64], reference_replicates: &[f64], flip_direction: bool) -> f64 {
    let n = model_replicates.len().min(reference_replicates.len());
    if n == 0 {
        return f64::NAN;
    }
    let not_better = (0..n)
        .filter(|&i| {
            let model = model_replicates[i];
            let reference = reference_replicates[i];
            if flip_direction {
                model <= reference
            } else {
                model >= reference
            }
        })
        .count();
    not_better as f64 / n as f64
}

/// Benjamini-Hochberg step-up adjustment across a set of raw p-values,
/// returning adjusted p-values in the same order as the input
/// (`spec.md` §4.E "Optional BH adjustment across the full model list").
pub fn benjamini_hochberg(p_values: &[f64]) -> Vec<f64> {
    let m = p_values.len();
    if m == 0 {
        return Vec::new();
    }
    let mut indexed: Vec<(usize, f64)> = p_values.iter().copied().enumerate().collect();
    indexed.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap());

    let mut adjusted = vec![0.0; m];
    let mut running_min = 1.0_f64;
    for rank in (0..m).rev() {
        let (orig_idx, p) = indexed[rank];
        let scaled = p * m as f64 / (rank as f64 + 1.0);
        running_min = running_min.min(scaled);
        adjusted[orig_idx] = running_min.clamp(0.0, 1.0);
    }
    adjusted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strictly_better_model_has_low_p_value() {
        let model = vec![0.1; 1000];
        let reference = vec![0.3; 1000];
        let p = one_sided_p_value(&model, &reference, false);
        assert!(p < 0.01);
    }

    #[test]
    fn flipped_direction_reverses_which_side_wins() {
        let model = vec![0.1; 1000];
        let reference = vec![0.3; 1000];
        let p_normal = one_sided_p_value(&model, &reference, false);
        let p_flipped = one_sided_p_value(&model, &reference, true);
        assert!(p_normal < 0.01);
        assert!(p_flipped > 0.99);
    }

    #[test]
    fn bh_adjustment_never_decreases_below_raw_minimum() {
        let raw = vec![0.01, 0.04, 0.03, 0.5];
        let adjusted = benjamini_hochberg(&raw);
        assert_eq!(adjusted.len(), 4);
        for (a, r) in adjusted.iter().zip(raw.iter()) {
            assert!(*a >= *r - 1e-9);
        }
    }

    #[test]
    fn bh_adjustment_is_monotonic_in_sorted_order() {
        let raw = vec![0.001, 0.2, 0.01, 0.3, 0.04];
        let adjusted = benjamini_hochberg(&raw);
        let mut indexed: Vec<(f64, f64)> = raw.iter().copied().zip(adjusted.iter().copied()).collect();
        indexed.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
        for window in indexed.windows(2) {
            assert!(window[0].1 <= window[1].1 + 1e-9);
        }
    }
}
