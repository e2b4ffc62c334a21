//! Stratified bootstrap confidence intervals for every leaderboard metric
//! (`spec.md` §4.E "Confidence intervals via bootstrap" and
//! `original_source/src/leaderboard/main.py::bootstrap_mean` /
//! `generate_bootstrap_question_pks`).
//!
//! Each replicate resamples questions with replacement within
//! `(forecast_due_date, source)` strata, so every replicate's question mix
//! still matches the real curation's per-day, per-source composition. A
//! resampled duplicate gets its own suffixed `question_pk`
//! (`"{question_pk}#{draw}"`) so the difficulty-adjustment fixed-effects
//! estimator treats it as an independent observation rather than silently
//! collapsing duplicates back to one row.
//!
//! Replicates are independent of each other, so the heavy per-replicate
//! recomputation (`compute_fn`, typically a full difficulty-adjustment +
//! scoring pass) is mapped with `rayon` across all available cores.

use std::collections::HashMap;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use crate::model::ScoredRow;

/// Group key for stratified resampling: the forecast round plus source.
fn strata_key(row: &ScoredRow) -> (chrono::NaiveDate, String) {
    (row.forecast_due_date, row.source.clone())
}

/// Produce one bootstrap replicate's row set by resampling distinct
/// question_pks with replacement within each stratum, then expanding back
/// to the full row set (every model's rows for the drawn question),
/// suffixing `question_pk` per draw so repeats don't alias.
pub fn resample_replicate(rows: &[ScoredRow], rng: &mut ChaCha8Rng) -> Vec<ScoredRow> {
    let mut strata: HashMap<(chrono::NaiveDate, String), Vec<&str>> = HashMap::new();
    let mut rows_by_question: HashMap<&str, Vec<&ScoredRow>> = HashMap::new();
    for row in rows {
        rows_by_question.entry(row.question_pk.as_str()).or_default().push(row);
    }
    for row in rows {
        let key = strata_key(row);
        let bucket = strata.entry(key).or_default();
        if !bucket.contains(&row.question_pk.as_str()) {
            bucket.push(row.question_pk.as_str());
        }
    }

    let mut out = Vec::with_capacity(rows.len());
    for (_key, question_pks) in strata {
        for draw in 0..question_pks.len() {
            let picked = question_pks.choose(rng).expect("non-empty stratum");
            let suffix = format!("{picked}#{draw}");
            for row in &rows_by_question[picked] {
                let mut cloned = (*row).clone();
                cloned.question_pk = suffix.clone();
                out.push(cloned);
            }
        }
    }
    out
}

/// Run `n_replicates` independent bootstrap replicates of `rows` through
/// `compute_fn` (which maps a resampled row set to `model_pk -> score`),
/// in parallel, returning every replicate's full score map.
pub fn bootstrap_replicates<F>(
    rows: &[ScoredRow],
    n_replicates: usize,
    seed: u64,
    compute_fn: F,
) -> Vec<HashMap<String, f64>>
where
    F: Fn(&[ScoredRow]) -> HashMap<String, f64> + Sync,
{
    (0..n_replicates)
        .into_par_iter()
        .map(|i| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(i as u64));
            let resampled = resample_replicate(rows, &mut rng);
            compute_fn(&resampled)
        })
        .collect()
}

/// Percentile-method two-sided 95% confidence interval from a model's
/// bootstrap replicate scores (`spec.md` §4.E "percentile method (default)").
pub fn percentile_ci(mut replicate_scores: Vec<f64>) -> (f64, f64) {
    replicate_scores.retain(|v| v.is_finite());
    if replicate_scores.is_empty() {
        return (f64::NAN, f64::NAN);
    }
    replicate_scores.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let lo = percentile(&replicate_scores, 0.025);
    let hi = percentile(&replicate_scores, 0.975);
    (lo, hi)
}

/// Bias-corrected-and-accelerated interval (`spec.md` §4.E "BCa (documented
/// alternative)"), computed from the original point estimate, the
/// replicate distribution, and jackknife-after-bootstrap influence values
/// over the coarse `(forecast_due_date, source)` strata (a faithful but
/// cheaper stand-in for a full per-question jackknife, documented in
/// `DESIGN.md`).
pub fn bca_ci(original: f64, replicates: &[f64], jackknife: &[f64]) -> (f64, f64) {
    let mut sorted: Vec<f64> = replicates.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return (f64::NAN, f64::NAN);
    }
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());

    let below = sorted.iter().filter(|&&v| v < original).count() as f64;
    let proportion = (below / sorted.len() as f64).clamp(1e-6, 1.0 - 1e-6);
    let z0 = inverse_normal_cdf(proportion);

    let mean_jack: f64 = jackknife.iter().sum::<f64>() / jackknife.len().max(1) as f64;
    let num: f64 = jackknife.iter().map(|v| (mean_jack - v).powi(3)).sum();
    let den: f64 = jackknife.iter().map(|v| (mean_jack - v).powi(2)).sum::<f64>().powf(1.5);
    let a = if den.abs() < 1e-12 { 0.0 } else { num / (6.0 * den) };

    let z_lo = -1.959963984540054_f64;
    let z_hi = 1.959963984540054_f64;
    let alpha_lo = normal_cdf(z0 + (z0 + z_lo) / (1.0 - a * (z0 + z_lo)));
    let alpha_hi = normal_cdf(z0 + (z0 + z_hi) / (1.0 - a * (z0 + z_hi)));

    (
        percentile(&sorted, alpha_lo.clamp(0.0, 1.0)),
        percentile(&sorted, alpha_hi.clamp(0.0, 1.0)),
    )
}

fn percentile(sorted: &[f64], q: f64) -> f64 {
    if sorted.len() == 1 {
        return sorted[0];
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let frac = pos - lo as f64;
        sorted[lo] * (1.0 - frac) + sorted[hi] * frac
    }
}

/// Standard normal CDF via the Abramowitz-Stegun erf approximation, enough
/// precision for CI endpoints.
fn normal_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / std::f64::consts::SQRT_2))
}

fn erf(x: f64) -> f64 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let a1 = 0.254829592;
    let a2 = -0.284496736;
    let a3 = 1.421413741;
    let a4 = -1.453152027;
    let a5 = 1.061405429;
    let p = 0.3275911;
    let t = 1.0 / (1.0 + p * x);
    let y = 1.0 - (((((a5 * t + a4) * t) + a3) * t + a2) * t + a1) * t * (-x * x).exp();
    sign * y
}

/// Inverse standard normal CDF (Acklam's rational approximation), used to
/// turn the BCa bias-correction proportion into a z-score.
fn inverse_normal_cdf(p: f64) -> f64 {
    let p = p.clamp(1e-10, 1.0 - 1e-10);
    let a = [
        -3.969683028665376e+01,
        2.209460984245205e+02,
        -2.759285104469687e+02,
        1.383577518672690e+02,
        -3.066479806614716e+01,
        2.506628277459239e+00,
    ];
    let b = [
        -5.447609879822406e+01,
        1.615858368580409e+02,
        -1.556989798598866e+02,
        6.680131188771972e+01,
        -1.328068155288572e+01,
    ];
    let c = [
        -7.784894002430293e-03,
        -3.223964580411365e-01,
        -2.400758277161838e+00,
        -2.549732539343734e+00,
        4.374664141464968e+00,
        2.938163982698783e+00,
    ];
    let d = [
        7.784695709041462e-03,
        3.224671290700398e-01,
        2.445134137142996e+00,
        3.754408661907416e+00,
    ];
    let p_low = 0.02425;
    let p_high = 1.0 - p_low;

    if p < p_low {
        let q = (-2.0 * p.ln()).sqrt();
        (((((c[0] * q + c[1]) * q + c[2]) * q + c[3]) * q + c[4]) * q + c[5])
            / ((((d[0] * q + d[1]) * q + d[2]) * q + d[3]) * q + 1.0)
    } else if p <= p_high {
        let q = p - 0.5;
        let r = q * q;
        (((((a[0] * r + a[1]) * r + a[2]) * r + a[3]) * r + a[4]) * r + a[5]) * q
            / (((((b[0] * r + b[1]) * r + b[2]) * r + b[3]) * r + b[4]) * r + 1.0)
    } else {
        let q = (-2.0 * (1.0 - p).ln()).sqrt();
        -(((((c[0] * q + c[1]) * q + c[2]) * q + c[3]) * q + c[4]) * q + c[5])
            / ((((d[0] * q + d[1]) * q + d[2]) * q + d[3]) * q + 1.0)
    }
}
