//! SOTA envelope and the LLM/superforecaster parity date estimate
//! (`spec.md` §4.E "SOTA envelope and parity regression" and
//! `original_source/src/leaderboard/main.py::get_sota_dates` /
//! `find_best_model_for_each_question_set`).
//!
//! The "envelope" is, for each forecast round, the best (lowest) score any
//! LLM achieved up to and including that round. A least-squares line is
//! fit through the envelope's trend over time and intersected with the
//! (flat) superforecaster reference score; the intersection's date is the
//! estimated day an LLM matches superforecaster performance. Run once per
//! bootstrap replicate, the distribution of intersection dates gives a
//! 2.5/50/97.5 percentile summary of that estimate's uncertainty.

use chrono::NaiveDate;

/// One (forecast_due_date, best LLM score at or before that date) point on
/// the cumulative SOTA envelope.
#[derive(Debug, Clone, Copy)]
pub struct EnvelopePoint {
    pub forecast_due_date: NaiveDate,
    pub best_score: f64,
}

/// Build the cumulative-best envelope over a series of (date, score) model
/// observations, one point per distinct forecast round, monotonically
/// non-increasing by construction (`spec.md` §4.E "best LLM score achieved
/// by or before each round").
pub fn sota_envelope(mut rounds: Vec<(NaiveDate, f64)>) -> Vec<EnvelopePoint> {
    rounds.sort_by_key(|(date, _)| *date);
    let mut envelope = Vec::with_capacity(rounds.len());
    let mut best = f64::INFINITY;
    for (date, score) in rounds {
        best = best.min(score);
        envelope.push(EnvelopePoint { forecast_due_date: date, best_score: best });
    }
    envelope
}

/// Ordinary least squares slope/intercept of `score ~ days_since_epoch`,
/// used to project the envelope's trend forward to a parity date.
fn fit_line(points: &[(f64, f64)]) -> (f64, f64) {
    let n = points.len() as f64;
    let mean_x: f64 = points.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y: f64 = points.iter().map(|(_, y)| y).sum::<f64>() / n;
    let mut num = 0.0;
    let mut den = 0.0;
    for (x, y) in points {
        num += (x - mean_x) * (y - mean_y);
        den += (x - mean_x).powi(2);
    }
    let slope = if den.abs() < 1e-12 { 0.0 } else { num / den };
    let intercept = mean_y - slope * mean_x;
    (slope, intercept)
}

/// Fit a least-squares trend line through the envelope and solve for the
/// day index at which it crosses `reference_score` (e.g. the
/// Superforecaster median's difficulty-adjusted score). Returns `None` if
/// the trend is flat or already past parity with no further improvement
/// expected (`spec.md` §4.E "may be undefined if the trend does not
/// converge").
pub fn parity_day_index(envelope: &[EnvelopePoint], epoch: NaiveDate, reference_score: f64) -> Option<f64> {
    if envelope.len() < 2 {
        return None;
    }
    let points: Vec<(f64, f64)> = envelope
        .iter()
        .map(|p| ((p.forecast_due_date - epoch).num_days() as f64, p.best_score))
        .collect();
    let (slope, intercept) = fit_line(&points);
    if slope >= 0.0 {
        // Envelope trend is flat or getting worse over time; no projected
        // crossing (scores are Brier, lower is better, so improvement
        // requires a negative slope).
        return None;
    }
    Some((reference_score - intercept) / slope)
}

/// 2.5/50/97.5 percentile summary of a bootstrap distribution of parity day
/// indices, converted back to dates (`spec.md` §4.E "summarized as
/// 2.5/50/97.5 percentile dates across bootstrap replicates").
pub fn summarize_parity_dates(epoch: NaiveDate, mut day_indices: Vec<f64>) -> (Option<NaiveDate>, Option<NaiveDate>, Option<NaiveDate>) {
    day_indices.retain(|d| d.is_finite());
    if day_indices.is_empty() {
        return (None, None, None);
    }
    day_indices.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let p2_5 = day_index_to_date(epoch, percentile(&day_indices, 0.025));
    let p50 = day_index_to_date(epoch, percentile(&day_indices, 0.5));
    let p97_5 = day_index_to_date(epoch, percentile(&day_indices, 0.975));
    (p2_5, p50, p97_5)
}

fn day_index_to_date(epoch: NaiveDate, day_index: f64) -> Option<NaiveDate> {
    epoch.checked_add_signed(chrono::Duration::days(day_index.round() as i64))
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
