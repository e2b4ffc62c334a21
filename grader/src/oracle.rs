//! The x% oracle family: 201 synthetic forecasters, one per 0.5 percentage
//! point from 0% to 100%, each of which answers every question with
//! `x` if the true resolution is 1 and `1 - x` if it is 0 (`spec.md` §4.E
//! "x% oracle family" and
//! `original_source/src/leaderboard/main.py::generate_oracle_rows`).
//!
//! These rows are injected into the same scored-row pool used for
//! difficulty adjustment, so each oracle's difficulty-adjusted score lands
//! on the same scale as every submitted model, and a model's score can be
//! reported as "equivalent to the largest x-oracle it still matches or
//! beats" (see [`nearest_oracle_equivalent`]).

use forecastbench_core::config::BenchmarkConstants;

use crate::model::{QuestionType, ScoredRow};

/// Step between adjacent oracle forecasters, giving 201 oracles at
/// 0.000, 0.005, ..., 1.000.
pub const ORACLE_STEP: f64 = 0.005;
pub const ORACLE_COUNT: usize = 201;

/// Display name for the oracle at fraction `x`, e.g. `"50.0% forecaster"`.
pub fn oracle_name(x: f64) -> String {
    format!("{:.1}% forecaster", x * 100.0)
}

/// Every oracle fraction from 0.0 to 1.0 inclusive, in ascending order.
pub fn oracle_fractions() -> Vec<f64> {
    (0..ORACLE_COUNT).map(|i| i as f64 * ORACLE_STEP).collect()
}

/// Synthesize one oracle forecaster's rows against the given set of
/// (question_pk, question_type, resolved_to) observations, one row per
/// question so the oracle participates in difficulty adjustment exactly
/// like a submitted model.
pub fn oracle_rows(
    x: f64,
    forecast_due_date: chrono::NaiveDate,
    questions: &[(String, QuestionType, f64)],
) -> Vec<ScoredRow> {
    let model = oracle_name(x);
    questions
        .iter()
        .map(|(question_pk, question_type, resolved_to)| {
            let forecast = if *resolved_to >= 0.5 { x } else { 1.0 - x };
            ScoredRow::new(
                BenchmarkConstants::BENCHMARK_NAME.to_string(),
                model.clone(),
                BenchmarkConstants::BENCHMARK_NAME.to_string(),
                forecast_due_date,
                String::new(),
                *question_type,
                question_pk.clone(),
                forecast,
                *resolved_to,
            )
        })
        .collect()
}

/// The largest oracle fraction `x` whose score the model matches or beats
/// (`spec.md` §4.E "x%-oracle equivalent": "the largest x such that the
/// x-oracle's overall score is <= the model's score", the exact scan in
/// `original_source/src/leaderboard/main.py::get_x_pct_oracle_equivalent`).
/// `oracle_scores` need not be pre-sorted by `x`: this walks every
/// `(x, oracle_score)` pair in ascending `x` order and keeps overwriting
/// the running answer whenever `model_score <= oracle_score`, so the final
/// value is the *last* (i.e. largest) `x` for which the model is at least
/// as good as that oracle. Returns `x * 100` (a percentage), or `NaN` if
/// the model beats no oracle at all (shouldn't happen for a valid Brier
/// score, since the `x=0.0` oracle scores at or near the worst possible).
pub fn nearest_oracle_equivalent(model_score: f64, oracle_scores: &[(f64, f64)]) -> f64 {
    let mut sorted: Vec<(f64, f64)> = oracle_scores.to_vec();
    sorted.sort_by(|(x1, _), (x2, _)| x1.partial_cmp(x2).unwrap());

    let mut equivalent: Option<f64> = None;
    for (x, oracle_score) in sorted {
        if model_score <= oracle_score {
            equivalent = Some(x);
        }
    }
    equivalent.map(|x| x * 100.0).unwrap_or(f64::NAN)
}
