//! Difficulty-adjusted Brier aggregation, peer score, Brier skill score, and
//! the fixed-point rescale that pins "Always 0.5" to 0.25 on every axis
//! (`spec.md` §4.E "Outputs" and `original_source/src/leaderboard/main.py`'s
//! `get_leaderboard` scoring block).

use std::collections::HashMap;

use forecastbench_core::config::BenchmarkConstants;

use crate::model::ScoredRow;

/// Per-model mean difficulty-adjusted Brier: `mean(brier_score - beta_q)`
/// over every row of that model, where `beta_q` is the question fixed
/// effect estimated in `fixed_effects.rs`.
pub fn difficulty_adjusted_scores(
    rows: &[&ScoredRow],
    question_fe: &HashMap<String, f64>,
) -> HashMap<String, f64> {
    let mut sums: HashMap<&str, f64> = HashMap::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for row in rows {
        let Some(beta_q) = question_fe.get(&row.question_pk) else {
            continue;
        };
        *sums.entry(row.model_pk.as_str()).or_insert(0.0) += row.brier_score - beta_q;
        *counts.entry(row.model_pk.as_str()).or_insert(0) += 1;
    }
    sums.into_iter()
        .map(|(model_pk, sum)| (model_pk.to_string(), sum / counts[model_pk] as f64))
        .collect()
}

/// Undo the difficulty adjustment's residual global shift by translating
/// every score so the designated "Always 0.5" model lands on its
/// known-correct Brier score of 0.25 (`spec.md` §4.E "Rescale so that Always
/// 0.5 reads exactly 0.25"). Returns the scores unchanged if "Always 0.5"
/// didn't appear on this axis (e.g. too few dataset questions resolved yet).
pub fn rescale_to_always_half(scores: &HashMap<String, f64>) -> HashMap<String, f64> {
    let anchor_pk = scores.keys().find(|pk| pk.ends_with(&format!(
        "\u{1f}{}\u{1f}{}",
        BenchmarkConstants::BENCHMARK_NAME,
        BenchmarkConstants::ALWAYS_05_MODEL
    )));
    let Some(anchor_pk) = anchor_pk else {
        return scores.clone();
    };
    let shift = scores[anchor_pk] - 0.25;
    scores.iter().map(|(pk, v)| (pk.clone(), v - shift)).collect()
}

/// The "peer score": a model's score minus the mean score of every other
/// model that answered the same questions, averaged across questions
/// (`spec.md` §4.E "peer score" — ForecastBench's relative-to-peers metric,
/// distinct from the difficulty-adjusted absolute score).
pub fn peer_scores(rows: &[&ScoredRow]) -> HashMap<String, f64> {
    let mut by_question: HashMap<&str, Vec<&ScoredRow>> = HashMap::new();
    for row in rows {
        by_question.entry(row.question_pk.as_str()).or_default().push(row);
    }

    let mut sums: HashMap<&str, f64> = HashMap::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for members in by_question.values() {
        if members.len() < 2 {
            continue;
        }
        let total: f64 = members.iter().map(|r| r.brier_score).sum();
        for row in members {
            let others_mean = (total - row.brier_score) / (members.len() - 1) as f64;
            *sums.entry(row.model_pk.as_str()).or_insert(0.0) += row.brier_score - others_mean;
            *counts.entry(row.model_pk.as_str()).or_insert(0) += 1;
        }
    }
    sums.into_iter()
        .map(|(model_pk, sum)| (model_pk.to_string(), sum / counts[model_pk] as f64))
        .collect()
}

/// Brier skill score relative to the Naive Forecaster: `1 - model/naive`.
/// `None` when the naive reference score isn't available (`spec.md` §4.E
/// "Brier skill score... omitted if the Naive Forecaster reference is
/// missing on that axis").
pub fn brier_skill_score(model_score: f64, naive_score: Option<f64>) -> Option<f64> {
    let naive_score = naive_score?;
    if naive_score == 0.0 {
        return None;
    }
    Some(1.0 - model_score / naive_score)
}

/// Look up a reference model's difficulty-adjusted score by its model_pk
/// components, used for both the Naive Forecaster (BSS) and the human
/// baselines (p-values).
pub fn reference_score(
    scores: &HashMap<String, f64>,
    organization: &str,
    model_organization: &str,
    model: &str,
) -> Option<f64> {
    let pk = crate::model::model_pk(organization, model_organization, model);
    scores.get(&pk).copied()
}
