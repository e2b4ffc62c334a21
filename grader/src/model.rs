//! Row-level and leaderboard-level types for the Scoring & Leaderboard
//! engine (`spec.md` §4.E). Grounded in
//! `original_source/src/leaderboard/main.py`'s flat per-forecast DataFrame:
//! every processed forecast across every submitted model becomes one
//! [`ScoredRow`] here instead of a DataFrame row, and `model_pk` /
//! `question_pk` become plain `String` keys instead of pandas groupby keys.

use std::fmt;

use chrono::NaiveDate;
use forecastbench_core::config::BenchmarkConstants;

/// Whether a row scores against the dataset-question or market-question
/// difficulty panel (`spec.md` §4.E "independently for dataset and market
/// questions").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuestionType {
    Dataset,
    Market,
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionType::Dataset => write!(f, "dataset"),
            QuestionType::Market => write!(f, "market"),
        }
    }
}

/// One (model, question, resolution date) observation, flattened out of a
/// processed forecast set (`spec.md` §3 "Processed forecast set").
#[derive(Debug, Clone)]
pub struct ScoredRow {
    pub organization: String,
    pub model: String,
    pub model_organization: String,
    pub model_pk: String,
    pub forecast_due_date: NaiveDate,
    pub source: String,
    pub question_type: QuestionType,
    pub question_pk: String,
    pub forecast: f64,
    pub resolved_to: f64,
    pub brier_score: f64,
}

impl ScoredRow {
    pub fn new(
        organization: String,
        model: String,
        model_organization: String,
        forecast_due_date: NaiveDate,
        source: String,
        question_type: QuestionType,
        question_pk: String,
        forecast: f64,
        resolved_to: f64,
    ) -> Self {
        let model_pk = model_pk(&organization, &model_organization, &model);
        let brier_score = (forecast - resolved_to).powi(2);
        ScoredRow {
            organization,
            model,
            model_organization,
            model_pk,
            forecast_due_date,
            source,
            question_type,
            question_pk,
            forecast,
            resolved_to,
            brier_score,
        }
    }

    pub fn is_benchmark_model(&self) -> bool {
        self.organization == BenchmarkConstants::BENCHMARK_NAME
    }
}

/// Stable string key for a (organization, model_organization, model)
/// triple, used as the groupby key `original_source`'s `set_model_pk`
/// computes on every DataFrame.
pub fn model_pk(organization: &str, model_organization: &str, model: &str) -> String {
    format!("{organization}\u{1f}{model_organization}\u{1f}{model}")
}

/// One leaderboard row: a scored model plus every derived metric
/// (`spec.md` §4.E "Outputs").
#[derive(Debug, Clone)]
pub struct LeaderboardRow {
    pub organization: String,
    pub model: String,
    pub model_organization: String,
    pub model_pk: String,
    pub model_release_date: Option<NaiveDate>,
    pub n_dataset: usize,
    pub n_market: usize,
    pub dataset_score: f64,
    pub market_score: f64,
    pub overall_score: f64,
    pub dataset_ci: (f64, f64),
    pub market_ci: (f64, f64),
    pub overall_ci: (f64, f64),
    pub p_value_vs_superforecaster: f64,
    pub p_value_vs_public: f64,
    pub pct_times_best: f64,
    pub pct_times_top_5_pct: f64,
    pub x_pct_oracle_equivalent: f64,
    pub peer_score: f64,
    pub brier_skill_score: Option<f64>,
}
