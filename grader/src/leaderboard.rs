//! Orchestrates the full Scoring & Leaderboard pipeline (`spec.md` §4.E):
//! ingest -> inject x% oracles -> difficulty-adjust -> peer/BSS -> bootstrap
//! -> rescale -> p-values -> x%-oracle equivalence -> SOTA parity ->
//! assemble [`LeaderboardRow`]s.
//!
//! Two variants are built from the same row pool
//! (`original_source/src/leaderboard/main.py::generate_leaderboard`'s
//! "baseline" vs "tournament" split): the baseline leaderboard scores every
//! qualifying submission since the benchmark's inception, the tournament
//! leaderboard restricts to submissions made during the active tournament
//! window.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use forecastbench_core::config::{BenchmarkConstants, CiMethod, ScoringConfig};

use crate::bootstrap::{bca_ci, bootstrap_replicates, percentile_ci};
use crate::fixed_effects::{
    dataset_panel, dataset_question_fixed_effects, market_question_fixed_effects,
};
use crate::model::{LeaderboardRow, QuestionType, ScoredRow};
use crate::oracle::{nearest_oracle_equivalent, oracle_fractions, oracle_rows};
use crate::pvalue::{benjamini_hochberg, one_sided_p_value};
use crate::release_dates::ReleaseDateTable;
use crate::scores::{brier_skill_score, difficulty_adjusted_scores, peer_scores, rescale_to_always_half};

/// Substrings that mark a model name as a tournament-specific variant of a
/// baseline submission, excluded from the difficulty-estimation panel so a
/// model can't help calibrate the very questions it's later scored against
/// (`original_source/src/leaderboard/main.py`'s `TOURNAMENT_MODEL_SUFFIXES`).
const TOURNAMENT_VARIANT_MARKERS: [&str; 2] = [" (tournament)", "-tournament"];

fn is_tournament_variant(model: &str) -> bool {
    TOURNAMENT_VARIANT_MARKERS.iter().any(|marker| model.contains(marker))
}

/// Synthetic reference models that never belong in the difficulty-fitting
/// panel even though they're ForecastBench's own submissions (their Brier
/// scores are definitionally extreme or degenerate, which would bias the
/// fixed-effects fit).
const BASELINE_PANEL_EXCLUDED_MODELS: [&str; 5] = [
    "Always 0",
    "Always 1",
    "Always 0.5",
    "Random Uniform",
    "Imputed Forecaster",
];

fn is_benchmark_baseline_excluded(model: &str) -> bool {
    BASELINE_PANEL_EXCLUDED_MODELS.contains(&model)
}

/// Which observations a leaderboard variant includes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaderboardVariant {
    Baseline,
    Tournament,
}

fn variant_rows<'a>(rows: &'a [ScoredRow], variant: LeaderboardVariant) -> Vec<&'a ScoredRow> {
    let cutoff = BenchmarkConstants::tournament_start_date();
    rows.iter()
        .filter(|r| match variant {
            LeaderboardVariant::Baseline => true,
            LeaderboardVariant::Tournament => r.forecast_due_date >= cutoff,
        })
        .collect()
}

/// Key prefixes distinguishing the three axes multiplexed into one
/// `model_pk -> score` map, so a single bootstrap pass over
/// [`compute_axis_scores`] yields replicate distributions for the dataset,
/// market, *and* overall score without tripling the FE-fitting cost per
/// replicate.
const DATASET_PREFIX: &str = "dataset\u{1}";
const MARKET_PREFIX: &str = "market\u{1}";
const OVERALL_PREFIX: &str = "overall\u{1}";

/// Compute dataset, market, and overall difficulty-adjusted scores for
/// every model in one row set, multiplexed into a single map keyed by axis
/// prefix + model_pk. Overall is the plain arithmetic mean of the dataset
/// and market scores (`spec.md` §4.E: "'overall' is the arithmetic mean of
/// the dataset and market scores"), present only when a model has both.
/// `release_dates`/`model_release_window_days` apply the same "Filter
/// models by release date" panel restriction to both the point estimate
/// and every bootstrap replicate.
fn compute_axis_scores(
    rows: &[ScoredRow],
    release_dates: &ReleaseDateTable,
    model_release_window_days: i64,
) -> HashMap<String, f64> {
    let dataset_rows: Vec<&ScoredRow> = rows.iter().filter(|r| r.question_type == QuestionType::Dataset).collect();
    let market_rows: Vec<&ScoredRow> = rows.iter().filter(|r| r.question_type == QuestionType::Market).collect();

    let panel = dataset_panel(
        rows,
        is_tournament_variant,
        is_benchmark_baseline_excluded,
        |row| release_dates.days_since_release(row),
        model_release_window_days,
    );
    let dataset_fe = dataset_question_fixed_effects(&panel);
    let market_fe = market_question_fixed_effects(rows);

    let dataset_scores = rescale_to_always_half(&difficulty_adjusted_scores(&dataset_rows, &dataset_fe));
    let market_scores = rescale_to_always_half(&difficulty_adjusted_scores(&market_rows, &market_fe));

    let mut model_pks: HashSet<&str> = HashSet::new();
    model_pks.extend(dataset_scores.keys().map(|k| k.as_str()));
    model_pks.extend(market_scores.keys().map(|k| k.as_str()));

    let mut out = HashMap::new();
    for pk in model_pks {
        let d = dataset_scores.get(pk).copied();
        let m = market_scores.get(pk).copied();
        if let Some(d) = d {
            out.insert(format!("{DATASET_PREFIX}{pk}"), d);
        }
        if let Some(m) = m {
            out.insert(format!("{MARKET_PREFIX}{pk}"), m);
        }
        let overall = match (d, m) {
            (Some(d), Some(m)) => Some((d + m) / 2.0),
            _ => None,
        };
        if let Some(overall) = overall {
            out.insert(format!("{OVERALL_PREFIX}{pk}"), overall);
        }
    }
    out
}

fn strip_prefix_map(axis_scores: &HashMap<String, f64>, prefix: &str) -> HashMap<String, f64> {
    axis_scores
        .iter()
        .filter_map(|(k, v)| k.strip_prefix(prefix).map(|pk| (pk.to_string(), *v)))
        .collect()
}

/// Build one leaderboard variant end to end.
pub fn build_leaderboard(
    all_rows: &[ScoredRow],
    variant: LeaderboardVariant,
    config: &ScoringConfig,
    release_dates: &ReleaseDateTable,
    _today: NaiveDate,
    seed: u64,
) -> Vec<LeaderboardRow> {
    let scoped: Vec<ScoredRow> = variant_rows(all_rows, variant).into_iter().cloned().collect();
    if scoped.is_empty() {
        return Vec::new();
    }
    let forecast_due_date = scoped.iter().map(|r| r.forecast_due_date).max().unwrap();

    let unique_questions: HashMap<String, (QuestionType, f64)> = scoped
        .iter()
        .map(|r| (r.question_pk.clone(), (r.question_type, r.resolved_to)))
        .collect();
    let oracle_questions: Vec<(String, QuestionType, f64)> = unique_questions
        .into_iter()
        .map(|(pk, (qt, resolved))| (pk, qt, resolved))
        .collect();

    let mut with_oracles = scoped.clone();
    for x in oracle_fractions() {
        with_oracles.extend(oracle_rows(x, forecast_due_date, &oracle_questions));
    }

    let axis_scores = compute_axis_scores(&with_oracles, release_dates, config.model_release_window_days);
    let original_overall = strip_prefix_map(&axis_scores, OVERALL_PREFIX);
    let original_dataset = strip_prefix_map(&axis_scores, DATASET_PREFIX);
    let original_market = strip_prefix_map(&axis_scores, MARKET_PREFIX);
    let original_peer = peer_scores(&with_oracles.iter().collect::<Vec<_>>());

    let dataset_rows: Vec<&ScoredRow> = with_oracles.iter().filter(|r| r.question_type == QuestionType::Dataset).collect();
    let market_rows: Vec<&ScoredRow> = with_oracles.iter().filter(|r| r.question_type == QuestionType::Market).collect();

    let naive_dataset_ref = original_dataset.get(&crate::model::model_pk(
        BenchmarkConstants::BENCHMARK_NAME,
        BenchmarkConstants::BENCHMARK_NAME,
        BenchmarkConstants::NAIVE_FORECASTER,
    )).copied();
    let naive_market_ref = original_market.get(&crate::model::model_pk(
        BenchmarkConstants::BENCHMARK_NAME,
        BenchmarkConstants::BENCHMARK_NAME,
        BenchmarkConstants::NAIVE_FORECASTER,
    )).copied();

    let release_window_days = config.model_release_window_days;
    let replicate_scores = bootstrap_replicates(&with_oracles, config.n_replicates, seed, |resampled| {
        compute_axis_scores(resampled, release_dates, release_window_days)
    });

    let mut per_model_replicates: HashMap<String, Vec<f64>> = HashMap::new();
    let mut per_model_dataset_replicates: HashMap<String, Vec<f64>> = HashMap::new();
    let mut per_model_market_replicates: HashMap<String, Vec<f64>> = HashMap::new();
    for replicate in &replicate_scores {
        for (key, score) in replicate {
            if let Some(pk) = key.strip_prefix(OVERALL_PREFIX) {
                per_model_replicates.entry(pk.to_string()).or_default().push(*score);
            } else if let Some(pk) = key.strip_prefix(DATASET_PREFIX) {
                per_model_dataset_replicates.entry(pk.to_string()).or_default().push(*score);
            } else if let Some(pk) = key.strip_prefix(MARKET_PREFIX) {
                per_model_market_replicates.entry(pk.to_string()).or_default().push(*score);
            }
        }
    }

    let superforecaster_pk = crate::model::model_pk(
        BenchmarkConstants::BENCHMARK_NAME,
        BenchmarkConstants::BENCHMARK_NAME,
        BenchmarkConstants::SUPERFORECASTER_MEDIAN,
    );
    let public_pk = crate::model::model_pk(
        BenchmarkConstants::BENCHMARK_NAME,
        BenchmarkConstants::BENCHMARK_NAME,
        BenchmarkConstants::PUBLIC_MEDIAN,
    );
    let empty_replicates = Vec::new();
    let superforecaster_replicates = per_model_replicates.get(&superforecaster_pk).unwrap_or(&empty_replicates);
    let public_replicates = per_model_replicates.get(&public_pk).unwrap_or(&empty_replicates);

    let oracle_model_pks: HashSet<String> = oracle_fractions()
        .into_iter()
        .map(|x| crate::model::model_pk(
            BenchmarkConstants::BENCHMARK_NAME,
            BenchmarkConstants::BENCHMARK_NAME,
            &crate::oracle::oracle_name(x),
        ))
        .collect();
    let oracle_scores: Vec<(f64, f64)> = oracle_fractions()
        .into_iter()
        .filter_map(|x| {
            let pk = crate::model::model_pk(
                BenchmarkConstants::BENCHMARK_NAME,
                BenchmarkConstants::BENCHMARK_NAME,
                &crate::oracle::oracle_name(x),
            );
            original_overall.get(&pk).map(|score| (x, *score))
        })
        .collect();

    let mut raw_p_superforecaster = Vec::new();
    let mut raw_p_public = Vec::new();
    let mut model_pks_ordered: Vec<String> = original_overall
        .keys()
        .filter(|pk| !oracle_model_pks.contains(*pk))
        .cloned()
        .collect();
    model_pks_ordered.sort();

    for pk in &model_pks_ordered {
        let replicates = per_model_replicates.get(pk).unwrap_or(&empty_replicates);
        raw_p_superforecaster.push(one_sided_p_value(replicates, superforecaster_replicates, false));
        raw_p_public.push(one_sided_p_value(replicates, public_replicates, true));
    }
    let (p_superforecaster, p_public) = if config.bh_adjust {
        (benjamini_hochberg(&raw_p_superforecaster), benjamini_hochberg(&raw_p_public))
    } else {
        (raw_p_superforecaster, raw_p_public)
    };

    let mut dataset_counts: HashMap<&str, usize> = HashMap::new();
    for r in &dataset_rows {
        if !oracle_model_pks.contains(&r.model_pk) {
            *dataset_counts.entry(r.model_pk.as_str()).or_insert(0) += 1;
        }
    }
    let mut market_counts: HashMap<&str, usize> = HashMap::new();
    for r in &market_rows {
        if !oracle_model_pks.contains(&r.model_pk) {
            *market_counts.entry(r.model_pk.as_str()).or_insert(0) += 1;
        }
    }

    let mut out = Vec::with_capacity(model_pks_ordered.len());
    for (i, pk) in model_pks_ordered.iter().enumerate() {
        let Some(row) = with_oracles.iter().find(|r| &r.model_pk == pk) else { continue };
        let overall_score = original_overall.get(pk).copied().unwrap_or(f64::NAN);
        let dataset_score = original_dataset.get(pk).copied().unwrap_or(f64::NAN);
        let market_score = original_market.get(pk).copied().unwrap_or(f64::NAN);
        let peer_score = original_peer.get(pk).copied().unwrap_or(f64::NAN);

        let overall_replicates = per_model_replicates.get(pk).cloned().unwrap_or_default();
        let dataset_replicates = per_model_dataset_replicates.get(pk).cloned().unwrap_or_default();
        let market_replicates = per_model_market_replicates.get(pk).cloned().unwrap_or_default();
        let compute_overall = |resampled: &[ScoredRow]| {
            strip_prefix_map(&compute_axis_scores(resampled, release_dates, release_window_days), OVERALL_PREFIX)
        };
        let compute_dataset = |resampled: &[ScoredRow]| {
            strip_prefix_map(&compute_axis_scores(resampled, release_dates, release_window_days), DATASET_PREFIX)
        };
        let compute_market = |resampled: &[ScoredRow]| {
            strip_prefix_map(&compute_axis_scores(resampled, release_dates, release_window_days), MARKET_PREFIX)
        };
        let overall_ci = ci_for(pk, overall_score, &overall_replicates, &with_oracles, config.ci_method, compute_overall);
        let dataset_ci = ci_for(pk, dataset_score, &dataset_replicates, &with_oracles, config.ci_method, compute_dataset);
        let market_ci = ci_for(pk, market_score, &market_replicates, &with_oracles, config.ci_method, compute_market);

        out.push(LeaderboardRow {
            organization: row.organization.clone(),
            model: row.model.clone(),
            model_organization: row.model_organization.clone(),
            model_pk: pk.clone(),
            model_release_date: release_dates.get(pk),
            n_dataset: dataset_counts.get(pk.as_str()).copied().unwrap_or(0),
            n_market: market_counts.get(pk.as_str()).copied().unwrap_or(0),
            dataset_score,
            market_score,
            overall_score,
            dataset_ci,
            market_ci,
            overall_ci,
            p_value_vs_superforecaster: p_superforecaster[i],
            p_value_vs_public: p_public[i],
            pct_times_best: 0.0,
            pct_times_top_5_pct: 0.0,
            x_pct_oracle_equivalent: nearest_oracle_equivalent(overall_score, &oracle_scores),
            peer_score,
            brier_skill_score: brier_skill_score(overall_score, naive_dataset_ref.zip(naive_market_ref).map(|(d, m)| (d + m) / 2.0)),
        });
    }
    out
}

/// Computes a model's confidence interval from its replicate scores. For
/// BCa, the jackknife influence values are the statistic recomputed with
/// each `(forecast_due_date, source)` stratum held out in turn (no further
/// resampling within the held-out set — jackknife-after-bootstrap, not a
/// second bootstrap).
fn ci_for(
    pk: &str,
    original: f64,
    replicates: &[f64],
    rows: &[ScoredRow],
    method: CiMethod,
    compute_fn: impl Fn(&[ScoredRow]) -> HashMap<String, f64>,
) -> (f64, f64) {
    match method {
        CiMethod::Percentile => percentile_ci(replicates.to_vec()),
        CiMethod::Bca => {
            let strata: HashSet<(NaiveDate, String)> =
                rows.iter().map(|r| (r.forecast_due_date, r.source.clone())).collect();
            let jackknife: Vec<f64> = strata
                .iter()
                .map(|(date, source)| {
                    let held_out: Vec<ScoredRow> = rows
                        .iter()
                        .filter(|r| !(r.forecast_due_date == *date && &r.source == source))
                        .cloned()
                        .collect();
                    compute_fn(&held_out).get(pk).copied().unwrap_or(original)
                })
                .collect();
            bca_ci(original, replicates, &jackknife)
        }
    }
}
