//! Flatten processed forecast sets into the combined row set the rest of
//! the scoring engine operates on (`spec.md` §4.E "Inputs" and
//! `original_source/src/leaderboard/main.py::combine_forecasting_rounds`,
//! `get_df_info`'s imputed-cutoff check, `filter_forecast_files_by_forecast_due_date`).

use std::collections::HashSet;

use chrono::NaiveDate;
use forecastbench_core::{ProcessedForecastSet, QuestionId};
use log::{info, warn};

use crate::model::{QuestionType, ScoredRow};

/// Combine every processed forecast set into one flat row list, applying
/// the scoring-stage filters: drop combination-question rows, drop
/// unresolved rows, drop whole files whose imputed fraction (per question
/// type) exceeds `imputed_cutoff_pct`, and drop files whose
/// `forecast_due_date` is not yet past the inclusion cutoff.
///
/// `market_sources` classifies each row's `source` as market vs. dataset
/// (`spec.md` §4.E "Ignores market-unresolved rows and combination-question
/// rows").
pub fn combine_forecasting_rounds(
    sets: &[ProcessedForecastSet],
    market_sources: &HashSet<String>,
    today: NaiveDate,
    inclusion_cutoff_days: i64,
    imputed_cutoff_pct: f64,
) -> Vec<ScoredRow> {
    let mut rows = Vec::new();
    let mut dropped_stale = 0;
    let mut dropped_cutoff = 0;

    for set in sets {
        let age_days = (today - set.forecast_due_date).num_days();
        if age_days < inclusion_cutoff_days {
            dropped_cutoff += 1;
            continue;
        }

        for question_type in [QuestionType::Dataset, QuestionType::Market] {
            let type_rows: Vec<_> = set
                .forecasts
                .iter()
                .filter(|r| classify(&r.source, market_sources) == question_type)
                .collect();
            if type_rows.is_empty() {
                continue;
            }
            let imputed = type_rows.iter().filter(|r| r.imputed).count();
            let frac = imputed as f64 / type_rows.len() as f64;
            if frac > imputed_cutoff_pct {
                warn!(
                    "{} {} {}/{}: imputed fraction {:.1}% exceeds cutoff {:.1}%, dropping {:?} rows from scoring",
                    set.organization, set.model, set.forecast_due_date, set.question_set,
                    frac * 100.0, imputed_cutoff_pct * 100.0, question_type
                );
                dropped_stale += type_rows.len();
                continue;
            }
            for row in type_rows {
                if matches!(row.id, QuestionId::Combo(_)) {
                    continue;
                }
                if !row.resolved || row.resolved_to.is_nan() {
                    continue;
                }
                rows.push(ScoredRow::new(
                    set.organization.clone(),
                    set.model.clone(),
                    set.model_organization.clone(),
                    set.forecast_due_date,
                    row.source.clone(),
                    question_type,
                    row.question_pk.clone(),
                    row.forecast,
                    row.resolved_to,
                ));
            }
        }
    }

    info!(
        "ingest: {} scored rows from {} processed sets ({} dropped as too-recent, {} dropped over imputed cutoff)",
        rows.len(),
        sets.len(),
        dropped_cutoff,
        dropped_stale,
    );
    rows
}

fn classify(source: &str, market_sources: &HashSet<String>) -> QuestionType {
    if market_sources.contains(source) {
        QuestionType::Market
    } else {
        QuestionType::Dataset
    }
}
