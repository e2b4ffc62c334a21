//! Join and impute (`spec.md` §4.D steps 2-4): resolve every question-set
//! entry's expected target(s), then for each submitting model either take
//! its validated row or impute a value.
//!
//! The two synthetic forecaster models get special-cased rather than
//! falling through the default-0.5 path: "Imputed Forecaster" always uses
//! `market_value_on_due_date` and "Naive Forecaster" always uses
//! `market_value_on_due_date_minus_one`, regardless of whether a row was
//! submitted — these exist precisely so the scoring stage has a
//! closed-form passthrough for market questions (`spec.md` §9, §5.E).

use std::collections::HashMap;

use chrono::NaiveDate;
use forecastbench_core::config::BenchmarkConstants;
use forecastbench_core::{
    ForecastRow, ForecastSet, ProcessedForecastRow, ProcessedForecastSet, Question, QuestionId,
    QuestionSet, QuestionSetEntry,
};

use crate::resolved_values::{ResolutionContext, ResolvedValues};

const DEFAULT_IMPUTED_FORECAST: f64 = 0.5;

/// The resolution date(s) a question-set entry is expected to have a
/// forecast for, as of `today`. Dataset questions carry their horizon dates
/// directly; market questions (and combos of markets, which have no
/// `resolution_dates` of their own) resolve once, at the later of their
/// legs' close/resolution time. A date in the future relative to `today` is
/// not yet an expected target (`spec.md` §4.D step 3: "drop a target
/// resolution_date that has not yet elapsed").
pub fn expected_targets(
    entry: &QuestionSetEntry,
    ctx: &ResolutionContext,
    today: NaiveDate,
) -> Vec<NaiveDate> {
    let dates = if !entry.resolution_dates.is_empty() {
        entry.resolution_dates.clone()
    } else {
        let legs: Vec<String> = match &entry.id {
            QuestionId::Single(s) => vec![s.clone()],
            QuestionId::Combo(c) => vec![c.legs[0].clone(), c.legs[1].clone()],
        };
        let mut market_dates = Vec::new();
        for leg in legs {
            if let Some(Question::Market(m)) = ctx.questions.get(&QuestionId::Single(leg)) {
                let d = m
                    .market_info
                    .resolution_datetime
                    .unwrap_or(m.market_info.close_datetime)
                    .date_naive();
                market_dates.push(d);
            }
        }
        market_dates.into_iter().max().into_iter().collect()
    };
    dates.into_iter().filter(|d| *d <= today).collect()
}

/// Join a model's validated rows against a question set's expected
/// targets, imputing the rest, and resolve every target's ground truth.
pub fn process_forecast_set(
    forecast_set: &ForecastSet,
    question_set: &QuestionSet,
    valid_rows: &[ForecastRow],
    ctx: &ResolutionContext,
    resolved: &mut ResolvedValues,
    today: NaiveDate,
) -> ProcessedForecastSet {
    let mut by_target: HashMap<(String, NaiveDate), &ForecastRow> = HashMap::new();
    for row in valid_rows {
        by_target.insert((row.id.as_key(), row.resolution_date), row);
    }

    let is_imputed_forecaster = forecast_set.model == BenchmarkConstants::IMPUTED_FORECASTER;
    let is_naive_forecaster = forecast_set.model == BenchmarkConstants::NAIVE_FORECASTER;

    let mut forecasts = Vec::new();
    for entry in &question_set.questions {
        for resolution_date in expected_targets(entry, ctx, today) {
            let due = question_set.forecast_due_date;
            let resolved_to = resolved.resolve_target(
                ctx,
                &entry.id,
                &entry.source,
                due,
                resolution_date,
                &entry.direction,
            );
            let market_due = resolved.market_point(ctx, &entry.id, &entry.source, due);
            let market_due_minus_one =
                resolved.market_point(ctx, &entry.id, &entry.source, due - chrono::Duration::days(1));

            let key = (entry.id.as_key(), resolution_date);
            let (forecast, imputed, direction) = if is_imputed_forecaster {
                (market_due.unwrap_or(DEFAULT_IMPUTED_FORECAST), true, entry.direction.clone())
            } else if is_naive_forecaster {
                (
                    market_due_minus_one.unwrap_or(DEFAULT_IMPUTED_FORECAST),
                    true,
                    entry.direction.clone(),
                )
            } else if let Some(row) = by_target.get(&key) {
                let direction = if row.direction.is_empty() {
                    entry.direction.clone()
                } else {
                    row.direction.clone()
                };
                (row.forecast.unwrap_or(DEFAULT_IMPUTED_FORECAST), false, direction)
            } else {
                (DEFAULT_IMPUTED_FORECAST, true, entry.direction.clone())
            };

            forecasts.push(ProcessedForecastRow {
                id: entry.id.clone(),
                source: entry.source.clone(),
                direction,
                forecast,
                resolution_date,
                resolved_to,
                resolved: !resolved_to.is_nan(),
                imputed,
                market_value_on_due_date: market_due,
                market_value_on_due_date_minus_one: market_due_minus_one,
                forecast_due_date: due,
                question_pk: format!("{}:{}", entry.id.as_key(), resolution_date),
            });
        }
    }

    ProcessedForecastSet {
        organization: forecast_set.organization.clone(),
        model: forecast_set.model.clone(),
        model_organization: forecast_set.model_organization.clone(),
        question_set: forecast_set.question_set.clone(),
        forecast_due_date: forecast_set.forecast_due_date,
        forecasts,
    }
}

/// Fraction of a processed set's rows that were imputed rather than
/// submitted, used at the call site to flag a file for the 5%-cutoff rule
/// (`spec.md` §4.D step 4: "a file whose imputed-row fraction exceeds 5%
/// for a given question type is dropped from scoring, not from
/// resolution").
pub fn imputed_fraction(set: &ProcessedForecastSet) -> f64 {
    if set.forecasts.is_empty() {
        return 0.0;
    }
    let imputed = set.forecasts.iter().filter(|r| r.imputed).count();
    imputed as f64 / set.forecasts.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use forecastbench_bank::{NullifyTable, QuestionTable, RemapTable, ResolutionStore};
    use forecastbench_core::{Category, Direction, NumericQuestion, QuestionHeader};

    fn setup_numeric() -> (QuestionTable, ResolutionStore) {
        let mut questions = QuestionTable::new();
        questions.insert_new(Question::Numeric(NumericQuestion {
            header: QuestionHeader {
                id: QuestionId::Single("n1".into()),
                source: "fred".into(),
                url: None,
                question: "".into(),
                background: "".into(),
                resolution_criteria: "".into(),
                category: Category::Economics,
                forecast_horizons: vec![7],
                freeze_datetime: chrono::Utc::now(),
                freeze_datetime_value: Some(1.0),
                freeze_datetime_value_explanation: None,
                resolved: false,
                valid_question: true,
            },
        }));
        let dir = std::env::temp_dir().join(format!("fb-resolve-process-test-{}", std::process::id()));
        let store = ResolutionStore::new(dir);
        let epoch = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let series: Vec<_> = (0..10)
            .map(|i| forecastbench_core::SeriesPoint {
                date: epoch + chrono::Duration::days(i),
                value: (i + 1) as f64,
            })
            .collect();
        store.store("fred", "n1", &series).unwrap();
        (questions, store)
    }

    #[test]
    fn missing_row_is_imputed_at_default() {
        let (questions, store) = setup_numeric();
        let remap = RemapTable::default();
        let nullify = NullifyTable::default();
        let ctx = ResolutionContext { questions: &questions, store: &store, remap: &remap, nullify: &nullify };
        let due = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let res_date = due + chrono::Duration::days(7);
        let question_set = QuestionSet {
            forecast_due_date: due,
            question_set: "llm".into(),
            questions: vec![QuestionSetEntry {
                id: QuestionId::Single("n1".into()),
                source: "fred".into(),
                resolution_dates: vec![res_date],
                direction: vec![Direction::Positive],
            }],
        };
        let forecast_set = ForecastSet {
            organization: "org".into(),
            model: "some-model".into(),
            model_organization: "org".into(),
            question_set: "llm".into(),
            forecast_due_date: due,
            forecasts: vec![],
        };
        let mut resolved = ResolvedValues::new();
        let today = res_date;
        let processed = process_forecast_set(&forecast_set, &question_set, &[], &ctx, &mut resolved, today);
        assert_eq!(processed.forecasts.len(), 1);
        assert!(processed.forecasts[0].imputed);
        assert_eq!(processed.forecasts[0].forecast, 0.5);
    }

    #[test]
    fn future_target_is_dropped() {
        let (questions, store) = setup_numeric();
        let remap = RemapTable::default();
        let nullify = NullifyTable::default();
        let ctx = ResolutionContext { questions: &questions, store: &store, remap: &remap, nullify: &nullify };
        let due = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let res_date = due + chrono::Duration::days(7);
        let question_set = QuestionSet {
            forecast_due_date: due,
            question_set: "llm".into(),
            questions: vec![QuestionSetEntry {
                id: QuestionId::Single("n1".into()),
                source: "fred".into(),
                resolution_dates: vec![res_date],
                direction: vec![Direction::Positive],
            }],
        };
        let forecast_set = ForecastSet {
            organization: "org".into(),
            model: "some-model".into(),
            model_organization: "org".into(),
            question_set: "llm".into(),
            forecast_due_date: due,
            forecasts: vec![],
        };
        let mut resolved = ResolvedValues::new();
        let today = due;
        let processed = process_forecast_set(&forecast_set, &question_set, &[], &ctx, &mut resolved, today);
        assert!(processed.forecasts.is_empty());
    }

    #[test]
    fn imputed_forecaster_uses_market_value_regardless_of_submission() {
        let (questions, store) = setup_numeric();
        let remap = RemapTable::default();
        let nullify = NullifyTable::default();
        let ctx = ResolutionContext { questions: &questions, store: &store, remap: &remap, nullify: &nullify };
        let due = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let res_date = due + chrono::Duration::days(7);
        let question_set = QuestionSet {
            forecast_due_date: due,
            question_set: "llm".into(),
            questions: vec![QuestionSetEntry {
                id: QuestionId::Single("n1".into()),
                source: "fred".into(),
                resolution_dates: vec![res_date],
                direction: vec![Direction::Positive],
            }],
        };
        let forecast_set = ForecastSet {
            organization: "forecastbench".into(),
            model: BenchmarkConstants::IMPUTED_FORECASTER.into(),
            model_organization: "forecastbench".into(),
            question_set: "llm".into(),
            forecast_due_date: due,
            forecasts: vec![],
        };
        let mut resolved = ResolvedValues::new();
        let processed = process_forecast_set(&forecast_set, &question_set, &[], &ctx, &mut resolved, res_date);
        assert_eq!(processed.forecasts[0].forecast, 1.0);
        assert!(processed.forecasts[0].imputed);
    }
}
