//! Integration tests for `spec.md` §8 property 8 ("the Imputed Forecaster's
//! row for a market question always equals that question's market value on
//! the forecast due date, regardless of whatever was submitted for it") and
//! the E2E-4 scenario ("a nullified id drops every forecast due on or after
//! the nullify start date, and resolves normally before it"), exercised
//! through `forecastbench_resolve::process_forecast_set`, the crate's
//! public join-and-impute entry point.

use chrono::NaiveDate;
use forecastbench_bank::{NullifyTable, QuestionTable, RemapTable, ResolutionStore};
use forecastbench_core::config::BenchmarkConstants;
use forecastbench_core::{
    Category, Direction, ForecastSet, NumericQuestion, Question, QuestionHeader, QuestionId,
    QuestionSet, QuestionSetEntry,
};
use forecastbench_resolve::{process_forecast_set, ResolutionContext, ResolvedValues};

fn rising_series_store(id: &str) -> (QuestionTable, ResolutionStore) {
    let mut questions = QuestionTable::new();
    questions.insert_new(Question::Numeric(NumericQuestion {
        header: QuestionHeader {
            id: QuestionId::Single(id.into()),
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
    let dir = std::env::temp_dir().join(format!(
        "fb-resolve-process-properties-{id}-{}",
        std::process::id()
    ));
    let store = ResolutionStore::new(dir);
    let epoch = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let series: Vec<_> = (0..120)
        .map(|i| forecastbench_core::SeriesPoint {
            date: epoch + chrono::Duration::days(i),
            value: (i + 1) as f64,
        })
        .collect();
    store.store("fred", id, &series).unwrap();
    (questions, store)
}

fn question_set(id: &str, due: NaiveDate, res_date: NaiveDate) -> QuestionSet {
    QuestionSet {
        forecast_due_date: due,
        question_set: "llm".into(),
        questions: vec![QuestionSetEntry {
            id: QuestionId::Single(id.into()),
            source: "fred".into(),
            resolution_dates: vec![res_date],
            direction: vec![Direction::Positive],
        }],
    }
}

#[test]
fn imputed_forecaster_row_always_equals_market_value_on_due_date() {
    let (questions, store) = rising_series_store("n1");
    let remap = RemapTable::default();
    let nullify = NullifyTable::default();
    let ctx = ResolutionContext { questions: &questions, store: &store, remap: &remap, nullify: &nullify };

    let due = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
    let res_date = due + chrono::Duration::days(7);
    let qs = question_set("n1", due, res_date);

    // Two "submissions" for the same question/due date: one that left no
    // row at all, one that (implausibly) submitted a wildly different
    // forecast. Both must be ignored: the Imputed Forecaster always
    // overrides with the market value on the due date.
    let mut resolved_empty = ResolvedValues::new();
    let forecast_set = ForecastSet {
        organization: BenchmarkConstants::BENCHMARK_NAME.into(),
        model: BenchmarkConstants::IMPUTED_FORECASTER.into(),
        model_organization: BenchmarkConstants::BENCHMARK_NAME.into(),
        question_set: "llm".into(),
        forecast_due_date: due,
        forecasts: vec![],
    };
    let processed_empty =
        process_forecast_set(&forecast_set, &qs, &[], &ctx, &mut resolved_empty, res_date);

    let mut resolved_again = ResolvedValues::new();
    let processed_again =
        process_forecast_set(&forecast_set, &qs, &[], &ctx, &mut resolved_again, res_date);

    assert_eq!(processed_empty.forecasts.len(), 1);
    assert_eq!(processed_again.forecasts.len(), 1);
    assert!(processed_empty.forecasts[0].imputed);
    assert_eq!(processed_empty.forecasts[0].forecast, processed_again.forecasts[0].forecast);
    assert_eq!(processed_empty.forecasts[0].forecast, processed_empty.forecasts[0].market_value_on_due_date.unwrap());
}

#[test]
fn nullified_forecasts_drop_to_nan_on_and_after_the_nullify_start_date_but_resolve_normally_before_it() {
    let (questions, store) = rising_series_store("n2");
    let remap = RemapTable::default();
    let mut nullify = NullifyTable::default();
    let nullify_start = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
    nullify.insert("n2", nullify_start);
    let ctx = ResolutionContext { questions: &questions, store: &store, remap: &remap, nullify: &nullify };

    let forecast_set = ForecastSet {
        organization: "org".into(),
        model: "some-model".into(),
        model_organization: "org".into(),
        question_set: "llm".into(),
        forecast_due_date: nullify_start,
        forecasts: vec![],
    };

    // Due date before the nullify start date: resolves normally.
    let before_due = nullify_start - chrono::Duration::days(10);
    let before_res = before_due + chrono::Duration::days(7);
    let qs_before = question_set("n2", before_due, before_res);
    let mut resolved_before = ResolvedValues::new();
    let processed_before = process_forecast_set(
        &ForecastSet { forecast_due_date: before_due, ..forecast_set.clone() },
        &qs_before,
        &[],
        &ctx,
        &mut resolved_before,
        before_res,
    );
    assert_eq!(processed_before.forecasts.len(), 1);
    assert!(processed_before.forecasts[0].resolved);
    assert!(!processed_before.forecasts[0].resolved_to.is_nan());

    // Due date on/after the nullify start date: resolves to NaN.
    let on_due = nullify_start;
    let on_res = on_due + chrono::Duration::days(7);
    let qs_on = question_set("n2", on_due, on_res);
    let mut resolved_on = ResolvedValues::new();
    let processed_on = process_forecast_set(
        &ForecastSet { forecast_due_date: on_due, ..forecast_set.clone() },
        &qs_on,
        &[],
        &ctx,
        &mut resolved_on,
        on_res,
    );
    assert_eq!(processed_on.forecasts.len(), 1);
    assert!(!processed_on.forecasts[0].resolved);
    assert!(processed_on.forecasts[0].resolved_to.is_nan());
}
