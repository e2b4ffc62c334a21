//! Integration test for `spec.md` §8 property 1: "for every remap entry `a
//! -> b`, resolving any historical forecast under `a` equals resolving it
//! under `b` over all forecast-due-dates >= the remap date," exercised
//! through the bank's public `resolve_with_overrides` entry point (the
//! seam every adapter is required to go through before looking a
//! question up, per `spec.md` §4.A).

use chrono::NaiveDate;
use forecastbench_adapters::numeric::NumericAdapter;
use forecastbench_bank::{resolve_with_overrides, NullifyTable, RemapTable};
use forecastbench_core::{Category, NumericQuestion, Question, QuestionHeader, QuestionId, SeriesPoint};

fn canonical_question(id: &str) -> Question {
    Question::Numeric(NumericQuestion {
        header: QuestionHeader {
            id: QuestionId::Single(id.into()),
            source: "fred".into(),
            url: None,
            question: "".into(),
            background: "".into(),
            resolution_criteria: "".into(),
            category: Category::Economics,
            forecast_horizons: vec![7, 30],
            freeze_datetime: chrono::Utc::now(),
            freeze_datetime_value: Some(1.0),
            freeze_datetime_value_explanation: None,
            resolved: false,
            valid_question: true,
        },
    })
}

fn rising_series(epoch: NaiveDate, days: i64) -> Vec<SeriesPoint> {
    (0..days)
        .map(|i| SeriesPoint { date: epoch + chrono::Duration::days(i), value: (i + 1) as f64 })
        .collect()
}

#[test]
fn resolving_under_old_id_matches_resolving_under_new_id_for_every_due_date_after_remap() {
    let adapter = NumericAdapter;
    let remap_date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    let mut remap = RemapTable::default();
    remap.insert("old-entity", "new-entity");
    let nullify = NullifyTable::default();

    let question = canonical_question("new-entity");
    let epoch = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let series = rising_series(epoch, 120);

    for offset in [0_i64, 1, 10, 60, 90] {
        let due = remap_date + chrono::Duration::days(offset);
        let resolution_date = due + chrono::Duration::days(7);

        let under_old = resolve_with_overrides(
            &adapter, &remap, &nullify, "old-entity", &question, due, resolution_date, &series,
        );
        let under_new = resolve_with_overrides(
            &adapter, &remap, &nullify, "new-entity", &question, due, resolution_date, &series,
        );
        assert_eq!(under_old, under_new, "mismatch at due={due}");
    }
}

#[test]
fn remap_is_transitive_across_multiple_renames() {
    let adapter = NumericAdapter;
    let mut remap = RemapTable::default();
    remap.insert("name-v1", "name-v2");
    remap.insert("name-v2", "name-v3");
    let nullify = NullifyTable::default();

    let question = canonical_question("name-v3");
    let epoch = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let series = rising_series(epoch, 60);
    let due = epoch + chrono::Duration::days(10);
    let resolution_date = due + chrono::Duration::days(7);

    let under_v1 = resolve_with_overrides(
        &adapter, &remap, &nullify, "name-v1", &question, due, resolution_date, &series,
    );
    let under_v3 = resolve_with_overrides(
        &adapter, &remap, &nullify, "name-v3", &question, due, resolution_date, &series,
    );
    assert_eq!(under_v1, under_v3);
}
