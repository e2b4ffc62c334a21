//! Curator pipeline step 1 (`spec.md` §4.C): drop questions that cannot be
//! sampled this cycle. Grounded in
//! `original_source/src/curate_questions/create_question_set/main.py`'s
//! filter helpers (`drop_invalid_questions`, `drop_missing_freeze_datetime`,
//! `market_resolves_before_forecast_due_date`,
//! `drop_questions_that_resolve_too_soon`).

use chrono::{Duration, NaiveDate};
use forecastbench_core::{Category, Question};
use log::debug;

/// Runs the filter pipeline over a source's full question table, returning
/// only the questions eligible to be sampled this cycle.
pub fn filter_candidates<'a>(
    questions: impl IntoIterator<Item = &'a Question>,
    freeze_datetime: NaiveDate,
    freeze_window_days: i64,
) -> Vec<&'a Question> {
    let all_forecasts_due = freeze_datetime + Duration::days(freeze_window_days);
    let mut kept = Vec::new();
    let mut dropped_invalid = 0;
    let mut dropped_other = 0;
    let mut dropped_resolved = 0;
    let mut dropped_no_freeze_value = 0;
    let mut dropped_closes_too_soon = 0;
    let mut dropped_no_horizons = 0;

    for q in questions {
        let header = q.header();
        if !header.valid_question {
            dropped_invalid += 1;
            continue;
        }
        if header.category == Category::Other {
            dropped_other += 1;
            continue;
        }
        if header.resolved {
            dropped_resolved += 1;
            continue;
        }
        if header.freeze_datetime_value.is_none() {
            dropped_no_freeze_value += 1;
            continue;
        }
        match q {
            Question::Market(m) => {
                if m.market_info.close_datetime.date_naive() <= all_forecasts_due {
                    dropped_closes_too_soon += 1;
                    continue;
                }
            }
            _ => {
                if header.forecast_horizons.is_empty() {
                    dropped_no_horizons += 1;
                    continue;
                }
            }
        }
        kept.push(q);
    }

    debug!(
        "filter: kept {} of {} (invalid={dropped_invalid}, other={dropped_other}, \
         resolved={dropped_resolved}, no_freeze_value={dropped_no_freeze_value}, \
         closes_too_soon={dropped_closes_too_soon}, no_horizons={dropped_no_horizons})",
        kept.len(),
        kept.len()
            + dropped_invalid
            + dropped_other
            + dropped_resolved
            + dropped_no_freeze_value
            + dropped_closes_too_soon
            + dropped_no_horizons,
    );
    kept
}
