//! Forecast-file validation (`spec.md` §4.D step 1: "Validate: drop rows
//! whose source isn't in the closed set, whose forecast is null or out of
//! [0, 1], or whose resolution_date isn't an allowed horizon for a dataset
//! question. A file with a duplicate (id, resolution_date) dataset row is
//! rejected outright.").
//!
//! A dropped row is a per-row, non-fatal validation failure; a duplicate
//! row is a file-level defect and aborts the whole file, per
//! [`forecastbench_core::CoreError`]'s split between `DuplicateForecastRow`
//! (fatal) and the row-level variants (dropped and logged).

use std::collections::{HashMap, HashSet};

use forecastbench_core::{CoreError, ForecastRow, QuestionSet, QuestionSetEntry};
use log::warn;

pub struct ValidationOutcome {
    pub valid: Vec<ForecastRow>,
    pub dropped: usize,
}

fn entry_allows(entry: &QuestionSetEntry, resolution_date: chrono::NaiveDate) -> bool {
    entry.resolution_dates.is_empty() || entry.resolution_dates.contains(&resolution_date)
}

/// Validate every row of a submitted forecast file against its question
/// set. Rows failing a per-row check are dropped and logged; a duplicate
/// (id, resolution_date) pair among the dataset rows aborts the whole file.
pub fn validate_forecast_rows(
    rows: &[ForecastRow],
    question_set: &QuestionSet,
) -> Result<ValidationOutcome, CoreError> {
    let by_key: HashMap<String, &QuestionSetEntry> = question_set
        .questions
        .iter()
        .map(|e| (e.id.as_key(), e))
        .collect();

    let mut seen_dataset_rows: HashSet<(String, chrono::NaiveDate)> = HashSet::new();
    let mut valid = Vec::with_capacity(rows.len());
    let mut dropped = 0;

    for row in rows {
        let key = row.id.as_key();
        let Some(entry) = by_key.get(key.as_str()) else {
            warn!("dropping row for {key}: not in this question set");
            dropped += 1;
            continue;
        };

        let is_dataset = !entry.resolution_dates.is_empty();
        if is_dataset {
            let dup_key = (key.clone(), row.resolution_date);
            if !seen_dataset_rows.insert(dup_key) {
                return Err(CoreError::DuplicateForecastRow {
                    id: key,
                    resolution_date: row.resolution_date.to_string(),
                });
            }
        }

        if !entry_allows(entry, row.resolution_date) {
            warn!(
                "dropping row for {key}: resolution_date {} is not an allowed horizon",
                row.resolution_date
            );
            dropped += 1;
            continue;
        }

        match row.forecast {
            None => {
                warn!("dropping row for {key}: forecast is null");
                dropped += 1;
            }
            Some(f) if !(0.0..=1.0).contains(&f) => {
                warn!("dropping row for {key}: forecast {f} out of [0,1]");
                dropped += 1;
            }
            Some(_) => valid.push(row.clone()),
        }
    }

    Ok(ValidationOutcome { valid, dropped })
}
