//! Model release date table: lookup and the 365-day staleness filter used
//! when assembling the dataset-question difficulty panel (`spec.md` §4.E
//! "Filter models by release date" and
//! `original_source/src/leaderboard/main.py::get_model_release_dates`).

use std::collections::HashMap;

use chrono::NaiveDate;
use log::warn;
use serde::Deserialize;

use crate::model::ScoredRow;

/// One row of the release date table, keyed by `model_pk`
/// (`organization`/`model_organization`/`model`) so every submitted
/// model_pk can be looked up directly.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelReleaseDate {
    pub organization: String,
    pub model_organization: String,
    pub model: String,
    pub release_date: NaiveDate,
}

#[derive(Debug, Default)]
pub struct ReleaseDateTable {
    by_model_pk: HashMap<String, NaiveDate>,
}

impl ReleaseDateTable {
    pub fn from_rows(rows: Vec<ModelReleaseDate>) -> Self {
        let mut by_model_pk = HashMap::new();
        for row in rows {
            let pk = crate::model::model_pk(&row.organization, &row.model_organization, &row.model);
            by_model_pk.insert(pk, row.release_date);
        }
        ReleaseDateTable { by_model_pk }
    }

    pub fn get(&self, model_pk: &str) -> Option<NaiveDate> {
        self.by_model_pk.get(model_pk).copied()
    }

    /// Days between a row's `forecast_due_date` and its model's release
    /// date, or `None` if the model has no release date on record (treated
    /// by the caller as "not stale" — `spec.md` §4.E notes unknown release
    /// dates default to inclusion with a logged warning).
    pub fn days_since_release(&self, row: &ScoredRow) -> Option<i64> {
        match self.get(&row.model_pk) {
            Some(release_date) => Some((row.forecast_due_date - release_date).num_days()),
            None => {
                warn!(
                    "no release date on record for model_pk {:?}; treating as not stale",
                    row.model_pk
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QuestionType;

    fn row(model: &str, forecast_due_date: NaiveDate) -> ScoredRow {
        ScoredRow::new(
            "acme".into(),
            model.into(),
            "acme".into(),
            forecast_due_date,
            "fred".into(),
            QuestionType::Dataset,
            "q1:2024-07-08".into(),
            0.5,
            1.0,
        )
    }

    #[test]
    fn days_since_release_is_positive_after_release() {
        let table = ReleaseDateTable::from_rows(vec![ModelReleaseDate {
            organization: "acme".into(),
            model_organization: "acme".into(),
            model: "m1".into(),
            release_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        }]);
        let row = row("m1", NaiveDate::from_ymd_opt(2024, 7, 1).unwrap());
        assert_eq!(table.days_since_release(&row), Some(182));
    }

    #[test]
    fn unknown_model_release_date_is_none() {
        let table = ReleaseDateTable::default();
        let row = row("unknown", NaiveDate::from_ymd_opt(2024, 7, 1).unwrap());
        assert_eq!(table.days_since_release(&row), None);
    }
}
