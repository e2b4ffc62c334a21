//! Encyclopedic-table source adapter (`spec.md` §4.A "Encyclopedic-table
//! source"). These sources reach back roughly four years further than
//! other dataset sources to support the naive forecaster's back-fill
//! (`spec.md` §4.B "Back-fill") and may front-fill with `null` observations
//! up to the bank's epoch.

use chrono::NaiveDate;
use forecastbench_core::{
    Category, EncyclopedicComparisonKind, EncyclopedicQuestion, Question, QuestionHeader,
    QuestionId, SeriesPoint,
};

use crate::error::AdapterError;
use crate::helpers::dense_daily_no_fill;
use crate::traits::SourceAdapter;

#[derive(Debug, Clone)]
pub struct RawEncyclopedicRow {
    pub id: String,
    pub source: String,
    pub url: Option<String>,
    pub question: String,
    pub background: String,
    pub resolution_criteria: String,
    pub category: Category,
    pub freeze_datetime: chrono::DateTime<chrono::Utc>,
    pub freeze_datetime_value: Option<f64>,
    pub forecast_horizons: Vec<u32>,
    pub comparison: EncyclopedicComparisonKind,
}

pub struct EncyclopedicAdapter;

impl SourceAdapter for EncyclopedicAdapter {
    type Raw = RawEncyclopedicRow;

    fn normalize(&self, raw: RawEncyclopedicRow) -> Result<Question, AdapterError> {
        if raw.freeze_datetime_value.is_none() {
            return Err(AdapterError::DataInvalid {
                id: raw.id,
                detail: "missing freeze_datetime_value".into(),
            });
        }
        let header = QuestionHeader {
            id: QuestionId::Single(raw.id),
            source: raw.source,
            url: raw.url,
            question: raw.question,
            background: raw.background,
            resolution_criteria: raw.resolution_criteria,
            category: raw.category,
            forecast_horizons: raw.forecast_horizons,
            freeze_datetime: raw.freeze_datetime,
            freeze_datetime_value: raw.freeze_datetime_value,
            freeze_datetime_value_explanation: Some("table value at freeze time".into()),
            resolved: false,
            valid_question: true,
        };
        Ok(Question::EncyclopedicRow(EncyclopedicQuestion {
            header,
            comparison: raw.comparison,
        }))
    }

    /// Unlike the other dataset sources, a gap here is not forward-filled:
    /// a row that disappears from the upstream table (the record was
    /// deleted, merged, or renamed without a remap entry yet) stays `NaN`
    /// until `resolve()` so the caller can tell a withdrawn record apart
    /// from a flat value.
    fn resolution_series(
        &self,
        _id: &QuestionId,
        today: NaiveDate,
        observations: &[SeriesPoint],
        epoch: NaiveDate,
    ) -> Result<Vec<SeriesPoint>, AdapterError> {
        Ok(dense_daily_no_fill(epoch, today, observations))
    }

    /// Compares the value at `resolution_date` against the value at
    /// `forecast_due_date` using the question's configured comparison kind.
    /// A record that disappeared from the upstream table between the two
    /// dates (either endpoint is `NaN`) resolves to `NaN`
    /// (`spec.md` §4.A).
    fn resolve(
        &self,
        question: &Question,
        forecast_due_date: NaiveDate,
        resolution_date: NaiveDate,
        series: &[SeriesPoint],
    ) -> f64 {
        let comparison = match question {
            Question::EncyclopedicRow(q) => q.comparison,
            _ => return f64::NAN,
        };
        let epoch = match series.first() {
            Some(p) => p.date,
            None => return f64::NAN,
        };
        let due_value = crate::helpers::value_at(series, epoch, forecast_due_date);
        let res_value = crate::helpers::value_at(series, epoch, resolution_date);
        match (due_value, res_value) {
            (Some(due), Some(res)) => {
                if comparison.evaluate(res, due) {
                    1.0
                } else {
                    0.0
                }
            }
            _ => f64::NAN,
        }
    }
}
