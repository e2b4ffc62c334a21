//! Numeric data source adapter (`spec.md` §4.A "Numeric data source":
//! monetary, econometric, climate, energy series). Grounded in
//! `original_source/src/resolve_forecasts/main.py`'s dataset-source
//! resolution dispatch and `extract/src/platforms/helpers.rs`'s
//! point-lookup helpers, generalized from probability segments to plain
//! numeric series.

use chrono::NaiveDate;
use forecastbench_core::{Category, NumericQuestion, Question, QuestionHeader, QuestionId, SeriesPoint};

use crate::error::AdapterError;
use crate::helpers::{forward_fill_daily, value_at};
use crate::traits::SourceAdapter;

#[derive(Debug, Clone)]
pub struct RawNumeric {
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
}

pub struct NumericAdapter;

impl SourceAdapter for NumericAdapter {
    type Raw = RawNumeric;

    fn normalize(&self, raw: RawNumeric) -> Result<Question, AdapterError> {
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
            freeze_datetime_value_explanation: Some("value observed at freeze time".into()),
            resolved: false,
            valid_question: true,
        };
        Ok(Question::Numeric(NumericQuestion { header }))
    }

    fn resolution_series(
        &self,
        _id: &QuestionId,
        today: NaiveDate,
        observations: &[SeriesPoint],
        epoch: NaiveDate,
    ) -> Result<Vec<SeriesPoint>, AdapterError> {
        Ok(forward_fill_daily(epoch, today, observations))
    }

    /// `1` if the value at `resolution_date` strictly exceeds the value at
    /// `forecast_due_date`, else `0`; `NaN` if either endpoint is missing
    /// (`spec.md` §4.A).
    fn resolve(
        &self,
        _question: &Question,
        forecast_due_date: NaiveDate,
        resolution_date: NaiveDate,
        series: &[SeriesPoint],
    ) -> f64 {
        let epoch = match series.first() {
            Some(p) => p.date,
            None => return f64::NAN,
        };
        let due_value = value_at(series, epoch, forecast_due_date);
        let res_value = value_at(series, epoch, resolution_date);
        match (due_value, res_value) {
            (Some(due), Some(res)) => {
                if res > due {
                    1.0
                } else {
                    0.0
                }
            }
            _ => f64::NAN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(epoch: NaiveDate, values: &[f64]) -> Vec<SeriesPoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| SeriesPoint {
                date: epoch + chrono::Duration::days(i as i64),
                value: *v,
            })
            .collect()
    }

    #[test]
    fn resolves_one_when_strictly_higher() {
        let epoch = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let s = series(epoch, &[10.0, 10.0, 11.0]);
        let adapter = NumericAdapter;
        let q = Question::Numeric(NumericQuestion {
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
                freeze_datetime_value: Some(10.0),
                freeze_datetime_value_explanation: None,
                resolved: false,
                valid_question: true,
            },
        });
        let v = adapter.resolve(&q, epoch, epoch + chrono::Duration::days(2), &s);
        assert_eq!(v, 1.0);
    }

    #[test]
    fn resolves_zero_when_not_higher() {
        let epoch = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let s = series(epoch, &[10.0, 10.0, 10.0]);
        let adapter = NumericAdapter;
        let q = Question::Numeric(NumericQuestion {
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
                freeze_datetime_value: Some(10.0),
                freeze_datetime_value_explanation: None,
                resolved: false,
                valid_question: true,
            },
        });
        let v = adapter.resolve(&q, epoch, epoch + chrono::Duration::days(2), &s);
        assert_eq!(v, 0.0);
    }
}
