//! Event-count data source adapter (`spec.md` §4.A "Event-count data
//! source"). Grounded in `original_source/src/resolve_forecasts/acled.py`:
//! the reference-value computation (`_sum_over_last_30_days`,
//! `_sum_over_last_30_days_times_10`, `_30_day_avg_over_past_360_days`,
//! `_30_day_avg_over_past_360_days_plus_1`) and the comparison
//! (`resolve_hand_side`/`resolve_eq`) are ported as static enums rather than
//! the original's `eval()`-based expression string — the re-architecture
//! `spec.md` §9 calls for.

use chrono::NaiveDate;
use forecastbench_core::{
    Category, ComparisonOp, EventCountQuestion, Question, QuestionHeader, QuestionId,
    ReferenceValueKind, SeriesPoint,
};

use crate::error::AdapterError;
use crate::helpers::{avg_30_day_over_360, forward_fill_daily, rolling_sum};
use crate::traits::SourceAdapter;

#[derive(Debug, Clone)]
pub struct RawEventCount {
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
    pub reference_kind: ReferenceValueKind,
    pub comparison: ComparisonOp,
}

pub struct EventCountAdapter;

impl SourceAdapter for EventCountAdapter {
    type Raw = RawEventCount;

    fn normalize(&self, raw: RawEventCount) -> Result<Question, AdapterError> {
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
            freeze_datetime_value_explanation: Some(
                "30-day rolling event count at freeze time".into(),
            ),
            resolved: false,
            valid_question: true,
        };
        Ok(Question::EventCount(EventCountQuestion {
            header,
            reference_kind: raw.reference_kind,
            comparison: raw.comparison,
        }))
    }

    fn resolution_series(
        &self,
        _id: &QuestionId,
        today: NaiveDate,
        observations: &[SeriesPoint],
        epoch: NaiveDate,
    ) -> Result<Vec<SeriesPoint>, AdapterError> {
        // Event counts are not forward-filled with a "last value" -- a day
        // with no reported events is zero, not missing.
        let mut dense = forward_fill_daily(epoch, today, observations);
        for p in dense.iter_mut() {
            if p.value.is_nan() {
                p.value = 0.0;
            }
        }
        Ok(dense)
    }

    /// Compares `sum(events in [resolution_date-29, resolution_date])`
    /// against the question's configured reference value kind, evaluated at
    /// the freeze (forecast due) date (`spec.md` §4.A: "a freeze-time
    /// reference"), using the question's configured comparison operator.
    fn resolve(
        &self,
        question: &Question,
        forecast_due_date: NaiveDate,
        resolution_date: NaiveDate,
        series: &[SeriesPoint],
    ) -> f64 {
        let (reference_kind, comparison) = match question {
            Question::EventCount(q) => (q.reference_kind, q.comparison),
            _ => return f64::NAN,
        };
        let epoch = match series.first() {
            Some(p) => p.date,
            None => return f64::NAN,
        };
        let lhs = match rolling_sum(series, epoch, resolution_date, 30) {
            Ok(v) => v,
            Err(_) => return f64::NAN,
        };
        let rhs = match reference_kind {
            ReferenceValueKind::Sum30Day => {
                match rolling_sum(series, epoch, forecast_due_date, 30) {
                    Ok(v) => v,
                    Err(_) => return f64::NAN,
                }
            }
            ReferenceValueKind::Sum30DayTimes10 => {
                match rolling_sum(series, epoch, forecast_due_date, 30) {
                    Ok(v) => v * 10.0,
                    Err(_) => return f64::NAN,
                }
            }
            ReferenceValueKind::Avg30DayOver360 => {
                avg_30_day_over_360(series, epoch, forecast_due_date)
            }
            ReferenceValueKind::Avg30DayOver360Plus1 => {
                avg_30_day_over_360(series, epoch, forecast_due_date) + 1.0
            }
        };
        if rhs.is_nan() {
            return f64::NAN;
        }
        if comparison.evaluate(lhs, rhs) {
            1.0
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_count_days_are_zero_not_missing() {
        let epoch = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let adapter = EventCountAdapter;
        let dense = adapter
            .resolution_series(&QuestionId::Single("e1".into()), today, &[], epoch)
            .unwrap();
        assert!(dense.iter().all(|p| p.value == 0.0));
    }

    #[test]
    fn comparison_op_dispatch_matches_gt() {
        assert!(ComparisonOp::Gt.evaluate(5.0, 3.0));
        assert!(!ComparisonOp::Gt.evaluate(3.0, 3.0));
        assert!(ComparisonOp::Gte.evaluate(3.0, 3.0));
    }
}
