//! Market source adapter (`spec.md` §4.A "Market source").
//!
//! Grounded in `extract/src/platforms/manifold.rs`'s raw-record shape
//! (open/close times, resolution, probability history) and
//! `extract/src/platforms.rs::standardize`'s error classification, adapted
//! from "platform" (Kalshi/Manifold/Metaculus/Polymarket) dispatch to the
//! question-lifecycle dispatch this crate implements.

use chrono::{DateTime, NaiveDate, Utc};
use forecastbench_core::{
    Category, MarketInfo, MarketQuestion, Question, QuestionHeader, QuestionId, SeriesPoint,
};

use crate::error::AdapterError;
use crate::helpers::{forward_fill_daily, value_at};
use crate::traits::SourceAdapter;

/// Raw market record as handed over by the (external) per-platform fetcher,
/// already merged across Kalshi/Manifold/Metaculus/Polymarket into one
/// shape. `resolved_to` is `None` for still-open or cancelled markets.
#[derive(Debug, Clone)]
pub struct RawMarket {
    pub id: String,
    pub source: String,
    pub url: Option<String>,
    pub question: String,
    pub background: String,
    pub resolution_criteria: String,
    pub category: Category,
    pub open_datetime: DateTime<Utc>,
    pub close_datetime: DateTime<Utc>,
    pub resolution_datetime: Option<DateTime<Utc>>,
    pub resolved_to: Option<f64>,
    pub cancelled: bool,
    pub probability_history: Vec<SeriesPoint>,
    pub freeze_datetime: DateTime<Utc>,
    pub freeze_datetime_value: Option<f64>,
}

pub struct MarketAdapter;

impl SourceAdapter for MarketAdapter {
    type Raw = RawMarket;

    fn normalize(&self, raw: RawMarket) -> Result<Question, AdapterError> {
        if raw.cancelled {
            return Err(AdapterError::Cancelled(raw.id));
        }
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
            forecast_horizons: Vec::new(),
            freeze_datetime: raw.freeze_datetime,
            freeze_datetime_value: raw.freeze_datetime_value,
            freeze_datetime_value_explanation: Some("probability at freeze time".into()),
            resolved: raw.resolution_datetime.is_some(),
            valid_question: true,
        };
        Ok(Question::Market(MarketQuestion {
            header,
            market_info: MarketInfo {
                open_datetime: raw.open_datetime,
                close_datetime: raw.close_datetime,
                resolution_datetime: raw.resolution_datetime,
            },
        }))
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

    /// Returns the series value at `resolution_date`. If the market closed
    /// before `resolution_date`, the forward-filled series already carries
    /// the last pre-close (or final resolved) value forward, so this is a
    /// plain point lookup (`spec.md` §4.A: "the last pre-close value is
    /// used, with the final resolved outcome carried forward").
    fn resolve(
        &self,
        _question: &Question,
        _forecast_due_date: NaiveDate,
        resolution_date: NaiveDate,
        series: &[SeriesPoint],
    ) -> f64 {
        let epoch = series.first().map(|p| p.date);
        match epoch {
            Some(epoch) => value_at(series, epoch, resolution_date).unwrap_or(f64::NAN),
            None => f64::NAN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_uses_carried_forward_value() {
        let epoch = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let series = vec![
            SeriesPoint { date: epoch, value: 0.3 },
            SeriesPoint { date: epoch + chrono::Duration::days(1), value: 0.3 },
            SeriesPoint { date: epoch + chrono::Duration::days(2), value: 1.0 },
        ];
        let adapter = MarketAdapter;
        let raw = RawMarket {
            id: "m1".into(),
            source: "manifold".into(),
            url: None,
            question: "?".into(),
            background: "".into(),
            resolution_criteria: "".into(),
            category: Category::Politics,
            open_datetime: Utc::now(),
            close_datetime: Utc::now(),
            resolution_datetime: None,
            resolved_to: None,
            cancelled: false,
            probability_history: series.clone(),
            freeze_datetime: Utc::now(),
            freeze_datetime_value: Some(0.3),
        };
        let question = adapter.normalize(raw).unwrap();
        let v = adapter.resolve(
            &question,
            epoch,
            epoch + chrono::Duration::days(2),
            &series,
        );
        assert_eq!(v, 1.0);
    }

    #[test]
    fn cancelled_market_is_not_normalized() {
        let adapter = MarketAdapter;
        let raw = RawMarket {
            id: "m2".into(),
            source: "manifold".into(),
            url: None,
            question: "?".into(),
            background: "".into(),
            resolution_criteria: "".into(),
            category: Category::Politics,
            open_datetime: Utc::now(),
            close_datetime: Utc::now(),
            resolution_datetime: None,
            resolved_to: None,
            cancelled: true,
            probability_history: vec![],
            freeze_datetime: Utc::now(),
            freeze_datetime_value: Some(0.5),
        };
        assert!(matches!(
            adapter.normalize(raw),
            Err(AdapterError::Cancelled(_))
        ));
    }
}
