//! Variant dispatch for `SourceAdapter::resolve` (`spec.md` §9: "the
//! per-source switch in resolution becomes a method dispatch on the
//! variant rather than a string-keyed branch"). Each adapter struct is
//! zero-sized, so dispatch is a plain match with no allocation or trait
//! object indirection.

use chrono::NaiveDate;
use forecastbench_adapters::{
    encyclopedic::EncyclopedicAdapter, event_count::EventCountAdapter, market::MarketAdapter,
    numeric::NumericAdapter, SourceAdapter,
};
use forecastbench_core::{Question, SeriesPoint};

pub fn resolve_question(
    question: &Question,
    forecast_due_date: NaiveDate,
    resolution_date: NaiveDate,
    series: &[SeriesPoint],
) -> f64 {
    match question {
        Question::Market(_) => {
            MarketAdapter.resolve(question, forecast_due_date, resolution_date, series)
        }
        Question::Numeric(_) => {
            NumericAdapter.resolve(question, forecast_due_date, resolution_date, series)
        }
        Question::EventCount(_) => {
            EventCountAdapter.resolve(question, forecast_due_date, resolution_date, series)
        }
        Question::EncyclopedicRow(_) => {
            EncyclopedicAdapter.resolve(question, forecast_due_date, resolution_date, series)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use forecastbench_core::{Category, NumericQuestion, QuestionHeader, QuestionId};

    #[test]
    fn dispatches_numeric_question_to_numeric_adapter() {
        let epoch = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let series = vec![
            SeriesPoint { date: epoch, value: 1.0 },
            SeriesPoint { date: epoch + chrono::Duration::days(1), value: 2.0 },
        ];
        let question = Question::Numeric(NumericQuestion {
            header: QuestionHeader {
                id: QuestionId::Single("n1".into()),
                source: "fred".into(),
                url: None,
                question: "".into(),
                background: "".into(),
                resolution_criteria: "".into(),
                category: Category::Economics,
                forecast_horizons: vec![1],
                freeze_datetime: Utc::now(),
                freeze_datetime_value: Some(1.0),
                freeze_datetime_value_explanation: None,
                resolved: false,
                valid_question: true,
            },
        });
        let v = resolve_question(&question, epoch, epoch + chrono::Duration::days(1), &series);
        assert_eq!(v, 1.0);
    }
}
