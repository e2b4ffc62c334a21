//! Ground-truth resolution sets (`spec.md` §4.D step 5: "Publish a
//! ground-truth-only resolution set alongside the processed forecast
//! sets, independent of any one model's submission, so a consumer can
//! re-derive Brier scores without re-running resolution.").

use chrono::NaiveDate;
use forecastbench_core::{QuestionSet, ResolutionSet, ResolutionSetRow};

use crate::process::expected_targets;
use crate::resolved_values::{ResolutionContext, ResolvedValues};

pub fn build_resolution_set(
    question_set: &QuestionSet,
    ctx: &ResolutionContext,
    resolved: &mut ResolvedValues,
    today: NaiveDate,
) -> ResolutionSet {
    let mut rows = Vec::new();
    for entry in &question_set.questions {
        for resolution_date in expected_targets(entry, ctx, today) {
            let resolved_to = resolved.resolve_target(
                ctx,
                &entry.id,
                &entry.source,
                question_set.forecast_due_date,
                resolution_date,
                &entry.direction,
            );
            rows.push(ResolutionSetRow {
                id: entry.id.clone(),
                source: entry.source.clone(),
                direction: entry.direction.clone(),
                resolution_date,
                resolved_to,
                resolved: !resolved_to.is_nan(),
            });
        }
    }
    ResolutionSet {
        forecast_due_date: question_set.forecast_due_date,
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forecastbench_bank::{NullifyTable, QuestionTable, RemapTable, ResolutionStore};
    use forecastbench_core::{Category, Direction, NumericQuestion, Question, QuestionHeader, QuestionId, SeriesPoint};

    #[test]
    fn resolution_set_has_one_row_per_elapsed_target() {
        let mut questions = QuestionTable::new();
        questions.insert_new(Question::Numeric(NumericQuestion {
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
                freeze_datetime_value: Some(1.0),
                freeze_datetime_value_explanation: None,
                resolved: false,
                valid_question: true,
            },
        }));
        let dir = std::env::temp_dir().join(format!("fb-resolve-resset-test-{}", std::process::id()));
        let store = ResolutionStore::new(dir);
        let epoch = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        store
            .store(
                "fred",
                "n1",
                &[
                    SeriesPoint { date: epoch, value: 1.0 },
                    SeriesPoint { date: epoch + chrono::Duration::days(7), value: 2.0 },
                ],
            )
            .unwrap();
        let remap = RemapTable::default();
        let nullify = NullifyTable::default();
        let ctx = ResolutionContext { questions: &questions, store: &store, remap: &remap, nullify: &nullify };
        let res_date = epoch + chrono::Duration::days(7);
        let question_set = QuestionSet {
            forecast_due_date: epoch,
            question_set: "llm".into(),
            questions: vec![forecastbench_core::QuestionSetEntry {
                id: QuestionId::Single("n1".into()),
                source: "fred".into(),
                resolution_dates: vec![res_date],
                direction: vec![Direction::Positive],
            }],
        };
        let mut resolved = ResolvedValues::new();
        let set = build_resolution_set(&question_set, &ctx, &mut resolved, res_date);
        assert_eq!(set.rows.len(), 1);
        assert_eq!(set.rows[0].resolved_to, 1.0);
    }
}
