//! Memoized resolution table for one (forecast_due_date, question_set) run
//! (`spec.md` §4.D step 2: "Resolve once per question set (memoized):
//! materialize a resolved_values table for the set by calling each
//! source's resolve for every (id, direction, resolution_date)").
//!
//! The memo key is (leg id, resolution_date): a combo question's two legs
//! resolve independently of direction (the sign is applied only when
//! [`combine`] folds the legs together), so caching per leg lets a combo
//! question and its single-question sibling share one resolve call.

use std::collections::HashMap;

use chrono::NaiveDate;
use forecastbench_adapters::combo::combine;
use forecastbench_adapters::helpers::value_at;
use forecastbench_bank::{NullifyTable, QuestionTable, RemapTable, ResolutionStore};
use forecastbench_core::{Direction, QuestionId};

use crate::dispatch::resolve_question;

/// Read-only handles shared by every lookup during one resolution run.
pub struct ResolutionContext<'a> {
    pub questions: &'a QuestionTable,
    pub store: &'a ResolutionStore,
    pub remap: &'a RemapTable,
    pub nullify: &'a NullifyTable,
}

#[derive(Default)]
pub struct ResolvedValues {
    memo: HashMap<(String, NaiveDate), f64>,
}

impl ResolvedValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a single leg, applying the global remap/nullify tables
    /// before lookup (`spec.md` §4.A: "Adapters must apply the global
    /// id-remap and nullify tables *before* lookup").
    pub fn resolve_leg(
        &mut self,
        ctx: &ResolutionContext,
        source: &str,
        raw_id: &str,
        forecast_due_date: NaiveDate,
        resolution_date: NaiveDate,
    ) -> f64 {
        let key = (raw_id.to_string(), resolution_date);
        if let Some(v) = self.memo.get(&key) {
            return *v;
        }
        let canonical_id = ctx.remap.resolve(raw_id).to_string();
        let value = if ctx.nullify.is_nullified(&canonical_id, forecast_due_date) {
            f64::NAN
        } else {
            match ctx.questions.get(&QuestionId::Single(canonical_id.clone())) {
                Some(question) => {
                    let series = ctx.store.load(source, &canonical_id).unwrap_or_default();
                    resolve_question(question, forecast_due_date, resolution_date, &series)
                }
                None => f64::NAN,
            }
        };
        self.memo.insert(key, value);
        value
    }

    /// Resolve a full target: a single id directly, or a combo's two legs
    /// combined per `spec.md` §4.D step 2's sign rule.
    pub fn resolve_target(
        &mut self,
        ctx: &ResolutionContext,
        id: &QuestionId,
        source: &str,
        forecast_due_date: NaiveDate,
        resolution_date: NaiveDate,
        direction: &[Direction],
    ) -> f64 {
        match id {
            QuestionId::Single(raw) => {
                self.resolve_leg(ctx, source, raw, forecast_due_date, resolution_date)
            }
            QuestionId::Combo(combo) => {
                let r0 = self.resolve_leg(ctx, source, &combo.legs[0], forecast_due_date, resolution_date);
                let r1 = self.resolve_leg(ctx, source, &combo.legs[1], forecast_due_date, resolution_date);
                let dirs = if direction.len() == 2 {
                    [direction[0], direction[1]]
                } else {
                    combo.directions
                };
                combine(dirs, [r0, r1])
            }
        }
    }

    /// The market value on a given date, used for `market_value_on_due_date`
    /// / `market_value_on_due_date_minus_one` and the "Imputed Forecaster" /
    /// "Naive Forecaster" overrides. `None` for combo ids (they have no
    /// single point value) or when the series has no observation at `date`.
    pub fn market_point(
        &self,
        ctx: &ResolutionContext,
        id: &QuestionId,
        source: &str,
        date: NaiveDate,
    ) -> Option<f64> {
        let raw = match id {
            QuestionId::Single(s) => s.clone(),
            QuestionId::Combo(_) => return None,
        };
        let canonical = ctx.remap.resolve(&raw).to_string();
        let series = ctx.store.load(source, &canonical).ok()?;
        let epoch = series.first()?.date;
        value_at(&series, epoch, date)
    }
}
