//! Canonical data model shared by every stage of the question lifecycle.
//!
//! The heterogeneous question records that the original implementation kept
//! in a dynamically-typed data frame become a sum type here: each source
//! family gets its own struct, and the places that used to branch on a
//! string column now dispatch on the `Question` variant.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The nine closed topical tags plus the catch-all `Other`, which the
/// curator always filters out (`spec.md` §4.C step 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Economics,
    ScienceTech,
    Healthcare,
    Politics,
    Sports,
    Environment,
    ArtsEntertainment,
    Other,
    World,
    Crypto,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// A question id is either a single source-scoped string, or — for a combo
/// question — a tagged pair of legs. `spec.md` §9 calls for a tagged struct
/// rather than a tuple-keyed id; the tuple form is retained only at the
/// storage boundary (`spec.md` "Combo questions ... only the storage layer
/// still interchanges the tuple form for backward compatibility").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuestionId {
    Single(String),
    Combo(Combo),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Combo {
    pub legs: [String; 2],
    pub directions: [Direction; 2],
}

/// Sign applied to a combo leg's resolution: `+1` keeps it, `-1` inverts it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i8)]
pub enum Direction {
    Negative = -1,
    Positive = 1,
}

impl Direction {
    /// Apply this direction to a 0/1 leg outcome, per `spec.md` §4.D step 2:
    /// `d == 1 ? r : 1 - r`.
    pub fn apply(self, r: f64) -> f64 {
        match self {
            Direction::Positive => r,
            Direction::Negative => 1.0 - r,
        }
    }
}

impl QuestionId {
    pub fn is_combo(&self) -> bool {
        matches!(self, QuestionId::Combo(_))
    }

    /// Stable string form used as a map key and in file paths.
    pub fn as_key(&self) -> String {
        match self {
            QuestionId::Single(s) => s.clone(),
            QuestionId::Combo(c) => format!("{}__{}", c.legs[0], c.legs[1]),
        }
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_key())
    }
}

/// Fields shared by every question variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionHeader {
    pub id: QuestionId,
    pub source: String,
    pub url: Option<String>,
    pub question: String,
    pub background: String,
    pub resolution_criteria: String,
    pub category: Category,
    /// Day offsets from the forecast due date at which the question
    /// resolves. Empty for market questions (they have a single close/
    /// resolution datetime instead) and for not-yet-resolvable synthesized
    /// questions.
    pub forecast_horizons: Vec<u32>,
    pub freeze_datetime: DateTime<Utc>,
    pub freeze_datetime_value: Option<f64>,
    pub freeze_datetime_value_explanation: Option<String>,
    pub resolved: bool,
    pub valid_question: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketInfo {
    pub open_datetime: DateTime<Utc>,
    pub close_datetime: DateTime<Utc>,
    pub resolution_datetime: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketQuestion {
    pub header: QuestionHeader,
    pub market_info: MarketInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumericQuestion {
    pub header: QuestionHeader,
}

/// Configuration for the event-count source's reference-value computation
/// (`spec.md` §4.A "Event-count data source"; original implementation in
/// `original_source/src/resolve_forecasts/acled.py`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceValueKind {
    /// Sum of events over the 30 days ending at the reference date.
    Sum30Day,
    /// Same, scaled by 10 (used for lower-frequency event templates).
    Sum30DayTimes10,
    /// 30-day average computed over the trailing 360-day window.
    Avg30DayOver360,
    /// Same, with a constant offset of 1 added (guards against zero
    /// baselines for rare event types).
    Avg30DayOver360Plus1,
}

/// Comparison applied between a resolution-date value and a reference
/// value. Replaces the original's `eval()`-based comparison string: this is
/// the explicit re-architecture `spec.md` §9 calls for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOp {
    Gt,
    Gte,
    Lt,
    Lte,
    Eq,
}

impl ComparisonOp {
    pub fn evaluate(self, lhs: f64, rhs: f64) -> bool {
        match self {
            ComparisonOp::Gt => lhs > rhs,
            ComparisonOp::Gte => lhs >= rhs,
            ComparisonOp::Lt => lhs < rhs,
            ComparisonOp::Lte => lhs <= rhs,
            ComparisonOp::Eq => (lhs - rhs).abs() < f64::EPSILON,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventCountQuestion {
    pub header: QuestionHeader,
    pub reference_kind: ReferenceValueKind,
    pub comparison: ComparisonOp,
}

/// The five enumerated comparison kinds for encyclopedic-table sources
/// (`spec.md` §4.A "Encyclopedic-table source").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncyclopedicComparisonKind {
    Same,
    SameOrMore,
    More,
    SameOrLess,
    OnePercentMore,
}

impl EncyclopedicComparisonKind {
    pub fn evaluate(self, resolution_value: f64, freeze_value: f64) -> bool {
        match self {
            EncyclopedicComparisonKind::Same => resolution_value == freeze_value,
            EncyclopedicComparisonKind::SameOrMore => resolution_value >= freeze_value,
            EncyclopedicComparisonKind::More => resolution_value > freeze_value,
            EncyclopedicComparisonKind::SameOrLess => resolution_value <= freeze_value,
            EncyclopedicComparisonKind::OnePercentMore => {
                resolution_value >= freeze_value * 1.01
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncyclopedicQuestion {
    pub header: QuestionHeader,
    pub comparison: EncyclopedicComparisonKind,
}

/// The sum type at the center of the redesign: every source family folds
/// into one of these four variants. Methods dispatch on variant instead of
/// branching on a source-name string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "question_type", rename_all = "snake_case")]
pub enum Question {
    Market(MarketQuestion),
    Numeric(NumericQuestion),
    EventCount(EventCountQuestion),
    EncyclopedicRow(EncyclopedicQuestion),
}

impl Question {
    pub fn header(&self) -> &QuestionHeader {
        match self {
            Question::Market(q) => &q.header,
            Question::Numeric(q) => &q.header,
            Question::EventCount(q) => &q.header,
            Question::EncyclopedicRow(q) => &q.header,
        }
    }

    pub fn header_mut(&mut self) -> &mut QuestionHeader {
        match self {
            Question::Market(q) => &mut q.header,
            Question::Numeric(q) => &mut q.header,
            Question::EventCount(q) => &mut q.header,
            Question::EncyclopedicRow(q) => &mut q.header,
        }
    }

    pub fn id(&self) -> &QuestionId {
        &self.header().id
    }

    pub fn is_market(&self) -> bool {
        matches!(self, Question::Market(_))
    }
}

/// One row of a per-question resolution series (`spec.md` §3 "Resolution
/// series"). Stored columnar per question elsewhere (`bank::series`); this
/// is the row-wise wire form.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// A question set entry: either a single question or a combo of two,
/// carrying per-question resolution dates for dataset questions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionSetEntry {
    pub id: QuestionId,
    pub source: String,
    /// Present (non-empty) only for dataset questions; market questions
    /// resolve at arbitrary horizons from the same close/resolution time.
    pub resolution_dates: Vec<NaiveDate>,
    pub direction: Vec<Direction>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionSet {
    pub forecast_due_date: NaiveDate,
    pub question_set: String,
    pub questions: Vec<QuestionSetEntry>,
}

/// A single submitted forecast row, pre-resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastRow {
    pub id: QuestionId,
    pub source: String,
    #[serde(default)]
    pub direction: Vec<Direction>,
    pub forecast: Option<f64>,
    pub resolution_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastSet {
    pub organization: String,
    pub model: String,
    pub model_organization: String,
    pub question_set: String,
    pub forecast_due_date: NaiveDate,
    pub forecasts: Vec<ForecastRow>,
}

/// A forecast row after resolution (`spec.md` §3 "Processed forecast set").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedForecastRow {
    pub id: QuestionId,
    pub source: String,
    pub direction: Vec<Direction>,
    pub forecast: f64,
    pub resolution_date: NaiveDate,
    pub resolved_to: f64,
    pub resolved: bool,
    pub imputed: bool,
    pub market_value_on_due_date: Option<f64>,
    pub market_value_on_due_date_minus_one: Option<f64>,
    pub forecast_due_date: NaiveDate,
    /// Canonical primary key the fixed-effects estimator absorbs on.
    pub question_pk: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedForecastSet {
    pub organization: String,
    pub model: String,
    pub model_organization: String,
    pub question_set: String,
    pub forecast_due_date: NaiveDate,
    pub forecasts: Vec<ProcessedForecastRow>,
}

/// The ground-truth-only table published alongside a processed forecast
/// set (`spec.md` §4.D step 5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionSetRow {
    pub id: QuestionId,
    pub source: String,
    pub direction: Vec<Direction>,
    pub resolution_date: NaiveDate,
    pub resolved_to: f64,
    pub resolved: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionSet {
    pub forecast_due_date: NaiveDate,
    pub rows: Vec<ResolutionSetRow>,
}

// serde_repr is not in the teacher's dependency stack; Direction is small
// enough to hand-roll the same behavior without pulling in a new crate.
mod direction_repr {
    use super::Direction;
    use serde::{de::Error as DeError, Deserialize, Deserializer, Serialize, Serializer};

    impl Serialize for super::Direction {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_i8(*self as i8)
        }
    }

    impl<'de> Deserialize<'de> for super::Direction {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            let v = i8::deserialize(deserializer)?;
            match v {
                1 => Ok(Direction::Positive),
                -1 => Ok(Direction::Negative),
                other => Err(DeError::custom(format!(
                    "invalid direction {other}, expected 1 or -1"
                ))),
            }
        }
    }
}
