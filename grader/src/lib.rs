//! The Scoring & Leaderboard engine (`spec.md` §4.E): combines every
//! processed forecast set into a difficulty-adjusted Brier leaderboard
//! with bootstrap confidence intervals, human-comparison p-values, x%
//! oracle equivalence, and SOTA-superforecaster parity dates.
//!
//! Grounded throughout in
//! `original_source/src/leaderboard/main.py`, whose pandas-DataFrame
//! pipeline becomes a sequence of plain `Vec<ScoredRow>` transforms here
//! (`spec.md` §9's sparse-OLS/closed-form split and parallel-map bootstrap
//! re-architecture notes apply directly to this crate).

pub mod bootstrap;
pub mod fixed_effects;
pub mod ingest;
pub mod leaderboard;
pub mod model;
pub mod oracle;
pub mod pvalue;
pub mod release_dates;
pub mod scores;
pub mod sota;

pub use model::{model_pk, LeaderboardRow, QuestionType, ScoredRow};
