//! Enumerated configuration structs, per `spec.md` §9: "Configuration ->
//! enumerated option structs" rather than scattered globals. Values default
//! to the constants the original implementation uses
//! (`original_source/src/helpers/constants.py`,
//! `original_source/src/curate_questions/create_question_set/main.py`,
//! `original_source/src/leaderboard/main.py`), loaded once at process start
//! the way the teacher's `PostgrestParams` is built in `grader/src/main.rs`.

use std::env;
use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::NaiveDate;

/// `RUN_MODE` toggles sample sizes and bootstrap replicate counts
/// (`spec.md` §6 "Environment").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Test,
    Prod,
}

impl RunMode {
    pub fn from_env() -> Self {
        match env::var("RUN_MODE") {
            Ok(v) if v.eq_ignore_ascii_case("prod") => RunMode::Prod,
            _ => RunMode::Test,
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::Test => write!(f, "TEST"),
            RunMode::Prod => write!(f, "PROD"),
        }
    }
}

/// Fixed benchmark-wide constants (`original_source/src/helpers/constants.py`).
pub struct BenchmarkConstants;

impl BenchmarkConstants {
    pub const BENCHMARK_NAME: &'static str = "ForecastBench";

    pub fn benchmark_start_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).expect("valid date")
    }

    pub fn tournament_start_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 21).expect("valid date")
    }

    /// Allowed dataset-question horizons, in days.
    pub const FORECAST_HORIZONS_DAYS: [u32; 8] = [7, 30, 90, 180, 365, 1095, 1825, 3650];

    /// Operational lag (days) before the resolution engine first runs on a
    /// question set (`spec.md` §4.D).
    pub const DELAY_IN_DAYS_BEFORE_FIRST_RESOLUTION: u32 = 14;

    pub const N_BOOTSTRAP_REPLICATES_PROD: usize = 1999;
    pub const N_BOOTSTRAP_REPLICATES_TEST: usize = 5;

    pub const IMPUTED_FORECASTER: &'static str = "Imputed Forecaster";
    pub const NAIVE_FORECASTER: &'static str = "Naive Forecaster";
    pub const ALWAYS_05_MODEL: &'static str = "Always 0.5";
    pub const SUPERFORECASTER_MEDIAN: &'static str = "Superforecaster median";
    pub const PUBLIC_MEDIAN: &'static str = "Public median";
}

/// Market-probability / time-horizon bin configuration for the curator's
/// stratified sampler (`spec.md` §4.C step 3). Weights are kept as exact
/// rationals (numerator/denominator over a common `WEIGHT_DENOM`) so the
/// "weights sum to exactly 1" invariant (`spec.md` §8 property 4) can be
/// checked without floating-point drift, matching the original's use of
/// Python's `Fraction`.
#[derive(Debug, Clone, Copy)]
pub struct BinWeight {
    pub low: f64,
    pub high: f64,
    pub numerator: u64,
}

/// Common denominator for all bin weights below (1000 gives three decimal
/// digits of resolution, matching the original's `MARKET_VALUE_CONFIG` /
/// `TIME_HORIZON_CONFIG` literals).
pub const WEIGHT_DENOM: u64 = 1000;

/// The 12 market-value bins, weight numerators over `WEIGHT_DENOM`.
pub const MARKET_VALUE_BINS: [BinWeight; 12] = [
    BinWeight { low: 0.00, high: 0.01, numerator: 20 },
    BinWeight { low: 0.01, high: 0.10, numerator: 96 },
    BinWeight { low: 0.10, high: 0.20, numerator: 96 },
    BinWeight { low: 0.20, high: 0.30, numerator: 96 },
    BinWeight { low: 0.30, high: 0.40, numerator: 96 },
    BinWeight { low: 0.40, high: 0.50, numerator: 96 },
    BinWeight { low: 0.50, high: 0.60, numerator: 96 },
    BinWeight { low: 0.60, high: 0.70, numerator: 96 },
    BinWeight { low: 0.70, high: 0.80, numerator: 96 },
    BinWeight { low: 0.80, high: 0.90, numerator: 96 },
    BinWeight { low: 0.90, high: 0.99, numerator: 96 },
    BinWeight { low: 0.99, high: 1.00, numerator: 20 },
];

/// The 7 time-horizon bins, in days-to-close.
#[derive(Debug, Clone, Copy)]
pub struct HorizonBin {
    pub low_days: u32,
    pub high_days: Option<u32>,
    pub numerator: u64,
}

pub const HORIZON_BINS: [HorizonBin; 7] = [
    HorizonBin { low_days: 0, high_days: Some(7), numerator: 120 },
    HorizonBin { low_days: 8, high_days: Some(30), numerator: 210 },
    HorizonBin { low_days: 31, high_days: Some(50), numerator: 210 },
    HorizonBin { low_days: 51, high_days: Some(90), numerator: 140 },
    HorizonBin { low_days: 91, high_days: Some(180), numerator: 140 },
    HorizonBin { low_days: 181, high_days: Some(365), numerator: 140 },
    HorizonBin { low_days: 366, high_days: None, numerator: 40 },
];

/// Validates that a set of weight numerators sums to exactly `WEIGHT_DENOM`
/// (`spec.md` §8 property 4 — "weight normalization").
pub fn validate_bin_weights(numerators: &[u64]) -> Result<()> {
    let sum: u64 = numerators.iter().sum();
    if sum != WEIGHT_DENOM {
        anyhow::bail!("bin weights sum to {sum}, expected {WEIGHT_DENOM}");
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct CuratorConfig {
    pub llm_n: usize,
    pub human_n: usize,
    pub sources_market: Vec<String>,
    pub sources_dataset: Vec<String>,
    pub seed: u64,
    /// Days after release during which submitters may forecast a set.
    pub freeze_window_days: i64,
}

impl CuratorConfig {
    pub fn for_mode(mode: RunMode) -> Self {
        let (llm_n, human_n) = match mode {
            RunMode::Prod => (1000, 200),
            RunMode::Test => (50, 10),
        };
        CuratorConfig {
            llm_n,
            human_n,
            sources_market: vec![
                "manifold".into(),
                "metaculus".into(),
                "infer".into(),
                "polymarket".into(),
            ],
            sources_dataset: vec![
                "acled".into(),
                "dbnomics".into(),
                "fred".into(),
                "wikipedia".into(),
                "yfinance".into(),
            ],
            seed: 20240501,
            freeze_window_days: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CiMethod {
    Percentile,
    Bca,
}

impl FromStr for CiMethod {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "percentile" => Ok(CiMethod::Percentile),
            "bca" => Ok(CiMethod::Bca),
            other => anyhow::bail!("unknown ci_method `{other}`, expected percentile|bca"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScoringConfig {
    pub n_replicates: usize,
    pub ci_method: CiMethod,
    /// Above this fraction of imputed rows per question type, a
    /// submitter's forecast file is discarded from scoring (`spec.md` §7).
    pub imputed_cutoff_pct: f64,
    /// Only forecast_due_dates older than this many days are scored.
    pub inclusion_cutoff_days: i64,
    /// Models whose release date precedes forecast_due_date by more than
    /// this are dropped from difficulty estimation.
    pub model_release_window_days: i64,
    /// Optional Benjamini-Hochberg adjustment of human-comparison p-values.
    pub bh_adjust: bool,
}

impl ScoringConfig {
    pub fn for_mode(mode: RunMode) -> Self {
        ScoringConfig {
            n_replicates: match mode {
                RunMode::Prod => BenchmarkConstants::N_BOOTSTRAP_REPLICATES_PROD,
                RunMode::Test => BenchmarkConstants::N_BOOTSTRAP_REPLICATES_TEST,
            },
            ci_method: CiMethod::Percentile,
            imputed_cutoff_pct: 0.05,
            inclusion_cutoff_days: 50,
            model_release_window_days: 365,
            bh_adjust: false,
        }
    }
}

/// Reads a required environment variable with a descriptive error, the way
/// `grader/src/main.rs`'s `PostgrestParams` does.
pub fn require_env(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("required environment variable {key} not set"))
}
