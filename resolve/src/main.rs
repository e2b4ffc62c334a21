//! Resolution Engine binary (`spec.md` §4.D). One task per
//! `forecast_due_date`: discovers every submitted forecast file under
//! `forecast_sets/{date}/`, validates and joins it against its question
//! set, resolves every expected target once (memoized across files), and
//! writes the processed forecast sets plus the shared ground-truth
//! resolution set.
//!
//! CLI/logging/config plumbing follows `extract/src/main.rs`'s pattern:
//! `clap::Parser` args, a validated `--log-level`, `dotenvy` for local
//! environment overrides.

use std::collections::HashMap;
use std::env;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use dotenvy::dotenv;
use forecastbench_bank::{NullifyTable, QuestionTable, RemapTable, ResolutionStore};
use forecastbench_core::config::{CuratorConfig, RunMode, ScoringConfig};
use forecastbench_core::{ForecastSet, ProcessedForecastSet, QuestionSet};
use forecastbench_resolve::{
    build_resolution_set, process_forecast_set, validate_forecast_rows, imputed_fraction,
    ResolutionContext, ResolvedValues,
};
use log::{debug, error, info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about)]
struct Args {
    /// Forecast due date to run resolution for (YYYY-MM-DD).
    #[arg(long)]
    forecast_due_date: NaiveDate,

    /// Root directory holding the object-store layout (`question_bank/`,
    /// `question_sets/`, `forecast_sets/`, `processed_forecast_sets/`,
    /// `resolution_sets/`).
    #[arg(long, default_value = "data")]
    data_root: PathBuf,

    /// Set the log level (e.g., error, warn, info, debug, trace)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = args.log_level.to_lowercase();
    match log_level.as_str() {
        "error" | "warn" | "info" | "debug" | "trace" => env::set_var("RUST_LOG", log_level),
        _ => {
            println!("Invalid log level, resetting to INFO.");
            env::set_var("RUST_LOG", "info");
        }
    }
    env_logger::init();
    debug!("Command line args: {:?}", args);

    dotenv().ok();
    let mode = RunMode::from_env();
    info!("resolve: run mode {mode}, forecast_due_date {}", args.forecast_due_date);

    let curator_config = CuratorConfig::for_mode(mode);
    let scoring_config = ScoringConfig::for_mode(mode);

    let question_bank_root = args.data_root.join("question_bank");
    let mut questions = QuestionTable::new();
    let mut remap = RemapTable::default();
    let mut nullify = NullifyTable::default();

    let all_sources = curator_config
        .sources_market
        .iter()
        .chain(curator_config.sources_dataset.iter());
    for source in all_sources {
        let source_root = question_bank_root.join(source);
        questions.merge(QuestionTable::load(&source_root.join("question_table.json"))?);
        remap.merge(RemapTable::load(&source_root.join("id_remap.json"))?);
        nullify.merge(NullifyTable::load(&source_root.join("nullify.json"))?);
    }
    info!("loaded {} questions across all sources", questions.len());

    let store = ResolutionStore::new(question_bank_root);
    let ctx = ResolutionContext {
        questions: &questions,
        store: &store,
        remap: &remap,
        nullify: &nullify,
    };

    let question_sets = load_question_sets(&args.data_root, args.forecast_due_date)?;
    if question_sets.is_empty() {
        anyhow::bail!(
            "no question sets found for forecast_due_date {}",
            args.forecast_due_date
        );
    }

    let forecast_dir = args
        .data_root
        .join("forecast_sets")
        .join(args.forecast_due_date.to_string());
    let processed_dir = args
        .data_root
        .join("processed_forecast_sets")
        .join(args.forecast_due_date.to_string());

    let mut resolved = ResolvedValues::new();
    let today = chrono::Utc::now().date_naive();

    let mut num_processed = 0;
    let mut num_rejected = 0;

    if forecast_dir.exists() {
        for entry in fs::read_dir(&forecast_dir)
            .with_context(|| format!("reading {}", forecast_dir.display()))?
        {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match process_one_file(
                &path,
                &question_sets,
                &ctx,
                &mut resolved,
                today,
                scoring_config.imputed_cutoff_pct,
            ) {
                Ok(processed) => {
                    let out_path = processed_dir.join(path.file_name().unwrap());
                    write_json_atomic(&out_path, &processed)?;
                    num_processed += 1;
                }
                Err(e) => {
                    error!("{}: rejected: {e}", path.display());
                    num_rejected += 1;
                }
            }
        }
    } else {
        warn!("no forecast_sets directory for {}", args.forecast_due_date);
    }

    if let Some(llm_set) = question_sets.values().find(|qs| qs.question_set.contains("llm")) {
        let resolution_set = build_resolution_set(llm_set, &ctx, &mut resolved, today);
        let out_path = args
            .data_root
            .join("resolution_sets")
            .join(format!("{}_resolution_set.json", args.forecast_due_date));
        write_json_atomic(&out_path, &resolution_set)?;
    }

    info!("resolve summary: processed={num_processed} rejected={num_rejected}");

    if num_rejected > 0 {
        anyhow::bail!("{num_rejected} forecast file(s) failed validation, see log for detail");
    }
    Ok(())
}

/// Load every question-set file for this due date (`{date}-llm.json`,
/// `{date}-human.json`), keyed by the question set's own name so a
/// forecast file's `question_set` field can be matched against the right
/// one.
fn load_question_sets(
    data_root: &std::path::Path,
    due_date: NaiveDate,
) -> Result<HashMap<String, QuestionSet>> {
    let mut sets = HashMap::new();
    for variant in ["llm", "human"] {
        let path = data_root
            .join("question_sets")
            .join(format!("{due_date}-{variant}.json"));
        if !path.exists() {
            continue;
        }
        let file = File::open(&path).with_context(|| format!("opening {}", path.display()))?;
        let reader = BufReader::new(file);
        let qs: QuestionSet = serde_json::from_reader(reader)
            .with_context(|| format!("parsing {}", path.display()))?;
        sets.insert(qs.question_set.clone(), qs);
    }
    Ok(sets)
}

fn process_one_file(
    path: &std::path::Path,
    question_sets: &HashMap<String, QuestionSet>,
    ctx: &ResolutionContext,
    resolved: &mut ResolvedValues,
    today: NaiveDate,
    imputed_cutoff_pct: f64,
) -> Result<ProcessedForecastSet> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let reader = BufReader::new(file);
    let forecast_set: ForecastSet =
        serde_json::from_reader(reader).with_context(|| format!("parsing {}", path.display()))?;

    let question_set = question_sets.get(&forecast_set.question_set).ok_or_else(|| {
        anyhow::anyhow!(
            "forecast file references unknown question set `{}`",
            forecast_set.question_set
        )
    })?;

    let outcome = validate_forecast_rows(&forecast_set.forecasts, question_set)
        .map_err(anyhow::Error::from)?;
    if outcome.dropped > 0 {
        warn!(
            "{}: dropped {} invalid row(s) during validation",
            path.display(),
            outcome.dropped
        );
    }

    let processed = process_forecast_set(&forecast_set, question_set, &outcome.valid, ctx, resolved, today);

    let frac = imputed_fraction(&processed);
    if frac > imputed_cutoff_pct {
        warn!(
            "{}: imputed-row fraction {:.1}% exceeds cutoff {:.1}%, flagged for scoring exclusion",
            path.display(),
            frac * 100.0,
            imputed_cutoff_pct * 100.0
        );
    }

    Ok(processed)
}

fn write_json_atomic<T: serde::Serialize>(path: &std::path::Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    let tmp = path.with_extension("json.tmp");
    {
        let file = File::create(&tmp).with_context(|| format!("creating {}", tmp.display()))?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, value)
            .with_context(|| format!("writing {}", tmp.display()))?;
    }
    fs::rename(&tmp, path).with_context(|| format!("finalizing {}", path.display()))?;
    Ok(())
}
