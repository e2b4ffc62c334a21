//! Question-Set Curator binary (`spec.md` §4.C). Runs once per freeze
//! cycle: loads the latest question table per source, filters eligible
//! candidates, allocates and stratified-samples an LLM question set,
//! derives a human sub-sample, expands dataset resolution dates, and
//! writes the two question-set files plus the `latest-llm.json` alias.
//!
//! CLI/logging/config plumbing follows `extract/src/main.rs`'s pattern.

use std::collections::BTreeMap;
use std::env;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use dotenvy::dotenv;
use log::{debug, info};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use forecastbench_bank::QuestionTable;
use forecastbench_core::config::{validate_bin_weights, CuratorConfig, RunMode, HORIZON_BINS, MARKET_VALUE_BINS};
use forecastbench_core::{Direction, Question, QuestionId, QuestionSet, QuestionSetEntry};
use forecastbench_curate::{
    allocate_evenly, composite_bin_weights, filter_candidates, horizon_bin, market_value_bin,
    stratified_sample, validate_axis_weights, CompositeBin,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about)]
struct Args {
    /// The freeze date for this curation cycle (YYYY-MM-DD); also becomes
    /// the forecast_due_date on the output question sets.
    #[arg(long)]
    freeze_date: NaiveDate,

    /// Root directory holding the object-store layout (`question_bank/`,
    /// `question_sets/`).
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
    let config = CuratorConfig::for_mode(mode);
    info!(
        "curate: run mode {mode}, freeze_date {}, llm_n={}, human_n={}",
        args.freeze_date, config.llm_n, config.human_n
    );

    validate_axis_weights().context("bin weight tables failed validation")?;
    validate_bin_weights(&MARKET_VALUE_BINS.iter().map(|b| b.numerator).collect::<Vec<_>>())?;
    validate_bin_weights(&HORIZON_BINS.iter().map(|b| b.numerator).collect::<Vec<_>>())?;

    let question_bank_root = args.data_root.join("question_bank");

    let mut llm_questions: Vec<Question> = Vec::new();

    let n_market_target = config.llm_n / 2;
    let n_dataset_target = config.llm_n - n_market_target;

    info!("--- market sources ---");
    let market_sampled = curate_market_sources(
        &question_bank_root,
        &config,
        args.freeze_date,
        n_market_target,
    )?;
    llm_questions.extend(market_sampled);

    info!("--- dataset sources ---");
    let dataset_sampled = curate_dataset_sources(
        &question_bank_root,
        &config,
        args.freeze_date,
        n_dataset_target,
    )?;
    llm_questions.extend(dataset_sampled);

    info!(
        "curator: sampled {} questions for the LLM set ({} market target, {} dataset target)",
        llm_questions.len(),
        n_market_target,
        n_dataset_target
    );

    let llm_set = build_question_set(&llm_questions, args.freeze_date, "llm");
    let human_set = derive_human_set(&llm_set, &config, args.freeze_date);

    let question_sets_dir = args.data_root.join("question_sets");
    fs::create_dir_all(&question_sets_dir)
        .with_context(|| format!("creating {}", question_sets_dir.display()))?;

    write_question_set(&question_sets_dir, &llm_set)?;
    write_question_set(&question_sets_dir, &human_set)?;
    write_alias(&question_sets_dir, &llm_set, "latest-llm.json")?;

    info!(
        "curator: wrote {} ({} questions) and {} ({} questions)",
        llm_set.question_set,
        llm_set.questions.len(),
        human_set.question_set,
        human_set.questions.len()
    );

    Ok(())
}

/// Filter, allocate, and composite-bin stratified-sample market questions
/// across `config.sources_market` (`spec.md` §4.C steps 1-3).
fn curate_market_sources(
    question_bank_root: &std::path::Path,
    config: &CuratorConfig,
    freeze_date: NaiveDate,
    n_target: usize,
) -> Result<Vec<Question>> {
    let mut candidates_by_source: BTreeMap<String, Vec<Question>> = BTreeMap::new();
    for source in &config.sources_market {
        let table = QuestionTable::load(
            &question_bank_root.join(source).join("question_table.json"),
        )?;
        let kept: Vec<Question> = filter_candidates(table.iter(), freeze_date, config.freeze_window_days)
            .into_iter()
            .cloned()
            .collect();
        info!("{source}: {} candidates after filtering", kept.len());
        candidates_by_source.insert(source.clone(), kept);
    }

    let availability: BTreeMap<String, usize> = candidates_by_source
        .iter()
        .map(|(s, qs)| (s.clone(), qs.len()))
        .collect();
    let per_source_targets = allocate_evenly(&availability, n_target);

    let mut sampled = Vec::new();
    for (source, target) in &per_source_targets {
        let questions = candidates_by_source.remove(source).unwrap_or_default();
        let mut by_id: BTreeMap<String, Question> = BTreeMap::new();
        let mut by_bin: BTreeMap<CompositeBin, Vec<String>> = BTreeMap::new();
        let mut observed_bins = Vec::new();
        for q in questions {
            let header = q.header();
            let market_value = header.freeze_datetime_value.unwrap_or(f64::NAN);
            let Question::Market(m) = &q else { continue };
            let days_to_close = (m.market_info.close_datetime.date_naive() - freeze_date).num_days();
            let mv_bin = market_value_bin(market_value);
            let h_bin = horizon_bin(days_to_close);
            let bin = (mv_bin, h_bin);
            observed_bins.push(bin);
            let key = q.id().as_key();
            by_bin.entry(bin).or_default().push(key.clone());
            by_id.insert(key, q);
        }
        observed_bins.sort();
        observed_bins.dedup();
        let weights = composite_bin_weights(&observed_bins);

        log_bin_telemetry(source, &by_bin, &weights, *target);

        let ids = stratified_sample(&by_bin, &weights, *target, config.seed);
        for id in ids {
            if let Some(q) = by_id.remove(&id) {
                sampled.push(q);
            }
        }
    }
    Ok(sampled)
}

/// Log the per-source, per-bin "got/want/available" table that catches
/// silent bin starvation (`spec.md` §4.C "Telemetry").
fn log_bin_telemetry(
    source: &str,
    by_bin: &BTreeMap<CompositeBin, Vec<String>>,
    weights: &BTreeMap<CompositeBin, f64>,
    target: usize,
) {
    for (bin, weight) in weights {
        let available = by_bin.get(bin).map(|v| v.len()).unwrap_or(0);
        let want = (target as f64 * weight).round() as usize;
        let shortfall = want.saturating_sub(available);
        if shortfall > 0 {
            info!(
                "{source}: bin {bin:?} available={available} want={want} shortfall={shortfall}"
            );
        } else {
            debug!("{source}: bin {bin:?} available={available} want={want}");
        }
    }
}

/// Filter and category-even-allocate dataset questions across
/// `config.sources_dataset` (`spec.md` §4.C steps 1, 2, 4).
fn curate_dataset_sources(
    question_bank_root: &std::path::Path,
    config: &CuratorConfig,
    freeze_date: NaiveDate,
    n_target: usize,
) -> Result<Vec<Question>> {
    let mut candidates_by_source: BTreeMap<String, Vec<Question>> = BTreeMap::new();
    for source in &config.sources_dataset {
        let table = QuestionTable::load(
            &question_bank_root.join(source).join("question_table.json"),
        )?;
        let kept: Vec<Question> = filter_candidates(table.iter(), freeze_date, config.freeze_window_days)
            .into_iter()
            .cloned()
            .collect();
        info!("{source}: {} candidates after filtering", kept.len());
        candidates_by_source.insert(source.clone(), kept);
    }

    let availability: BTreeMap<String, usize> = candidates_by_source
        .iter()
        .map(|(s, qs)| (s.clone(), qs.len()))
        .collect();
    let per_source_targets = allocate_evenly(&availability, n_target);

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let mut sampled = Vec::new();
    for (source, target) in &per_source_targets {
        let questions = candidates_by_source.remove(source).unwrap_or_default();
        let mut by_category: BTreeMap<String, Vec<Question>> = BTreeMap::new();
        for q in questions {
            by_category
                .entry(q.header().category.to_string())
                .or_default()
                .push(q);
        }
        let category_availability: BTreeMap<String, usize> =
            by_category.iter().map(|(c, qs)| (c.clone(), qs.len())).collect();
        let category_targets = allocate_evenly(&category_availability, *target);

        for (category, cat_target) in &category_targets {
            if let Some(mut qs) = by_category.remove(category) {
                qs.sort_by(|a, b| a.id().as_key().cmp(&b.id().as_key()));
                qs.shuffle(&mut rng);
                sampled.extend(qs.into_iter().take(*cat_target));
            }
        }
    }
    Ok(sampled)
}

/// Attach `resolution_dates = forecast_due_date + h` for every horizon and
/// build the `QuestionSet` wrapper (`spec.md` §4.C step 4).
fn build_question_set(questions: &[Question], freeze_date: NaiveDate, target: &str) -> QuestionSet {
    let filename = format!("{freeze_date}-{target}.json");
    let entries = questions
        .iter()
        .map(|q| {
            let header = q.header();
            let resolution_dates = if q.is_market() {
                Vec::new()
            } else {
                header
                    .forecast_horizons
                    .iter()
                    .map(|h| freeze_date + chrono::Duration::days(*h as i64))
                    .collect()
            };
            QuestionSetEntry {
                id: header.id.clone(),
                source: header.source.clone(),
                resolution_dates,
                direction: Vec::<Direction>::new(),
            }
        })
        .collect();
    QuestionSet {
        forecast_due_date: freeze_date,
        question_set: filename,
        questions: entries,
    }
}

/// Derive the human sample: uniform-at-random per source within the LLM
/// set, subject to the human N/source allocation, deterministic given the
/// configured seed (`spec.md` §4.C step 5).
fn derive_human_set(llm_set: &QuestionSet, config: &CuratorConfig, freeze_date: NaiveDate) -> QuestionSet {
    let mut by_source: BTreeMap<String, Vec<&QuestionSetEntry>> = BTreeMap::new();
    for entry in &llm_set.questions {
        by_source.entry(entry.source.clone()).or_default().push(entry);
    }
    let availability: BTreeMap<String, usize> =
        by_source.iter().map(|(s, v)| (s.clone(), v.len())).collect();
    let targets = allocate_evenly(&availability, config.human_n);

    // Derive a sub-seed so the human draw is a deterministic function of
    // the curator seed but doesn't retrace the LLM market sampler's RNG
    // stream.
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed.wrapping_add(1));
    let mut sampled = Vec::new();
    for (source, target) in &targets {
        if let Some(entries) = by_source.get(source) {
            let mut pool: Vec<&QuestionSetEntry> = entries.clone();
            pool.sort_by_key(|e| e.id.as_key());
            pool.shuffle(&mut rng);
            sampled.extend(pool.into_iter().take(*target).cloned());
        }
    }
    QuestionSet {
        forecast_due_date: freeze_date,
        question_set: format!("{freeze_date}-human.json"),
        questions: sampled,
    }
}

fn write_question_set(dir: &std::path::Path, set: &QuestionSet) -> Result<()> {
    let path = dir.join(&set.question_set);
    write_json_atomic(&path, set)
}

/// Write the `latest-llm.json` alias as a byte-identical copy of the
/// dated file (`spec.md` §4.C "Output").
fn write_alias(dir: &std::path::Path, set: &QuestionSet, alias_name: &str) -> Result<()> {
    write_json_atomic(&dir.join(alias_name), set)
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
