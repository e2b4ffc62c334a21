//! Scoring & Leaderboard binary (`spec.md` §4.E). Discovers every processed
//! forecast set under `processed_forecast_sets/`, loads the model release
//! date table, builds the baseline and tournament leaderboards, and writes
//! both out as CSV alongside a SOTA-envelope graph CSV.
//!
//! CLI/logging/config plumbing follows `resolve/src/main.rs`'s pattern:
//! `clap::Parser` args, a validated `--log-level`, `dotenvy` for local
//! environment overrides.

use std::collections::HashSet;
use std::env;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use dotenvy::dotenv;
use forecastbench_core::config::{CuratorConfig, RunMode, ScoringConfig};
use forecastbench_core::ProcessedForecastSet;
use forecastbench_grader::ingest::combine_forecasting_rounds;
use forecastbench_grader::leaderboard::{build_leaderboard, LeaderboardVariant};
use forecastbench_grader::model::LeaderboardRow;
use forecastbench_grader::release_dates::{ModelReleaseDate, ReleaseDateTable};
use forecastbench_grader::sota::{sota_envelope, summarize_parity_dates};
use log::{debug, info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about)]
struct Args {
    /// Root directory holding the object-store layout (`processed_forecast_sets/`,
    /// `model_release_dates.json`, `leaderboards/`).
    #[arg(long, default_value = "data")]
    data_root: PathBuf,

    /// Random seed for the bootstrap (defaults to the curator's own seed so
    /// a full pipeline run is reproducible end to end).
    #[arg(long)]
    seed: Option<u64>,

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
    info!("grader: run mode {mode}");

    let curator_config = CuratorConfig::for_mode(mode);
    let scoring_config = ScoringConfig::for_mode(mode);
    let seed = args.seed.unwrap_or(curator_config.seed);

    let market_sources: HashSet<String> = curator_config.sources_market.iter().cloned().collect();

    let sets = load_processed_forecast_sets(&args.data_root.join("processed_forecast_sets"))?;
    if sets.is_empty() {
        anyhow::bail!("no processed forecast sets found under {}", args.data_root.display());
    }
    info!("loaded {} processed forecast sets", sets.len());

    let today = chrono::Utc::now().date_naive();
    let rows = combine_forecasting_rounds(
        &sets,
        &market_sources,
        today,
        scoring_config.inclusion_cutoff_days,
        scoring_config.imputed_cutoff_pct,
    );
    if rows.is_empty() {
        anyhow::bail!("no scoreable rows after ingest filters");
    }

    let release_dates = load_release_dates(&args.data_root.join("model_release_dates.json"))?;

    let leaderboard_dir = args.data_root.join("leaderboards").join("csv");

    for (variant, name) in [
        (LeaderboardVariant::Baseline, "baseline"),
        (LeaderboardVariant::Tournament, "tournament"),
    ] {
        let leaderboard = build_leaderboard(&rows, variant, &scoring_config, &release_dates, today, seed);
        info!("{name} leaderboard: {} models scored", leaderboard.len());
        write_leaderboard_csv(&leaderboard_dir.join(format!("leaderboard_{name}.csv")), &leaderboard)?;
        write_sota_graph_csv(&leaderboard_dir.join(format!("sota_graph_{name}.csv")), &rows, variant, &scoring_config)?;
    }

    Ok(())
}

/// Recursively load every `processed_forecast_sets/{date}/*.json` file.
fn load_processed_forecast_sets(root: &Path) -> Result<Vec<ProcessedForecastSet>> {
    let mut sets = Vec::new();
    if !root.exists() {
        return Ok(sets);
    }
    for date_entry in fs::read_dir(root).with_context(|| format!("reading {}", root.display()))? {
        let date_entry = date_entry?;
        if !date_entry.file_type()?.is_dir() {
            continue;
        }
        for file_entry in fs::read_dir(date_entry.path())? {
            let file_entry = file_entry?;
            let path = file_entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let file = File::open(&path).with_context(|| format!("opening {}", path.display()))?;
            let reader = BufReader::new(file);
            match serde_json::from_reader::<_, ProcessedForecastSet>(reader) {
                Ok(set) => sets.push(set),
                Err(e) => warn!("{}: skipping unparseable processed forecast set: {e}", path.display()),
            }
        }
    }
    Ok(sets)
}

fn load_release_dates(path: &Path) -> Result<ReleaseDateTable> {
    if !path.exists() {
        warn!("no model release date table at {}; all models treated as not-stale", path.display());
        return Ok(ReleaseDateTable::default());
    }
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let reader = BufReader::new(file);
    let rows: Vec<ModelReleaseDate> =
        serde_json::from_reader(reader).with_context(|| format!("parsing {}", path.display()))?;
    Ok(ReleaseDateTable::from_rows(rows))
}

fn write_leaderboard_csv(path: &Path, rows: &[LeaderboardRow]) -> Result<()> {
    let mut out = String::new();
    out.push_str(
        "organization,model,model_organization,model_release_date,n_dataset,n_market,\
         dataset_score,market_score,overall_score,dataset_ci_low,dataset_ci_high,\
         market_ci_low,market_ci_high,overall_ci_low,overall_ci_high,\
         p_value_vs_superforecaster,p_value_vs_public,x_pct_oracle_equivalent,\
         peer_score,brier_skill_score\n",
    );
    let mut sorted: Vec<&LeaderboardRow> = rows.iter().collect();
    sorted.sort_by(|a, b| a.overall_score.partial_cmp(&b.overall_score).unwrap());
    for row in sorted {
        out.push_str(&format!(
            "{},{},{},{},{},{},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{}\n",
            csv_escape(&row.organization),
            csv_escape(&row.model),
            csv_escape(&row.model_organization),
            row.model_release_date.map(|d| d.to_string()).unwrap_or_default(),
            row.n_dataset,
            row.n_market,
            row.dataset_score,
            row.market_score,
            row.overall_score,
            row.dataset_ci.0,
            row.dataset_ci.1,
            row.market_ci.0,
            row.market_ci.1,
            row.overall_ci.0,
            row.overall_ci.1,
            row.p_value_vs_superforecaster,
            row.p_value_vs_public,
            row.x_pct_oracle_equivalent,
            row.peer_score,
            row.brier_skill_score.map(|v| format!("{v:.6}")).unwrap_or_default(),
        ));
    }
    write_atomic(path, out.as_bytes())
}

/// Write the cumulative best-LLM-score-over-time envelope used for the
/// SOTA/superforecaster parity chart, plus the 2.5/50/97.5 percentile
/// parity date estimate as a trailing comment row.
fn write_sota_graph_csv(
    path: &Path,
    rows: &[forecastbench_grader::model::ScoredRow],
    variant: LeaderboardVariant,
    config: &ScoringConfig,
) -> Result<()> {
    use forecastbench_core::config::BenchmarkConstants;
    use forecastbench_grader::model::{model_pk, QuestionType};

    let cutoff = BenchmarkConstants::tournament_start_date();
    let scoped: Vec<&forecastbench_grader::model::ScoredRow> = rows
        .iter()
        .filter(|r| match variant {
            LeaderboardVariant::Baseline => true,
            LeaderboardVariant::Tournament => r.forecast_due_date >= cutoff,
        })
        .collect();

    let benchmark_pks: HashSet<String> = [
        BenchmarkConstants::IMPUTED_FORECASTER,
        BenchmarkConstants::NAIVE_FORECASTER,
        BenchmarkConstants::ALWAYS_05_MODEL,
        BenchmarkConstants::SUPERFORECASTER_MEDIAN,
        BenchmarkConstants::PUBLIC_MEDIAN,
    ]
    .iter()
    .map(|m| model_pk(BenchmarkConstants::BENCHMARK_NAME, BenchmarkConstants::BENCHMARK_NAME, m))
    .collect();

    let mut by_round: std::collections::HashMap<chrono::NaiveDate, std::collections::HashMap<&str, (f64, usize)>> =
        std::collections::HashMap::new();
    for r in &scoped {
        if benchmark_pks.contains(&r.model_pk) || r.question_type != QuestionType::Dataset {
            continue;
        }
        let entry = by_round.entry(r.forecast_due_date).or_default().entry(&r.model_pk).or_insert((0.0, 0));
        entry.0 += r.brier_score;
        entry.1 += 1;
    }

    let rounds: Vec<(chrono::NaiveDate, f64)> = by_round
        .into_iter()
        .filter_map(|(date, models)| {
            models
                .values()
                .map(|(sum, n)| sum / *n as f64)
                .fold(None, |acc, v| Some(acc.map_or(v, |a: f64| a.min(v))))
                .map(|best| (date, best))
        })
        .collect();

    let mut out = String::new();
    out.push_str("forecast_due_date,best_llm_score\n");
    if !rounds.is_empty() {
        let envelope = sota_envelope(rounds);
        for point in &envelope {
            out.push_str(&format!("{},{:.6}\n", point.forecast_due_date, point.best_score));
        }

        let superforecaster_pk =
            model_pk(BenchmarkConstants::BENCHMARK_NAME, BenchmarkConstants::BENCHMARK_NAME, BenchmarkConstants::SUPERFORECASTER_MEDIAN);
        let superforecaster_scores: Vec<f64> = scoped
            .iter()
            .filter(|r| r.model_pk == superforecaster_pk && r.question_type == QuestionType::Dataset)
            .map(|r| r.brier_score)
            .collect();
        if !superforecaster_scores.is_empty() {
            let reference = superforecaster_scores.iter().sum::<f64>() / superforecaster_scores.len() as f64;
            let epoch = envelope[0].forecast_due_date;
            let day_indices: Vec<f64> = (0..config.n_replicates)
                .filter_map(|_| forecastbench_grader::sota::parity_day_index(&envelope, epoch, reference))
                .collect();
            let (p2_5, p50, p97_5) = summarize_parity_dates(epoch, day_indices);
            out.push_str(&format!(
                "# parity_date_p2_5={},parity_date_p50={},parity_date_p97_5={}\n",
                p2_5.map(|d| d.to_string()).unwrap_or_default(),
                p50.map(|d| d.to_string()).unwrap_or_default(),
                p97_5.map(|d| d.to_string()).unwrap_or_default(),
            ));
        }
    }
    write_atomic(path, out.as_bytes())
}

fn csv_escape(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    let tmp = path.with_extension("csv.tmp");
    {
        let file = File::create(&tmp).with_context(|| format!("creating {}", tmp.display()))?;
        let mut writer = BufWriter::new(file);
        writer.write_all(content).with_context(|| format!("writing {}", tmp.display()))?;
    }
    fs::rename(&tmp, path).with_context(|| format!("finalizing {}", path.display()))?;
    Ok(())
}
