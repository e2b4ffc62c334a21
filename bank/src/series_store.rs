//! Per-question resolution series storage: `question_bank/<source>/<id>.jsonl`,
//! one `{id, date, value}` row per calendar day (`spec.md` §6).
//!
//! Grounded in `extract/src/platforms.rs::load_data`'s JSONL-per-line load
//! pattern (parse, log and skip on a bad line rather than abort the whole
//! file) and the columnar-series redesign note in `spec.md` §9.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use forecastbench_core::dates::{day_index, yesterday_utc};
use forecastbench_core::error::CoreError;
use forecastbench_core::SeriesPoint;
use log::{error, warn};
use serde_jsonlines::{json_lines, write_json_lines};

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct SeriesRow {
    id: String,
    date: NaiveDate,
    value: f64,
}

pub struct ResolutionStore {
    root: PathBuf,
}

impl ResolutionStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        ResolutionStore { root: root.into() }
    }

    fn path_for(&self, source: &str, id: &str) -> PathBuf {
        self.root.join(source).join(format!("{id}.jsonl"))
    }

    /// Load a question's series, skipping (and logging) malformed lines
    /// rather than aborting the whole read -- the same discipline
    /// `extract/src/platforms.rs::load_data` applies to raw market JSONL.
    pub fn load(&self, source: &str, id: &str) -> Result<Vec<SeriesPoint>> {
        let path = self.path_for(source, id);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let mut points = Vec::new();
        let lines: Vec<Result<SeriesRow, _>> = json_lines(&path)
            .with_context(|| format!("failed to open series file {}", path.display()))?
            .collect();
        for row in lines {
            match row {
                Ok(r) => points.push(SeriesPoint { date: r.date, value: r.value }),
                Err(e) => {
                    error!("{}: malformed series row skipped: {e}", path.display());
                }
            }
        }
        points.sort_by_key(|p| p.date);
        Ok(points)
    }

    /// Write a question's full series, replacing the file atomically (write
    /// to a temp path, then rename) so a crash mid-write never leaves a
    /// partial artifact (`spec.md` §5 "every stage writes its output
    /// atomically as a single file replace").
    pub fn store(&self, source: &str, id: &str, points: &[SeriesPoint]) -> Result<()> {
        let path = self.path_for(source, id);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let tmp_path = path.with_extension("jsonl.tmp");
        {
            let file = File::create(&tmp_path)
                .with_context(|| format!("failed to create {}", tmp_path.display()))?;
            let mut writer = BufWriter::new(file);
            let rows = points.iter().map(|p| SeriesRow {
                id: id.to_string(),
                date: p.date,
                value: p.value,
            });
            write_json_lines(&mut writer, rows)
                .with_context(|| format!("failed to write {}", tmp_path.display()))?;
            writer.flush()?;
        }
        std::fs::rename(&tmp_path, &path)
            .with_context(|| format!("failed to finalize {}", path.display()))?;
        Ok(())
    }

    /// Verify the invariants `spec.md` §3/§4.B require: at most one value
    /// per day, contiguous after the first observation, last row no older
    /// than yesterday UTC. Returns an error describing the first violation.
    pub fn validate_contiguous(
        &self,
        id: &str,
        points: &[SeriesPoint],
        today: NaiveDate,
    ) -> Result<(), CoreError> {
        if points.is_empty() {
            // Freshly added, unresolved questions may have an empty series.
            return Ok(());
        }
        let epoch = points[0].date;
        for (i, p) in points.iter().enumerate() {
            let expected = epoch + chrono::Duration::days(i as i64);
            if p.date != expected {
                return Err(CoreError::NonContiguousSeries {
                    id: id.to_string(),
                    gap_start: expected.to_string(),
                });
            }
        }
        let last = points.last().unwrap().date;
        let expected_last = yesterday_utc(today);
        if last < expected_last {
            warn!("{id}: series last row {last} is older than expected {expected_last}");
        }
        let _ = day_index;
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile_like::TempDir;

    mod tempfile_like {
        use std::path::{Path, PathBuf};

        /// Minimal scratch-directory helper so bank's tests don't need the
        /// `tempfile` crate just for this one use.
        pub struct TempDir(PathBuf);

        impl TempDir {
            pub fn new(tag: &str) -> Self {
                let dir = std::env::temp_dir().join(format!(
                    "forecastbench-bank-test-{tag}-{}",
                    std::process::id()
                ));
                std::fs::create_dir_all(&dir).unwrap();
                TempDir(dir)
            }
        }

        impl AsRef<Path> for TempDir {
            fn as_ref(&self) -> &Path {
                &self.0
            }
        }

        impl Drop for TempDir {
            fn drop(&mut self) {
                let _ = std::fs::remove_dir_all(&self.0);
            }
        }
    }

    #[test]
    fn store_then_load_roundtrips() {
        let dir = TempDir::new("roundtrip");
        let store = ResolutionStore::new(dir.as_ref());
        let epoch = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let points = vec![
            SeriesPoint { date: epoch, value: 1.0 },
            SeriesPoint { date: epoch + chrono::Duration::days(1), value: 2.0 },
        ];
        store.store("fred", "q1", &points).unwrap();
        let loaded = store.load("fred", "q1").unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[1].value, 2.0);
    }

    #[test]
    fn detects_non_contiguous_gap() {
        let dir = TempDir::new("gap");
        let store = ResolutionStore::new(dir.as_ref());
        let epoch = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let points = vec![
            SeriesPoint { date: epoch, value: 1.0 },
            SeriesPoint { date: epoch + chrono::Duration::days(2), value: 2.0 },
        ];
        let today = epoch + chrono::Duration::days(5);
        let err = store.validate_contiguous("q1", &points, today).unwrap_err();
        assert!(matches!(err, CoreError::NonContiguousSeries { .. }));
    }
}
