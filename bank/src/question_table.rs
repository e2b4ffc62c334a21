//! The question table: per-source storage of canonical questions, with a
//! narrow mutable surface (`spec.md` §4.B: "mutable fields only: resolved,
//! freeze_datetime_value, market_info_close_datetime,
//! market_info_resolution_datetime, and adapter-provided text fields; id is
//! immutable").

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;

use anyhow::{Context, Result};
use forecastbench_core::{Question, QuestionId};
use log::{debug, warn};

pub struct QuestionTable {
    by_id: HashMap<String, Question>,
}

impl QuestionTable {
    pub fn new() -> Self {
        QuestionTable { by_id: HashMap::new() }
    }

    pub fn load(path: &PathBuf) -> Result<Self> {
        if !path.exists() {
            return Ok(QuestionTable::new());
        }
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        let reader = BufReader::new(file);
        let questions: Vec<Question> = serde_json::from_reader(reader)
            .with_context(|| format!("parsing {}", path.display()))?;
        let mut table = QuestionTable::new();
        for q in questions {
            table.insert_new(q);
        }
        Ok(table)
    }

    pub fn store(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        {
            let file = File::create(&tmp).with_context(|| format!("creating {}", tmp.display()))?;
            let writer = BufWriter::new(file);
            let all: Vec<&Question> = self.by_id.values().collect();
            serde_json::to_writer(writer, &all)
                .with_context(|| format!("writing {}", tmp.display()))?;
        }
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Insert a question that has never been seen before. Questions are
    /// never deleted (`spec.md` §3 Lifecycle); re-inserting an existing id
    /// is a no-op that logs a warning, since that path should go through
    /// [`QuestionTable::apply_mutation`] instead.
    pub fn insert_new(&mut self, question: Question) {
        let key = question.id().as_key();
        if self.by_id.contains_key(&key) {
            warn!("question {key} already exists, ignoring duplicate insert_new");
            return;
        }
        self.by_id.insert(key, question);
    }

    pub fn get(&self, id: &QuestionId) -> Option<&Question> {
        self.by_id.get(&id.as_key())
    }

    /// Fold another source's question table into this one. Ids are
    /// globally unique across sources (`spec.md` §3 invariant), so a plain
    /// key union is safe; used to merge per-source tables into the
    /// combined view a resolution or curation run needs.
    pub fn merge(&mut self, other: QuestionTable) {
        for (key, question) in other.by_id {
            self.by_id.entry(key).or_insert(question);
        }
    }

    /// Apply an allowed mutation to an existing question's mutable fields.
    /// `mutate` receives `&mut Question` and must not change `id`.
    pub fn apply_mutation(&mut self, id: &QuestionId, mutate: impl FnOnce(&mut Question)) -> bool {
        let key = id.as_key();
        match self.by_id.get_mut(&key) {
            Some(q) => {
                let original_id = q.id().clone();
                mutate(q);
                debug_assert_eq!(
                    &original_id,
                    q.id(),
                    "mutation must not change question id"
                );
                debug!("mutated question {key}");
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.by_id.values()
    }
}

impl Default for QuestionTable {
    fn default() -> Self {
        Self::new()
    }
}
