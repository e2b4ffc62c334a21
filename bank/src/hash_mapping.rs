//! Hash-mapping table: synthesized-id hex digest ↔ structured key dict that
//! produced it. Persisted as `question_bank/<source>/hash_mapping.json`
//! (`spec.md` §6). Grounded in
//! `original_source/src/helpers/acled.py::populate_hash_mapping` /
//! `upload_hash_mapping`.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;

use anyhow::{Context, Result};
use forecastbench_core::ids::hash_key;
use serde_json::Value;

#[derive(Debug, Default, Clone, serde::Serialize, serde::Deserialize)]
pub struct HashMapping {
    /// hash -> structured key dict.
    entries: HashMap<String, Value>,
}

impl HashMapping {
    pub fn load(path: &PathBuf) -> Result<Self> {
        if !path.exists() {
            return Ok(HashMapping::default());
        }
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        let reader = BufReader::new(file);
        let entries: HashMap<String, Value> = serde_json::from_reader(reader)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(HashMapping { entries })
    }

    pub fn store(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        {
            let file = File::create(&tmp).with_context(|| format!("creating {}", tmp.display()))?;
            let writer = BufWriter::new(file);
            serde_json::to_writer_pretty(writer, &self.entries)
                .with_context(|| format!("writing {}", tmp.display()))?;
        }
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Hash `key` and record the mapping if not already present. Returns
    /// the (possibly pre-existing) hash.
    pub fn populate(&mut self, key: Value) -> String {
        let hash = hash_key(&key);
        self.entries.entry(hash.clone()).or_insert(key);
        hash
    }

    pub fn key_for(&self, hash: &str) -> Option<&Value> {
        self.entries.get(hash)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
