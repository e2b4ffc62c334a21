//! Stable id hashing for synthesized questions.
//!
//! Grounded in `original_source/src/helpers/acled.py::id_hash` /
//! `id_unhash`: a SHA-256 hex digest of a stable key dict, so two adapter
//! runs that describe the same semantic question (same source, same
//! entity, same template) produce the same id. The structured key itself is
//! persisted by the question bank's hash-mapping table
//! (`bank::hash_mapping`) so resolution can reconstruct it later.

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Hash a JSON object's sorted keys into a stable hex digest. `key` must be
/// a `Value::Object`; any other shape is a programming error in the caller
/// (source adapters only ever synthesize ids from a fixed-shape struct).
pub fn hash_key(key: &Value) -> String {
    let obj = key
        .as_object()
        .expect("id_hash key must be a JSON object");
    let mut entries: Vec<(&String, &Value)> = obj.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    let canonical = serde_json::to_string(&entries).expect("serializable key");
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}
