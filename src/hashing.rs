//! Hashing System - SHA-256 for Manifests
//!
//! Provides deterministic hashes so a run can be reproduced and compared.

use sha2::{Sha256, Digest};
use serde::Serialize;
use serde_json::{Value, to_string_pretty};

/// Compute SHA-256 hash of bytes, return lowercase hex
pub fn sha256_hex(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

/// Pretty JSON with object keys in sorted order at every depth
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let mut v = serde_json::to_value(value)?;
    sort_keys(&mut v);
    to_string_pretty(&v)
}

fn sort_keys(v: &mut Value) {
    match v {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = std::mem::take(map).into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            for (key, mut child) in entries {
                sort_keys(&mut child);
                map.insert(key, child);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(sort_keys),
        _ => {}
    }
}

/// job_hash = sha256(sha256(rules) + sha256(template) + engine_version)
pub fn compute_job_hash(rules_text: &str, template_text: &str, engine_version: &str) -> String {
    let combined = format!(
        "{}:{}:{}",
        sha256_hex(rules_text.as_bytes()),
        sha256_hex(template_text.as_bytes()),
        engine_version
    );
    sha256_hex(combined.as_bytes())
}
