//! Generation Manifest
//!
//! Records what one run produced, with content hashes for the SVG outputs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::color::ColorHex;
use crate::hashing::{canonical_json, compute_job_hash, sha256_hex};
use crate::pipeline::PipelineError;
use crate::ENGINE_VERSION;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RasterStatus {
    Skipped,
    Succeeded,
    Failed { exit_code: Option<i32> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub key: ColorHex,
    pub svg_file: String,
    pub png_file: String,
    pub svg_sha256: String,
    pub replacements: usize,
    pub raster: RasterStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub engine_version: String,
    pub created_at: DateTime<Utc>,
    pub job_hash: String,
    pub entries: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn new(rules_text: &str, template_text: &str) -> Self {
        Self {
            engine_version: ENGINE_VERSION.to_string(),
            created_at: Utc::now(),
            job_hash: compute_job_hash(rules_text, template_text, ENGINE_VERSION),
            entries: vec![],
        }
    }

    pub fn push(
        &mut self,
        key: ColorHex,
        svg_file: String,
        png_file: String,
        svg: &str,
        replacements: usize,
        raster: RasterStatus,
    ) {
        self.entries.push(ManifestEntry {
            key,
            svg_file,
            png_file,
            svg_sha256: sha256_hex(svg.as_bytes()),
            replacements,
            raster,
        });
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        canonical_json(self)
    }

    pub fn write_to(&self, path: &Path) -> Result<(), PipelineError> {
        fs::write(path, self.to_json()?).map_err(|source| PipelineError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}
