//! Generation Pipeline - Single Entry Point
//!
//! Parse rules, recolor the template per rule, write SVGs, rasterize.
//! Input problems abort before anything is written; renderer failures
//! are reported and, by default, the run continues.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::color::ColorHex;
use crate::manifest::{Manifest, RasterStatus};
use crate::raster::{RasterError, Renderer};
use crate::rules::{parse_rules, RuleParseError};
use crate::templates::Template;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Rule parse error: {0}")]
    Parse(#[from] RuleParseError),

    #[error(transparent)]
    Raster(#[from] RasterError),

    #[error("renderer failed on {} (exit code {exit_code:?})", .file.display())]
    RasterFailed {
        file: PathBuf,
        exit_code: Option<i32>,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// What to do when the renderer exits nonzero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Report diagnostics and move on to the next rule.
    #[default]
    Continue,
    /// Stop the run at the first failure.
    Abort,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub output_dir: PathBuf,
    #[serde(default = "default_true")]
    pub rasterize: bool,
    #[serde(default)]
    pub failure_policy: FailurePolicy,
    #[serde(default)]
    pub manifest_path: Option<PathBuf>,
}

fn default_true() -> bool { true }

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            rasterize: true,
            failure_policy: FailurePolicy::Continue,
            manifest_path: None,
        }
    }
}

impl RunConfig {
    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        if !self.output_dir.is_dir() {
            return Err(PipelineError::InvalidConfig(format!(
                "output directory '{}' does not exist",
                self.output_dir.display()
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct GeneratedAsset {
    pub key: ColorHex,
    pub svg_path: PathBuf,
    pub png_path: PathBuf,
    pub raster: RasterStatus,
}

#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub assets: Vec<GeneratedAsset>,
}

impl RunReport {
    pub fn raster_failures(&self) -> usize {
        self.assets
            .iter()
            .filter(|a| matches!(a.raster, RasterStatus::Failed { .. }))
            .count()
    }
}

/// The generation pipeline - one rule at a time, synchronously
pub struct GenerationPipeline<R: Renderer> {
    renderer: R,
    config: RunConfig,
}

impl<R: Renderer> GenerationPipeline<R> {
    pub fn new(renderer: R, config: RunConfig) -> Self {
        Self { renderer, config }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Read both inputs from disk, then run.
    pub fn run_files(
        &self,
        rules_path: &Path,
        template_path: &Path,
        report: &mut dyn Write,
    ) -> Result<RunReport, PipelineError> {
        let rules_text = read_input(rules_path)?;
        let template_text = read_input(template_path)?;
        self.run(&rules_text, &template_text, report)
    }

    /// Generate one SVG/PNG pair per rule.
    ///
    /// Renderer diagnostics go to `report`.
    pub fn run(
        &self,
        rules_text: &str,
        template_text: &str,
        report: &mut dyn Write,
    ) -> Result<RunReport, PipelineError> {
        self.config.validate()?;

        let rules = parse_rules(rules_text)?;
        info!(rules = rules.len(), "parsed rule file");

        let template = Template::new(template_text);
        let mut manifest = Manifest::new(rules_text, template_text);
        let mut run_report = RunReport::default();

        for asset in template.render_all(&rules) {
            let svg_path = self.config.output_dir.join(asset.svg_file_name());
            let png_path = self.config.output_dir.join(asset.png_file_name());

            fs::write(&svg_path, &asset.svg).map_err(|source| PipelineError::Write {
                path: svg_path.clone(),
                source,
            })?;
            info!(key = %asset.key, path = %svg_path.display(), "wrote svg");

            let raster = if self.config.rasterize {
                self.rasterize(&svg_path, &png_path, report)?
            } else {
                RasterStatus::Skipped
            };

            manifest.push(
                asset.key.clone(),
                asset.svg_file_name(),
                asset.png_file_name(),
                &asset.svg,
                asset.replacements,
                raster.clone(),
            );
            run_report.assets.push(GeneratedAsset {
                key: asset.key,
                svg_path,
                png_path,
                raster,
            });
        }

        if let Some(path) = &self.config.manifest_path {
            manifest.write_to(path)?;
            info!(path = %path.display(), "wrote manifest");
        }

        info!(
            assets = run_report.assets.len(),
            raster_failures = run_report.raster_failures(),
            "generation finished"
        );
        Ok(run_report)
    }

    fn rasterize(
        &self,
        svg_path: &Path,
        png_path: &Path,
        report: &mut dyn Write,
    ) -> Result<RasterStatus, PipelineError> {
        let outcome = self.renderer.render(svg_path, png_path)?;
        outcome.report(report)?;

        if outcome.is_success() {
            info!(path = %png_path.display(), "wrote png");
            return Ok(RasterStatus::Succeeded);
        }

        match self.config.failure_policy {
            FailurePolicy::Continue => {
                warn!(path = %svg_path.display(), "rasterization failed, continuing");
                Ok(RasterStatus::Failed {
                    exit_code: outcome.exit_code,
                })
            }
            FailurePolicy::Abort => Err(PipelineError::RasterFailed {
                file: svg_path.to_path_buf(),
                exit_code: outcome.exit_code,
            }),
        }
    }
}

fn read_input(path: &Path) -> Result<String, PipelineError> {
    fs::read_to_string(path).map_err(|source| PipelineError::Read {
        path: path.to_path_buf(),
        source,
    })
}
