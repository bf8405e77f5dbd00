//! Rasterization - External SVG to PNG Renderer
//!
//! The renderer runs as a child process, one at a time. Its output is fully
//! captured; a nonzero exit is returned as data, not as an error.

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_RENDERER: &str = "inkscape";

#[derive(Debug, Error)]
pub enum RasterError {
    #[error("failed to spawn renderer '{program}' (is it installed and on PATH?): {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to wait for renderer '{program}': {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Command-line conventions of the renderer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CliFlavor {
    /// `-z --export-png <out> <in>` (Inkscape 0.x)
    #[default]
    Legacy,
    /// `--export-type=png --export-filename=<out> <in>` (Inkscape 1.x)
    Modern,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RendererConfig {
    pub program: String,
    #[serde(default)]
    pub flavor: CliFlavor,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_RENDERER.to_string(),
            flavor: CliFlavor::Legacy,
        }
    }
}

/// Captured result of one renderer invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RasterOutcome {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
}

impl RasterOutcome {
    pub fn success() -> Self {
        Self {
            exit_code: Some(0),
            ..Self::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Write diagnostics: stdout whenever present, stderr only on failure.
    pub fn report(&self, sink: &mut dyn Write) -> std::io::Result<()> {
        if !self.stdout.is_empty() {
            writeln!(sink, "{}", self.stdout)?;
        }
        if !self.stderr.is_empty() && !self.is_success() {
            writeln!(sink, "{}", self.stderr)?;
        }
        Ok(())
    }
}

/// Converts one SVG file into one PNG file.
pub trait Renderer {
    fn render(&self, svg_path: &Path, png_path: &Path) -> Result<RasterOutcome, RasterError>;
}

/// Renderer backed by an executable on PATH.
pub struct ExternalRenderer {
    config: RendererConfig,
}

impl ExternalRenderer {
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn command(&self, svg_path: &Path, png_path: &Path) -> Command {
        let mut cmd = Command::new(&self.config.program);
        match self.config.flavor {
            CliFlavor::Legacy => {
                cmd.arg("-z").arg("--export-png").arg(png_path);
            }
            CliFlavor::Modern => {
                let mut target = std::ffi::OsString::from("--export-filename=");
                target.push(png_path);
                cmd.arg("--export-type=png").arg(target);
            }
        }
        cmd.arg(svg_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }
}

impl Default for ExternalRenderer {
    fn default() -> Self {
        Self::new(RendererConfig::default())
    }
}

impl Renderer for ExternalRenderer {
    fn render(&self, svg_path: &Path, png_path: &Path) -> Result<RasterOutcome, RasterError> {
        let program = self.config.program.clone();
        debug!(%program, svg = %svg_path.display(), png = %png_path.display(), "spawning renderer");

        let child = self
            .command(svg_path, png_path)
            .spawn()
            .map_err(|source| RasterError::Spawn {
                program: program.clone(),
                source,
            })?;

        // wait_with_output drains both pipes concurrently
        let output = child
            .wait_with_output()
            .map_err(|source| RasterError::Wait { program, source })?;

        let outcome = RasterOutcome {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        };
        if !outcome.is_success() {
            warn!(
                svg = %svg_path.display(),
                exit_code = ?outcome.exit_code,
                "renderer exited with failure"
            );
        }
        Ok(outcome)
    }
}
