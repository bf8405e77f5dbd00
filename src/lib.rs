//! Carpet Rules - Rule-Driven SVG Asset Generation
//!
//! Each line of a rule file maps a cell state to a 3x3 grid of neighbor
//! states. Every rule recolors a copy of a base SVG template, which is then
//! rasterized to PNG by an external renderer.
//!
//! Rules are processed one at a time, in rule-file order.

pub mod color;
pub mod rules;
pub mod templates;
pub mod raster;
pub mod hashing;
pub mod manifest;
pub mod pipeline;
pub mod carpet;

pub use color::{encode, CellState, ColorHex};
pub use rules::{parse_rules, Grid, Rule, RuleParseError, RuleSet};
pub use templates::{render, PlaceholderTable, RenderedAsset, Template};
pub use raster::{CliFlavor, ExternalRenderer, RasterError, RasterOutcome, Renderer, RendererConfig};
pub use manifest::{Manifest, RasterStatus};
pub use pipeline::{FailurePolicy, GenerationPipeline, PipelineError, RunConfig, RunReport};
pub use carpet::{CarpetConfig, CarpetError};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
