//! carpet-rules CLI
//!
//! usage: carpet-rules <rulesfile.txt> <basefile.svg> [options]
//! Writes rule-<KEY>FF.svg/.png per rule. Renderer diagnostics go to stdout,
//! logs to stderr.

use clap::error::ErrorKind;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use carpet_rules::{
    raster::DEFAULT_RENDERER, CliFlavor, ExternalRenderer, FailurePolicy, GenerationPipeline,
    PipelineError, RendererConfig, RunConfig,
};

#[derive(Parser, Debug)]
#[command(name = "carpet-rules", version)]
#[command(about = "Recolor an SVG template per carpet rule and rasterize each result")]
struct Cli {
    /// Rule file (`<key> -> <a> <b> <c>, <d> <e> <f>, <g> <h> <i>` per line)
    rules_file: PathBuf,

    /// Base SVG template with placeholder colors
    base_file: PathBuf,

    /// Directory for generated files
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Renderer executable
    #[arg(long, default_value = DEFAULT_RENDERER)]
    renderer: String,

    /// Renderer command-line convention
    #[arg(long, value_enum, default_value_t = FlavorChoice::Legacy)]
    renderer_cli: FlavorChoice,

    /// Write SVGs only
    #[arg(long)]
    no_rasterize: bool,

    /// Abort on the first renderer failure
    #[arg(long)]
    strict: bool,

    /// Write a JSON manifest of generated assets
    #[arg(long)]
    manifest: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FlavorChoice {
    Legacy,
    Modern,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(_) => {
            let program = std::env::args().next().unwrap_or_else(|| "carpet-rules".to_string());
            println!("usage: {} <rulesfile.txt> <basefile.svg>", program);
            return ExitCode::from(1);
        }
    };

    init_tracing();

    let renderer = ExternalRenderer::new(RendererConfig {
        program: cli.renderer,
        flavor: match cli.renderer_cli {
            FlavorChoice::Legacy => CliFlavor::Legacy,
            FlavorChoice::Modern => CliFlavor::Modern,
        },
    });

    let config = RunConfig {
        output_dir: cli.output_dir,
        rasterize: !cli.no_rasterize,
        failure_policy: if cli.strict {
            FailurePolicy::Abort
        } else {
            FailurePolicy::Continue
        },
        manifest_path: cli.manifest,
    };

    let pipeline = GenerationPipeline::new(renderer, config);
    let stdout = std::io::stdout();
    let mut report = stdout.lock();

    match pipeline.run_files(&cli.rules_file, &cli.base_file, &mut report) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e @ PipelineError::RasterFailed { .. }) => {
            eprintln!("error: {}", e);
            ExitCode::from(2)
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,carpet_rules=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
