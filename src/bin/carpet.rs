//! carpet CLI - draws the fractal carpet a rule file describes
//!
//! usage: carpet <rulesfile.txt> <iterations> <output.png> [initial-color:8hex]

use clap::Parser;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use carpet_rules::carpet::{self, CarpetConfig};
use carpet_rules::parse_rules;

#[derive(Parser, Debug)]
#[command(name = "carpet", version)]
#[command(about = "Draw a carpet by iterating cellular-automaton rules")]
struct Cli {
    /// Rule file
    rules_file: PathBuf,

    /// Number of iterations (the image is 3^n pixels wide)
    iterations: u32,

    /// Output PNG path
    output: PathBuf,

    /// Initial color as RRGGBBAA (defaults to the first rule's key)
    initial: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,carpet_rules=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let text = match fs::read_to_string(&cli.rules_file) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: failed to read {}: {}", cli.rules_file.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let rules = match parse_rules(&text) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let initial = match cli.initial.as_deref().map(carpet::parse_rgba).transpose() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let config = CarpetConfig {
        iterations: cli.iterations,
        initial,
    };

    match carpet::draw_to_file(&rules, &config, &cli.output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
