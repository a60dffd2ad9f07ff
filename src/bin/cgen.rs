//! Schema compiler CLI
//!
//! Compiles a schema definition and writes the render handoff as JSON.

use std::path::PathBuf;

use anyhow::Context;
use cgen::{CgenConfig, Compiler, JsonRenderer, Renderer, Severity};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cgen")]
#[command(about = "Compile a schema definition into render data")]
struct Cli {
    /// Root schema file
    definition: PathBuf,

    /// Extra directory to look schema files up in (repeatable)
    #[arg(short, long = "input")]
    input: Vec<PathBuf>,

    /// Config file (defaults to cgen.toml lookup)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Skip meta-schema validation
    #[arg(long)]
    no_validate: bool,

    /// Print every diagnostic, including informational ones
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = CgenConfig::load_from(cli.config.as_deref()).context("loading config")?;
    if cli.no_validate {
        config.validation.enabled = false;
    }
    let pretty = config.output.pretty;

    let mut compiler = Compiler::from_config(config)?;
    for dir in cli.input {
        compiler.add_search_path(dir);
    }

    println!("📦 Compiling {}", cli.definition.display());
    let compilation = compiler.compile(&cli.definition)?;

    let min = if cli.verbose {
        Severity::Info
    } else {
        Severity::Warning
    };
    let report = compilation.diagnostics.format(min);
    if !report.is_empty() {
        println!("{}", report);
    }

    let renderer = JsonRenderer::new(pretty);
    let written = renderer.render(&compilation.data, &cli.output)?;

    println!(
        "✅ {} type(s), {} element(s), digest {}",
        compilation.data.types.len(),
        compilation.data.elements.len(),
        compilation.data.digest
    );
    for path in written {
        println!("   {}", path.display());
    }

    Ok(())
}
