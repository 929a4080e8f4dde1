use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ifacegen::{run, ConfigFile, GeneratorConfig};

#[derive(Parser)]
#[command(name = "ifacegen")]
#[command(about = "Compile JSON interface descriptions into a typed module IR", long_about = None)]
struct Cli {
    /// IDL files to compile
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Product prefix for type and module names
    #[arg(long, env = "IFACEGEN_PREFIX")]
    prefix: Option<String>,

    /// Output directory (default: gen)
    #[arg(short, long, env = "IFACEGEN_OUTDIR")]
    outdir: Option<PathBuf>,

    /// TOML config file
    #[arg(long, env = "IFACEGEN_CONFIG")]
    config: Option<PathBuf>,

    /// Print resolved types and methods
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,

    /// Write IR to stdout instead of the output directory
    #[arg(long)]
    stdout: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.debug {
        tracing::Level::TRACE
    } else if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    // Logs go to stderr so --stdout output stays clean
    let builder = tracing_subscriber::fmt()
        .with_target(cli.debug)
        .with_writer(std::io::stderr);
    match EnvFilter::try_from_default_env() {
        Ok(filter) => builder.with_env_filter(filter).init(),
        Err(_) => builder.with_max_level(level).init(),
    }

    let file = match &cli.config {
        Some(path) => ConfigFile::from_file(path)?,
        None => ConfigFile::default(),
    };
    let config = GeneratorConfig {
        verbose: cli.verbose,
        to_stdout: cli.stdout,
        ..GeneratorConfig::layered(file, cli.prefix, cli.outdir)
    };

    let failures = run(&cli.inputs, &config);
    if failures > 0 {
        std::process::exit(1);
    }
    Ok(())
}
