//! Evaluate a transmission description from the command line.
//!
//! # Usage
//! ```bash
//! epicycle simpson.json --pretty
//! RUST_LOG=epicycle_kernel=debug epicycle simpson.json --locale pt
//! cat simpson.json | epicycle -
//! ```

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use epicycle_bridge::{Envelope, Locale, Request, Response, dispatch};
use epicycle_kernel::EvaluationConfig;
use epicycle_types::Transmission;

#[derive(Parser)]
#[command(name = "epicycle")]
#[command(about = "Planetary gear train kinematics, assembly and phasing")]
#[command(version)]
struct Cli {
    /// Transmission JSON file, or `-` for stdin
    file: PathBuf,

    /// Language for assembly messages
    #[arg(long, value_enum, default_value = "en")]
    locale: LocaleArg,

    /// Evaluation settings JSON (solver, layout, phasing)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Pretty-print the output
    #[arg(long)]
    pretty: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LocaleArg {
    En,
    Pt,
}

impl From<LocaleArg> for Locale {
    fn from(arg: LocaleArg) -> Self {
        match arg {
            LocaleArg::En => Locale::En,
            LocaleArg::Pt => Locale::Pt,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let output = run(&cli)?;
    println!("{output}");
    Ok(())
}

fn run(cli: &Cli) -> Result<String> {
    let transmission: Transmission = serde_json::from_str(&read_input(&cli.file)?)
        .with_context(|| format!("invalid transmission in {}", cli.file.display()))?;
    let config: EvaluationConfig = match &cli.config {
        Some(path) => serde_json::from_str(&read_input(path)?)
            .with_context(|| format!("invalid config in {}", path.display()))?,
        None => EvaluationConfig::default(),
    };
    info!(stages = transmission.stages.len(), "evaluating");

    let envelope = Envelope::new(Request::Evaluate { transmission, config }).with_locale(cli.locale.into());
    let response = dispatch(envelope);
    if let Response::Error { message } = &response {
        bail!("evaluation failed: {message}");
    }

    let json = if cli.pretty {
        serde_json::to_string_pretty(&response)?
    } else {
        serde_json::to_string(&response)?
    };
    Ok(json)
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer).context("failed to read stdin")?;
        return Ok(buffer);
    }
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}
