//! CLI for the pytest synthesis loop.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};

use testsynth::core::extract::extract_functions;
use testsynth::core::types::FunctionOutcome;
use testsynth::io::config::{SynthConfig, load_config};
use testsynth::io::coverage::{CoverageLedger, CoverageState};
use testsynth::io::harness::PytestHarness;
use testsynth::io::scanner::scan_sources;
use testsynth::io::synthesizer::GeminiSynthesizer;
use testsynth::logging;
use testsynth::looping::{RunSummary, run_scan};
use testsynth::run::SynthesisEvent;

#[derive(Parser)]
#[command(
    name = "testsynth",
    version,
    about = "Synthesizes pytest unit tests for Python functions with a generative model"
)]
struct Cli {
    /// Target repository root (overrides the configured root).
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Path to the config file.
    #[arg(long, default_value = "testsynth.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Synthesize and validate tests for every uncovered function.
    Run,
    /// List discovered functions and their coverage state without synthesizing.
    Scan,
}

fn main() {
    logging::init();
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let cfg = load_config(&cli.config)?;
    let root = cli.root.unwrap_or_else(|| PathBuf::from(&cfg.root));
    match cli.command {
        Command::Run => cmd_run(&cfg, &root),
        Command::Scan => cmd_scan(&cfg, &root),
    }
}

fn cmd_run(cfg: &SynthConfig, root: &Path) -> Result<()> {
    let synthesizer = GeminiSynthesizer::from_config(cfg)?;
    let harness = PytestHarness::new(root, cfg);
    let summary = run_scan(cfg, root, &synthesizer, &harness, print_event)?;
    print_summary(&summary);
    // Exhausted functions do not fail the process; only environment-level
    // errors reach main as Err.
    Ok(())
}

fn cmd_scan(cfg: &SynthConfig, root: &Path) -> Result<()> {
    let ledger = CoverageLedger::new(root.join(&cfg.tests_dir));
    for file in scan_sources(root, &cfg.tests_dir)? {
        let text = match std::fs::read_to_string(&file.path) {
            Ok(text) => text,
            Err(err) => {
                eprintln!("skip {}: {err}", file.path.display());
                continue;
            }
        };
        let units = match extract_functions(&text, &file.module) {
            Ok(units) => units,
            Err(err) => {
                eprintln!("skip {}: {err}", file.path.display());
                continue;
            }
        };
        for unit in units {
            let state = match ledger.state(&unit.name) {
                CoverageState::Covered => "covered",
                CoverageState::Uncovered => "uncovered",
            };
            println!("{state} {}.{}", file.module, unit.name);
        }
    }
    Ok(())
}

fn print_event(event: &SynthesisEvent) {
    match event {
        SynthesisEvent::Skipped { name } => {
            println!("skip {name}: test already present");
        }
        SynthesisEvent::AttemptPassed { name, attempt } => {
            println!("pass {name}: attempt {attempt}");
        }
        SynthesisEvent::AttemptFailed { name, attempt } => {
            println!("fail {name}: attempt {attempt}, retrying");
        }
        SynthesisEvent::SynthesisFailed { name, message } => {
            println!("abort {name}: {message}");
        }
        SynthesisEvent::Exhausted { name, attempts } => {
            println!("exhausted {name}: all {attempts} attempts failed");
        }
    }
}

fn print_summary(summary: &RunSummary) {
    println!(
        "summary: functions={} passed={} exhausted={} synthesis_failed={} skipped={}",
        summary.reports.len(),
        summary.count(FunctionOutcome::Passed),
        summary.count(FunctionOutcome::Exhausted),
        summary.count(FunctionOutcome::SynthesisFailed),
        summary.count(FunctionOutcome::Skipped),
    );
}
