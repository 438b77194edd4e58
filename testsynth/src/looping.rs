//! Full-scan orchestration: discover, extract, deduplicate, synthesize.

use std::fs;
use std::path::Path;

use anyhow::{Result, bail};
use tracing::{info, warn};

use crate::core::extract::extract_functions;
use crate::core::types::{FunctionOutcome, FunctionReport};
use crate::io::config::SynthConfig;
use crate::io::coverage::CoverageLedger;
use crate::io::harness::HarnessRunner;
use crate::io::scanner::scan_sources;
use crate::io::synthesizer::Synthesizer;
use crate::io::writer::TestWriter;
use crate::run::{SynthesisEvent, synthesize_function};

/// Per-function reports for one full scan, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub reports: Vec<FunctionReport>,
}

impl RunSummary {
    pub fn count(&self, outcome: FunctionOutcome) -> usize {
        self.reports
            .iter()
            .filter(|report| report.outcome == outcome)
            .count()
    }
}

/// Process every source function under `root` to a terminal state.
///
/// Fully sequential: one function reaches a terminal state before the next
/// begins. Unparseable files are skipped with a warning; covered functions
/// are skipped without invoking the synthesizer; a synthesis failure
/// abandons only that function's chain. Only environment-level errors
/// (unreadable root, write failures, an unspawnable harness) abort the scan.
pub fn run_scan<S: Synthesizer, H: HarnessRunner, F: FnMut(&SynthesisEvent)>(
    cfg: &SynthConfig,
    root: &Path,
    synthesizer: &S,
    harness: &H,
    mut on_event: F,
) -> Result<RunSummary> {
    if !root.is_dir() {
        bail!("target root {} does not exist", root.display());
    }
    let tests_dir = root.join(&cfg.tests_dir);
    let writer = TestWriter::new(&tests_dir);
    writer.ensure_layout()?;
    let ledger = CoverageLedger::new(&tests_dir);

    let files = scan_sources(root, &cfg.tests_dir)?;
    info!(files = files.len(), root = %root.display(), "scan started");

    let mut reports = Vec::new();
    for file in files {
        let text = match fs::read_to_string(&file.path) {
            Ok(text) => text,
            Err(err) => {
                warn!(file = %file.path.display(), %err, "skipping unreadable file");
                continue;
            }
        };
        let units = match extract_functions(&text, &file.module) {
            Ok(units) => units,
            Err(err) => {
                warn!(file = %file.path.display(), %err, "skipping unparseable file");
                continue;
            }
        };

        for unit in units {
            if ledger.has_test(&unit.name) {
                on_event(&SynthesisEvent::Skipped {
                    name: unit.name.clone(),
                });
                reports.push(FunctionReport {
                    name: unit.name,
                    module: file.module.clone(),
                    outcome: FunctionOutcome::Skipped,
                    attempts: 0,
                });
                continue;
            }
            let report = synthesize_function(
                &unit,
                synthesizer,
                &writer,
                harness,
                cfg.max_attempts,
                &mut on_event,
            )?;
            reports.push(report);
        }
    }

    info!(functions = reports.len(), "scan finished");
    Ok(RunSummary { reports })
}
