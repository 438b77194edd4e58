//! Per-function synthesis state machine.
//!
//! One function moves through `Pending -> Synthesizing -> Writing ->
//! Validating` until it reaches a terminal state: `Passed`, `Exhausted`, or
//! an aborted chain after a synthesis failure. Retries are blind re-samples:
//! the failing harness log is never fed back into the next prompt.

use anyhow::Result;
use tracing::{debug, warn};

use crate::core::types::{FunctionOutcome, FunctionReport, SourceUnit, TestArtifact};
use crate::io::harness::HarnessRunner;
use crate::io::synthesizer::{SynthesisError, Synthesizer};
use crate::io::writer::TestWriter;

/// Progress notification emitted while a function is being processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthesisEvent {
    /// A generated test already existed; no synthesis call was made.
    Skipped { name: String },
    /// The harness validated the artifact written on this attempt.
    AttemptPassed { name: String, attempt: u32 },
    /// The harness rejected this attempt; another attempt follows.
    AttemptFailed { name: String, attempt: u32 },
    /// The generative service failed; the chain is abandoned.
    SynthesisFailed { name: String, message: String },
    /// Every attempt failed validation; the last artifact stays on disk.
    Exhausted { name: String, attempts: u32 },
}

/// Drive one function to a terminal state.
///
/// Performs at most `max_attempts` synthesize -> write -> validate cycles and
/// stops on the first attempt that validates. A [`SynthesisError`] aborts the
/// chain with `SynthesisFailed`; any other error (write failures, a harness
/// that cannot be spawned) is an environment problem and propagates to the
/// caller as fatal.
pub fn synthesize_function<S: Synthesizer, H: HarnessRunner>(
    unit: &SourceUnit,
    synthesizer: &S,
    writer: &TestWriter,
    harness: &H,
    max_attempts: u32,
    on_event: &mut dyn FnMut(&SynthesisEvent),
) -> Result<FunctionReport> {
    for attempt in 1..=max_attempts {
        let content = match synthesizer.synthesize(unit) {
            Ok(content) => content,
            Err(err) => {
                let Some(synth) = err.downcast_ref::<SynthesisError>() else {
                    return Err(err);
                };
                warn!(function = %unit.name, attempt, err = %synth, "synthesis aborted");
                on_event(&SynthesisEvent::SynthesisFailed {
                    name: unit.name.clone(),
                    message: synth.to_string(),
                });
                return Ok(FunctionReport {
                    name: unit.name.clone(),
                    module: unit.origin_module.clone(),
                    outcome: FunctionOutcome::SynthesisFailed,
                    attempts: attempt - 1,
                });
            }
        };

        let artifact = TestArtifact {
            target_name: unit.name.clone(),
            file_path: writer.write(&unit.name, &content)?,
            content,
            attempt,
        };
        debug!(
            function = %unit.name,
            attempt,
            path = %artifact.file_path.display(),
            "validating attempt"
        );

        // The harness runs the whole tests directory, re-validating every
        // previously generated test along with this one.
        let result = harness.run()?;
        if result.success {
            on_event(&SynthesisEvent::AttemptPassed {
                name: unit.name.clone(),
                attempt,
            });
            return Ok(FunctionReport {
                name: unit.name.clone(),
                module: unit.origin_module.clone(),
                outcome: FunctionOutcome::Passed,
                attempts: attempt,
            });
        }

        debug!(
            function = %unit.name,
            attempt,
            log_tail = %tail(&result.log, 400),
            "attempt failed validation"
        );
        if attempt < max_attempts {
            on_event(&SynthesisEvent::AttemptFailed {
                name: unit.name.clone(),
                attempt,
            });
        }
    }

    on_event(&SynthesisEvent::Exhausted {
        name: unit.name.clone(),
        attempts: max_attempts,
    });
    Ok(FunctionReport {
        name: unit.name.clone(),
        module: unit.origin_module.clone(),
        outcome: FunctionOutcome::Exhausted,
        attempts: max_attempts,
    })
}

fn tail(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let start = text.len() - max_bytes;
    // Step forward to a char boundary.
    let mut idx = start;
    while !text.is_char_boundary(idx) {
        idx += 1;
    }
    &text[idx..]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptedHarness, ScriptedSynthesizer, TestWorkspace};

    fn unit() -> SourceUnit {
        SourceUnit {
            name: "add".to_string(),
            source_text: "def add(a, b):\n    return a + b".to_string(),
            origin_module: "mathmod".to_string(),
        }
    }

    /// Verifies the loop stops on the first validating attempt: if attempt 2
    /// of 3 passes, no attempt 3 occurs.
    #[test]
    fn stops_on_first_passing_attempt() {
        let workspace = TestWorkspace::new().expect("workspace");
        let writer = TestWriter::new(workspace.tests_dir());
        let synthesizer = ScriptedSynthesizer::always_ok("assert True\n");
        let harness = ScriptedHarness::new(vec![false, true, true]);
        let mut events = Vec::new();

        let report = synthesize_function(
            &unit(),
            &synthesizer,
            &writer,
            &harness,
            3,
            &mut |event| events.push(event.clone()),
        )
        .expect("run");

        assert_eq!(report.outcome, FunctionOutcome::Passed);
        assert_eq!(report.attempts, 2);
        assert_eq!(synthesizer.calls(), 2);
        assert_eq!(harness.runs(), 2);
        assert_eq!(
            events,
            vec![
                SynthesisEvent::AttemptFailed {
                    name: "add".to_string(),
                    attempt: 1
                },
                SynthesisEvent::AttemptPassed {
                    name: "add".to_string(),
                    attempt: 2
                },
            ]
        );
    }

    /// Verifies exhaustion after max attempts leaves the last artifact on disk.
    #[test]
    fn exhausts_after_max_attempts() {
        let workspace = TestWorkspace::new().expect("workspace");
        let writer = TestWriter::new(workspace.tests_dir());
        let synthesizer = ScriptedSynthesizer::new(vec![
            Ok("attempt one\n".to_string()),
            Ok("attempt two\n".to_string()),
            Ok("attempt three\n".to_string()),
        ]);
        let harness = ScriptedHarness::new(vec![false, false, false]);
        let mut events = Vec::new();

        let report = synthesize_function(
            &unit(),
            &synthesizer,
            &writer,
            &harness,
            3,
            &mut |event| events.push(event.clone()),
        )
        .expect("run");

        assert_eq!(report.outcome, FunctionOutcome::Exhausted);
        assert_eq!(report.attempts, 3);
        assert_eq!(synthesizer.calls(), 3);
        let content = std::fs::read_to_string(workspace.tests_dir().join("test_add.py"))
            .expect("read artifact");
        assert_eq!(content, "attempt three\n");
        assert_eq!(
            events.last(),
            Some(&SynthesisEvent::Exhausted {
                name: "add".to_string(),
                attempts: 3
            })
        );
    }

    /// Verifies a synthesis failure abandons the chain without consuming
    /// further attempts and without an error.
    #[test]
    fn synthesis_failure_abandons_chain() {
        let workspace = TestWorkspace::new().expect("workspace");
        let writer = TestWriter::new(workspace.tests_dir());
        let synthesizer =
            ScriptedSynthesizer::new(vec![Err("service unreachable".to_string())]);
        let harness = ScriptedHarness::new(Vec::new());
        let mut events = Vec::new();

        let report = synthesize_function(
            &unit(),
            &synthesizer,
            &writer,
            &harness,
            3,
            &mut |event| events.push(event.clone()),
        )
        .expect("run");

        assert_eq!(report.outcome, FunctionOutcome::SynthesisFailed);
        assert_eq!(report.attempts, 0);
        assert_eq!(harness.runs(), 0);
        assert!(!workspace.tests_dir().join("test_add.py").exists());
    }
}
