//! Shared deterministic types for the synthesis core.
//!
//! These types define stable contracts between components. They should not
//! depend on external state and must remain deterministic across runs.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One extracted top-level function with its verbatim source text.
///
/// `source_text` is the exact span from the input file, including decorators
/// and signature. The synthesizer depends on receiving faithful source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    /// Function name as written in the `def` header.
    pub name: String,
    /// Verbatim source span of the function.
    pub source_text: String,
    /// Dotted module path of the originating file (e.g. `pkg.util`).
    pub origin_module: String,
}

/// A generated test file tied to one target function.
///
/// Owned exclusively by the synthesis loop; each retry fully replaces the
/// previous content at the same path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestArtifact {
    pub target_name: String,
    pub file_path: PathBuf,
    pub content: String,
    /// 1-indexed attempt number that produced this artifact.
    pub attempt: u32,
}

/// Result of one harness invocation over the whole tests directory.
///
/// Ephemeral: produced per invocation and consumed immediately by the loop,
/// never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    /// True iff the harness exited with status zero.
    pub success: bool,
    /// Combined stdout and stderr of the harness process.
    pub log: String,
}

/// Terminal outcome of one function's synthesis chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionOutcome {
    /// A generated test already existed; the synthesizer was never invoked.
    Skipped,
    /// An attempt validated successfully.
    Passed,
    /// All attempts failed validation; the last failing artifact remains on
    /// disk and will satisfy the coverage predicate on subsequent runs.
    Exhausted,
    /// The generative service was unreachable or returned an empty response;
    /// the chain was abandoned without further attempts.
    SynthesisFailed,
}

/// Per-function status report returned by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionReport {
    pub name: String,
    pub module: String,
    pub outcome: FunctionOutcome,
    /// Completed synthesize -> write -> validate attempts. Zero for skipped
    /// functions and for chains aborted by a synthesis failure before any
    /// artifact was validated.
    pub attempts: u32,
}
