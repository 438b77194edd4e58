//! Coverage ledger over the generated tests directory.
//!
//! The predicate is the canonical exact-match policy: a function is covered
//! iff a file named exactly `test_<name>.py` exists. A substring policy
//! (any filename containing the name) was observed in earlier variants of
//! this tool; it produces accidental collisions (`add` matched by
//! `test_add_all.py`) and is deliberately not implemented.

use std::path::{Path, PathBuf};

/// Coverage classification for one function name.
///
/// File presence alone cannot distinguish a passing test from one left
/// behind by an exhausted attempt chain; the per-run [`FunctionReport`]
/// carries that distinction (passed / exhausted / skipped).
///
/// [`FunctionReport`]: crate::core::types::FunctionReport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverageState {
    /// No generated test file exists for this name.
    Uncovered,
    /// A file named exactly `test_<name>.py` exists.
    Covered,
}

/// Deterministic file name for a function's generated test.
///
/// The writer and the ledger must agree on this naming; both call through
/// here.
pub fn test_file_name(name: &str) -> String {
    format!("test_{name}.py")
}

/// Recomputes coverage from the filesystem on every lookup; nothing is
/// cached across calls, so a run never observes stale state.
#[derive(Debug, Clone)]
pub struct CoverageLedger {
    tests_dir: PathBuf,
}

impl CoverageLedger {
    pub fn new(tests_dir: impl Into<PathBuf>) -> Self {
        Self {
            tests_dir: tests_dir.into(),
        }
    }

    /// Path the generated test for `name` would occupy.
    pub fn test_path(&self, name: &str) -> PathBuf {
        self.tests_dir.join(test_file_name(name))
    }

    pub fn state(&self, name: &str) -> CoverageState {
        if self.test_path(name).is_file() {
            CoverageState::Covered
        } else {
            CoverageState::Uncovered
        }
    }

    /// Exact-match predicate. Unaffected by files whose names merely contain
    /// `name` as a substring.
    pub fn has_test(&self, name: &str) -> bool {
        self.state(name) == CoverageState::Covered
    }
}
