//! Test-only scripted collaborators and workspace fixtures.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};

use crate::core::types::{RunResult, SourceUnit};
use crate::io::config::SynthConfig;
use crate::io::harness::HarnessRunner;
use crate::io::synthesizer::{SynthesisError, Synthesizer};

/// Synthesizer returning a scripted queue of responses. `Err` entries become
/// downcastable [`SynthesisError`]s, matching the production failure mode.
pub struct ScriptedSynthesizer {
    responses: RefCell<VecDeque<Result<String, String>>>,
    fallback: Option<String>,
    calls: Cell<usize>,
}

impl ScriptedSynthesizer {
    pub fn new(responses: Vec<Result<String, String>>) -> Self {
        Self {
            responses: RefCell::new(responses.into_iter().collect()),
            fallback: None,
            calls: Cell::new(0),
        }
    }

    /// Synthesizer that answers every call with the same content.
    pub fn always_ok(content: &str) -> Self {
        Self {
            responses: RefCell::new(VecDeque::new()),
            fallback: Some(content.to_string()),
            calls: Cell::new(0),
        }
    }

    /// Number of synthesis invocations so far.
    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl Synthesizer for ScriptedSynthesizer {
    fn synthesize(&self, _unit: &SourceUnit) -> Result<String> {
        self.calls.set(self.calls.get() + 1);
        match self.responses.borrow_mut().pop_front() {
            Some(Ok(content)) => Ok(content),
            Some(Err(message)) => Err(SynthesisError::new(message).into()),
            None => match &self.fallback {
                Some(content) => Ok(content.clone()),
                None => Err(anyhow!("scripted synthesizer ran out of responses")),
            },
        }
    }
}

/// Harness returning a scripted queue of pass/fail results. An empty queue
/// fails, so a test that over-runs its script surfaces loudly.
pub struct ScriptedHarness {
    results: RefCell<VecDeque<bool>>,
    runs: Cell<usize>,
}

impl ScriptedHarness {
    pub fn new(results: Vec<bool>) -> Self {
        Self {
            results: RefCell::new(results.into_iter().collect()),
            runs: Cell::new(0),
        }
    }

    /// Number of harness invocations so far.
    pub fn runs(&self) -> usize {
        self.runs.get()
    }
}

impl HarnessRunner for ScriptedHarness {
    fn run(&self) -> Result<RunResult> {
        self.runs.set(self.runs.get() + 1);
        let success = self.results.borrow_mut().pop_front().unwrap_or(false);
        Ok(RunResult {
            success,
            log: if success {
                "1 passed".to_string()
            } else {
                "1 failed".to_string()
            },
        })
    }
}

/// Temporary target repository for loop tests.
pub struct TestWorkspace {
    temp: tempfile::TempDir,
}

impl TestWorkspace {
    pub fn new() -> Result<Self> {
        Ok(Self {
            temp: tempfile::tempdir().context("create temp workspace")?,
        })
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    pub fn tests_dir(&self) -> PathBuf {
        self.root().join("tests")
    }

    /// Config pointing at this workspace with default settings.
    pub fn config(&self) -> SynthConfig {
        SynthConfig {
            root: self.root().display().to_string(),
            ..SynthConfig::default()
        }
    }

    /// Write a source module at a root-relative path.
    pub fn write_module(&self, rel: &str, contents: &str) -> Result<PathBuf> {
        let path = self.root().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
        fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
        Ok(path)
    }

    /// Write a pre-existing generated test file.
    pub fn write_test(&self, file_name: &str, contents: &str) -> Result<PathBuf> {
        let dir = self.tests_dir();
        fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
        let path = dir.join(file_name);
        fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
        Ok(path)
    }
}
