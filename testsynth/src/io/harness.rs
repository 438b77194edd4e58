//! Test harness adapter for the external execution tool.
//!
//! The [`HarnessRunner`] trait decouples the synthesis loop from the actual
//! test tool (pytest by default). Tests use scripted runners that return
//! predetermined results without spawning processes.

use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, instrument};

use crate::core::types::RunResult;
use crate::io::config::SynthConfig;
use crate::io::process::run_command_with_timeout;

/// Abstraction over test-execution backends.
///
/// Every invocation runs the whole tests directory, so a newly written test
/// cannot silently break an earlier one without detection.
pub trait HarnessRunner {
    fn run(&self) -> Result<RunResult>;
}

/// Harness that spawns the configured command (default `pytest -q`) in the
/// target root.
pub struct PytestHarness {
    root: PathBuf,
    command: Vec<String>,
    timeout: Duration,
    output_limit_bytes: usize,
}

impl PytestHarness {
    pub fn new(root: impl Into<PathBuf>, cfg: &SynthConfig) -> Self {
        Self {
            root: root.into(),
            command: cfg.harness.command.clone(),
            timeout: Duration::from_secs(cfg.harness_timeout_secs),
            output_limit_bytes: cfg.harness_output_limit_bytes,
        }
    }
}

impl HarnessRunner for PytestHarness {
    #[instrument(skip_all, fields(root = %self.root.display()))]
    fn run(&self) -> Result<RunResult> {
        let (program, args) = self
            .command
            .split_first()
            .ok_or_else(|| anyhow!("empty harness command"))?;

        let mut cmd = Command::new(program);
        cmd.args(args).current_dir(&self.root);
        cmd.env("PYTHONPATH", extended_python_path(&self.root)?);

        let output = run_command_with_timeout(cmd, self.timeout, self.output_limit_bytes)
            .with_context(|| format!("run harness `{program}`"))?;

        let mut log = String::from_utf8_lossy(&output.stdout).into_owned();
        log.push_str(&String::from_utf8_lossy(&output.stderr));
        if output.truncated > 0 {
            log.push_str(&format!("\n[harness output truncated {} bytes]\n", output.truncated));
        }
        if output.timed_out {
            log.push_str("\n[harness timed out]\n");
            return Ok(RunResult {
                success: false,
                log,
            });
        }

        debug!(exit_code = ?output.status.code(), "harness finished");
        Ok(RunResult {
            success: output.status.success(),
            log,
        })
    }
}

/// Prepend the target root to `PYTHONPATH` so generated tests can import the
/// scanned modules.
fn extended_python_path(root: &Path) -> Result<std::ffi::OsString> {
    let mut paths = vec![root.to_path_buf()];
    if let Some(existing) = env::var_os("PYTHONPATH") {
        paths.extend(env::split_paths(&existing));
    }
    env::join_paths(paths).context("join PYTHONPATH")
}
