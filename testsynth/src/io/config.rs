//! Tool configuration stored in `testsynth.toml`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Synthesis-loop configuration (TOML).
///
/// This file is intended to be edited by humans. Missing fields default to
/// the observed baseline values. The generative-service credential is never
/// stored here; `api_key_env` names the environment variable that holds it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SynthConfig {
    /// Target repository checkout to scan for source functions.
    pub root: String,

    /// Directory (relative to `root`) that holds generated tests.
    pub tests_dir: String,

    /// Generative model identifier.
    pub model: String,

    /// Base URL of the generative service.
    pub endpoint: String,

    /// Environment variable holding the service credential.
    pub api_key_env: String,

    /// Sampling temperature; 0.0 keeps synthesis as deterministic as the
    /// service allows.
    pub temperature: f64,

    /// Synthesis attempts per function before giving up.
    pub max_attempts: u32,

    /// Timeout for one generative-service call.
    pub synthesis_timeout_secs: u64,

    /// Timeout for one harness invocation.
    pub harness_timeout_secs: u64,

    /// Truncate captured harness output beyond this many bytes.
    pub harness_output_limit_bytes: usize,

    pub harness: HarnessConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HarnessConfig {
    /// Command executed over the tests directory (e.g. `["pytest","-q"]`).
    pub command: Vec<String>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            command: vec!["pytest".to_string(), "-q".to_string()],
        }
    }
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            root: "repo".to_string(),
            tests_dir: "tests".to_string(),
            model: "gemini-pro".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            temperature: 0.0,
            max_attempts: 3,
            synthesis_timeout_secs: 120,
            harness_timeout_secs: 600,
            harness_output_limit_bytes: 100_000,
            harness: HarnessConfig::default(),
        }
    }
}

impl SynthConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(anyhow!("max_attempts must be >= 1"));
        }
        if self.synthesis_timeout_secs == 0 {
            return Err(anyhow!("synthesis_timeout_secs must be > 0"));
        }
        if self.harness_timeout_secs == 0 {
            return Err(anyhow!("harness_timeout_secs must be > 0"));
        }
        if self.harness_output_limit_bytes == 0 {
            return Err(anyhow!("harness_output_limit_bytes must be > 0"));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(anyhow!("temperature must be within [0, 2]"));
        }
        if self.harness.command.is_empty() || self.harness.command[0].trim().is_empty() {
            return Err(anyhow!("harness.command must be a non-empty array"));
        }
        if self.tests_dir.trim().is_empty() {
            return Err(anyhow!("tests_dir must be non-empty"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `SynthConfig::default()`.
pub fn load_config(path: &Path) -> Result<SynthConfig> {
    if !path.exists() {
        let cfg = SynthConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: SynthConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}
