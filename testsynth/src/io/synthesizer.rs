//! Generative-service client for test synthesis.
//!
//! The [`Synthesizer`] trait decouples the loop from the model backend. The
//! production implementation calls the Gemini `generateContent` endpoint
//! with a blocking HTTP client; it is constructed explicitly from config and
//! passed in as a collaborator, never held as process-wide state. No retry
//! happens at this layer; retries belong to the synthesis loop.

use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::core::types::SourceUnit;
use crate::io::config::SynthConfig;
use crate::io::prompt::PromptBuilder;

/// Generative service unreachable or returned an unusable response. The
/// function's attempt chain aborts; the scan continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisError {
    pub message: String,
}

impl SynthesisError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for SynthesisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for SynthesisError {}

/// Abstraction over generative backends: one prompt in, one candidate test
/// file out. The call is synchronous and may block on network I/O.
pub trait Synthesizer {
    fn synthesize(&self, unit: &SourceUnit) -> Result<String>;
}

/// Synthesizer backed by the Gemini REST API.
pub struct GeminiSynthesizer {
    client: reqwest::blocking::Client,
    endpoint: String,
    model: String,
    api_key: String,
    temperature: f64,
    prompts: PromptBuilder,
}

impl GeminiSynthesizer {
    /// Build a client from config, reading the credential from the
    /// environment variable the config names.
    pub fn from_config(cfg: &SynthConfig) -> Result<Self> {
        let api_key = std::env::var(&cfg.api_key_env)
            .with_context(|| format!("read credential from ${}", cfg.api_key_env))?;
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(cfg.synthesis_timeout_secs))
            .build()
            .context("build http client")?;
        Ok(Self {
            client,
            endpoint: cfg.endpoint.clone(),
            model: cfg.model.clone(),
            api_key,
            temperature: cfg.temperature,
            prompts: PromptBuilder::new(),
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f64,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl Synthesizer for GeminiSynthesizer {
    #[instrument(skip_all, fields(function = %unit.name, model = %self.model))]
    fn synthesize(&self, unit: &SourceUnit) -> Result<String> {
        let prompt = self.prompts.build(unit)?;
        let url = format!(
            "{}/models/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        );
        let body = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: &prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
            },
        };

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .map_err(|err| SynthesisError::new(format!("generative service unreachable: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SynthesisError::new(format!(
                "generative service returned {status}"
            ))
            .into());
        }

        let parsed: GenerateResponse = response
            .json()
            .map_err(|err| SynthesisError::new(format!("unparseable response: {err}")))?;
        let raw: String = parsed
            .candidates
            .first()
            .map(|candidate| {
                candidate
                    .content
                    .parts
                    .iter()
                    .map(|part| part.text.as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        let text = strip_code_fence(&raw);
        if text.trim().is_empty() {
            return Err(SynthesisError::new("empty response from generative service").into());
        }
        debug!(bytes = text.len(), "synthesized candidate test");
        Ok(text)
    }
}

/// Strip a wrapping markdown code fence, if present.
///
/// The consumer expects raw executable source; models frequently wrap their
/// answer in ```` ```python ```` fences despite instructions.
pub fn strip_code_fence(raw: &str) -> String {
    let trimmed = raw.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }
    let mut lines: Vec<&str> = trimmed.lines().collect();
    lines.remove(0);
    if lines.last().is_some_and(|line| line.trim() == "```") {
        lines.pop();
    }
    lines.join("\n")
}
