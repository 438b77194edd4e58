//! Prompt construction for the test synthesizer.
//!
//! One fixed instructional template, one function per prompt. The function
//! source is embedded verbatim; the origin module is included so the model
//! can construct a correct import.

use anyhow::{Context, Result};
use minijinja::{Environment, context};

use crate::core::types::SourceUnit;

const SYNTHESIZER_TEMPLATE: &str = include_str!("prompts/synthesizer.md");

/// Template engine wrapper around minijinja.
pub struct PromptBuilder {
    env: Environment<'static>,
}

impl PromptBuilder {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.add_template("synthesizer", SYNTHESIZER_TEMPLATE)
            .expect("synthesizer template should be valid");
        Self { env }
    }

    /// Render the synthesis prompt for one function.
    pub fn build(&self, unit: &SourceUnit) -> Result<String> {
        let template = self
            .env
            .get_template("synthesizer")
            .context("load synthesizer template")?;
        let rendered = template
            .render(context! {
                name => unit.name.as_str(),
                module => unit.origin_module.as_str(),
                source => unit.source_text.as_str(),
            })
            .context("render synthesizer template")?;
        Ok(rendered)
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new()
    }
}
