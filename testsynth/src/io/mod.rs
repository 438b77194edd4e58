//! Side-effecting collaborators for the synthesis loop.

pub mod config;
pub mod coverage;
pub mod harness;
pub mod process;
pub mod prompt;
pub mod scanner;
pub mod synthesizer;
pub mod writer;
