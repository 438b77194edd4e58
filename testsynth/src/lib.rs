//! Automatic pytest synthesis for Python repositories via a generative model.
//!
//! The crate walks a target repository, extracts top-level Python functions,
//! and drives a bounded synthesize -> write -> execute -> retry loop for each
//! function that does not yet have a generated test. The architecture
//! enforces a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (function extraction, shared
//!   types). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting collaborators (config, source scanning,
//!   coverage lookups, the model client, the test writer, the harness).
//!
//! Orchestration modules ([`run`], [`looping`]) coordinate core logic with
//! I/O to implement the CLI commands.

pub mod core;
pub mod io;
pub mod logging;
pub mod looping;
pub mod run;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
