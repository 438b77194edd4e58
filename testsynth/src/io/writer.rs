//! Deterministic persistence of synthesized test artifacts.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::io::coverage::test_file_name;

/// Writes generated tests to `<tests_dir>/test_<name>.py`, always fully
/// replacing prior content. Write failures indicate an unrecoverable
/// environment problem and are fatal to the run.
#[derive(Debug, Clone)]
pub struct TestWriter {
    tests_dir: PathBuf,
}

impl TestWriter {
    pub fn new(tests_dir: impl Into<PathBuf>) -> Self {
        Self {
            tests_dir: tests_dir.into(),
        }
    }

    pub fn tests_dir(&self) -> &Path {
        &self.tests_dir
    }

    /// Create the tests directory and its `__init__.py` package marker so
    /// the harness tool recognizes it as a test package. Idempotent.
    pub fn ensure_layout(&self) -> Result<()> {
        fs::create_dir_all(&self.tests_dir)
            .with_context(|| format!("create tests dir {}", self.tests_dir.display()))?;
        let marker = self.tests_dir.join("__init__.py");
        if !marker.exists() {
            fs::write(&marker, "")
                .with_context(|| format!("write package marker {}", marker.display()))?;
        }
        Ok(())
    }

    /// Persist `content` for `name`, overwriting any prior artifact.
    ///
    /// The write goes through a temp file and rename, so the target path
    /// either holds the complete new content or is untouched.
    pub fn write(&self, name: &str, content: &str) -> Result<PathBuf> {
        self.ensure_layout()?;
        let path = self.tests_dir.join(test_file_name(name));
        let tmp = path.with_extension("py.tmp");
        fs::write(&tmp, content).with_context(|| format!("write temp test {}", tmp.display()))?;
        fs::rename(&tmp, &path)
            .with_context(|| format!("replace test {}", path.display()))?;
        debug!(path = %path.display(), bytes = content.len(), "wrote test artifact");
        Ok(path)
    }
}
