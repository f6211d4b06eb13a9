// src/report/smoke.rs

//! Smoke test: run an installed binary on the embedded sample
//!
//! The loader is fed the sample shapefile and its stdout must mention
//! every expected substring. A loader that exits non-zero fails the test;
//! it is not an error, because "the package does not work" is exactly what
//! the smoke test reports.

use crate::error::Result;
use crate::kitchen::{ExternalTool, Invocation};
use crate::report::sample::ShapefileSample;
use std::fmt;
use std::path::Path;
use tracing::{debug, info, warn};

/// Pass or fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Pass,
    Fail,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass => f.write_str("PASS"),
            Self::Fail => f.write_str("FAIL"),
        }
    }
}

/// Result of a smoke test
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestResult {
    pub outcome: Outcome,
    /// Expectations found in stdout
    pub matched: Vec<String>,
    /// Expectations not found (all of them if the binary failed)
    pub missing: Vec<String>,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl TestResult {
    pub fn passed(&self) -> bool {
        self.outcome == Outcome::Pass
    }
}

/// Run `binary <sample>.shp` and check its output
pub fn run_smoke_test(
    tool: &dyn ExternalTool,
    binary: &Path,
    sample: &ShapefileSample,
    expectations: &[String],
) -> Result<TestResult> {
    let dir = tempfile::Builder::new().prefix("saucier-test-").tempdir()?;
    let shp = sample.write_to(dir.path(), "brew")?;

    let invocation = Invocation::new(binary.to_string_lossy(), dir.path())
        .arg(shp.to_string_lossy());
    info!("Smoke test: {}", invocation.command_line());

    let exit = tool.invoke(&invocation)?;
    debug!("Smoke test exit code: {:?}", exit.code);

    let (matched, missing): (Vec<String>, Vec<String>) = if exit.success() {
        expectations
            .iter()
            .cloned()
            .partition(|e| exit.stdout.contains(e.as_str()))
    } else {
        (Vec::new(), expectations.to_vec())
    };

    let outcome = if exit.success() && missing.is_empty() {
        Outcome::Pass
    } else {
        warn!(
            "Smoke test failed (exit {:?}, missing: {})",
            exit.code,
            missing.join(", ")
        );
        Outcome::Fail
    };

    Ok(TestResult {
        outcome,
        matched,
        missing,
        exit_code: exit.code,
        stdout: exit.stdout,
        stderr: exit.stderr,
    })
}
