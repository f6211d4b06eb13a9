// src/error.rs

//! Error types for saucier

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while planning, cooking and promoting a formula
#[derive(Error, Debug)]
pub enum Error {
    /// An option name that the formula never declared
    #[error("unknown option: {0}")]
    UnknownOption(String),

    /// A dependency predicate referenced an undeclared option
    ///
    /// This is a bug in the formula, never retried.
    #[error("dependency '{dependency}' has an invalid predicate: unknown option '{option}'")]
    DependencyPredicate { dependency: String, option: String },

    /// An active option needs another option that is inactive
    #[error("option '{option}' requires option '{requires}' to be enabled")]
    OptionRequirement { option: String, requires: String },

    /// The prefix registry has no installed prefix for a dependency
    #[error("dependency not found: {0}")]
    DependencyNotFound(String),

    /// An external tool exited non-zero
    #[error("{stage} failed with exit code {}{}", format_code(.exit_code), format_stderr(.stderr))]
    ExternalToolFailure {
        stage: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    /// An external tool ran past the configured per-stage timeout
    #[error("{stage} timed out after {seconds} seconds")]
    ToolTimeout { stage: String, seconds: u64 },

    /// Two promotion rules (or two promoted files) target the same path
    #[error("promotion destination collision: {0}")]
    DestinationCollision(String),

    /// A mandatory promotion source matched nothing in the stage
    #[error("missing staged artifact: {pattern} (for {destination})")]
    MissingStagedArtifact { pattern: String, destination: String },

    /// A documentation step failed under the fatal doc policy
    #[error("documentation step '{step}' failed: {cause}")]
    DocGeneration { step: String, cause: String },

    /// A failure with no stage of its own, tagged with the stage it hit
    ///
    /// Spawn failures and I/O errors during a phase end up here.
    #[error("{stage} failed: {source}")]
    StageFailed {
        stage: String,
        #[source]
        source: Box<Error>,
    },

    /// Formula or config parsing failed
    #[error("parse error: {0}")]
    ParseError(String),

    /// A path did not exist where one was expected
    #[error("not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Name of the pipeline stage this error belongs to, if any
    pub fn stage(&self) -> Option<&str> {
        match self {
            Self::ExternalToolFailure { stage, .. }
            | Self::ToolTimeout { stage, .. }
            | Self::StageFailed { stage, .. } => {
                Some(stage.as_str())
            }
            Self::DocGeneration { .. } => Some("docs"),
            Self::DestinationCollision(_) | Self::MissingStagedArtifact { .. } => Some("promote"),
            Self::UnknownOption(_)
            | Self::DependencyPredicate { .. }
            | Self::OptionRequirement { .. }
            | Self::DependencyNotFound(_) => Some("plan"),
            Self::ParseError(_) | Self::NotFound(_) | Self::Io(_) => None,
        }
    }
}

fn format_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "<signal>".to_string(),
    }
}

fn format_stderr(stderr: &str) -> String {
    let stderr = stderr.trim();
    if stderr.is_empty() {
        String::new()
    } else {
        format!("\nstderr: {}", stderr)
    }
}
