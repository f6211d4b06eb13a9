// src/kitchen/config.rs

//! Configuration types for the Kitchen

use crate::error::{Error, Result};
use crate::stage::PromotionReport;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// What to do when a documentation step fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocFailurePolicy {
    /// Warn, skip that step's promotion rules and keep going
    #[default]
    Degrade,
    /// Abort the cook with [`Error::DocGeneration`]
    Fatal,
}

impl std::str::FromStr for DocFailurePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "degrade" => Ok(Self::Degrade),
            "fatal" => Ok(Self::Fatal),
            other => Err(Error::ParseError(format!(
                "Unknown doc failure policy '{}' (expected degrade or fatal)",
                other
            ))),
        }
    }
}

/// Configuration for the Kitchen
///
/// Loadable from TOML:
///
/// ```toml
/// timeout_secs = 3600
/// keep_stage = false
/// doc_failure = "degrade"
/// sysconfdir = "/usr/local/etc"
///
/// [env]
/// CFLAGS = "-O2"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KitchenConfig {
    /// Per-stage timeout for external tools (none = wait forever)
    #[serde(rename = "timeout_secs", with = "duration_secs")]
    pub timeout: Option<Duration>,
    /// Keep the stage root after the cook (for debugging)
    pub keep_stage: bool,
    /// Directory to create stage roots in (default: system temp dir)
    pub stage_parent: Option<PathBuf>,
    /// Documentation failure handling
    pub doc_failure: DocFailurePolicy,
    /// System configuration directory, `%(etc)s` in formulas
    pub sysconfdir: PathBuf,
    /// Extra environment passed to every external tool
    pub env: BTreeMap<String, String>,
}

impl Default for KitchenConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            keep_stage: false,
            stage_parent: None,
            doc_failure: DocFailurePolicy::Degrade,
            sysconfdir: PathBuf::from("/usr/local/etc"),
            env: BTreeMap::new(),
        }
    }
}

impl KitchenConfig {
    /// Parse a configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| Error::ParseError(format!("Invalid kitchen config: {}", e)))
    }

    /// Read a configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        match value {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_secs))
    }
}

/// Build runner states
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookState {
    Unconfigured,
    Configuring,
    Building,
    DocBuilding,
    Installing,
    Done,
    Failed { stage: String, cause: String },
}

impl CookState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed { .. })
    }

    /// Whether `next` may follow `self`
    pub fn can_transition_to(&self, next: &CookState) -> bool {
        use CookState::*;
        match (self, next) {
            (Done | Failed { .. }, _) => false,
            (_, Failed { .. }) => true,
            (Unconfigured, Configuring)
            | (Configuring, Building)
            | (Building, DocBuilding)
            | (Building, Installing)
            | (DocBuilding, Installing)
            | (Installing, Done) => true,
            _ => false,
        }
    }
}

impl fmt::Display for CookState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unconfigured => f.write_str("unconfigured"),
            Self::Configuring => f.write_str("configuring"),
            Self::Building => f.write_str("building"),
            Self::DocBuilding => f.write_str("doc-building"),
            Self::Installing => f.write_str("installing"),
            Self::Done => f.write_str("done"),
            Self::Failed { stage, cause } => write!(f, "failed in {}: {}", stage, cause),
        }
    }
}

/// Result of cooking a formula
#[derive(Debug)]
pub struct CookResult {
    /// Final install prefix
    pub prefix: PathBuf,
    /// Build log
    pub log: String,
    /// Warnings generated during build
    pub warnings: Vec<String>,
    /// Every state the cook passed through
    pub states: Vec<CookState>,
    /// Documentation steps that failed and were skipped
    pub degraded: BTreeSet<String>,
    /// What promotion wrote
    pub promotion: PromotionReport,
    /// Fingerprint of the plan that was cooked
    pub fingerprint: String,
    /// Stage root left on disk when `keep_stage` is set
    pub kept_stage: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kitchen_config_default() {
        let config = KitchenConfig::default();
        assert!(config.timeout.is_none());
        assert!(!config.keep_stage);
        assert_eq!(config.doc_failure, DocFailurePolicy::Degrade);
        assert_eq!(config.sysconfdir, PathBuf::from("/usr/local/etc"));
    }

    #[test]
    fn test_kitchen_config_from_toml() {
        let config = KitchenConfig::from_toml(
            r#"
timeout_secs = 600
doc_failure = "fatal"
keep_stage = true

[env]
CFLAGS = "-O2"
"#,
        )
        .unwrap();
        assert_eq!(config.timeout, Some(Duration::from_secs(600)));
        assert_eq!(config.doc_failure, DocFailurePolicy::Fatal);
        assert!(config.keep_stage);
        assert_eq!(config.env.get("CFLAGS").map(String::as_str), Some("-O2"));
        assert_eq!(config.sysconfdir, PathBuf::from("/usr/local/etc"));
    }

    #[test]
    fn test_kitchen_config_rejects_unknown_policy() {
        assert!(KitchenConfig::from_toml("doc_failure = \"ignore\"").is_err());
        assert!("ignore".parse::<DocFailurePolicy>().is_err());
        assert_eq!(
            "fatal".parse::<DocFailurePolicy>().unwrap(),
            DocFailurePolicy::Fatal
        );
    }

    #[test]
    fn test_state_transitions() {
        use CookState::*;
        assert!(Unconfigured.can_transition_to(&Configuring));
        assert!(Building.can_transition_to(&Installing));
        assert!(Building.can_transition_to(&DocBuilding));
        assert!(!Unconfigured.can_transition_to(&Building));
        assert!(!Installing.can_transition_to(&Building));
        let failed = Failed {
            stage: "make".to_string(),
            cause: "exit 2".to_string(),
        };
        assert!(Configuring.can_transition_to(&failed));
        assert!(!Done.can_transition_to(&failed));
        assert!(failed.is_terminal());
    }
}
