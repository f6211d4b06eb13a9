// src/formula/format.rs

//! Formula file format definitions
//!
//! Formulas are TOML files that declare a package's build options and how
//! each option changes the dependency set, the configure arguments, the
//! optional build steps and the promotion of staged files.

use crate::args::ArgSpec;
use crate::options::BuildOption;
use crate::predicate::Predicate;
use crate::resolver::Dependency;
use crate::stage::PromotionRule;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A complete formula
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Formula {
    /// Package metadata
    pub package: PackageSection,

    /// Declared build options
    #[serde(default, rename = "option")]
    pub options: Vec<BuildOption>,

    /// Statically declared dependencies, each gated by a predicate
    #[serde(default, rename = "dependency")]
    pub dependencies: Vec<Dependency>,

    /// Configure script and argument table
    #[serde(default)]
    pub configure: ConfigureSection,

    /// Build tool settings
    #[serde(default)]
    pub build: BuildSection,

    /// Steps run before configure (e.g. autogen for trunk builds)
    #[serde(default)]
    pub setup: Vec<Step>,

    /// Documentation steps, run with the build tool after the main build
    #[serde(default)]
    pub docs: Vec<Step>,

    /// Rules that move staged files into the final prefix
    #[serde(default, rename = "promote")]
    pub promotions: Vec<PromotionRule>,

    /// Post-install message
    #[serde(default)]
    pub caveats: Option<CaveatsSection>,

    /// Smoke test run against the installed package
    #[serde(default)]
    pub test: Option<SmokeTestSection>,
}

impl Formula {
    /// `name-version` plus `_revision` when the formula was revised
    pub fn full_version(&self) -> String {
        if self.package.revision > 0 {
            format!("{}_{}", self.package.version, self.package.revision)
        } else {
            self.package.version.clone()
        }
    }

    /// Look up a declared dependency by name
    pub fn dependency(&self, name: &str) -> Option<&Dependency> {
        self.dependencies.iter().find(|d| d.name == name)
    }
}

/// Package metadata section
///
/// Download URL and checksum are carried for reporting only; fetching and
/// verification happen before the orchestrator runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageSection {
    /// Package name
    pub name: String,

    /// Upstream version
    pub version: String,

    /// Formula revision (rebuilds of the same version)
    #[serde(default)]
    pub revision: u32,

    /// Short description
    #[serde(default)]
    pub desc: Option<String>,

    /// Homepage URL
    #[serde(default)]
    pub homepage: Option<String>,

    /// Source archive URL
    #[serde(default)]
    pub url: Option<String>,

    /// Source archive SHA-256
    #[serde(default)]
    pub sha256: Option<String>,
}

/// Configure section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigureSection {
    /// Configure program, relative to the source tree
    #[serde(default = "default_configure")]
    pub program: String,

    /// Ordered argument table
    #[serde(default)]
    pub args: Vec<ArgSpec>,
}

impl Default for ConfigureSection {
    fn default() -> Self {
        Self {
            program: default_configure(),
            args: Vec::new(),
        }
    }
}

fn default_configure() -> String {
    "./configure".to_string()
}

/// Build tool section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildSection {
    /// Build tool program
    #[serde(default = "default_make")]
    pub make: String,

    /// Install target name
    #[serde(default = "default_install_target")]
    pub install_target: String,
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            make: default_make(),
            install_target: default_install_target(),
        }
    }
}

fn default_make() -> String {
    "make".to_string()
}

fn default_install_target() -> String {
    "install".to_string()
}

/// An optional build step gated by a predicate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    /// Step name, used in logs and by `produced_by` on promotion rules
    pub name: String,

    /// When the step runs
    #[serde(default)]
    pub when: Predicate,

    /// Program to run; doc steps default to the build tool
    #[serde(default)]
    pub program: Option<String>,

    /// Arguments (support `%(var)s` substitution)
    #[serde(default)]
    pub args: Vec<String>,

    /// Working directory relative to the source tree
    #[serde(default)]
    pub workdir: Option<String>,

    /// Extra environment for this step only
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

/// Caveats section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaveatsSection {
    /// Message template
    pub text: String,

    /// Where extension modules land, relative to the prefix
    #[serde(default)]
    pub extension_dir: Option<String>,
}

/// Smoke test section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmokeTestSection {
    /// Binary to run, relative to the install prefix
    pub binary: String,

    /// Embedded sample to feed it
    #[serde(default)]
    pub sample: SampleKind,

    /// Substrings that must all appear in stdout
    pub expect: Vec<String>,
}

/// Embedded smoke test inputs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleKind {
    #[default]
    Shapefile,
}
