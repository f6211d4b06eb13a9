// src/resolver/mod.rs

//! Dependency resolution for a single cook
//!
//! Each declared dependency carries a predicate over the option set. The
//! resolver evaluates every predicate once and returns the active set. It
//! is also where option inter-dependencies are enforced: an option whose
//! `requires` list is not satisfied stops the cook before anything runs.
//!
//! Turning the active set into filesystem prefixes is delegated to a
//! [`PrefixRegistry`]; a missing prefix is surfaced as
//! [`Error::DependencyNotFound`].

pub mod registry;

pub use registry::{OptRegistry, PrefixRegistry, TableRegistry};

use crate::error::{Error, Result};
use crate::options::OptionSet;
use crate::predicate::Predicate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use tracing::debug;

/// When a dependency is needed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    /// Only needed to build
    Build,
    /// Needed at build time and by the installed package
    #[default]
    Runtime,
    /// Recommended: on by default, switched off through its option
    Optional,
}

impl DependencyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Build => "build",
            Self::Runtime => "runtime",
            Self::Optional => "optional",
        }
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A statically declared dependency
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Dependency {
    /// Package name in the prefix registry
    pub name: String,

    #[serde(default)]
    pub kind: DependencyKind,

    /// Predicate deciding whether this dependency is active
    #[serde(default)]
    pub when: Predicate,
}

impl Dependency {
    pub fn new(name: impl Into<String>, kind: DependencyKind, when: Predicate) -> Self {
        Self {
            name: name.into(),
            kind,
            when,
        }
    }

    /// Evaluate the predicate, reporting bad option names as predicate errors
    pub fn is_active(&self, options: &OptionSet) -> Result<bool> {
        self.when.evaluate(options).map_err(|e| match e {
            Error::UnknownOption(option) => Error::DependencyPredicate {
                dependency: self.name.clone(),
                option,
            },
            other => other,
        })
    }
}

/// An active dependency together with its installed prefix
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResolvedDependency {
    pub dependency: Dependency,
    pub prefix: PathBuf,
}

impl ResolvedDependency {
    pub fn name(&self) -> &str {
        &self.dependency.name
    }
}

/// Check `requires` relationships between active options
pub fn check_option_requirements(options: &OptionSet) -> Result<()> {
    for option in options.declared() {
        if !options.is_active(&option.name)? {
            continue;
        }
        for required in &option.requires {
            if !options.is_active(required)? {
                return Err(Error::OptionRequirement {
                    option: option.name.clone(),
                    requires: required.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Resolve the active dependency set for an option set
///
/// Unconditional dependencies are always included. The result is ordered,
/// so the same option set always yields the same set in the same order.
pub fn resolve(dependencies: &[Dependency], options: &OptionSet) -> Result<BTreeSet<Dependency>> {
    check_option_requirements(options)?;

    let mut active = BTreeSet::new();
    for dep in dependencies {
        if dep.is_active(options)? {
            debug!("Dependency {} ({}) active", dep.name, dep.kind);
            active.insert(dep.clone());
        } else {
            debug!("Dependency {} inactive (when: {})", dep.name, dep.when);
        }
    }

    Ok(active)
}

/// Look up the installed prefix of every active dependency
pub fn resolve_prefixes(
    active: &BTreeSet<Dependency>,
    registry: &dyn PrefixRegistry,
) -> Result<BTreeSet<ResolvedDependency>> {
    active
        .iter()
        .map(|dep| {
            let prefix = registry.prefix(&dep.name)?;
            Ok(ResolvedDependency {
                dependency: dep.clone(),
                prefix,
            })
        })
        .collect()
}
