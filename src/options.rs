// src/options.rs

//! Build options and the per-invocation option set
//!
//! A formula declares its options once; the user then selects some of them
//! on or off for a single cook (`--with gui`, `--without gdal`). The merged
//! result is an immutable [`OptionSet`] that every later phase queries.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A declared build option
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildOption {
    /// Option name (e.g. "gui", "html-docs")
    pub name: String,

    /// Human readable description
    #[serde(default)]
    pub description: String,

    /// Whether the option is active when the user says nothing
    #[serde(default)]
    pub default: bool,

    /// Options that must also be active when this one is
    ///
    /// Checked by the resolver, not here.
    #[serde(default)]
    pub requires: Vec<String>,
}

impl BuildOption {
    /// Create an option with no requirements
    pub fn new(name: impl Into<String>, description: impl Into<String>, default: bool) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            default,
            requires: Vec::new(),
        }
    }

    /// The flag a user passes to flip this option away from its default
    pub fn toggle_flag(&self) -> String {
        if self.default {
            format!("--without {}", self.name)
        } else {
            format!("--with {}", self.name)
        }
    }
}

/// A user's choice for one option
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    With,
    Without,
}

/// Declared options merged with user selections
///
/// Fixed at the start of a cook and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionSet {
    declared: BTreeMap<String, BuildOption>,
    selected: BTreeMap<String, bool>,
}

impl OptionSet {
    /// Build an option set from the declared options and user selections
    ///
    /// Selecting an option that was never declared is an error; a later
    /// selection for the same name wins.
    pub fn new<'a, I>(declared: &[BuildOption], selections: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, Selection)>,
    {
        let declared: BTreeMap<String, BuildOption> = declared
            .iter()
            .map(|o| (o.name.clone(), o.clone()))
            .collect();

        let mut selected = BTreeMap::new();
        for (name, selection) in selections {
            if !declared.contains_key(name) {
                return Err(Error::UnknownOption(name.to_string()));
            }
            selected.insert(name.to_string(), selection == Selection::With);
        }

        Ok(Self { declared, selected })
    }

    /// Option set with every option at its default
    pub fn defaults(declared: &[BuildOption]) -> Self {
        Self {
            declared: declared
                .iter()
                .map(|o| (o.name.clone(), o.clone()))
                .collect(),
            selected: BTreeMap::new(),
        }
    }

    /// Whether the named option is active for this cook
    pub fn is_active(&self, name: &str) -> Result<bool> {
        let option = self
            .declared
            .get(name)
            .ok_or_else(|| Error::UnknownOption(name.to_string()))?;

        Ok(self.selected.get(name).copied().unwrap_or(option.default))
    }

    /// Whether the name was declared
    pub fn is_declared(&self, name: &str) -> bool {
        self.declared.contains_key(name)
    }

    /// Look up a declared option
    pub fn get(&self, name: &str) -> Option<&BuildOption> {
        self.declared.get(name)
    }

    /// Declared options in name order
    pub fn declared(&self) -> impl Iterator<Item = &BuildOption> {
        self.declared.values()
    }

    /// Names of the active options, sorted
    pub fn active(&self) -> Vec<&str> {
        self.declared
            .values()
            .filter(|o| self.selected.get(&o.name).copied().unwrap_or(o.default))
            .map(|o| o.name.as_str())
            .collect()
    }
}
