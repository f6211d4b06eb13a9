// src/args.rs

//! Configure argument builder
//!
//! The argument table is declarative: every entry is either a fixed flag,
//! a flag whose value is a dependency prefix, or a flag gated by an option.
//! Option entries name an explicit `disable` flag separately from the
//! `enable` flag, because telling the configure script "no raster support"
//! is not the same as simply not mentioning the raster library.

use crate::error::{Error, Result};
use crate::formula::Vars;
use crate::options::OptionSet;
use crate::resolver::ResolvedDependency;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One entry of the configure argument table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ArgSpec {
    /// Always present
    Fixed { flag: String },

    /// `flag=<prefix of dependency>[/suffix]`
    Prefix {
        flag: String,
        dependency: String,
        #[serde(default)]
        suffix: Option<String>,
    },

    /// `enable` when the option is active, `disable` when it is not
    Option {
        option: String,
        #[serde(default)]
        enable: Option<String>,
        #[serde(default)]
        disable: Option<String>,
    },
}

impl ArgSpec {
    pub fn fixed(flag: impl Into<String>) -> Self {
        Self::Fixed { flag: flag.into() }
    }

    pub fn prefix(flag: impl Into<String>, dependency: impl Into<String>) -> Self {
        Self::Prefix {
            flag: flag.into(),
            dependency: dependency.into(),
            suffix: None,
        }
    }

    /// Option flag with an enable form, a disable form, or both
    pub fn option(option: impl Into<String>, enable: Option<&str>, disable: Option<&str>) -> Self {
        Self::Option {
            option: option.into(),
            enable: enable.map(str::to_string),
            disable: disable.map(str::to_string),
        }
    }
}

/// Derive the configure argument list
///
/// Output follows table order and depends only on the inputs, so repeated
/// calls with the same option set are byte-identical. Flags go through
/// `%(var)s` substitution; `vars` should already carry `dep.<name>` entries
/// for the resolved dependencies.
pub fn build_args(
    specs: &[ArgSpec],
    resolved: &BTreeSet<ResolvedDependency>,
    options: &OptionSet,
    vars: &Vars,
) -> Result<Vec<String>> {
    let mut args = Vec::with_capacity(specs.len());

    for spec in specs {
        match spec {
            ArgSpec::Fixed { flag } => args.push(vars.substitute(flag)),
            ArgSpec::Prefix {
                flag,
                dependency,
                suffix,
            } => {
                let resolved = resolved
                    .iter()
                    .find(|r| r.name() == dependency)
                    .ok_or_else(|| Error::DependencyNotFound(dependency.clone()))?;

                let value = match suffix {
                    Some(suffix) => resolved.prefix.join(suffix),
                    None => resolved.prefix.clone(),
                };
                args.push(format!("{}={}", vars.substitute(flag), value.display()));
            }
            ArgSpec::Option {
                option,
                enable,
                disable,
            } => {
                let chosen = if options.is_active(option)? {
                    enable
                } else {
                    disable
                };
                if let Some(flag) = chosen {
                    args.push(vars.substitute(flag));
                }
            }
        }
    }

    Ok(args)
}
