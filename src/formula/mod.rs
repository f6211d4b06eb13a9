// src/formula/mod.rs

//! Formula definitions
//!
//! A formula is a TOML document that describes how one native source
//! package is configured, built, installed and tested under a set of
//! user-selectable build options. Formulas are loaded from a path, or from
//! the embedded set with a `builtin:` prefix.

pub mod builtin;
mod format;
mod parser;
mod vars;

pub use format::{
    BuildSection, CaveatsSection, ConfigureSection, Formula, PackageSection, SampleKind,
    SmokeTestSection, Step,
};
pub use parser::{parse_formula, parse_formula_file, validate_formula};
pub use vars::Vars;

use crate::error::{Error, Result};
use std::path::Path;

/// Prefix selecting an embedded formula
pub const BUILTIN_PREFIX: &str = "builtin:";

/// Load a formula from `builtin:NAME` or a file path
pub fn load(spec: &str) -> Result<Formula> {
    match spec.strip_prefix(BUILTIN_PREFIX) {
        Some(name) => builtin::get(name),
        None => {
            let path = Path::new(spec);
            if !path.exists() {
                return Err(Error::NotFound(path.to_path_buf()));
            }
            parse_formula_file(path)
        }
    }
}
