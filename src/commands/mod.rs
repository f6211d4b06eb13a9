// src/commands/mod.rs

//! Command handlers for the saucier CLI

mod caveats;
mod cook;
mod options;
mod plan;

pub use caveats::cmd_caveats;
pub use cook::{cmd_cook, CookArgs};
pub use options::cmd_options;
pub use plan::cmd_plan;
pub use test::cmd_test;

use crate::cli::{RegistryArgs, SelectionArgs};
use anyhow::{bail, Context, Result};
use saucier::formula::{self, Formula};
use saucier::kitchen::KitchenConfig;
use saucier::options::{OptionSet, Selection};
use saucier::resolver::{OptRegistry, PrefixRegistry, TableRegistry};
use std::path::Path;

/// Load and validate a formula, printing validation warnings
pub(crate) fn load_formula(spec: &str) -> Result<Formula> {
    let formula =
        formula::load(spec).with_context(|| format!("Failed to load formula: {}", spec))?;

    let warnings = formula::validate_formula(&formula)
        .with_context(|| format!("Formula validation failed: {}", spec))?;
    for warning in &warnings {
        println!("Warning: {}", warning);
    }

    Ok(formula)
}

/// Merge `--with` / `--without` flags with the formula's defaults
pub(crate) fn option_set(formula: &Formula, args: &SelectionArgs) -> Result<OptionSet> {
    if let Some(both) = args.with.iter().find(|w| args.without.contains(w)) {
        bail!("Option '{}' given with both --with and --without", both);
    }

    let selections = args
        .with
        .iter()
        .map(|name| (name.as_str(), Selection::With))
        .chain(
            args.without
                .iter()
                .map(|name| (name.as_str(), Selection::Without)),
        );

    OptionSet::new(&formula.options, selections).context("Invalid option selection")
}

/// Build the prefix registry selected on the command line
pub(crate) fn registry(args: &RegistryArgs) -> Result<Box<dyn PrefixRegistry>> {
    match &args.registry {
        Some(path) => {
            let registry = TableRegistry::from_file(path)
                .with_context(|| format!("Failed to load registry: {}", path.display()))?;
            Ok(Box::new(registry))
        }
        None => Ok(Box::new(OptRegistry::new(&args.opt_root))),
    }
}

/// Kitchen configuration from `--config`, or defaults
pub(crate) fn kitchen_config(path: Option<&Path>) -> Result<KitchenConfig> {
    match path {
        Some(path) => KitchenConfig::from_file(path)
            .with_context(|| format!("Failed to load kitchen config: {}", path.display())),
        None => Ok(KitchenConfig::default()),
    }
}
