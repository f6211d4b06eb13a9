// src/commands/caveats.rs

//! Caveats command

use anyhow::Result;
use saucier::formula::Formula;
use saucier::report::{render_caveats, InstallPaths};
use std::path::Path;

/// Caveats text for an installed prefix, if the formula has any
pub(crate) fn caveats_text(formula: &Formula, prefix: &Path) -> Option<String> {
    let caveats = formula.caveats.as_ref()?;
    let paths = InstallPaths::for_caveats(prefix, &formula.package.name, caveats);
    Some(render_caveats(&caveats.text, &formula.package.version, &paths))
}

/// Print the caveats for a formula
pub fn cmd_caveats(formula_spec: &str, prefix: &Path) -> Result<()> {
    let formula = super::load_formula(formula_spec)?;

    match caveats_text(&formula, prefix) {
        Some(text) => print!("{}", text),
        None => println!("{} has no caveats", formula.package.name),
    }
    Ok(())
}
