// src/commands/options.rs

//! Options command - list a formula's build options

use anyhow::Result;

/// Print every declared option with its default and toggle flag
pub fn cmd_options(formula_spec: &str) -> Result<()> {
    let formula = super::load_formula(formula_spec)?;

    println!(
        "{} {}: {} option(s)",
        formula.package.name,
        formula.full_version(),
        formula.options.len()
    );
    for option in &formula.options {
        let default = if option.default { "on" } else { "off" };
        println!("  {:<12} [{}]  {}", option.name, default, option.toggle_flag());
        if !option.description.is_empty() {
            println!("      {}", option.description);
        }
        if !option.requires.is_empty() {
            println!("      requires: {}", option.requires.join(", "));
        }
    }

    Ok(())
}
