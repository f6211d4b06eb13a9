// src/commands/plan.rs

//! Plan command - show what a cook would do

use crate::cli::{RegistryArgs, SelectionArgs};
use anyhow::{Context, Result};
use saucier::plan::{BuildPlan, PlanContext};
use std::path::Path;

/// Resolve a plan and print it
pub fn cmd_plan(
    formula_spec: &str,
    selection: &SelectionArgs,
    registry: &RegistryArgs,
    prefix: &Path,
    config: Option<&Path>,
    json: bool,
) -> Result<()> {
    let formula = super::load_formula(formula_spec)?;
    let options = super::option_set(&formula, selection)?;
    let registry = super::registry(registry)?;
    let config = super::kitchen_config(config)?;

    let context = PlanContext::new(prefix).with_sysconfdir(&config.sysconfdir);
    let plan = BuildPlan::compute(&formula, &options, &*registry, &context)
        .with_context(|| format!("Failed to plan {}", formula.package.name))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan.to_json())?);
        return Ok(());
    }

    println!("Plan: {} {}", plan.name, formula.full_version());
    println!("  Options: {}", plan.options.active().join(", "));
    println!("  Dependencies:");
    for dep in &plan.dependencies {
        println!(
            "    {:<12} {:<8} {}",
            dep.name(),
            dep.dependency.kind,
            dep.prefix.display()
        );
    }
    println!("  Configure: {} {}", plan.configure_program, plan.configure_args.join(" "));
    for step in &plan.setup_steps {
        println!("  Setup step: {}", step.name);
    }
    for step in &plan.doc_steps {
        println!("  Doc step: {}", step.name);
    }
    println!("  Promotes:");
    for rule in &plan.promotions {
        let required = if rule.required { "" } else { " (optional)" };
        println!("    {}{}", rule.destination, required);
    }
    println!("  Fingerprint: {}", plan.fingerprint());

    Ok(())
}
