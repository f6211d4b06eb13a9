// src/commands/cook.rs

//! Cook command - build and install a formula from an unpacked source tree

use crate::cli::{RegistryArgs, SelectionArgs};
use anyhow::{Context, Result};
use saucier::kitchen::{DocFailurePolicy, Kitchen};
use saucier::plan::{BuildPlan, PlanContext};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Command-line settings for a cook
pub struct CookArgs<'a> {
    pub formula: &'a str,
    pub source: &'a Path,
    pub prefix: &'a Path,
    pub selection: &'a SelectionArgs,
    pub registry: &'a RegistryArgs,
    pub config: Option<&'a Path>,
    pub timeout: Option<u64>,
    pub keep_stage: bool,
    pub doc_failure: Option<&'a str>,
    pub sysconfdir: Option<PathBuf>,
    pub validate_only: bool,
}

/// Cook a formula into a prefix
pub fn cmd_cook(args: CookArgs<'_>) -> Result<()> {
    println!("Reading formula: {}", args.formula);
    let formula = super::load_formula(args.formula)?;
    println!(
        "Formula: {} version {}",
        formula.package.name,
        formula.full_version()
    );

    if args.validate_only {
        println!("[OK] Formula validation passed");
        return Ok(());
    }

    // CLI flags override the config file
    let mut config = super::kitchen_config(args.config)?;
    if let Some(secs) = args.timeout {
        config.timeout = Some(Duration::from_secs(secs));
    }
    if args.keep_stage {
        config.keep_stage = true;
    }
    if let Some(policy) = args.doc_failure {
        config.doc_failure = policy
            .parse::<DocFailurePolicy>()
            .context("Invalid --doc-failure")?;
    }
    if let Some(dir) = args.sysconfdir {
        config.sysconfdir = dir;
    }

    let options = super::option_set(&formula, args.selection)?;
    let registry = super::registry(args.registry)?;
    let context = PlanContext::new(args.prefix).with_sysconfdir(&config.sysconfdir);
    let plan = BuildPlan::compute(&formula, &options, &*registry, &context)
        .with_context(|| format!("Failed to plan {}", formula.package.name))?;

    let active = plan.options.active();
    println!(
        "Cooking with options: {}",
        if active.is_empty() {
            "(none)".to_string()
        } else {
            active.join(", ")
        }
    );
    info!("Plan fingerprint {}", plan.fingerprint());

    let kitchen = Kitchen::new(config);
    let result = kitchen
        .cook(&plan, args.source)
        .with_context(|| format!("Failed to cook {}", formula.package.name))?;

    for warning in &result.warnings {
        println!("Warning: {}", warning);
    }
    if let Some(stage) = &result.kept_stage {
        println!("Stage root kept at {}", stage.display());
    }

    println!(
        "\n[COMPLETE] Installed {} {} into {} ({} files)",
        formula.package.name,
        formula.full_version(),
        result.prefix.display(),
        result.promotion.files_written
    );

    if let Some(text) = super::caveats::caveats_text(&formula, args.prefix) {
        println!("\n==> Caveats");
        print!("{}", text);
    }

    Ok(())
}
