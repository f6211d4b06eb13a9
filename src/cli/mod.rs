// src/cli/mod.rs
//! CLI definitions for saucier
//!
//! This module contains the command-line interface definitions using clap.
//! The actual command implementations are in the `commands` module.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "saucier")]
#[command(author = "Saucier Contributors")]
#[command(version)]
#[command(about = "Conditional build orchestration for native source packages", long_about = None)]
pub struct Cli {
    /// Kitchen configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// `--with` / `--without` option selections
#[derive(Args, Debug, Clone, Default)]
pub struct SelectionArgs {
    /// Enable a build option (repeatable)
    #[arg(long = "with", value_name = "OPTION")]
    pub with: Vec<String>,

    /// Disable a build option (repeatable)
    #[arg(long = "without", value_name = "OPTION")]
    pub without: Vec<String>,
}

/// Where installed dependencies live
#[derive(Args, Debug, Clone)]
pub struct RegistryArgs {
    /// TOML file mapping dependency names to prefixes
    #[arg(long, conflicts_with = "opt_root")]
    pub registry: Option<PathBuf>,

    /// Directory holding one prefix per dependency (`<root>/<name>`)
    #[arg(long, default_value = "/usr/local/opt")]
    pub opt_root: PathBuf,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List a formula's build options
    Options {
        /// Formula file, or builtin:NAME
        formula: String,
    },

    /// Resolve dependencies and configure arguments without building
    Plan {
        /// Formula file, or builtin:NAME
        formula: String,

        #[command(flatten)]
        selection: SelectionArgs,

        #[command(flatten)]
        registry: RegistryArgs,

        /// Final install prefix
        #[arg(long, default_value = "/usr/local")]
        prefix: PathBuf,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },

    /// Configure, build, install into a stage root and promote
    Cook {
        /// Formula file, or builtin:NAME
        formula: String,

        /// Unpacked source tree
        #[arg(long)]
        source: PathBuf,

        /// Final install prefix
        #[arg(long)]
        prefix: PathBuf,

        #[command(flatten)]
        selection: SelectionArgs,

        #[command(flatten)]
        registry: RegistryArgs,

        /// Per-stage timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Keep the stage root after the cook
        #[arg(long)]
        keep_stage: bool,

        /// Documentation failure policy: degrade or fatal
        #[arg(long, value_parser = ["degrade", "fatal"])]
        doc_failure: Option<String>,

        /// System configuration directory
        #[arg(long)]
        sysconfdir: Option<PathBuf>,

        /// Only validate the formula, don't cook
        #[arg(long)]
        validate_only: bool,
    },

    /// Print the post-install caveats
    Caveats {
        /// Formula file, or builtin:NAME
        formula: String,

        /// Install prefix
        #[arg(long, default_value = "/usr/local")]
        prefix: PathBuf,
    },

    /// Run the smoke test against an installed prefix
    Test {
        /// Formula file, or builtin:NAME
        formula: String,

        /// Install prefix
        #[arg(long)]
        prefix: PathBuf,
    },
}
