// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Common argument: formula file or builtin:NAME
fn formula_arg() -> Arg {
    Arg::new("formula")
        .required(true)
        .help("Formula file, or builtin:NAME")
}

/// Common arguments: option selections
fn selection_args() -> [Arg; 2] {
    [
        Arg::new("with")
            .long("with")
            .value_name("OPTION")
            .action(ArgAction::Append)
            .help("Enable a build option (repeatable)"),
        Arg::new("without")
            .long("without")
            .value_name("OPTION")
            .action(ArgAction::Append)
            .help("Disable a build option (repeatable)"),
    ]
}

/// Common arguments: dependency prefix lookup
fn registry_args() -> [Arg; 2] {
    [
        Arg::new("registry")
            .long("registry")
            .value_name("FILE")
            .help("TOML file mapping dependency names to prefixes"),
        Arg::new("opt_root")
            .long("opt-root")
            .value_name("DIR")
            .default_value("/usr/local/opt")
            .help("Directory holding one prefix per dependency"),
    ]
}

fn build_cli() -> Command {
    Command::new("saucier")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Saucier Contributors")
        .about("Conditional build orchestration for native source packages")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .global(true)
                .help("Kitchen configuration file (TOML)"),
        )
        .subcommand_required(true)
        .subcommand(
            Command::new("options")
                .about("List a formula's build options")
                .arg(formula_arg()),
        )
        .subcommand(
            Command::new("plan")
                .about("Resolve dependencies and configure arguments without building")
                .arg(formula_arg())
                .args(selection_args())
                .args(registry_args())
                .arg(
                    Arg::new("prefix")
                        .long("prefix")
                        .default_value("/usr/local")
                        .help("Final install prefix"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the plan as JSON"),
                ),
        )
        .subcommand(
            Command::new("cook")
                .about("Configure, build, install into a stage root and promote")
                .arg(formula_arg())
                .arg(Arg::new("source").long("source").required(true).help("Unpacked source tree"))
                .arg(Arg::new("prefix").long("prefix").required(true).help("Final install prefix"))
                .args(selection_args())
                .args(registry_args())
                .arg(Arg::new("timeout").long("timeout").help("Per-stage timeout in seconds"))
                .arg(
                    Arg::new("keep_stage")
                        .long("keep-stage")
                        .action(ArgAction::SetTrue)
                        .help("Keep the stage root after the cook"),
                )
                .arg(
                    Arg::new("doc_failure")
                        .long("doc-failure")
                        .value_parser(["degrade", "fatal"])
                        .help("Documentation failure policy"),
                )
                .arg(Arg::new("sysconfdir").long("sysconfdir").help("System configuration directory"))
                .arg(
                    Arg::new("validate_only")
                        .long("validate-only")
                        .action(ArgAction::SetTrue)
                        .help("Only validate the formula, don't cook"),
                ),
        )
        .subcommand(
            Command::new("caveats")
                .about("Print the post-install caveats")
                .arg(formula_arg())
                .arg(Arg::new("prefix").long("prefix").default_value("/usr/local").help("Install prefix")),
        )
        .subcommand(
            Command::new("test")
                .about("Run the smoke test against an installed prefix")
                .arg(formula_arg())
                .arg(Arg::new("prefix").long("prefix").required(true).help("Install prefix")),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Create man directory - use CARGO_MANIFEST_DIR which is always set by cargo
    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("saucier.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
