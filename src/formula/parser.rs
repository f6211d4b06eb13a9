// src/formula/parser.rs

//! Formula file parsing and validation

use crate::args::ArgSpec;
use crate::error::{Error, Result};
use crate::formula::format::Formula;
use crate::resolver::DependencyKind;
use std::collections::HashSet;
use std::path::Path;

/// Parse a formula from a TOML string
pub fn parse_formula(content: &str) -> Result<Formula> {
    toml::from_str(content).map_err(|e| Error::ParseError(format!("Invalid formula: {}", e)))
}

/// Parse a formula from a file
pub fn parse_formula_file(path: &Path) -> Result<Formula> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::ParseError(format!("Failed to read formula {}: {}", path.display(), e))
    })?;

    parse_formula(&content)
}

/// Validate a formula for completeness and internal consistency
///
/// Hard errors are returned as `Err`; soft issues come back as warnings.
/// Every predicate and argument must reference declared options and
/// dependencies, so a formula that validates cannot fail later with a
/// predicate error.
pub fn validate_formula(formula: &Formula) -> Result<Vec<String>> {
    let mut warnings = Vec::new();

    if formula.package.name.is_empty() {
        return Err(Error::ParseError("Formula package name cannot be empty".to_string()));
    }
    if formula.package.version.is_empty() {
        return Err(Error::ParseError(
            "Formula package version cannot be empty".to_string(),
        ));
    }

    // Options
    let mut options = HashSet::new();
    for option in &formula.options {
        if !options.insert(option.name.as_str()) {
            return Err(Error::ParseError(format!(
                "Option '{}' declared more than once",
                option.name
            )));
        }
    }
    for option in &formula.options {
        for required in &option.requires {
            if !options.contains(required.as_str()) {
                return Err(Error::UnknownOption(required.clone()));
            }
        }
    }

    // Dependencies
    let mut deps = HashSet::new();
    for dep in &formula.dependencies {
        if !deps.insert(dep.name.as_str()) {
            return Err(Error::ParseError(format!(
                "Dependency '{}' declared more than once",
                dep.name
            )));
        }
        if let Some(option) = dep.when.options().find(|o| !options.contains(o)) {
            return Err(Error::DependencyPredicate {
                dependency: dep.name.clone(),
                option: option.to_string(),
            });
        }
        if dep.kind == DependencyKind::Optional && dep.when.is_always() {
            return Err(Error::ParseError(format!(
                "Optional dependency '{}' must name the option that controls it",
                dep.name
            )));
        }
    }

    // Configure arguments
    for arg in &formula.configure.args {
        match arg {
            ArgSpec::Fixed { flag } if flag.is_empty() => {
                return Err(Error::ParseError("Empty fixed configure flag".to_string()));
            }
            ArgSpec::Fixed { .. } => {}
            ArgSpec::Prefix {
                flag, dependency, ..
            } => {
                if !deps.contains(dependency.as_str()) {
                    return Err(Error::ParseError(format!(
                        "Configure flag {} references undeclared dependency '{}'",
                        flag, dependency
                    )));
                }
            }
            ArgSpec::Option {
                option,
                enable,
                disable,
            } => {
                if !options.contains(option.as_str()) {
                    return Err(Error::UnknownOption(option.clone()));
                }
                if enable.is_none() && disable.is_none() {
                    return Err(Error::ParseError(format!(
                        "Configure argument for option '{}' has neither enable nor disable flag",
                        option
                    )));
                }
            }
        }
    }

    // Steps
    for step in formula.setup.iter().chain(&formula.docs) {
        if let Some(option) = step.when.options().find(|o| !options.contains(o)) {
            return Err(Error::UnknownOption(option.to_string()));
        }
    }
    for step in &formula.setup {
        if step.program.is_none() {
            return Err(Error::ParseError(format!(
                "Setup step '{}' has no program",
                step.name
            )));
        }
    }
    let doc_steps: HashSet<&str> = formula.docs.iter().map(|s| s.name.as_str()).collect();

    // Promotion rules
    let mut destinations = HashSet::new();
    for rule in &formula.promotions {
        if let Some(option) = rule.when.options().find(|o| !options.contains(o)) {
            return Err(Error::UnknownOption(option.to_string()));
        }
        if let Some(step) = &rule.produced_by
            && !doc_steps.contains(step.as_str())
        {
            return Err(Error::ParseError(format!(
                "Promotion rule for {} is produced by unknown step '{}'",
                rule.destination, step
            )));
        }
        if rule.sources.is_empty() {
            return Err(Error::ParseError(format!(
                "Promotion rule for {} has no sources",
                rule.destination
            )));
        }
        if !destinations.insert(rule.destination.trim_matches('/')) {
            warnings.push(format!(
                "Promotion destination {} is declared more than once; only one may be active",
                rule.destination
            ));
        }
    }

    // Soft checks
    if formula.package.desc.is_none() {
        warnings.push("Missing package description".to_string());
    }
    if formula.package.sha256.is_none() {
        warnings.push("Missing source checksum".to_string());
    }
    if formula.promotions.is_empty() {
        warnings.push("No promotion rules: nothing will be installed".to_string());
    }
    if formula.test.is_none() {
        warnings.push("No smoke test declared".to_string());
    }

    Ok(warnings)
}
