// src/stage/promote.rs

//! Promotion: move staged output into the final prefix
//!
//! Promotion runs in two passes. The planning pass evaluates rule
//! predicates, checks that destinations are disjoint, expands every glob and
//! maps each match to its target path, all without touching the
//! destination. Only a plan that is valid as a whole reaches the copy pass,
//! and a copy pass that fails midway removes whatever it already wrote.

use crate::error::{Error, Result};
use crate::options::OptionSet;
use crate::predicate::Predicate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Which tree a glob is expanded against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// The stage root that `make install DESTDIR=...` wrote into
    #[default]
    Stage,
    /// The unpacked source tree (scripts and docs not installed by make)
    Source,
}

/// A glob plus the tree it is relative to
///
/// In a formula a bare string is a stage glob:
///
/// ```toml
/// sources = ["**/bin/*", { glob = "utils/*.pl", from = "source" }]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawSourceGlob")]
pub struct SourceGlob {
    pub glob: String,
    pub from: Origin,
}

impl SourceGlob {
    pub fn stage(glob: impl Into<String>) -> Self {
        Self {
            glob: glob.into(),
            from: Origin::Stage,
        }
    }

    pub fn source(glob: impl Into<String>) -> Self {
        Self {
            glob: glob.into(),
            from: Origin::Source,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSourceGlob {
    Bare(String),
    Detailed {
        glob: String,
        #[serde(default)]
        from: Origin,
    },
}

impl From<RawSourceGlob> for SourceGlob {
    fn from(raw: RawSourceGlob) -> Self {
        match raw {
            RawSourceGlob::Bare(glob) => Self::stage(glob),
            RawSourceGlob::Detailed { glob, from } => Self { glob, from },
        }
    }
}

/// Maps staged (or source) paths into a subdirectory of the final prefix
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromotionRule {
    /// Subdirectory of the final prefix, e.g. `share/postgis`
    pub destination: String,

    pub sources: Vec<SourceGlob>,

    /// When the rule applies
    #[serde(default)]
    pub when: Predicate,

    /// Whether an empty match is an error
    #[serde(default = "default_required")]
    pub required: bool,

    /// Documentation step whose output this rule promotes
    ///
    /// The rule is skipped when that step degraded.
    #[serde(default)]
    pub produced_by: Option<String>,
}

fn default_required() -> bool {
    true
}

impl PromotionRule {
    pub fn new(destination: impl Into<String>, sources: Vec<SourceGlob>) -> Self {
        Self {
            destination: destination.into(),
            sources,
            when: Predicate::always(),
            required: true,
            produced_by: None,
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn when(mut self, when: Predicate) -> Self {
        self.when = when;
        self
    }

    pub fn produced_by(mut self, step: impl Into<String>) -> Self {
        self.produced_by = Some(step.into());
        self
    }

    fn patterns(&self) -> String {
        self.sources
            .iter()
            .map(|s| s.glob.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// One planned copy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromotedEntry {
    /// Matched path in the stage root or source tree
    pub from: PathBuf,
    /// Target path under the final prefix
    pub to: PathBuf,
    /// Destination of the rule that produced it
    pub rule: String,
}

/// What a promotion did
#[derive(Debug, Clone, Default)]
pub struct PromotionReport {
    /// Top-level entries promoted, in copy order
    pub entries: Vec<PromotedEntry>,
    /// Files (not directories) written, counting directory contents
    pub files_written: usize,
    /// Destinations of rules that did not apply
    pub skipped: Vec<String>,
}

/// Promote staged files into `destination`
///
/// `degraded` names documentation steps that failed under the degrade
/// policy; rules `produced_by` one of them are skipped. Nothing is written
/// unless every active rule can be satisfied.
pub fn promote(
    stage_root: &Path,
    source_dir: &Path,
    destination: &Path,
    rules: &[PromotionRule],
    options: &OptionSet,
    degraded: &BTreeSet<String>,
) -> Result<PromotionReport> {
    let mut report = PromotionReport::default();

    let mut active = Vec::new();
    for rule in rules {
        if !rule.when.evaluate(options)? {
            debug!("Promotion to {} inactive (when: {})", rule.destination, rule.when);
            report.skipped.push(rule.destination.clone());
            continue;
        }
        if let Some(step) = &rule.produced_by
            && degraded.contains(step)
        {
            warn!(
                "Skipping promotion to {}: step '{}' did not produce output",
                rule.destination, step
            );
            report.skipped.push(rule.destination.clone());
            continue;
        }
        active.push(rule);
    }

    check_disjoint(&active)?;

    let entries = plan_entries(stage_root, source_dir, destination, &active)?;
    info!(
        "Promoting {} entries into {}",
        entries.len(),
        destination.display()
    );

    let mut written = Vec::new();
    match copy_entries(&entries, &mut written) {
        Ok(files) => {
            report.files_written = files;
            report.entries = entries;
            Ok(report)
        }
        Err(e) => {
            warn!(
                "Promotion failed, removing {} written paths: {}",
                written.len(),
                e
            );
            rollback(&written);
            Err(e)
        }
    }
}

/// Relative destination as a normalized path
fn destination_path(destination: &str) -> Result<PathBuf> {
    let path = PathBuf::from(destination.trim_matches('/'));
    if path.as_os_str().is_empty()
        || path
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
    {
        return Err(Error::ParseError(format!(
            "Promotion destination must be a relative subdirectory: '{}'",
            destination
        )));
    }
    Ok(path)
}

/// Active rule destinations must be pairwise disjoint
fn check_disjoint(rules: &[&PromotionRule]) -> Result<()> {
    let mut paths = Vec::with_capacity(rules.len());
    for rule in rules {
        paths.push((destination_path(&rule.destination)?, &rule.destination));
    }

    for (i, (a, a_name)) in paths.iter().enumerate() {
        for (b, b_name) in &paths[i + 1..] {
            if a.starts_with(b) || b.starts_with(a) {
                return Err(Error::DestinationCollision(format!(
                    "rules for '{}' and '{}' overlap",
                    a_name, b_name
                )));
            }
        }
    }
    Ok(())
}

fn expand(root: &Path, glob: &str) -> Result<Vec<PathBuf>> {
    let pattern = format!(
        "{}/{}",
        glob::Pattern::escape(&root.to_string_lossy()),
        glob.trim_start_matches('/')
    );

    let paths = glob::glob(&pattern)
        .map_err(|e| Error::ParseError(format!("Invalid promotion glob '{}': {}", glob, e)))?;

    let mut matches = Vec::new();
    for entry in paths {
        matches.push(entry.map_err(|e| Error::Io(e.into_error()))?);
    }
    Ok(matches)
}

/// Expand every active rule into concrete copies
fn plan_entries(
    stage_root: &Path,
    source_dir: &Path,
    destination: &Path,
    rules: &[&PromotionRule],
) -> Result<Vec<PromotedEntry>> {
    let mut targets: BTreeMap<PathBuf, PathBuf> = BTreeMap::new();
    let mut entries = Vec::new();

    for rule in rules {
        let mut matches = BTreeSet::new();
        for source in &rule.sources {
            let root = match source.from {
                Origin::Stage => stage_root,
                Origin::Source => source_dir,
            };
            matches.extend(expand(root, &source.glob)?);
        }

        // A directory match already carries everything below it
        let top_level: Vec<&PathBuf> = matches
            .iter()
            .filter(|m| !m.ancestors().skip(1).any(|a| matches.contains(a)))
            .collect();

        if top_level.is_empty() {
            if rule.required {
                return Err(Error::MissingStagedArtifact {
                    pattern: rule.patterns(),
                    destination: rule.destination.clone(),
                });
            }
            debug!("Optional promotion to {} matched nothing", rule.destination);
            continue;
        }

        let dest_dir = destination.join(destination_path(&rule.destination)?);
        for path in top_level {
            let Some(name) = path.file_name() else {
                continue;
            };
            let target = dest_dir.join(name);

            if let Some(previous) = targets.get(&target) {
                return Err(Error::DestinationCollision(format!(
                    "{} and {} both promote to {}",
                    previous.display(),
                    path.display(),
                    target.display()
                )));
            }
            if target.symlink_metadata().is_ok() {
                return Err(Error::DestinationCollision(format!(
                    "{} already exists",
                    target.display()
                )));
            }

            targets.insert(target.clone(), path.clone());
            entries.push(PromotedEntry {
                from: path.clone(),
                to: target,
                rule: rule.destination.clone(),
            });
        }
    }

    Ok(entries)
}

/// Create `dir` and any missing parents, recording each one created
fn ensure_dir(dir: &Path, written: &mut Vec<PathBuf>) -> Result<()> {
    let missing: Vec<&Path> = dir.ancestors().take_while(|a| !a.exists()).collect();
    for path in missing.into_iter().rev() {
        fs::create_dir(path)?;
        written.push(path.to_path_buf());
    }
    Ok(())
}

fn copy_one(from: &Path, to: &Path, written: &mut Vec<PathBuf>) -> Result<bool> {
    let file_type = from.symlink_metadata()?.file_type();

    if file_type.is_dir() {
        ensure_dir(to, written)?;
        return Ok(false);
    }

    if let Some(parent) = to.parent() {
        ensure_dir(parent, written)?;
    }

    if file_type.is_symlink() {
        let link = fs::read_link(from)?;
        #[cfg(unix)]
        std::os::unix::fs::symlink(&link, to)?;
        #[cfg(not(unix))]
        fs::copy(from, to)?;
    } else {
        fs::copy(from, to)?;
    }
    written.push(to.to_path_buf());
    Ok(true)
}

fn copy_entries(entries: &[PromotedEntry], written: &mut Vec<PathBuf>) -> Result<usize> {
    let mut files = 0;

    for entry in entries {
        debug!("Promote {} -> {}", entry.from.display(), entry.to.display());

        if entry.from.symlink_metadata()?.is_dir() {
            for item in WalkDir::new(&entry.from).sort_by_file_name() {
                let item = item.map_err(|e| Error::Io(e.into()))?;
                let rel = item
                    .path()
                    .strip_prefix(&entry.from)
                    .map_err(|e| Error::ParseError(e.to_string()))?;
                if copy_one(item.path(), &entry.to.join(rel), written)? {
                    files += 1;
                }
            }
        } else if copy_one(&entry.from, &entry.to, written)? {
            files += 1;
        }
    }

    Ok(files)
}

/// Remove written paths, newest first
fn rollback(written: &[PathBuf]) {
    for path in written.iter().rev() {
        let removed = match path.symlink_metadata() {
            Ok(meta) if meta.is_dir() => fs::remove_dir(path),
            Ok(_) => fs::remove_file(path),
            Err(_) => continue,
        };
        if let Err(e) = removed {
            warn!("Failed to remove {} during rollback: {}", path.display(), e);
        }
    }
}
