// src/report/caveats.rs

//! Post-install caveats text

use crate::formula::{CaveatsSection, Vars};
use std::path::{Path, PathBuf};

/// Where an installed package's pieces ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallPaths {
    pub prefix: PathBuf,
    /// Package-specific shared data (`share/<name>`)
    pub pkgshare: PathBuf,
    pub lib: PathBuf,
    /// Host extension directory
    pub extension: PathBuf,
}

impl InstallPaths {
    /// Standard layout under `prefix`
    pub fn new(prefix: &Path, name: &str, extension_dir: Option<&str>) -> Self {
        Self {
            prefix: prefix.to_path_buf(),
            pkgshare: prefix.join("share").join(name),
            lib: prefix.join("lib"),
            extension: prefix.join(extension_dir.unwrap_or("share/extension")),
        }
    }

    /// Layout for a formula's caveats section
    pub fn for_caveats(prefix: &Path, name: &str, caveats: &CaveatsSection) -> Self {
        Self::new(prefix, name, caveats.extension_dir.as_deref())
    }
}

/// Render a caveats template
///
/// Pure: the same inputs always give the same text.
pub fn render_caveats(template: &str, version: &str, paths: &InstallPaths) -> String {
    Vars::new()
        .with("version", version)
        .with("prefix", paths.prefix.to_string_lossy())
        .with("pkgshare", paths.pkgshare.to_string_lossy())
        .with("lib", paths.lib.to_string_lossy())
        .with("extension", paths.extension.to_string_lossy())
        .substitute(template)
}
