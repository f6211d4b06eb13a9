// src/resolver/registry.rs

//! Prefix registries: where is an installed dependency?

use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Trait for mapping dependency names to installed prefixes
///
/// Keeps the resolver decoupled from however the surrounding package
/// manager tracks installations.
pub trait PrefixRegistry: Send + Sync {
    /// Installed prefix for `name`, or [`Error::DependencyNotFound`]
    fn prefix(&self, name: &str) -> Result<PathBuf>;
}

/// Explicit name to prefix table
///
/// Loadable from TOML:
///
/// ```toml
/// [prefixes]
/// proj = "/usr/local/opt/proj"
/// "json-c" = "/usr/local/opt/json-c"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TableRegistry {
    #[serde(default)]
    prefixes: BTreeMap<String, PathBuf>,
}

impl TableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a prefix
    pub fn insert(&mut self, name: impl Into<String>, prefix: impl Into<PathBuf>) {
        self.prefixes.insert(name.into(), prefix.into());
    }

    /// Parse a registry from a TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| Error::ParseError(format!("Invalid prefix registry: {}", e)))
    }

    /// Read a registry file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::ParseError(format!("Failed to read registry {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }
}

impl PrefixRegistry for TableRegistry {
    fn prefix(&self, name: &str) -> Result<PathBuf> {
        self.prefixes
            .get(name)
            .cloned()
            .ok_or_else(|| Error::DependencyNotFound(name.to_string()))
    }
}

/// Registry following the "opt prefix" layout: `<root>/<name>`
///
/// A dependency is installed iff its directory exists.
#[derive(Debug, Clone)]
pub struct OptRegistry {
    root: PathBuf,
}

impl OptRegistry {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl PrefixRegistry for OptRegistry {
    fn prefix(&self, name: &str) -> Result<PathBuf> {
        let prefix = self.root.join(name);
        if prefix.is_dir() {
            Ok(prefix)
        } else {
            Err(Error::DependencyNotFound(format!(
                "{} (no prefix at {})",
                name,
                prefix.display()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_registry_from_toml() {
        let registry = TableRegistry::from_toml(
            r#"
[prefixes]
proj = "/opt/proj"
"json-c" = "/opt/json-c"
"#,
        )
        .unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.prefix("json-c").unwrap(), PathBuf::from("/opt/json-c"));
        assert!(matches!(registry.prefix("geos"), Err(Error::DependencyNotFound(_))));
    }

    #[test]
    fn test_opt_registry() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join("proj")).unwrap();

        let registry = OptRegistry::new(root.path());
        assert_eq!(registry.prefix("proj").unwrap(), root.path().join("proj"));
        assert!(matches!(registry.prefix("geos"), Err(Error::DependencyNotFound(_))));
    }
}
