// src/formula/vars.rs

//! `%(name)s` substitution for formula strings

use std::collections::BTreeMap;
use std::path::Path;

/// Variables available to formula templates
///
/// Built-ins are `name`, `version`, `prefix`, `destdir` and `etc`; resolved
/// dependency prefixes appear as `dep.<name>`. Unknown variables are left in
/// place so a typo is visible in the resulting command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vars {
    values: BTreeMap<String, String>,
}

impl Vars {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Set a variable to a path
    pub fn set_path(&mut self, key: impl Into<String>, path: &Path) -> &mut Self {
        self.set(key, path.to_string_lossy().into_owned())
    }

    /// Builder-style variant of [`Vars::set`]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    /// Substitute every known `%(key)s` in `template`
    pub fn substitute(&self, template: &str) -> String {
        if !template.contains("%(") {
            return template.to_string();
        }

        let mut result = template.to_string();
        for (key, value) in &self.values {
            result = result.replace(&format!("%({})s", key), value);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitute_known() {
        let vars = Vars::new()
            .with("version", "2.4.2")
            .with("dep.proj", "/opt/proj");
        assert_eq!(
            vars.substitute("--with-projdir=%(dep.proj)s v%(version)s"),
            "--with-projdir=/opt/proj v2.4.2"
        );
    }

    #[test]
    fn test_unknown_left_in_place() {
        let vars = Vars::new().with("version", "1");
        assert_eq!(vars.substitute("%(nope)s-%(version)s"), "%(nope)s-1");
    }
}
