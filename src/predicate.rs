// src/predicate.rs

//! Option predicates: when does a dependency, argument or rule apply?
//!
//! Syntax borrows the flavor operators: `gdal` means "gdal is active",
//! `!gdal` means "gdal is inactive". A list is a conjunction, and an absent
//! predicate always holds.
//!
//! ```toml
//! when = "gdal"
//! when = "!gdal"
//! when = ["html-docs", "!head"]
//! ```

use crate::error::{Error, Result};
use crate::options::OptionSet;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A single `name` / `!name` test
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Term {
    pub option: String,
    pub negated: bool,
}

impl Term {
    /// Parse `name` or `!name`
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        let (negated, name) = match s.strip_prefix('!') {
            Some(rest) => (true, rest.trim()),
            None => (false, s),
        };

        if name.is_empty() {
            return Err(Error::ParseError(format!("Empty option name in predicate '{}'", s)));
        }

        Ok(Self {
            option: name.to_string(),
            negated,
        })
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            write!(f, "!{}", self.option)
        } else {
            f.write_str(&self.option)
        }
    }
}

/// Conjunction of terms; empty means unconditional
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Predicate {
    terms: Vec<Term>,
}

impl Predicate {
    /// The predicate that always holds
    pub fn always() -> Self {
        Self::default()
    }

    /// Holds when `option` is active
    pub fn active(option: impl Into<String>) -> Self {
        Self {
            terms: vec![Term {
                option: option.into(),
                negated: false,
            }],
        }
    }

    /// Holds when `option` is inactive
    pub fn inactive(option: impl Into<String>) -> Self {
        Self {
            terms: vec![Term {
                option: option.into(),
                negated: true,
            }],
        }
    }

    /// Parse a comma separated list of terms
    pub fn parse(s: &str) -> Result<Self> {
        let terms = s
            .split(',')
            .filter(|t| !t.trim().is_empty())
            .map(Term::parse)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { terms })
    }

    pub fn is_always(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// Option names this predicate reads
    pub fn options(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(|t| t.option.as_str())
    }

    /// Evaluate against an option set
    ///
    /// Fails with [`Error::UnknownOption`] when a term names an option the
    /// set never declared; callers rewrap it with their own context.
    pub fn evaluate(&self, options: &OptionSet) -> Result<bool> {
        for term in &self.terms {
            if options.is_active(&term.option)? == term.negated {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.terms.is_empty() {
            return f.write_str("always");
        }
        let parts: Vec<String> = self.terms.iter().map(|t| t.to_string()).collect();
        f.write_str(&parts.join(", "))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PredicateRepr {
    One(String),
    All(Vec<String>),
}

impl<'de> Deserialize<'de> for Predicate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let terms = match PredicateRepr::deserialize(deserializer)? {
            PredicateRepr::One(s) => Predicate::parse(&s)
                .map_err(serde::de::Error::custom)?
                .terms,
            PredicateRepr::All(items) => items
                .iter()
                .map(|s| Term::parse(s))
                .collect::<Result<Vec<_>>>()
                .map_err(serde::de::Error::custom)?,
        };
        Ok(Self { terms })
    }
}

impl Serialize for Predicate {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let items: Vec<String> = self.terms.iter().map(|t| t.to_string()).collect();
        items.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{BuildOption, Selection};

    fn options(gui: bool) -> OptionSet {
        let declared = vec![
            BuildOption::new("gui", "", false),
            BuildOption::new("gdal", "", true),
        ];
        let selection = if gui { Selection::With } else { Selection::Without };
        OptionSet::new(&declared, [("gui", selection)]).unwrap()
    }

    #[test]
    fn test_always_holds() {
        assert!(Predicate::always().evaluate(&options(false)).unwrap());
        assert_eq!(Predicate::always().to_string(), "always");
    }

    #[test]
    fn test_parse_terms() {
        let p = Predicate::parse("gui, !gdal").unwrap();
        assert_eq!(p.terms().len(), 2);
        assert!(p.terms()[1].negated);
        assert_eq!(p.to_string(), "gui, !gdal");
    }

    #[test]
    fn test_parse_rejects_bare_bang() {
        assert!(Term::parse("!").is_err());
    }

    #[test]
    fn test_evaluate_conjunction() {
        let p = Predicate::parse("gui, gdal").unwrap();
        assert!(p.evaluate(&options(true)).unwrap());
        assert!(!p.evaluate(&options(false)).unwrap());
        assert!(Predicate::inactive("gui").evaluate(&options(false)).unwrap());
    }

    #[test]
    fn test_evaluate_unknown_option() {
        let p = Predicate::active("qt");
        assert!(matches!(p.evaluate(&options(true)), Err(Error::UnknownOption(_))));
    }

    #[test]
    fn test_deserialize_forms() {
        #[derive(Deserialize)]
        struct Holder {
            when: Predicate,
        }

        let one: Holder = toml::from_str(r#"when = "!gdal""#).unwrap();
        assert_eq!(one.when, Predicate::inactive("gdal"));

        let many: Holder = toml::from_str(r#"when = ["gui", "!gdal"]"#).unwrap();
        assert_eq!(many.when.terms().len(), 2);
    }
}
