// src/formula/builtin.rs

//! Formulas embedded in the binary

use crate::error::{Error, Result};
use crate::formula::{parse_formula, Formula};
use std::path::PathBuf;

const POSTGIS: &str = include_str!("../../formulas/postgis.toml");

/// Names accepted after `builtin:`
pub const NAMES: &[&str] = &["postgis"];

/// The PostGIS formula
pub fn postgis() -> Result<Formula> {
    parse_formula(POSTGIS)
}

/// Look up an embedded formula by name
pub fn get(name: &str) -> Result<Formula> {
    match name {
        "postgis" => postgis(),
        other => Err(Error::NotFound(PathBuf::from(format!("builtin:{}", other)))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::validate_formula;

    #[test]
    fn test_postgis_validates() {
        let formula = postgis().unwrap();
        let warnings = validate_formula(&formula).unwrap();
        assert!(warnings.is_empty(), "unexpected warnings: {:?}", warnings);
        assert_eq!(formula.full_version(), "2.4.2_1");
    }

    #[test]
    fn test_postgis_options() {
        let formula = postgis().unwrap();
        let names: Vec<(&str, bool)> = formula
            .options
            .iter()
            .map(|o| (o.name.as_str(), o.default))
            .collect();
        assert_eq!(
            names,
            vec![
                ("gui", false),
                ("gdal", true),
                ("sfcgal", true),
                ("html-docs", false),
                ("api-docs", false),
                ("head", false),
            ]
        );
    }

    #[test]
    fn test_every_builtin_parses() {
        for name in NAMES {
            assert!(get(name).is_ok(), "builtin {} failed to parse", name);
        }
    }
}
