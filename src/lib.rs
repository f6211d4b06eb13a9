// src/lib.rs

//! saucier: conditional build orchestration for native source packages
//!
//! A formula declares build options, dependencies gated on those options,
//! a configure argument table, optional build steps and promotion rules.
//! saucier turns one option selection into an immutable build plan, runs
//! the external build tools against an unpacked source tree, installs into
//! a private stage root and promotes the result into the final prefix.
//!
//! # Pipeline
//!
//! - [`options`]: declared options plus user selections
//! - [`resolver`]: active dependencies and their prefixes
//! - [`args`]: the configure argument list
//! - [`plan`]: everything above, fixed and fingerprinted
//! - [`kitchen`]: configure, make, docs and `make install DESTDIR=...`
//! - [`stage`]: promotion from the stage root into the prefix
//! - [`report`]: caveats and the smoke test

pub mod args;
mod error;
pub mod formula;
pub mod kitchen;
pub mod options;
pub mod plan;
pub mod predicate;
pub mod report;
pub mod resolver;
pub mod stage;

pub use error::{Error, Result};
pub use formula::Formula;
pub use kitchen::{Cook, CookResult, Kitchen, KitchenConfig};
pub use options::OptionSet;
pub use plan::BuildPlan;
