// src/report/mod.rs

//! Post-install reporting: caveats text and the smoke test

mod caveats;
pub mod sample;
mod smoke;

pub use caveats::{render_caveats, InstallPaths};
pub use sample::ShapefileSample;
pub use smoke::{run_smoke_test, Outcome, TestResult};
