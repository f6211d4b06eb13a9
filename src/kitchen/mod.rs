// src/kitchen/mod.rs

//! Kitchen: runs a build plan against an unpacked source tree
//!
//! The Kitchen drives the external build tools through a fixed sequence of
//! phases:
//! - Configuring: setup steps (e.g. `./autogen.sh`), then `./configure`
//! - Building: `make -j1`
//! - DocBuilding: optional documentation targets
//! - Installing: `make install DESTDIR=<stage root>`, then promotion into
//!   the final prefix
//!
//! Every phase is fail-fast. Fetching and verifying the source archive
//! happen before the kitchen is involved.

mod config;
mod cook;
mod tool;

pub use config::{CookResult, CookState, DocFailurePolicy, KitchenConfig};
pub use cook::Cook;
pub use tool::{ExitResult, ExternalTool, Invocation, SystemTool};

use crate::error::Result;
use crate::plan::BuildPlan;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// The Kitchen: where formulas are cooked
pub struct Kitchen {
    pub(crate) config: KitchenConfig,
    tool: Arc<dyn ExternalTool>,
}

impl Kitchen {
    /// Create a Kitchen that runs real processes
    pub fn new(config: KitchenConfig) -> Self {
        let tool = SystemTool::new().with_timeout(config.timeout);
        Self {
            config,
            tool: Arc::new(tool),
        }
    }

    /// Create a Kitchen with a custom tool runner
    pub fn with_tool(config: KitchenConfig, tool: Arc<dyn ExternalTool>) -> Self {
        Self { config, tool }
    }

    /// Create a Kitchen with default configuration
    pub fn with_defaults() -> Self {
        Self::new(KitchenConfig::default())
    }

    pub fn config(&self) -> &KitchenConfig {
        &self.config
    }

    /// Prepare a cook without running it
    ///
    /// Creates the stage root. Use [`Cook::run`] and [`Cook::finish`] to
    /// drive it by hand, e.g. to inspect the state history after a failure.
    pub fn start<'a>(&'a self, plan: &'a BuildPlan, source_dir: &Path) -> Result<Cook<'a>> {
        Cook::new(self, plan, source_dir)
    }

    /// Cook a plan: configure, build, document, install and promote
    ///
    /// This is the main entry point. The final prefix is only written once
    /// every external tool has succeeded and the promotion plan is valid.
    pub fn cook(&self, plan: &BuildPlan, source_dir: &Path) -> Result<CookResult> {
        info!(
            "Cooking {} {} from {}",
            plan.name,
            plan.version,
            source_dir.display()
        );

        let mut cook = self.start(plan, source_dir)?;
        cook.run()?;
        let result = cook.finish();

        for warning in &result.warnings {
            info!("Warning: {}", warning);
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::formula::parse_formula;
    use crate::options::{OptionSet, Selection};
    use crate::plan::PlanContext;
    use crate::resolver::TableRegistry;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    const FORMULA: &str = r#"
[package]
name = "demo"
version = "1.0"

[[option]]
name = "docs"

[[docs]]
name = "html"
when = "docs"
workdir = "doc"
args = ["html"]
env = { CATALOG = "%(etc)s/catalog" }

[[promote]]
destination = "bin"
sources = ["**/bin/*"]

[[promote]]
destination = "doc/html"
sources = [{ glob = "doc/html/*", from = "source" }]
when = "docs"
produced_by = "html"
"#;

    /// Records invocations; `make install` writes `usr/bin/demo` into DESTDIR
    #[derive(Default)]
    struct FakeTool {
        calls: Mutex<Vec<Invocation>>,
        fail_on: Option<&'static str>,
        /// Program that cannot be spawned
        missing: Option<&'static str>,
    }

    impl ExternalTool for FakeTool {
        fn invoke(&self, invocation: &Invocation) -> Result<ExitResult> {
            self.calls.lock().unwrap().push(invocation.clone());

            if self.missing == Some(invocation.program.as_str()) {
                return Err(Error::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("Failed to spawn {}", invocation.program),
                )));
            }

            let fails = self
                .fail_on
                .is_some_and(|arg| invocation.program == arg || invocation.args.iter().any(|a| a == arg));
            if fails {
                return Ok(ExitResult {
                    code: Some(2),
                    stdout: String::new(),
                    stderr: "boom".to_string(),
                });
            }

            if let Some(destdir) = invocation.args.iter().find_map(|a| a.strip_prefix("DESTDIR=")) {
                let bin = Path::new(destdir).join("usr/bin");
                fs::create_dir_all(&bin)?;
                fs::write(bin.join("demo"), "#!/bin/sh\n")?;
            }
            Ok(ExitResult {
                code: Some(0),
                ..Default::default()
            })
        }
    }

    struct Setup {
        source: TempDir,
        prefix: TempDir,
        plan: BuildPlan,
    }

    fn setup(docs: bool) -> Setup {
        let formula = parse_formula(FORMULA).unwrap();
        let selections = if docs {
            vec![("docs", Selection::With)]
        } else {
            Vec::new()
        };
        let options = OptionSet::new(&formula.options, selections).unwrap();
        let source = TempDir::new().unwrap();
        let prefix = TempDir::new().unwrap();
        let plan = BuildPlan::compute(
            &formula,
            &options,
            &TableRegistry::new(),
            &PlanContext::new(prefix.path().join("demo")).with_sysconfdir("/etc"),
        )
        .unwrap();
        Setup {
            source,
            prefix,
            plan,
        }
    }

    fn kitchen(tool: Arc<FakeTool>, config: KitchenConfig) -> Kitchen {
        Kitchen::with_tool(config, tool)
    }

    #[test]
    fn test_cook_runs_phases_in_order() {
        let s = setup(false);
        let tool = Arc::new(FakeTool::default());
        let result = kitchen(tool.clone(), KitchenConfig::default())
            .cook(&s.plan, s.source.path())
            .unwrap();

        assert_eq!(
            result.states,
            vec![
                CookState::Unconfigured,
                CookState::Configuring,
                CookState::Building,
                CookState::Installing,
                CookState::Done,
            ]
        );
        assert!(s.prefix.path().join("demo/bin/demo").is_file());

        let calls = tool.calls.lock().unwrap();
        assert_eq!(calls[0].program, "./configure");
        assert_eq!(calls[1].args, vec!["-j1"]);
        assert_eq!(calls[1].env.get("MAKEFLAGS").map(String::as_str), Some("-j1"));
        assert_eq!(calls[2].args[0], "install");
        assert!(calls[2].args[1].starts_with("DESTDIR="));
        assert!(!calls[2].args[1].contains(&s.prefix.path().display().to_string()));
    }

    #[test]
    fn test_configure_failure_leaves_prefix_untouched() {
        let s = setup(false);
        let tool = Arc::new(FakeTool {
            fail_on: Some("./configure"),
            ..Default::default()
        });
        let kitchen = kitchen(tool.clone(), KitchenConfig::default());

        let mut cook = kitchen.start(&s.plan, s.source.path()).unwrap();
        let err = cook.run().unwrap_err();
        assert!(matches!(
            err,
            Error::ExternalToolFailure { ref stage, exit_code: Some(2), .. } if stage == "configure"
        ));
        assert!(matches!(
            cook.state(),
            CookState::Failed { stage, .. } if stage == "configure"
        ));
        assert_eq!(tool.calls.lock().unwrap().len(), 1);
        assert!(!s.prefix.path().join("demo").exists());
    }

    #[test]
    fn test_spawn_failure_names_stage() {
        let s = setup(false);
        let tool = Arc::new(FakeTool {
            missing: Some("./configure"),
            ..Default::default()
        });
        let kitchen = kitchen(tool, KitchenConfig::default());

        let mut cook = kitchen.start(&s.plan, s.source.path()).unwrap();
        let err = cook.run().unwrap_err();
        assert_eq!(err.stage(), Some("configure"));
        assert!(matches!(
            &err,
            Error::StageFailed { source, .. } if matches!(**source, Error::Io(_))
        ));
        assert!(matches!(
            cook.state(),
            CookState::Failed { stage, .. } if stage == "configure"
        ));
        assert!(!s.prefix.path().join("demo").exists());
    }

    #[test]
    fn test_spawn_failure_during_build() {
        let s = setup(false);
        let tool = Arc::new(FakeTool {
            missing: Some("make"),
            ..Default::default()
        });
        let err = kitchen(tool, KitchenConfig::default())
            .cook(&s.plan, s.source.path())
            .unwrap_err();
        assert_eq!(err.stage(), Some("make"));
    }

    #[test]
    fn test_doc_failure_degrades_by_default() {
        let s = setup(true);
        let tool = Arc::new(FakeTool {
            fail_on: Some("html"),
            ..Default::default()
        });
        let result = kitchen(tool.clone(), KitchenConfig::default())
            .cook(&s.plan, s.source.path())
            .unwrap();

        assert!(result.degraded.contains("html"));
        assert_eq!(result.warnings.len(), 1);
        assert!(result.promotion.skipped.contains(&"doc/html".to_string()));
        assert!(result.states.contains(&CookState::DocBuilding));

        let calls = tool.calls.lock().unwrap();
        let doc = &calls[2];
        assert_eq!(doc.program, "make");
        assert!(doc.cwd.ends_with("doc"));
        assert_eq!(doc.env.get("CATALOG").map(String::as_str), Some("/etc/catalog"));
    }

    #[test]
    fn test_doc_failure_fatal() {
        let s = setup(true);
        let tool = Arc::new(FakeTool {
            fail_on: Some("html"),
            ..Default::default()
        });
        let config = KitchenConfig {
            doc_failure: DocFailurePolicy::Fatal,
            ..Default::default()
        };
        let err = kitchen(tool, config)
            .cook(&s.plan, s.source.path())
            .unwrap_err();
        assert!(matches!(err, Error::DocGeneration { ref step, .. } if step == "html"));
        assert_eq!(err.stage(), Some("docs"));
        assert!(!s.prefix.path().join("demo").exists());
    }

    #[test]
    fn test_kitchen_env_reaches_every_tool() {
        let s = setup(false);
        let tool = Arc::new(FakeTool::default());
        let mut config = KitchenConfig::default();
        config.env.insert("CFLAGS".to_string(), "-O2".to_string());

        kitchen(tool.clone(), config)
            .cook(&s.plan, s.source.path())
            .unwrap();
        for call in tool.calls.lock().unwrap().iter() {
            assert_eq!(call.env.get("CFLAGS").map(String::as_str), Some("-O2"));
        }
    }

    #[test]
    fn test_missing_source_dir() {
        let s = setup(false);
        let kitchen = kitchen(Arc::new(FakeTool::default()), KitchenConfig::default());
        let missing = s.source.path().join("nope");
        assert!(matches!(
            kitchen.cook(&s.plan, &missing),
            Err(Error::NotFound(_))
        ));
    }
}
