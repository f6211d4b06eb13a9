// src/kitchen/cook.rs

//! Cook: the build state machine for a single plan

use crate::error::{Error, Result};
use crate::formula::{Step, Vars};
use crate::plan::BuildPlan;
use crate::stage::{self, PromotionReport, StageRoot};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::config::{CookResult, CookState, DocFailurePolicy};
use super::tool::{ExitResult, Invocation};
use super::Kitchen;

/// Parallel builds are never requested
const SINGLE_JOB: &str = "-j1";

/// A single cook operation
pub struct Cook<'a> {
    kitchen: &'a Kitchen,
    plan: &'a BuildPlan,
    source_dir: PathBuf,
    stage: StageRoot,
    vars: Vars,
    state: CookState,
    states: Vec<CookState>,
    degraded: BTreeSet<String>,
    promotion: PromotionReport,
    log: String,
    warnings: Vec<String>,
}

impl<'a> Cook<'a> {
    pub(super) fn new(kitchen: &'a Kitchen, plan: &'a BuildPlan, source_dir: &Path) -> Result<Self> {
        if !source_dir.is_dir() {
            return Err(Error::NotFound(source_dir.to_path_buf()));
        }

        let stage = StageRoot::create(
            kitchen.config.stage_parent.as_deref(),
            kitchen.config.keep_stage,
        )?;

        let mut vars = plan.vars.clone();
        vars.set_path("destdir", stage.path());

        Ok(Self {
            kitchen,
            plan,
            source_dir: source_dir.to_path_buf(),
            stage,
            vars,
            state: CookState::Unconfigured,
            states: vec![CookState::Unconfigured],
            degraded: BTreeSet::new(),
            promotion: PromotionReport::default(),
            log: String::new(),
            warnings: Vec::new(),
        })
    }

    /// Current state
    pub fn state(&self) -> &CookState {
        &self.state
    }

    /// Every state so far, oldest first
    pub fn states(&self) -> &[CookState] {
        &self.states
    }

    /// The stage root this cook installs into
    pub fn stage_path(&self) -> &Path {
        self.stage.path()
    }

    pub fn log(&self) -> &str {
        &self.log
    }

    /// Run every phase in order
    ///
    /// On error the cook moves to [`CookState::Failed`]. Errors that carry
    /// no stage are wrapped in [`Error::StageFailed`] with the current
    /// phase, so the returned error always names a stage. Nothing has been written to the final prefix
    /// unless the failure happened during promotion, and promotion cleans up
    /// after itself.
    pub fn run(&mut self) -> Result<()> {
        let Err(e) = self.run_phases() else {
            return Ok(());
        };

        let e = match e.stage() {
            Some(_) => e,
            None => Error::StageFailed {
                stage: self.phase().to_string(),
                source: Box::new(e),
            },
        };
        let stage = e.stage().unwrap_or_else(|| self.phase()).to_string();
        self.log_line(&format!("FAILED in {}: {}", stage, e));
        self.transition(CookState::Failed {
            stage,
            cause: e.to_string(),
        });
        Err(e)
    }

    /// Stage name of the current state, as used in errors
    fn phase(&self) -> &'static str {
        match self.state {
            CookState::Unconfigured | CookState::Configuring => "configure",
            CookState::Building => "make",
            CookState::DocBuilding => "docs",
            CookState::Installing | CookState::Done => "install",
            CookState::Failed { .. } => "cook",
        }
    }

    fn run_phases(&mut self) -> Result<()> {
        self.configure()?;
        self.build()?;
        self.build_docs()?;
        self.install()?;
        self.transition(CookState::Done);
        info!("Cooked {} {}", self.plan.name, self.plan.version);
        Ok(())
    }

    /// Consume the cook, releasing the stage root
    pub fn finish(self) -> CookResult {
        let kept_stage = self
            .kitchen
            .config
            .keep_stage
            .then(|| self.stage.path().to_path_buf());

        CookResult {
            prefix: self.plan.prefix.clone(),
            log: self.log,
            warnings: self.warnings,
            states: self.states,
            degraded: self.degraded,
            promotion: self.promotion,
            fingerprint: self.plan.fingerprint(),
            kept_stage,
        }
    }

    fn transition(&mut self, next: CookState) {
        debug_assert!(
            self.state.can_transition_to(&next),
            "invalid transition {} -> {}",
            self.state,
            next
        );
        debug!("Cook state: {} -> {}", self.state, next);
        self.state = next.clone();
        self.states.push(next);
    }

    /// Configuring: setup steps, then the configure script
    fn configure(&mut self) -> Result<()> {
        let plan = self.plan;
        self.transition(CookState::Configuring);

        for step in &plan.setup_steps {
            let Some(program) = &step.program else {
                return Err(Error::ParseError(format!(
                    "Setup step '{}' has no program",
                    step.name
                )));
            };
            let invocation = self.step_invocation(step, program);
            self.run_tool(&step.name, invocation)?;
        }

        let invocation = self
            .base_invocation(&plan.configure_program, &self.source_dir)
            .args(plan.configure_args.iter().cloned());
        self.run_tool("configure", invocation)?;
        Ok(())
    }

    /// Building: a single-job make
    fn build(&mut self) -> Result<()> {
        self.transition(CookState::Building);

        let invocation = self
            .make_invocation(&self.source_dir)
            .arg(SINGLE_JOB);
        self.run_tool("make", invocation)?;
        Ok(())
    }

    /// DocBuilding: each active doc step, failures handled per policy
    fn build_docs(&mut self) -> Result<()> {
        let plan = self.plan;
        if plan.doc_steps.is_empty() {
            return Ok(());
        }
        self.transition(CookState::DocBuilding);

        for step in &plan.doc_steps {
            let program = step.program.as_deref().unwrap_or(&plan.make);
            let invocation = self
                .step_invocation(step, program)
                .env("MAKEFLAGS", SINGLE_JOB);

            match self.run_tool(&step.name, invocation) {
                Ok(_) => {}
                Err(e) => match self.kitchen.config.doc_failure {
                    DocFailurePolicy::Fatal => {
                        return Err(Error::DocGeneration {
                            step: step.name.clone(),
                            cause: e.to_string(),
                        });
                    }
                    DocFailurePolicy::Degrade => {
                        warn!("Documentation step {} failed, continuing: {}", step.name, e);
                        self.warnings
                            .push(format!("Documentation step {} failed: {}", step.name, e));
                        self.degraded.insert(step.name.clone());
                    }
                },
            }
        }
        Ok(())
    }

    /// Installing: `make install DESTDIR=<stage>`, then promotion
    fn install(&mut self) -> Result<()> {
        self.transition(CookState::Installing);

        let invocation = self
            .make_invocation(&self.source_dir)
            .arg(self.plan.install_target.clone())
            .arg(format!("DESTDIR={}", self.stage.path().display()));
        self.run_tool("install", invocation)?;

        if self.stage.is_empty()? {
            warn!("make install wrote nothing into {}", self.stage.path().display());
            self.warnings
                .push("Install step left the stage root empty".to_string());
        }

        info!("Promoting into {}", self.plan.prefix.display());
        self.promotion = stage::promote(
            self.stage.path(),
            &self.source_dir,
            &self.plan.prefix,
            &self.plan.promotions,
            &self.plan.options,
            &self.degraded,
        )?;
        self.log_line(&format!(
            "Promoted {} files into {}",
            self.promotion.files_written,
            self.plan.prefix.display()
        ));
        Ok(())
    }

    /// Invocation with the kitchen-wide environment
    fn base_invocation(&self, program: &str, cwd: &Path) -> Invocation {
        let mut invocation = Invocation::new(self.vars.substitute(program), cwd);
        for (key, value) in &self.kitchen.config.env {
            invocation = invocation.env(key.as_str(), self.vars.substitute(value));
        }
        invocation
    }

    fn make_invocation(&self, cwd: &Path) -> Invocation {
        self.base_invocation(&self.plan.make, cwd)
            .env("MAKEFLAGS", SINGLE_JOB)
    }

    fn step_invocation(&self, step: &Step, program: &str) -> Invocation {
        let cwd = match &step.workdir {
            Some(dir) => self.source_dir.join(dir),
            None => self.source_dir.clone(),
        };
        let mut invocation = self
            .base_invocation(program, &cwd)
            .args(step.args.iter().map(|a| self.vars.substitute(a)));
        for (key, value) in &step.env {
            invocation = invocation.env(key.as_str(), self.vars.substitute(value));
        }
        invocation
    }

    /// Run one external tool, fail-fast
    fn run_tool(&mut self, stage: &str, invocation: Invocation) -> Result<ExitResult> {
        info!("Running {} phase", stage);
        debug!("Command: {}", invocation.command_line());
        self.log_line(&format!("$ {}", invocation.command_line()));

        let result = match self.kitchen.tool.invoke(&invocation) {
            Ok(result) => result,
            Err(Error::ToolTimeout { seconds, .. }) => {
                return Err(Error::ToolTimeout {
                    stage: stage.to_string(),
                    seconds,
                });
            }
            Err(e) if e.stage().is_none() => {
                return Err(Error::StageFailed {
                    stage: stage.to_string(),
                    source: Box::new(e),
                });
            }
            Err(e) => return Err(e),
        };

        self.log_build_output(stage, &result.stdout, &result.stderr);

        if !result.success() {
            return Err(Error::ExternalToolFailure {
                stage: stage.to_string(),
                exit_code: result.code,
                stderr: result.stderr.trim_end().to_string(),
            });
        }
        Ok(result)
    }

    fn log_line(&mut self, line: &str) {
        self.log.push_str(line);
        self.log.push('\n');
    }

    /// Log build step output (stdout/stderr) with a phase header
    fn log_build_output(&mut self, phase: &str, stdout: &str, stderr: &str) {
        self.log_line(&format!("=== {} ===", phase));
        if !stdout.is_empty() {
            self.log.push_str(stdout);
            self.log.push('\n');
        }
        if !stderr.is_empty() {
            self.log.push_str(stderr);
            self.log.push('\n');
        }
    }
}
