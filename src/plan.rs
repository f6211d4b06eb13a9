// src/plan.rs

//! Build plans
//!
//! A [`BuildPlan`] is everything the option set decides for one cook,
//! computed up front and never mutated: the resolved dependencies, the
//! configure arguments, the setup and documentation steps that will run,
//! and the promotion rules that apply. Keeping these decisions in one
//! value lets them be inspected (`saucier plan`) and fingerprinted without
//! running a build.

use crate::args::build_args;
use crate::error::Result;
use crate::formula::{Formula, Step, Vars};
use crate::options::OptionSet;
use crate::resolver::{self, PrefixRegistry, ResolvedDependency};
use crate::stage::PromotionRule;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Where the plan will install and read system config from
#[derive(Debug, Clone)]
pub struct PlanContext {
    /// Final destination prefix
    pub prefix: PathBuf,
    /// System configuration directory (`%(etc)s`)
    pub sysconfdir: PathBuf,
}

impl PlanContext {
    pub fn new(prefix: impl Into<PathBuf>) -> Self {
        let prefix = prefix.into();
        let sysconfdir = prefix.join("etc");
        Self { prefix, sysconfdir }
    }

    pub fn with_sysconfdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.sysconfdir = dir.into();
        self
    }
}

/// The resolved plan for a single cook
#[derive(Debug, Clone)]
pub struct BuildPlan {
    pub name: String,
    pub version: String,
    pub revision: u32,
    pub options: OptionSet,
    pub dependencies: BTreeSet<ResolvedDependency>,
    pub configure_program: String,
    pub configure_args: Vec<String>,
    pub make: String,
    pub install_target: String,
    /// Active setup steps, in declaration order
    pub setup_steps: Vec<Step>,
    /// Active documentation steps, in declaration order
    pub doc_steps: Vec<Step>,
    /// Promotion rules whose predicates hold
    pub promotions: Vec<PromotionRule>,
    pub prefix: PathBuf,
    pub vars: Vars,
}

impl BuildPlan {
    /// Resolve a formula against an option set
    pub fn compute(
        formula: &Formula,
        options: &OptionSet,
        registry: &dyn PrefixRegistry,
        context: &PlanContext,
    ) -> Result<Self> {
        info!(
            "Planning {} {} with options [{}]",
            formula.package.name,
            formula.package.version,
            options.active().join(", ")
        );

        let active = resolver::resolve(&formula.dependencies, options)?;
        let dependencies = resolver::resolve_prefixes(&active, registry)?;

        let mut vars = Vars::new();
        vars.set("name", formula.package.name.as_str())
            .set("version", formula.package.version.as_str())
            .set_path("prefix", &context.prefix)
            .set_path("etc", &context.sysconfdir);
        for dep in &dependencies {
            vars.set_path(format!("dep.{}", dep.name()), &dep.prefix);
        }

        let configure_args = build_args(&formula.configure.args, &dependencies, options, &vars)?;
        debug!("Configure args: {:?}", configure_args);

        let setup_steps = active_steps(&formula.setup, options)?;
        let doc_steps = active_steps(&formula.docs, options)?;

        let mut promotions = Vec::new();
        for rule in &formula.promotions {
            if rule.when.evaluate(options)? {
                promotions.push(rule.clone());
            } else {
                debug!("Skipping promotion to {} (when: {})", rule.destination, rule.when);
            }
        }

        Ok(Self {
            name: formula.package.name.clone(),
            version: formula.package.version.clone(),
            revision: formula.package.revision,
            options: options.clone(),
            dependencies,
            configure_program: formula.configure.program.clone(),
            configure_args,
            make: formula.build.make.clone(),
            install_target: formula.build.install_target.clone(),
            setup_steps,
            doc_steps,
            promotions,
            prefix: context.prefix.clone(),
            vars,
        })
    }

    /// Resolved prefix of a dependency in this plan
    pub fn dependency_prefix(&self, name: &str) -> Option<&Path> {
        self.dependencies
            .iter()
            .find(|d| d.name() == name)
            .map(|d| d.prefix.as_path())
    }

    /// Whether a dependency is part of this plan
    pub fn has_dependency(&self, name: &str) -> bool {
        self.dependency_prefix(name).is_some()
    }

    /// SHA-256 over every input that changes the build output
    ///
    /// Covers every command the plan runs after substitution, so two plans
    /// with the same fingerprint run the same commands and promote the same
    /// rules. The kitchen environment is not part of the plan.
    pub fn fingerprint(&self) -> String {
        let mut data = String::new();

        data.push_str(&format!(
            "name:{}\nversion:{}\nrevision:{}\n",
            self.name, self.version, self.revision
        ));
        data.push_str(&format!("options:{}\n", self.options.active().join(",")));
        for dep in &self.dependencies {
            data.push_str(&format!(
                "dep:{}:{}:{}\n",
                dep.name(),
                dep.dependency.kind,
                dep.prefix.display()
            ));
        }
        data.push_str(&format!(
            "configure:{}\n",
            self.vars.substitute(&self.configure_program)
        ));
        for arg in &self.configure_args {
            data.push_str(&format!("arg:{}\n", arg));
        }
        data.push_str(&format!(
            "make:{}\ninstall:{}\n",
            self.vars.substitute(&self.make),
            self.install_target
        ));
        for step in self.setup_steps.iter().chain(&self.doc_steps) {
            data.push_str(&self.step_fingerprint(step));
        }
        for rule in &self.promotions {
            data.push_str(&format!("promote:{}\n", rule.destination));
        }
        data.push_str(&format!("prefix:{}\n", self.prefix.display()));

        hex::encode(Sha256::digest(data.as_bytes()))
    }

    /// A step as it will run: substituted program, args, workdir and env
    fn step_fingerprint(&self, step: &Step) -> String {
        let program = step.program.as_deref().unwrap_or(&self.make);
        let mut line = format!(
            "step:{}:{}:{}",
            step.name,
            self.vars.substitute(program),
            step.workdir.as_deref().unwrap_or(".")
        );
        for arg in &step.args {
            line.push_str(&format!(":arg={}", self.vars.substitute(arg)));
        }
        for (key, value) in &step.env {
            line.push_str(&format!(":env={}={}", key, self.vars.substitute(value)));
        }
        line.push('\n');
        line
    }

    /// JSON view for `saucier plan --json`
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name,
            "version": self.version,
            "revision": self.revision,
            "options": self.options.active(),
            "dependencies": self.dependencies.iter().map(|d| serde_json::json!({
                "name": d.name(),
                "kind": d.dependency.kind.as_str(),
                "prefix": d.prefix.display().to_string(),
            })).collect::<Vec<_>>(),
            "configure": {
                "program": self.configure_program,
                "args": self.configure_args,
            },
            "setup": self.setup_steps.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(),
            "docs": self.doc_steps.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(),
            "promote": self.promotions.iter().map(|r| r.destination.as_str()).collect::<Vec<_>>(),
            "prefix": self.prefix.display().to_string(),
            "fingerprint": self.fingerprint(),
        })
    }
}

fn active_steps(steps: &[Step], options: &OptionSet) -> Result<Vec<Step>> {
    let mut active = Vec::new();
    for step in steps {
        if step.when.evaluate(options)? {
            active.push(step.clone());
        }
    }
    Ok(active)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::builtin;
    use crate::options::Selection;
    use crate::resolver::TableRegistry;

    fn registry(formula: &Formula) -> TableRegistry {
        let mut registry = TableRegistry::new();
        for dep in &formula.dependencies {
            registry.insert(dep.name.as_str(), format!("/opt/{}", dep.name));
        }
        registry
    }

    #[test]
    fn test_plan_defaults() {
        let formula = builtin::postgis().unwrap();
        let options = OptionSet::defaults(&formula.options);
        let plan = BuildPlan::compute(
            &formula,
            &options,
            &registry(&formula),
            &PlanContext::new("/usr/local"),
        )
        .unwrap();

        assert!(plan.has_dependency("gdal"));
        assert!(plan.has_dependency("pcre"));
        assert!(!plan.has_dependency("gtk+"));
        assert!(!plan.has_dependency("autoconf"));
        assert!(plan.setup_steps.is_empty());
        assert!(plan.doc_steps.is_empty());
        assert!(!plan.promotions.iter().any(|r| r.destination == "doc/html"));
        assert_eq!(plan.dependency_prefix("proj"), Some(Path::new("/opt/proj")));
    }

    #[test]
    fn test_plan_head_and_docs() {
        let formula = builtin::postgis().unwrap();
        let options = OptionSet::new(
            &formula.options,
            [("head", Selection::With), ("html-docs", Selection::With)],
        )
        .unwrap();
        let plan = BuildPlan::compute(
            &formula,
            &options,
            &registry(&formula),
            &PlanContext::new("/usr/local").with_sysconfdir("/usr/local/etc"),
        )
        .unwrap();

        assert!(plan.has_dependency("autoconf"));
        assert_eq!(plan.setup_steps.len(), 1);
        assert_eq!(plan.doc_steps[0].name, "chunked-html");
        assert!(plan
            .configure_args
            .contains(&"--with-xsldir=/opt/docbook-xsl/docbook-xsl".to_string()));
        assert!(plan.promotions.iter().any(|r| r.destination == "doc/html"));
    }

    #[test]
    fn test_fingerprint_stable_and_sensitive() {
        let formula = builtin::postgis().unwrap();
        let registry = registry(&formula);
        let context = PlanContext::new("/usr/local");

        let defaults = OptionSet::defaults(&formula.options);
        let a = BuildPlan::compute(&formula, &defaults, &registry, &context).unwrap();
        let b = BuildPlan::compute(&formula, &defaults, &registry, &context).unwrap();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);

        let no_raster =
            OptionSet::new(&formula.options, [("gdal", Selection::Without)]).unwrap();
        let c = BuildPlan::compute(&formula, &no_raster, &registry, &context).unwrap();
        assert_ne!(a.fingerprint(), c.fingerprint());

        // sysconfdir only reaches the doc step environment
        let docs = OptionSet::new(&formula.options, [("html-docs", Selection::With)]).unwrap();
        let etc_a = PlanContext::new("/usr/local").with_sysconfdir("/etc/a");
        let etc_b = PlanContext::new("/usr/local").with_sysconfdir("/etc/b");
        let d = BuildPlan::compute(&formula, &docs, &registry, &etc_a).unwrap();
        let e = BuildPlan::compute(&formula, &docs, &registry, &etc_b).unwrap();
        assert_eq!(d.configure_args, e.configure_args);
        assert_ne!(d.fingerprint(), e.fingerprint());

        let mut f = d.clone();
        f.install_target = "install-strip".to_string();
        assert_ne!(d.fingerprint(), f.fingerprint());

        let mut g = d.clone();
        g.doc_steps[0].workdir = Some("doc/html".to_string());
        assert_ne!(d.fingerprint(), g.fingerprint());
    }

    #[test]
    fn test_plan_json() {
        let formula = builtin::postgis().unwrap();
        let options = OptionSet::defaults(&formula.options);
        let plan = BuildPlan::compute(
            &formula,
            &options,
            &registry(&formula),
            &PlanContext::new("/usr/local"),
        )
        .unwrap();
        let json = plan.to_json();
        assert_eq!(json["name"], "postgis");
        assert_eq!(json["configure"]["args"][3], "--disable-nls");
    }
}
