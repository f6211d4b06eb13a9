// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use saucier::formula::{builtin, Formula};
use saucier::kitchen::{ExitResult, ExternalTool, Invocation};
use saucier::options::{OptionSet, Selection};
use saucier::plan::{BuildPlan, PlanContext};
use saucier::report::sample::{file_code, SHAPEFILE_FILE_CODE};
use saucier::resolver::TableRegistry;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;
use walkdir::WalkDir;

/// Perl helpers PostGIS ships in `utils/` but never installs
pub const UTILS: &[&str] = &[
    "create_undef.pl",
    "postgis_proc_upgrade.pl",
    "postgis_restore.pl",
    "profile_intersects.pl",
    "test_estimation.pl",
    "test_geography_estimation.pl",
    "test_geography_joinestimation.pl",
    "test_joinestimation.pl",
];

/// Stand-in for configure, make and the installed loader
///
/// Records every invocation. `make install DESTDIR=...` writes a PostGIS
/// shaped tree into the stage (raster bits only when configure was not told
/// `--without-raster`, the GUI loader only with `--with-gui`). Doc targets write their HTML into the source tree.
/// A program ending in `shp2pgsql` behaves like the loader: it checks the
/// shapefile header and prints SQL.
#[derive(Default)]
pub struct FakeBuild {
    pub calls: Mutex<Vec<Invocation>>,
    /// Any invocation with one of these as program or argument exits 2
    pub fail_on: Vec<String>,
    /// Leave headers out of the install
    pub skip_headers: bool,
}

impl FakeBuild {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(arg: &str) -> Self {
        Self {
            fail_on: vec![arg.to_string()],
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    /// Arguments passed to the configure script
    pub fn configure_args(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .find(|c| c.program.ends_with("configure"))
            .map(|c| c.args)
            .unwrap_or_default()
    }

    fn install(&self, destdir: &Path) -> std::io::Result<()> {
        let args = self.configure_args();
        let raster = !args.iter().any(|a| a == "--without-raster");
        let gui = args.iter().any(|a| a == "--with-gui");
        let local = destdir.join("usr/local");
        let pg = destdir.join("usr/local/opt/postgresql");

        let mut files = vec![
            local.join("bin/shp2pgsql"),
            local.join("bin/pgsql2shp"),
            local.join("lib/liblwgeom-2.4.0.so"),
            pg.join("lib/postgresql/postgis-2.4.so"),
            pg.join("share/postgresql/extension/postgis.control"),
            pg.join("share/postgresql/extension/postgis--2.4.2.sql"),
            pg.join("share/postgresql/contrib/postgis-2.4/postgis.sql"),
            pg.join("share/postgresql/contrib/postgis-2.4/spatial_ref_sys.sql"),
            pg.join("share/doc/postgresql/extension/README.postgis"),
        ];
        if !self.skip_headers {
            files.push(local.join("include/liblwgeom.h"));
        }
        if gui {
            files.push(local.join("bin/shp2pgsql-gui"));
        }
        if raster {
            files.push(local.join("bin/raster2pgsql"));
            files.push(pg.join("lib/postgresql/rtpostgis-2.4.so"));
        }

        for file in files {
            fs::create_dir_all(file.parent().unwrap())?;
            fs::write(&file, file.file_name().unwrap().to_string_lossy().as_bytes())?;
        }
        Ok(())
    }

    fn load_shapefile(&self, invocation: &Invocation) -> std::io::Result<ExitResult> {
        let bytes = fs::read(&invocation.args[0])?;
        if file_code(&bytes) != Some(SHAPEFILE_FILE_CODE) {
            return Ok(ExitResult {
                code: Some(1),
                stdout: String::new(),
                stderr: "Unable to open shapefile: wrong file code".to_string(),
            });
        }
        Ok(ExitResult {
            code: Some(0),
            stdout: "SET CLIENT_ENCODING TO UTF8;\n\
                     SELECT AddGeometryColumn('','brew','geom','0','POINT',4);\n\
                     INSERT INTO \"brew\" (\"first_fld\",\"second_fld\",geom) VALUES ('First','Point','...');\n"
                .to_string(),
            stderr: String::new(),
        })
    }
}

impl ExternalTool for FakeBuild {
    fn invoke(&self, invocation: &Invocation) -> saucier::Result<ExitResult> {
        self.calls.lock().unwrap().push(invocation.clone());

        let fails = self
            .fail_on
            .iter()
            .any(|f| &invocation.program == f || invocation.args.contains(f));
        if fails {
            return Ok(ExitResult {
                code: Some(2),
                stdout: String::new(),
                stderr: format!("make: *** [{}] Error 2", invocation.args.join(" ")),
            });
        }

        if invocation.program.ends_with("shp2pgsql") {
            return Ok(self.load_shapefile(invocation)?);
        }

        if let Some(destdir) = invocation.args.iter().find_map(|a| a.strip_prefix("DESTDIR=")) {
            self.install(Path::new(destdir))?;
        }
        if invocation.args.iter().any(|a| a == "chunked-html") {
            let html = invocation.cwd.join("html");
            fs::create_dir_all(&html)?;
            fs::write(html.join("index.html"), "<html/>")?;
        }
        if invocation.args.iter().any(|a| a == "doxygen") {
            let html = invocation.cwd.join("doxygen/html");
            fs::create_dir_all(&html)?;
            fs::write(html.join("index.html"), "<html/>")?;
        }

        Ok(ExitResult {
            code: Some(0),
            ..Default::default()
        })
    }
}

/// Unpacked PostGIS-like source tree
pub fn source_tree() -> TempDir {
    let dir = TempDir::new().unwrap();
    let utils = dir.path().join("utils");
    fs::create_dir_all(&utils).unwrap();
    for script in UTILS {
        fs::write(utils.join(script), "#!/usr/bin/perl\n").unwrap();
    }
    let man = dir.path().join("doc/man");
    fs::create_dir_all(&man).unwrap();
    fs::write(man.join("shp2pgsql.1"), ".TH SHP2PGSQL 1\n").unwrap();
    fs::write(dir.path().join("configure"), "#!/bin/sh\n").unwrap();
    dir
}

/// Registry with every PostGIS dependency under `/opt/<name>`
pub fn registry(formula: &Formula) -> TableRegistry {
    let mut registry = TableRegistry::new();
    for dep in &formula.dependencies {
        registry.insert(dep.name.as_str(), format!("/opt/{}", dep.name));
    }
    registry
}

/// Option set for the builtin PostGIS formula
pub fn postgis_options(formula: &Formula, selections: &[(&str, Selection)]) -> OptionSet {
    OptionSet::new(&formula.options, selections.iter().copied()).unwrap()
}

/// Plan the builtin PostGIS formula into `prefix`
pub fn postgis_plan(selections: &[(&str, Selection)], prefix: &Path) -> BuildPlan {
    let formula = builtin::postgis().unwrap();
    let options = postgis_options(&formula, selections);
    BuildPlan::compute(
        &formula,
        &options,
        &registry(&formula),
        &PlanContext::new(prefix).with_sysconfdir("/usr/local/etc"),
    )
    .unwrap()
}

/// Every file below `dir`, relative, sorted
pub fn files_under(dir: &Path) -> Vec<PathBuf> {
    if !dir.exists() {
        return Vec::new();
    }
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| !e.file_type().is_dir())
        .map(|e| e.path().strip_prefix(dir).unwrap().to_path_buf())
        .collect();
    files.sort();
    files
}
