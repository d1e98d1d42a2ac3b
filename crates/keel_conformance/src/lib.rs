//! Conformance test helpers for the Keel analysis pipeline.
//!
//! Provides a temporary-directory fixture builder and a [`SourceSet`] that
//! runs the scan → resolve → order pipeline the way the CLI does, so
//! integration tests can assert on complete dump outputs, generated scripts,
//! and error messages.

#![warn(missing_docs)]

use std::error::Error;
use std::path::{Path, PathBuf};

use keel_common::VhdlVersion;
use keel_resolve::{compile_order, Analysis, CompileOrder, Mode, PatternSet, Registry, TestCase};
use keel_target::{dump, vsim, OutputSink};
use keel_vhdl::{ExtractOptions, VhdlFile};
use tempfile::TempDir;

/// A scratch directory of VHDL fixture files.
pub struct Project {
    dir: TempDir,
}

impl Project {
    /// Creates an empty fixture directory.
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("creating fixture directory"),
        }
    }

    /// Writes a fixture file; intermediate directories are created.
    pub fn file(&self, name: &str, contents: &str) -> &Self {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("creating fixture subdirectory");
        }
        std::fs::write(&path, contents).expect("writing fixture file");
        self
    }

    /// The fixture directory root.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// The canonical path of a fixture file, as dump output reports it.
    pub fn canonical(&self, name: &str) -> PathBuf {
        std::fs::canonicalize(self.dir.path().join(name)).expect("canonicalizing fixture path")
    }
}

impl Default for Project {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-directory inclusion options, mirroring one `-i`/`-I`/`-x` spec.
#[derive(Clone, Debug, Default)]
pub struct IncludeOptions {
    /// Destination library; `work` when empty.
    pub library: String,
    /// Version forced onto every file of the directory.
    pub override_version: Option<VhdlVersion>,
    /// Enforce style rules.
    pub strict: bool,
    /// Allow black-box components.
    pub allow_black_box: bool,
}

/// A registry under construction plus the pipeline steps over it.
pub struct SourceSet {
    registry: Registry,
}

impl SourceSet {
    /// Creates a source set with the given filter policy.
    pub fn new(
        mode: Mode,
        desired: Option<VhdlVersion>,
        required: Option<VhdlVersion>,
    ) -> Self {
        Self {
            registry: Registry::new(mode, desired, required),
        }
    }

    /// A source set with the default policy (simulation mode, VHDL-2008).
    pub fn with_defaults() -> Self {
        Self::new(Mode::Simulation, None, None)
    }

    /// Recursively adds every `*.vhd`/`*.vhdl` file under `dir`.
    pub fn add_dir(&mut self, dir: &Path, options: &IncludeOptions) -> Result<(), Box<dyn Error>> {
        let mut files = Vec::new();
        collect(dir, &mut files)?;
        files.sort();
        for path in files {
            let library = if options.library.is_empty() {
                "work".to_string()
            } else {
                options.library.clone()
            };
            let file = VhdlFile::parse(
                &path,
                ExtractOptions {
                    library,
                    override_version: options.override_version,
                    desired_version: self.registry.desired_version(),
                    strict: options.strict,
                    allow_black_box: options.allow_black_box,
                },
            )?;
            self.registry.insert(file);
        }
        Ok(())
    }

    /// The registry built so far.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Computes the compile order for the given root globs.
    pub fn order(&self, tops: &[&str]) -> Result<CompileOrder, Box<dyn Error>> {
        let tops: Vec<String> = tops.iter().map(|t| t.to_string()).collect();
        let mut analysis = Analysis::new(&self.registry);
        Ok(compile_order(&mut analysis, &tops)?)
    }

    /// Runs the dump backend and returns its complete output.
    pub fn dump(&self, tops: &[&str]) -> Result<String, Box<dyn Error>> {
        let order = self.order(tops)?;
        let (sink, contents) = OutputSink::memory();
        dump::run(&self.registry, &order, &sink)?;
        Ok(contents.contents())
    }

    /// Selects test cases with the given patterns over the ordered tops.
    pub fn test_cases(
        &self,
        tops: &[&str],
        patterns: &[&str],
    ) -> Result<Vec<TestCase>, Box<dyn Error>> {
        let order = self.order(tops)?;
        let patterns: Vec<String> = patterns.iter().map(|p| p.to_string()).collect();
        Ok(PatternSet::parse(&patterns)?.filter(&self.registry, &order))
    }

    /// Names of the selected test-case entities, for compact assertions.
    pub fn test_case_units(
        &self,
        tops: &[&str],
        patterns: &[&str],
    ) -> Result<Vec<String>, Box<dyn Error>> {
        Ok(self
            .test_cases(tops, patterns)?
            .into_iter()
            .map(|tc| tc.unit)
            .collect())
    }

    /// Generates the vsim TCL script for the given patterns.
    pub fn vsim_script(&self, patterns: &[&str]) -> Result<String, Box<dyn Error>> {
        let order = self.order(&[])?;
        let cases = self.test_cases(&[], patterns)?;
        Ok(vsim::generate_script(&self.registry, &order, &cases)?)
    }
}

fn collect(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), Box<dyn Error>> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect(&path, files)?;
        } else {
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .map(str::to_lowercase)
                .unwrap_or_default();
            if name.ends_with(".vhd") || name.ends_with(".vhdl") {
                files.push(path);
            }
        }
    }
    Ok(())
}

/// Convenience: builds a default source set over one fixture project.
pub fn analyze_project(project: &Project) -> SourceSet {
    let mut set = SourceSet::with_defaults();
    set.add_dir(project.path(), &IncludeOptions::default())
        .expect("adding fixture directory");
    set
}
