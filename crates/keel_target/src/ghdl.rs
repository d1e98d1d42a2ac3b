//! GHDL runner backend.
//!
//! Analyzes the compile order with `ghdl -a`, then elaborates and runs each
//! selected test case, classifying results as passed, timeout, failed, or
//! error. Cases can run sequentially or on a worker pool; parallel cases get
//! private scratch directories wired to the shared library directory with
//! symlinks so GHDL's per-library artifact files are shared.

use std::fmt;
use std::path::{Path, PathBuf};

use keel_common::VhdlVersion;
use keel_resolve::{CompileOrder, Registry, TestCase};

use crate::error::TargetError;
use crate::exec::{run_tool, ToolOutput};
use crate::pool::{run_pool, CancelFlag};
use crate::shared::{
    prepare_cases, reject_multiple_cases_per_file, write_summary, CaseOutcome, CaseStatus,
    PreparedCase,
};
use crate::sink::OutputSink;

/// The IEEE library implementation GHDL compiles against.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum IeeeLibrary {
    /// The standard-conformant implementation.
    Standard,
    /// Synopsys' implementation; more lenient with real-world code.
    #[default]
    Synopsys,
    /// Mentor's implementation.
    Mentor,
    /// No IEEE library.
    None,
}

impl fmt::Display for IeeeLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IeeeLibrary::Standard => "standard",
            IeeeLibrary::Synopsys => "synopsys",
            IeeeLibrary::Mentor => "mentor",
            IeeeLibrary::None => "none",
        };
        f.write_str(name)
    }
}

/// Options for the GHDL backend.
#[derive(Clone, Debug, Default)]
pub struct GhdlOptions {
    /// IEEE library variant passed to `--ieee`.
    pub ieee: IeeeLibrary,
    /// Disable debug symbols (`-g0` instead of `-g`).
    pub no_debug: bool,
    /// Run in the current directory instead of a scratch directory.
    pub no_tempdir: bool,
    /// Parallel test-case execution: `Some(0)` means one worker per case,
    /// `Some(n)` a fixed pool of `n`, `None` sequential.
    pub jobs: Option<usize>,
    /// Capture a `<lib>.<unit>.vcd` waveform per test case in this
    /// directory.
    pub vcd_dir: Option<PathBuf>,
}

/// Runs the GHDL backend over the analysis result.
pub fn run(
    registry: &Registry,
    order: &CompileOrder,
    cases: &[TestCase],
    sink: &OutputSink,
    options: &GhdlOptions,
) -> Result<i32, TargetError> {
    let switches = common_switches(registry, order, options)?;

    // Scratch working directory holding the per-library artifact files.
    // The binding keeps the directory alive for the whole run.
    let _scratch;
    let workdir: PathBuf = if options.no_tempdir {
        std::env::current_dir()?
    } else {
        let scratch = tempfile::tempdir()?;
        let path = scratch.path().to_path_buf();
        _scratch = scratch;
        path
    };

    let vcd_dir = match &options.vcd_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            Some(std::fs::canonicalize(dir)?)
        }
        None => None,
    };

    // Analyze everything in compile order, continuing past failures so all
    // diagnostics surface in one run.
    let total = order.len();
    let mut analysis_failed = false;
    for (index, &id) in order.files().iter().enumerate() {
        let file = registry.file(id);
        sink.write_str(&format!(
            "Analyzing ({}/{}) {}...\n",
            index + 1,
            total,
            file.path.display()
        ))?;
        let mut args = vec!["-a".to_string()];
        args.extend(switches.iter().cloned());
        args.push(format!("--work={}", file.library));
        args.push(file.path.display().to_string());
        let output = run_tool(sink, "ghdl", &args, &workdir)?;
        if !output.success() {
            analysis_failed = true;
        }
    }
    if analysis_failed {
        sink.write_str("Analysis failed!\n")?;
        return Ok(2);
    }

    let prepared = prepare_cases(registry, cases);
    reject_multiple_cases_per_file(&prepared)?;

    let outcomes = match options.jobs {
        None => {
            let mut outcomes = Vec::with_capacity(prepared.len());
            for case in &prepared {
                outcomes.push(run_case(
                    sink,
                    case,
                    &workdir,
                    vcd_dir.as_deref(),
                    &switches,
                )?);
            }
            outcomes
        }
        Some(jobs) => {
            let jobs = if jobs == 0 { prepared.len() } else { jobs };
            let cancel = CancelFlag::for_interrupts();
            let results = run_pool(prepared, jobs, &cancel, |case| {
                run_case_buffered(sink, &case, &workdir, vcd_dir.as_deref(), &switches)
            });
            if cancel.is_cancelled() {
                return Err(TargetError::Interrupted);
            }
            results.into_iter().collect::<Result<Vec<_>, _>>()?
        }
    };

    let failed = write_summary(sink, &outcomes)?;
    Ok(if failed { 1 } else { 0 })
}

/// Builds the switch set shared by analyze, elaborate, and run.
///
/// GHDL cannot mix language versions in one run, so a mixed-version order is
/// rejected here, as is a version GHDL has no `--std` flag for.
fn common_switches(
    registry: &Registry,
    order: &CompileOrder,
    options: &GhdlOptions,
) -> Result<Vec<String>, TargetError> {
    let mut versions: Vec<VhdlVersion> = order
        .files()
        .iter()
        .map(|&id| registry.file(id).version)
        .collect();
    versions.sort();
    versions.dedup();
    if versions.len() > 1 {
        let listed: Vec<String> = versions.iter().map(|v| v.to_string()).collect();
        return Err(TargetError::Config(format!(
            "GHDL does not support mixing VHDL versions. Use the -v flag to \
             force one. The following versions were detected: {}",
            listed.join(", ")
        )));
    }
    let version = versions.first().copied().unwrap_or(VhdlVersion::V2008);
    let std_switch = std_switch(version)?;
    let debug = if options.no_debug { "-g0" } else { "-g" };
    Ok(vec![
        debug.to_string(),
        std_switch.to_string(),
        format!("--ieee={}", options.ieee),
    ])
}

fn std_switch(version: VhdlVersion) -> Result<&'static str, TargetError> {
    match version {
        VhdlVersion::V1987 => Ok("--std=87"),
        VhdlVersion::V1993 => Ok("--std=93c"),
        VhdlVersion::V2000 => Ok("--std=00"),
        VhdlVersion::V2002 => Ok("--std=02"),
        VhdlVersion::V2008 => Ok("--std=08"),
        other => Err(TargetError::Config(format!(
            "GHDL supports only the following versions: 1987, 1993, 2000, \
             2002, 2008; {other} was requested"
        ))),
    }
}

/// Elaborates and runs one test case, writing progress to `sink`.
fn run_case(
    sink: &OutputSink,
    case: &PreparedCase,
    workdir: &Path,
    vcd_dir: Option<&Path>,
    switches: &[String],
) -> Result<CaseOutcome, TargetError> {
    sink.write_str(&format!("Elaborating {}...\n", case.unit))?;
    let mut args = vec!["-e".to_string()];
    args.extend(switches.iter().cloned());
    args.push(format!("--work={}", case.library));
    args.push(case.unit.clone());
    let output = run_tool(sink, "ghdl", &args, workdir)?;
    if !output.success() {
        sink.write_str(&format!("Elaboration for {} failed!\n", case.unit))?;
        return Ok(CaseOutcome {
            status: CaseStatus::Error,
            case: case.clone(),
            vcd: None,
        });
    }

    sink.write_str(&format!("Running {}...\n", case.unit))?;
    let vcd = vcd_dir.map(|dir| dir.join(format!("{}.{}.vcd", case.library, case.unit)));
    let mut args = vec!["-r".to_string()];
    args.extend(switches.iter().cloned());
    args.push(format!("--work={}", case.library));
    args.push(case.unit.clone());
    args.push(format!("--stop-time={}", case.timeout.compact()));
    if let Some(vcd) = &vcd {
        args.push(format!("--vcd={}", vcd.display()));
    }
    let output = run_tool(sink, "ghdl", &args, workdir)?;
    Ok(CaseOutcome {
        status: classify(&output),
        case: case.clone(),
        vcd,
    })
}

/// Parallel variant of [`run_case`]: output is buffered per case and flushed
/// through the shared sink in one write, and the case runs in a private
/// scratch directory linked back to the shared library directory.
fn run_case_buffered(
    sink: &OutputSink,
    case: &PreparedCase,
    shared_dir: &Path,
    vcd_dir: Option<&Path>,
    switches: &[String],
) -> Result<CaseOutcome, TargetError> {
    let (buffer, contents) = OutputSink::memory();
    let guard = CaseWorkdir::create(shared_dir, &format!("{}.{}", case.library, case.unit))?;
    let result = run_case(&buffer, case, guard.path(), vcd_dir, switches);
    drop(guard);
    sink.write_str(&contents.contents())?;
    result
}

/// Classifies a `ghdl -r` invocation.
///
/// The simulated-time stop limit is reported in GHDL's output rather than
/// its exit code, so that is checked first.
fn classify(output: &ToolOutput) -> CaseStatus {
    if output.stdout.contains("simulation stopped by --stop-time") {
        CaseStatus::Timeout
    } else if !output.success() {
        CaseStatus::Failed
    } else {
        CaseStatus::Passed
    }
}

/// Scratch directory for one parallel case, populated with symlinks to the
/// shared library directory's artifact files. The directory and its links
/// are removed on drop, on every exit path.
#[derive(Debug)]
struct CaseWorkdir {
    dir: PathBuf,
}

impl CaseWorkdir {
    fn create(shared: &Path, label: &str) -> Result<Self, TargetError> {
        let dir = shared.join(format!("run.{label}"));
        // A pre-existing directory or link name is a hard error; silently
        // reusing it could mix artifacts between cases.
        std::fs::create_dir(&dir)?;
        let guard = Self { dir };
        for entry in std::fs::read_dir(shared)? {
            let entry = entry?;
            let source = entry.path();
            if source.is_dir() {
                continue;
            }
            let link = guard.dir.join(entry.file_name());
            #[cfg(unix)]
            std::os::unix::fs::symlink(&source, &link)?;
            #[cfg(not(unix))]
            std::fs::copy(&source, &link)?;
        }
        Ok(guard)
    }

    fn path(&self) -> &Path {
        &self.dir
    }
}

impl Drop for CaseWorkdir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.dir);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_resolve::{compile_order, Analysis, Mode};
    use keel_vhdl::{ExtractOptions, VhdlFile};
    use std::fs;
    use tempfile::TempDir;

    fn registry_with(dir: &TempDir, names: &[&str]) -> Registry {
        let mut registry = Registry::new(Mode::Simulation, None, None);
        for name in names {
            let path = dir.path().join(name);
            let unit = name.split('.').next().unwrap();
            fs::write(&path, format!("entity {unit} is end entity;")).unwrap();
            registry.insert(VhdlFile::parse(&path, ExtractOptions::default()).unwrap());
        }
        registry
    }

    fn order_of(registry: &Registry) -> CompileOrder {
        let mut analysis = Analysis::new(registry);
        compile_order(&mut analysis, &[]).unwrap()
    }

    #[test]
    fn std_switch_mapping() {
        assert_eq!(std_switch(VhdlVersion::V1987).unwrap(), "--std=87");
        assert_eq!(std_switch(VhdlVersion::V1993).unwrap(), "--std=93c");
        assert_eq!(std_switch(VhdlVersion::V2000).unwrap(), "--std=00");
        assert_eq!(std_switch(VhdlVersion::V2002).unwrap(), "--std=02");
        assert_eq!(std_switch(VhdlVersion::V2008).unwrap(), "--std=08");
        let err = std_switch(VhdlVersion::from_year(2019)).unwrap_err();
        assert!(err
            .to_string()
            .contains("GHDL supports only the following versions"));
    }

    #[test]
    fn mixed_versions_are_rejected() {
        let dir = TempDir::new().unwrap();
        let registry = registry_with(&dir, &["a.93.vhd", "b.08.vhd"]);
        let order = order_of(&registry);
        let err = common_switches(&registry, &order, &GhdlOptions::default()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("GHDL does not support mixing VHDL versions"));
        assert!(msg.contains("1993, 2008"));
    }

    #[test]
    fn uniform_version_produces_switches() {
        let dir = TempDir::new().unwrap();
        let registry = registry_with(&dir, &["a.vhd", "b.vhd"]);
        let order = order_of(&registry);
        let switches = common_switches(&registry, &order, &GhdlOptions::default()).unwrap();
        assert_eq!(switches, vec!["-g", "--std=08", "--ieee=synopsys"]);
    }

    #[test]
    fn no_debug_switch() {
        let dir = TempDir::new().unwrap();
        let registry = registry_with(&dir, &["a.vhd"]);
        let order = order_of(&registry);
        let options = GhdlOptions {
            no_debug: true,
            ieee: IeeeLibrary::Standard,
            ..GhdlOptions::default()
        };
        let switches = common_switches(&registry, &order, &options).unwrap();
        assert_eq!(switches, vec!["-g0", "--std=08", "--ieee=standard"]);
    }

    #[test]
    fn classify_prefers_timeout_over_exit_code() {
        let timeout = ToolOutput {
            code: 0,
            stdout: "foo\nsimulation stopped by --stop-time\n".to_string(),
            stderr: String::new(),
        };
        assert_eq!(classify(&timeout), CaseStatus::Timeout);
        let failed = ToolOutput {
            code: 1,
            stdout: "assertion failure\n".to_string(),
            stderr: String::new(),
        };
        assert_eq!(classify(&failed), CaseStatus::Failed);
        let passed = ToolOutput {
            code: 0,
            stdout: "done\n".to_string(),
            stderr: String::new(),
        };
        assert_eq!(classify(&passed), CaseStatus::Passed);
    }

    #[test]
    fn case_workdir_links_and_cleans_up() {
        let shared = TempDir::new().unwrap();
        fs::write(shared.path().join("work-obj08.cf"), "library data").unwrap();
        let run_dir;
        {
            let guard = CaseWorkdir::create(shared.path(), "work.test_tc").unwrap();
            run_dir = guard.path().to_path_buf();
            let linked = run_dir.join("work-obj08.cf");
            assert_eq!(fs::read_to_string(&linked).unwrap(), "library data");
        }
        assert!(!run_dir.exists());
        assert!(shared.path().join("work-obj08.cf").exists());
    }

    #[test]
    fn case_workdir_collision_is_an_error() {
        let shared = TempDir::new().unwrap();
        fs::create_dir(shared.path().join("run.work.test_tc")).unwrap();
        let err = CaseWorkdir::create(shared.path(), "work.test_tc").unwrap_err();
        assert!(matches!(err, TargetError::Io(_)));
    }
}
