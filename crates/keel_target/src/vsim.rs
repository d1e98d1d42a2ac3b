//! Modelsim/Questasim backend.
//!
//! Generates a TCL driver script that compiles the ordered sources and runs
//! every selected test case as a regression, then either writes the script
//! to the output sink (`--tcl`) or feeds it to `vsim` in batch or GUI mode.
//! Test cases are expected to finish by event starvation on success and with
//! a `severity failure` report or a simulated-time timeout on failure, which
//! the script turns into vsim's exit status in batch mode.

use std::path::PathBuf;

use keel_common::VhdlVersion;
use keel_resolve::{CompileOrder, Registry, TestCase};

use crate::error::TargetError;
use crate::exec::{run_tool, run_tool_with_stdin};
use crate::shared::{prepare_cases, reject_multiple_cases_per_file};
use crate::sink::OutputSink;

/// Options for the vsim backend.
#[derive(Clone, Debug, Default)]
pub struct VsimOptions {
    /// Write the TCL script to the output sink instead of running vsim.
    pub tcl: bool,
    /// Launch vsim in GUI mode instead of batch mode.
    pub gui: bool,
    /// Run in the current directory instead of a scratch directory.
    pub no_tempdir: bool,
}

const TCL_PRELUDE: &str = r#"set sources [list]
set test_cases [list]
set libs [list]

# Registers a source file for compilation into the given library.
proc add_source {fname lib flags} {
  global sources libs
  if {[lsearch $libs $lib] == -1} {
    vlib $lib
    lappend libs $lib
  }
  lappend sources [dict create fname $fname lib $lib flags $flags]
}

# Compiles all registered sources in registration order.
proc compile_sources {} {
  global sources
  foreach source $sources {
    dict with source {
      echo "Compiling (-work $lib $flags):" [file tail $fname]
      eval vcom "-quiet -work $lib $flags $fname"
    }
  }
}

# Registers a test case to be run by run_all.
proc add_test {lib unit workdir timeout} {
  global test_cases
  lappend test_cases [dict create \
    lib $lib unit $unit workdir $workdir timeout $timeout]
}

# Runs one test case dict; returns passed, failed, or timeout.
proc run_test {test_case} {
  global StdArithNoWarnings StdNumNoWarnings NumericStdNoWarnings
  set result unknown
  set libdir [pwd]
  dict with test_case {
    cd $workdir
    vsim -novopt -assertdebug $lib.$unit
    set StdArithNoWarnings 1
    set StdNumNoWarnings 1
    set NumericStdNoWarnings 1
    # Run until failure report, event starvation, or timeout. A failure
    # breaks, which must not kill this script.
    onbreak resume
    run $timeout
    set status1 [runStatus -full]
    run -step
    onbreak ""
    set status2 [runStatus -full]
    quit -sim
    if {$status2 eq "ready end"} {
      set result passed
    } elseif {$status1 eq "break simulation_stop"} {
      set result failed
    } else {
      set result timeout
    }
  }
  cd $libdir
  return $result
}

# Compiles everything and runs the registered regression.
proc run_all {} {
  global test_cases
  compile_sources
  set passes 0
  set fails 0
  foreach test_case $test_cases {
    set result [run_test $test_case]
    dict with test_case {
      if {$result eq "passed"} {
        echo "PASSED $lib.$unit"
        incr passes
      } else {
        echo "[string toupper $result] $lib.$unit"
        incr fails
      }
    }
  }
  echo "$passes/[llength $test_cases] test(s) passed"
  if {[batch_mode]} {
    if {$fails > 0} {
      exit -code 1
    }
    exit -code 0
  }
}

"#;

/// Runs the vsim backend over the analysis result.
pub fn run(
    registry: &Registry,
    order: &CompileOrder,
    cases: &[TestCase],
    sink: &OutputSink,
    options: &VsimOptions,
) -> Result<i32, TargetError> {
    let prepared = prepare_cases(registry, cases);
    let script = script_for(registry, order, &prepared)?;
    if options.tcl {
        sink.write_str(&script)?;
        return Ok(0);
    }

    reject_multiple_cases_per_file(&prepared)?;

    let _scratch;
    let workdir: PathBuf = if options.no_tempdir {
        std::env::current_dir()?
    } else {
        let scratch = tempfile::tempdir()?;
        let path = scratch.path().to_path_buf();
        _scratch = scratch;
        path
    };
    let script_path = workdir.join("vsim.do");
    std::fs::write(&script_path, &script)?;

    let result = if options.gui {
        run_tool(
            sink,
            "vsim",
            &["-do".to_string(), "vsim.do".to_string()],
            &workdir,
        )
    } else {
        run_tool_with_stdin(sink, "vsim", &[], &workdir, &script_path)
    };
    let output = result.map_err(|e| match e {
        TargetError::ToolMissing(_) => {
            TargetError::ToolMissing("no vsim-compatible simulator was found".to_string())
        }
        other => other,
    })?;
    Ok(output.code)
}

/// Generates the TCL driver script for the given order and test cases.
pub fn generate_script(
    registry: &Registry,
    order: &CompileOrder,
    cases: &[TestCase],
) -> Result<String, TargetError> {
    script_for(registry, order, &prepare_cases(registry, cases))
}

fn script_for(
    registry: &Registry,
    order: &CompileOrder,
    cases: &[crate::shared::PreparedCase],
) -> Result<String, TargetError> {
    let mut script = String::from(TCL_PRELUDE);
    for &id in order.files() {
        let file = registry.file(id);
        let flags = vcom_version_flag(file.version)?;
        script.push_str(&format!(
            "add_source {{{}}} {{{}}} {{{}}}\n",
            file.path.display(),
            file.library,
            flags
        ));
    }
    for case in cases {
        script.push_str(&format!(
            "add_test {} {} \"{}\" \"{}\"\n",
            case.library,
            case.unit,
            case.home.display(),
            case.timeout
        ));
    }
    script.push_str("run_all\n");
    Ok(script)
}

/// Maps a language version to the vcom standard-selection flag.
fn vcom_version_flag(version: VhdlVersion) -> Result<&'static str, TargetError> {
    let year = version.year();
    if year <= 1987 {
        Ok("-87")
    } else if year <= 1993 {
        Ok("-93")
    } else if year <= 2002 {
        Ok("-2002")
    } else if year <= 2008 {
        Ok("-2008")
    } else {
        Err(TargetError::Config(format!(
            "VHDL version {year} is not supported"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_resolve::{compile_order, Analysis, Mode, PatternSet};
    use keel_vhdl::{ExtractOptions, VhdlFile};
    use std::fs;
    use tempfile::TempDir;

    fn analyze(dir: &TempDir, files: &[(&str, String)]) -> (Registry, CompileOrder) {
        let mut registry = Registry::new(Mode::Simulation, None, None);
        for (name, contents) in files {
            let path = dir.path().join(name);
            fs::write(&path, contents).unwrap();
            registry.insert(VhdlFile::parse(&path, ExtractOptions::default()).unwrap());
        }
        let order = {
            let mut analysis = Analysis::new(&registry);
            compile_order(&mut analysis, &[]).unwrap()
        };
        (registry, order)
    }

    #[test]
    fn version_flag_mapping() {
        assert_eq!(vcom_version_flag(VhdlVersion::V1987).unwrap(), "-87");
        assert_eq!(vcom_version_flag(VhdlVersion::V1993).unwrap(), "-93");
        assert_eq!(vcom_version_flag(VhdlVersion::V2002).unwrap(), "-2002");
        assert_eq!(vcom_version_flag(VhdlVersion::V2008).unwrap(), "-2008");
        let err = vcom_version_flag(VhdlVersion::from_year(2012)).unwrap_err();
        assert_eq!(err.to_string(), "VHDL version 2012 is not supported");
    }

    #[test]
    fn script_contains_sources_and_tests() {
        let dir = TempDir::new().unwrap();
        let (registry, order) = analyze(
            &dir,
            &[
                (
                    "test_tc.vhd",
                    "-- pragma simulation timeout 3 ms\nentity test_tc is end entity;".to_string(),
                ),
                ("dep.vhd", "entity dep is end entity;".to_string()),
            ],
        );
        let cases = PatternSet::parse(&[]).unwrap().filter(&registry, &order);
        let script = generate_script(&registry, &order, &cases).unwrap();
        assert!(script.contains("proc add_source"));
        assert!(script.contains("} {work} {-2008}\n"));
        assert!(script.contains("test_tc.vhd"));
        assert!(script.contains("dep.vhd"));
        assert!(script.contains("add_test work test_tc "));
        assert!(script.contains("\"3 ms\""));
        assert!(script.ends_with("run_all\n"));
    }

    #[test]
    fn script_uses_per_file_version_flags() {
        let dir = TempDir::new().unwrap();
        let (registry, order) = analyze(
            &dir,
            &[
                ("foo_tc.93.vhd", "entity foo_tc is end entity;".to_string()),
                ("bar_tc.08.vhd", "entity bar_tc is end entity;".to_string()),
            ],
        );
        let script = generate_script(&registry, &order, &[]).unwrap();
        assert!(script.contains("foo_tc.93.vhd} {work} {-93}"));
        assert!(script.contains("bar_tc.08.vhd} {work} {-2008}"));
    }

    #[test]
    fn unsupported_version_is_config_error() {
        let dir = TempDir::new().unwrap();
        let (registry, order) = analyze(
            &dir,
            &[("a.12.vhd", "entity a is end entity;".to_string())],
        );
        let err = generate_script(&registry, &order, &[]).unwrap_err();
        assert!(err.to_string().contains("VHDL version 2012 is not supported"));
    }

    #[test]
    fn tcl_mode_writes_to_sink() {
        let dir = TempDir::new().unwrap();
        let (registry, order) = analyze(
            &dir,
            &[("a_tc.vhd", "entity a_tc is end entity;".to_string())],
        );
        let cases = PatternSet::parse(&[]).unwrap().filter(&registry, &order);
        let (sink, handle) = OutputSink::memory();
        let code = run(
            &registry,
            &order,
            &cases,
            &sink,
            &VsimOptions {
                tcl: true,
                ..VsimOptions::default()
            },
        )
        .unwrap();
        assert_eq!(code, 0);
        assert!(handle.contents().contains("add_source"));
        assert!(handle.contents().contains("a_tc"));
    }
}
