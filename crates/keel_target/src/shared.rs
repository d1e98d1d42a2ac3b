//! Helpers shared by the runner backends: test-case preparation, result
//! classification, and the final summary.

use std::io;
use std::path::PathBuf;

use keel_common::TimeSpec;
use keel_resolve::{Registry, TestCase};

use crate::error::TargetError;
use crate::sink::OutputSink;

/// A test case with everything a runner needs resolved up front.
#[derive(Clone, Debug)]
pub struct PreparedCase {
    /// Library the test entity is compiled into.
    pub library: String,
    /// The test entity name.
    pub unit: String,
    /// Absolute path of the defining file.
    pub path: PathBuf,
    /// Directory of the defining file, used as the case's home directory in
    /// generated scripts.
    pub home: PathBuf,
    /// Simulated-time limit for the run.
    pub timeout: TimeSpec,
}

/// Resolves libraries, paths, and timeouts for the selected test cases.
///
/// A case without a timeout pragma gets the 1 ms default and a stderr
/// warning, since a too-short stop time silently truncates the simulation.
pub fn prepare_cases(registry: &Registry, cases: &[TestCase]) -> Vec<PreparedCase> {
    cases
        .iter()
        .map(|case| {
            let file = registry.file(case.file);
            let timeout = match &file.sim_timeout {
                Some(timeout) => timeout.clone(),
                None => {
                    eprintln!(
                        "Warning: no simulation timeout specified for {}.{}, defaulting to 1 ms.",
                        file.library, case.unit
                    );
                    eprintln!("Specify using \"-- pragma simulation timeout <VHDL timespec>\"");
                    TimeSpec::default_timeout()
                }
            };
            PreparedCase {
                library: file.library.clone(),
                unit: case.unit.clone(),
                path: file.path.clone(),
                home: file
                    .path
                    .parent()
                    .map(|p| p.to_path_buf())
                    .unwrap_or_else(|| PathBuf::from(".")),
                timeout,
            }
        })
        .collect()
}

/// Rejects selections with more than one test entity in the same file.
///
/// Runner backends elaborate one entity per file; a second entity in the
/// same file cannot be driven separately.
pub fn reject_multiple_cases_per_file(cases: &[PreparedCase]) -> Result<(), TargetError> {
    for (i, case) in cases.iter().enumerate() {
        if cases[..i].iter().any(|prev| prev.path == case.path) {
            return Err(TargetError::Config(format!(
                "test case runners do not support multiple test cases per VHDL file ({})",
                case.path.display()
            )));
        }
    }
    Ok(())
}

/// Classification of one executed test case, ordered best to worst.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum CaseStatus {
    /// The simulation ran to event starvation without failures.
    Passed,
    /// The simulation hit its simulated-time stop limit.
    Timeout,
    /// The simulation terminated with a failure.
    Failed,
    /// Elaboration failed; the case never ran.
    Error,
}

impl CaseStatus {
    /// Fixed-width label for summary lines.
    pub fn label(self) -> &'static str {
        match self {
            CaseStatus::Passed => "PASSED ",
            CaseStatus::Timeout => "TIMEOUT",
            CaseStatus::Failed => "FAILED ",
            CaseStatus::Error => "ERROR  ",
        }
    }

    /// Whether this status fails the suite.
    pub fn is_failure(self) -> bool {
        self != CaseStatus::Passed
    }
}

/// The executed outcome of one test case.
#[derive(Clone, Debug)]
pub struct CaseOutcome {
    /// The classification.
    pub status: CaseStatus,
    /// The case that ran.
    pub case: PreparedCase,
    /// Waveform file captured for the case, if any.
    pub vcd: Option<PathBuf>,
}

/// Writes the final summary, deterministically ordered by
/// (status, library, entity name). Returns whether the suite failed.
pub fn write_summary(sink: &OutputSink, outcomes: &[CaseOutcome]) -> io::Result<bool> {
    let mut sorted: Vec<&CaseOutcome> = outcomes.iter().collect();
    sorted.sort_by(|a, b| {
        (a.status, &a.case.library, &a.case.unit).cmp(&(b.status, &b.case.library, &b.case.unit))
    });
    sink.write_str("\nFinal summary:\n")?;
    let mut failed = false;
    for outcome in sorted {
        failed |= outcome.status.is_failure();
        sink.write_str(&format!(
            " * {} {}.{}\n",
            outcome.status.label(),
            outcome.case.library,
            outcome.case.unit
        ))?;
    }
    if failed {
        sink.write_str("Test suite FAILED\n")?;
    } else {
        sink.write_str("Test suite PASSED\n")?;
    }
    Ok(failed)
}
