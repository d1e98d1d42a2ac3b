//! Simulator backends for Keel.
//!
//! A backend consumes a validated, ordered, and filtered analysis result —
//! the compile order plus the selected test cases — and performs the rest:
//! dumping the order, driving GHDL, or emitting and launching a
//! Modelsim-compatible TCL script. The [`Target`] trait is the contract;
//! the analysis core makes no assumptions beyond it.

#![warn(missing_docs)]

pub mod dump;
pub mod error;
mod exec;
pub mod ghdl;
mod pool;
pub mod shared;
pub mod sink;
pub mod vsim;

use keel_resolve::{CompileOrder, Registry, TestCase};

pub use error::TargetError;
pub use sink::{MemorySink, OutputSink};

/// Everything a backend receives from the analysis core.
pub struct RunContext<'a> {
    /// The populated file registry.
    pub registry: &'a Registry,
    /// The dependency-first compile order with top-level marking.
    pub order: &'a CompileOrder,
    /// The selected test cases, in deterministic order.
    pub cases: &'a [TestCase],
}

/// The backend contract: run against an analysis result, write transcripts
/// to the sink, and return a process exit code.
///
/// Exit code conventions: 0 for success, 1 for a failing test suite, 2 for
/// an external-tool analysis failure. Configuration problems are errors, not
/// exit codes.
pub trait Target {
    /// Runs the backend.
    fn run(&self, ctx: &RunContext<'_>, sink: &OutputSink) -> Result<i32, TargetError>;
}

/// Compile-order dump backend.
pub struct DumpTarget;

impl Target for DumpTarget {
    fn run(&self, ctx: &RunContext<'_>, sink: &OutputSink) -> Result<i32, TargetError> {
        dump::run(ctx.registry, ctx.order, sink)
    }
}

/// GHDL analyze/elaborate/run backend.
pub struct GhdlTarget(pub ghdl::GhdlOptions);

impl Target for GhdlTarget {
    fn run(&self, ctx: &RunContext<'_>, sink: &OutputSink) -> Result<i32, TargetError> {
        ghdl::run(ctx.registry, ctx.order, ctx.cases, sink, &self.0)
    }
}

/// Modelsim/Questasim TCL backend.
pub struct VsimTarget(pub vsim::VsimOptions);

impl Target for VsimTarget {
    fn run(&self, ctx: &RunContext<'_>, sink: &OutputSink) -> Result<i32, TargetError> {
        vsim::run(ctx.registry, ctx.order, ctx.cases, sink, &self.0)
    }
}
