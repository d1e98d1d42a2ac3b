//! Keel — a VHDL dependency analyzer and simulation driver.
//!
//! Given VHDL files and directories, Keel computes a compile order honoring
//! the language's defined-before-used rule and hands it to a target backend:
//! `dump` prints the order, `ghdl` compiles and runs the test suite with
//! GHDL, and `vsim` generates (or runs) a Modelsim-compatible TCL script.
//! Strictly included files are additionally checked against style rules, and
//! missing entities behind component declarations are rejected unless the
//! declaring file was included with black boxes allowed.

#![warn(missing_docs)]

mod error;
mod sources;

use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand, ValueEnum};
use keel_resolve::{compile_order, Analysis, CompileOrder, Mode, PatternSet, Registry};
use keel_target::ghdl::{GhdlOptions, IeeeLibrary};
use keel_target::vsim::VsimOptions;
use keel_target::{DumpTarget, GhdlTarget, OutputSink, RunContext, Target, VsimTarget};
use keel_common::VhdlVersion;

use error::CliError;
use sources::SpecKind;

/// Keel — VHDL dependency analyzer and simulation driver.
#[derive(Parser, Debug)]
#[command(name = "keel", version, about = "VHDL dependency analyzer and simulation driver")]
pub struct Cli {
    /// Print full error details instead of a one-line summary.
    #[arg(long, global = true)]
    pub debug: bool,

    /// The target backend to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available target backends.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write the compile order as generic `role lib version path` lines.
    Dump(DumpArgs),
    /// Compile the order and run the selected test cases with GHDL.
    Ghdl(GhdlArgs),
    /// Generate (or run) a Modelsim-compatible TCL regression script.
    Vsim(VsimArgs),
}

/// Arguments shared by every target.
#[derive(Args, Debug)]
pub struct CommonArgs {
    /// Top-level unit globs as [LIB.]NAME; all units when omitted.
    pub tops: Vec<String>,

    /// Includes VHDL files; spec is [[VERSION:]LIB:]PATH where PATH is a
    /// directory (recursive), a file, or a non-recursive glob.
    #[arg(short = 'i', long = "include", value_name = "spec")]
    pub include: Vec<String>,

    /// Like -i, but also enforces style rules: one design unit per file,
    /// package names end in _pkg, filename matches the unit name.
    #[arg(short = 'I', long = "strict", value_name = "spec")]
    pub strict: Vec<String>,

    /// Like -i, but components declared in these files may stay black
    /// boxes; useful for vendor libraries and Verilog interfaces.
    #[arg(short = 'x', long = "external", value_name = "spec")]
    pub external: Vec<String>,

    /// Preferred VHDL version (2- or 4-digit year, default 2008) used to
    /// pick between multiple version-tagged candidates.
    #[arg(short = 'd', long = "desired-version", value_name = "year")]
    pub desired_version: Option<VhdlVersion>,

    /// Required VHDL version; files tagged only for other versions are
    /// filtered out.
    #[arg(short = 'v', long = "required-version", value_name = "year")]
    pub required_version: Option<VhdlVersion>,

    /// Compilation mode controlling the .sim./.syn. filename filter.
    #[arg(short = 'm', long = "mode", value_enum, default_value_t = ModeArg::Sim)]
    pub mode: ModeArg,

    /// Output file; stdout when omitted.
    #[arg(short = 'o', long = "outfile", value_name = "file")]
    pub outfile: Option<PathBuf>,
}

/// Arguments for the `dump` target.
#[derive(Args, Debug)]
pub struct DumpArgs {
    /// Shared analysis arguments.
    #[command(flatten)]
    pub common: CommonArgs,
}

/// Arguments for the `ghdl` target.
#[derive(Args, Debug)]
pub struct GhdlArgs {
    /// Shared analysis arguments.
    #[command(flatten)]
    pub common: CommonArgs,

    /// Test-case patterns, applied in order; a leading ':' matches the file
    /// path, a leading '!' excludes matches. Default: *_tc.
    #[arg(short = 'p', long = "pattern", value_name = "pat")]
    pub patterns: Vec<String>,

    /// IEEE library implementation to compile against.
    #[arg(long, value_enum, default_value_t = IeeeArg::Synopsys)]
    pub ieee: IeeeArg,

    /// Disable debug symbols (-g0 instead of -g).
    #[arg(long)]
    pub no_debug: bool,

    /// Run in the current working directory instead of a temporary one.
    #[arg(long)]
    pub no_tempdir: bool,

    /// Run test cases in parallel with N workers, or one worker per case
    /// when N is omitted.
    #[arg(short = 'j', long = "jobs", value_name = "N", num_args = 0..=1, default_missing_value = "0")]
    pub jobs: Option<usize>,

    /// Capture waveform (*.vcd) files per test case into this directory.
    #[arg(short = 'w', long = "vcd-dir", value_name = "dir")]
    pub vcd_dir: Option<PathBuf>,
}

/// Arguments for the `vsim` target.
#[derive(Args, Debug)]
pub struct VsimArgs {
    /// Shared analysis arguments.
    #[command(flatten)]
    pub common: CommonArgs,

    /// Test-case patterns, applied in order; a leading ':' matches the file
    /// path, a leading '!' excludes matches. Default: *_tc.
    #[arg(short = 'p', long = "pattern", value_name = "pat")]
    pub patterns: Vec<String>,

    /// Write the TCL script to the output instead of running vsim.
    #[arg(long)]
    pub tcl: bool,

    /// Launch vsim in GUI mode instead of batch mode.
    #[arg(long)]
    pub gui: bool,

    /// Run in the current working directory instead of a temporary one.
    #[arg(long)]
    pub no_tempdir: bool,
}

/// Compilation mode filter.
#[derive(Clone, Copy, PartialEq, Eq, Debug, ValueEnum)]
pub enum ModeArg {
    /// Simulation: *.syn.* files are filtered out.
    Sim,
    /// Synthesis: *.sim.* files are filtered out.
    Syn,
    /// No mode filtering.
    All,
}

impl From<ModeArg> for Mode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Sim => Mode::Simulation,
            ModeArg::Syn => Mode::Synthesis,
            ModeArg::All => Mode::All,
        }
    }
}

/// IEEE library selection for the GHDL target.
#[derive(Clone, Copy, PartialEq, Eq, Debug, ValueEnum)]
pub enum IeeeArg {
    /// Standard-conformant IEEE library.
    Standard,
    /// Synopsys' IEEE library (default; more lenient in practice).
    Synopsys,
    /// Mentor's IEEE library.
    Mentor,
    /// No IEEE library.
    None,
}

impl From<IeeeArg> for IeeeLibrary {
    fn from(ieee: IeeeArg) -> Self {
        match ieee {
            IeeeArg::Standard => IeeeLibrary::Standard,
            IeeeArg::Synopsys => IeeeLibrary::Synopsys,
            IeeeArg::Mentor => IeeeLibrary::Mentor,
            IeeeArg::None => IeeeLibrary::None,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let debug = cli.debug;
    match run(cli.command) {
        Ok(code) => process::exit(code),
        Err(e) if e.is_interrupt() => {
            eprintln!("Interrupted.");
            process::exit(1);
        }
        Err(e) => {
            if debug {
                eprintln!("{e:?}");
            }
            eprintln!("{}: {}", e.kind(), e);
            process::exit(1);
        }
    }
}

/// Runs the selected target, returning its exit code.
fn run(command: Command) -> Result<i32, CliError> {
    match command {
        Command::Dump(args) => {
            let Some((registry, order)) = analyze(&args.common)? else {
                return Ok(0);
            };
            let sink = make_sink(&args.common)?;
            let ctx = RunContext {
                registry: &registry,
                order: &order,
                cases: &[],
            };
            Ok(DumpTarget.run(&ctx, &sink)?)
        }
        Command::Ghdl(args) => {
            let Some((registry, order)) = analyze(&args.common)? else {
                return Ok(0);
            };
            let cases = PatternSet::parse(&args.patterns)?.filter(&registry, &order);
            let sink = make_sink(&args.common)?;
            let target = GhdlTarget(GhdlOptions {
                ieee: args.ieee.into(),
                no_debug: args.no_debug,
                no_tempdir: args.no_tempdir,
                jobs: args.jobs,
                vcd_dir: args.vcd_dir,
            });
            let ctx = RunContext {
                registry: &registry,
                order: &order,
                cases: &cases,
            };
            Ok(target.run(&ctx, &sink)?)
        }
        Command::Vsim(args) => {
            let Some((registry, order)) = analyze(&args.common)? else {
                return Ok(0);
            };
            let cases = PatternSet::parse(&args.patterns)?.filter(&registry, &order);
            let sink = make_sink(&args.common)?;
            let target = VsimTarget(VsimOptions {
                tcl: args.tcl,
                gui: args.gui,
                no_tempdir: args.no_tempdir,
            });
            let ctx = RunContext {
                registry: &registry,
                order: &order,
                cases: &cases,
            };
            Ok(target.run(&ctx, &sink)?)
        }
    }
}

/// Scans the requested sources and computes the compile order.
///
/// Returns `None` (after a stderr warning) when no VHDL files were found at
/// all, which is not an error.
fn analyze(common: &CommonArgs) -> Result<Option<(Registry, CompileOrder)>, CliError> {
    let mut registry = Registry::new(
        common.mode.into(),
        common.desired_version,
        common.required_version,
    );

    let mut include = common.include.clone();
    if include.is_empty() && common.strict.is_empty() && common.external.is_empty() {
        eprintln!("Including the current working directory recursively by default...");
        include.push(".".to_string());
    }
    for spec in &include {
        sources::add_spec(&mut registry, spec, SpecKind::Include)?;
    }
    for spec in &common.strict {
        sources::add_spec(&mut registry, spec, SpecKind::Strict)?;
    }
    for spec in &common.external {
        sources::add_spec(&mut registry, spec, SpecKind::External)?;
    }

    if registry.is_empty() {
        eprintln!("Warning: no VHDL files found.");
        return Ok(None);
    }

    let order = {
        let mut analysis = Analysis::new(&registry);
        compile_order(&mut analysis, &common.tops)?
    };
    Ok(Some((registry, order)))
}

fn make_sink(common: &CommonArgs) -> Result<OutputSink, CliError> {
    match &common.outfile {
        Some(path) => Ok(OutputSink::to_file(path)?),
        None => Ok(OutputSink::stdout()),
    }
}
