//! Subprocess plumbing for external tools.

use std::path::Path;
use std::process::{Command, Stdio};

use crate::error::TargetError;
use crate::sink::OutputSink;

/// Captured result of one tool invocation.
#[derive(Debug)]
pub struct ToolOutput {
    /// Process exit code; termination by signal maps to 1.
    pub code: i32,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl ToolOutput {
    /// Whether the tool exited successfully.
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// Runs a tool in `workdir`, forwarding its captured output to the sink.
pub fn run_tool(
    sink: &OutputSink,
    program: &str,
    args: &[String],
    workdir: &Path,
) -> Result<ToolOutput, TargetError> {
    run_tool_inner(sink, program, args, workdir, None)
}

/// Like [`run_tool`], feeding the given file to the tool's standard input.
pub fn run_tool_with_stdin(
    sink: &OutputSink,
    program: &str,
    args: &[String],
    workdir: &Path,
    stdin: &Path,
) -> Result<ToolOutput, TargetError> {
    run_tool_inner(sink, program, args, workdir, Some(stdin))
}

fn run_tool_inner(
    sink: &OutputSink,
    program: &str,
    args: &[String],
    workdir: &Path,
    stdin: Option<&Path>,
) -> Result<ToolOutput, TargetError> {
    let mut command = Command::new(program);
    command
        .args(args)
        .current_dir(workdir)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    match stdin {
        Some(path) => {
            command.stdin(std::fs::File::open(path)?);
        }
        None => {
            command.stdin(Stdio::null());
        }
    }
    let output = command.output().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            TargetError::ToolMissing(format!("{program} was not found"))
        } else {
            TargetError::Io(e)
        }
    })?;
    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    sink.write_str(&stdout)?;
    sink.write_str(&stderr)?;
    Ok(ToolOutput {
        code: output.status.code().unwrap_or(1),
        stdout,
        stderr,
    })
}
