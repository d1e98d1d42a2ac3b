//! Top-level error mapping for the `keel` binary.
//!
//! Every fallible layer keeps its own error type; this is the single place
//! they are gathered and converted into the driver's `Kind: message` summary
//! lines and process exit codes.

use keel_resolve::ResolveError;
use keel_target::TargetError;
use keel_vhdl::ExtractError;

/// Any failure the driver can encounter.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// A source file failed to extract.
    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// Dependency resolution or ordering failed.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// A backend could not be configured or driven.
    #[error(transparent)]
    Target(#[from] TargetError),

    /// A command-line argument was invalid.
    #[error("{0}")]
    Config(String),

    /// An I/O failure outside of file extraction.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// The error-kind label printed in front of the message.
    pub fn kind(&self) -> &'static str {
        match self {
            CliError::Extract(ExtractError::Io { .. }) | CliError::Io(_) => "IOError",
            CliError::Extract(ExtractError::Style(_)) => "StyleError",
            CliError::Resolve(ResolveError::Pattern { .. }) => "ConfigError",
            CliError::Resolve(_) => "ResolutionError",
            CliError::Target(TargetError::Config(_)) | CliError::Config(_) => "ConfigError",
            CliError::Target(TargetError::ToolMissing(_)) => "ToolError",
            CliError::Target(TargetError::Io(_)) => "IOError",
            CliError::Target(TargetError::Interrupted) => "Interrupted",
        }
    }

    /// Whether this is the user-interrupt pseudo-error.
    pub fn is_interrupt(&self) -> bool {
        matches!(self, CliError::Target(TargetError::Interrupted))
    }
}
