//! Error types for backend execution.

/// Errors raised while configuring or driving a simulator backend.
///
/// Tool *failures* (a failing analysis or test case) are reported through
/// exit codes, not through this type; these errors cover problems that
/// prevent the backend from running at all.
#[derive(Debug, thiserror::Error)]
pub enum TargetError {
    /// The inputs cannot be driven by this backend (mixed or unsupported
    /// versions, unsupported test-case shapes, bad flags).
    #[error("{0}")]
    Config(String),

    /// The external tool binary is not available.
    #[error("{0}")]
    ToolMissing(String),

    /// Writing to the output sink or managing scratch directories failed.
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// The run was cancelled by a user interrupt.
    #[error("interrupted")]
    Interrupted,
}
