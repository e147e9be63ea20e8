//! Failures of the external tools (asterisk CLI, iperf3, reload command)

use thiserror::Error;

/// Result type alias for external tool invocations
pub type Result<T> = std::result::Result<T, ProbeError>;

#[derive(Debug, Error)]
pub enum ProbeError {
    /// The binary is not installed or not on the PATH
    #[error("{program} not found")]
    ToolNotFound { program: String },

    /// The process could not be started
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The process ran but reported failure
    #[error("{program} exited with status {code:?}: {stderr}")]
    NonZeroExit {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    /// The process succeeded but its output did not have the expected shape
    #[error("unexpected output from {program}: {reason}")]
    UnexpectedOutput { program: String, reason: String },

    /// The throughput unit on the summary line is not one we can convert
    #[error("unrecognized bandwidth unit {0}")]
    UnknownUnit(String),
}
