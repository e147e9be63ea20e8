//! Error types for the optimizer

use thiserror::Error;

/// Result type alias for optimizer operations
pub type Result<T> = std::result::Result<T, OptimizerError>;

#[derive(Debug, Error)]
pub enum OptimizerError {
    /// Reading or writing the PJSIP configuration failed
    #[error("Configuration store error: {0}")]
    Store(#[from] pjsip_config::ConfigStoreError),

    /// An external tool failed where the failure cannot be tolerated
    #[error("External tool error: {0}")]
    Tool(#[from] probe_core::ProbeError),

    /// Settings are missing or inconsistent
    #[error("Settings error: {0}")]
    Settings(String),
}

impl From<infra_common::Error> for OptimizerError {
    fn from(err: infra_common::Error) -> Self {
        OptimizerError::Settings(err.to_string())
    }
}
