//! # Infra-Common
//!
//! Shared infrastructure for the pjtune binaries:
//!
//! - `logging`: tracing subscriber setup
//! - `settings`: layered settings loading (defaults, TOML file, environment)
//! - `errors`: the error type shared by the above

pub mod errors;
pub mod logging;
pub mod settings;

pub use errors::{Error, Result};
pub use logging::{setup_logging, LoggingConfig, LoggingSettings};
pub use settings::{load_settings, ENV_PREFIX};
