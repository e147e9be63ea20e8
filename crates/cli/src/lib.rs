//! # PJSIP Manager
//!
//! Command-line management of PJSIP users: `add`, `edit`, `del` and `show`.
//! Each command loads the configuration store, applies one change and writes
//! it back. The server is not reloaded.

pub mod args;
pub mod commands;
pub mod settings;

pub use args::{Cli, Command, DEFAULT_ADD_CODECS};
pub use commands::{execute, Outcome};
pub use settings::ManagerSettings;
