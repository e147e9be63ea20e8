//! Locations of the PJSIP configuration files

use std::path::{Path, PathBuf};

pub const DEFAULT_CONF_DIR: &str = "/etc/asterisk";

pub const MAIN_FILE: &str = "pjsip.conf";
pub const AOR_FILE: &str = "pjsip_aor.conf";
pub const AUTH_FILE: &str = "pjsip_auth.conf";
pub const ENDPOINT_FILE: &str = "pjsip_endpoints.conf";
pub const EXTENSIONS_FILE: &str = "extensions.conf";

/// Paths of the five files the store reads and writes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PjsipPaths {
    /// `pjsip.conf`: transport section plus `#include`s of the three section files
    pub main: PathBuf,
    /// Contact (AOR) sections
    pub aor: PathBuf,
    /// Credential sections
    pub auth: PathBuf,
    /// Endpoint sections
    pub endpoint: PathBuf,
    /// Dial-plan with the managed region
    pub extensions: PathBuf,
}

impl PjsipPaths {
    /// Standard file names inside `dir`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            main: dir.join(MAIN_FILE),
            aor: dir.join(AOR_FILE),
            auth: dir.join(AUTH_FILE),
            endpoint: dir.join(ENDPOINT_FILE),
            extensions: dir.join(EXTENSIONS_FILE),
        }
    }

    /// The three section files, in the order they are persisted
    pub fn section_files(&self) -> [&Path; 3] {
        [&self.aor, &self.auth, &self.endpoint]
    }
}

impl Default for PjsipPaths {
    fn default() -> Self {
        Self::in_dir(DEFAULT_CONF_DIR)
    }
}
