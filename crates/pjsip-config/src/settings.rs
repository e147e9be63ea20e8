//! The `[asterisk]` settings section, shared by the pjtune binaries

use crate::paths::{PjsipPaths, DEFAULT_CONF_DIR};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AsteriskSettings {
    /// Directory holding `pjsip.conf`, the section files and `extensions.conf`
    pub conf_dir: PathBuf,
    /// Asterisk binary used for `-rx` commands
    pub cli_bin: String,
    /// Program and arguments that make the server reload its configuration
    pub reload_command: Vec<String>,
}

impl Default for AsteriskSettings {
    fn default() -> Self {
        Self {
            conf_dir: PathBuf::from(DEFAULT_CONF_DIR),
            cli_bin: "asterisk".to_string(),
            reload_command: vec![
                "asterisk".to_string(),
                "-rx".to_string(),
                "core reload".to_string(),
            ],
        }
    }
}

impl AsteriskSettings {
    pub fn paths(&self) -> PjsipPaths {
        PjsipPaths::in_dir(&self.conf_dir)
    }
}
