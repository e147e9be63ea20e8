//! The part of the shared settings file the management tool reads

use anyhow::{Context, Result};
use infra_common::{load_settings, LoggingSettings, ENV_PREFIX};
use pjsip_config::AsteriskSettings;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// `[asterisk]` and `[logging]`; other sections of the file are ignored
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerSettings {
    pub asterisk: AsteriskSettings,
    pub logging: LoggingSettings,
}

impl ManagerSettings {
    /// Defaults, then `file` (if given), then `PJTUNE__*` environment variables
    pub fn load(file: Option<&Path>) -> Result<Self> {
        load_settings(file, ENV_PREFIX).context("loading settings")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    #[test]
    fn reads_asterisk_section_of_a_shared_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[asterisk]\nconf_dir = \"/srv/asterisk\"\n\n[probe]\nduration_secs = 5\n\n[schedule]\nper_endpoint_secs = 120"
        )
        .unwrap();

        let settings = ManagerSettings::load(Some(file.path())).unwrap();
        assert_eq!(settings.asterisk.conf_dir, PathBuf::from("/srv/asterisk"));
        assert_eq!(settings.asterisk.cli_bin, "asterisk");
        assert_eq!(settings.logging, LoggingSettings::default());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(ManagerSettings::load(Some(Path::new("/nonexistent/pjtune.toml"))).is_err());
    }
}
