//! The management operations, run against the configuration store

use crate::args::{Cli, Command};
use anyhow::{Context, Result};
use crate::settings::ManagerSettings;
use pjsip_config::{ensure_config_files, CodecList, PjsipConfigStore, ShowReport};
use std::path::PathBuf;
use tracing::info;

/// What a successful command did
#[derive(Debug, Clone)]
pub enum Outcome {
    Added(String),
    Updated(String),
    Deleted(String),
    Shown(ShowReport),
}

impl Cli {
    /// Effective settings: defaults, the settings file, the environment, then flags.
    ///
    /// Logging is quiet (`warn`) unless `--verbose` is given.
    pub fn settings(&self) -> Result<ManagerSettings> {
        let mut settings = ManagerSettings::load(self.config.as_deref())?;
        if let Some(dir) = &self.conf_dir {
            settings.asterisk.conf_dir = dir.clone();
        }
        settings.logging.level = if self.verbose { "debug" } else { "warn" }.to_string();
        Ok(settings)
    }
}

/// Run `command` against the files under `conf_dir`.
///
/// Missing configuration files are created first. Changes are written only
/// when the command succeeds.
pub fn execute(command: &Command, conf_dir: impl Into<PathBuf>) -> Result<Outcome> {
    let conf_dir = conf_dir.into();
    let paths = pjsip_config::PjsipPaths::in_dir(&conf_dir);

    let created = ensure_config_files(&paths)
        .with_context(|| format!("preparing {}", conf_dir.display()))?;
    for path in &created {
        info!(path = %path.display(), "created configuration file");
    }

    let mut store = PjsipConfigStore::open(&paths)?;

    let outcome = match command {
        Command::Add {
            extension,
            password,
            codecs,
        } => {
            let codecs = CodecList::parse(codecs)?;
            store.add_user(extension, password, Some(&codecs))?;
            Outcome::Added(extension.clone())
        }
        Command::Edit {
            extension,
            password,
            codecs,
        } => {
            let codecs = codecs.as_deref().map(CodecList::parse).transpose()?;
            store.edit_user(extension, password.as_deref(), codecs.as_ref())?;
            Outcome::Updated(extension.clone())
        }
        Command::Del { extension } => {
            store.delete_user(extension)?;
            Outcome::Deleted(extension.clone())
        }
        Command::Show { extension } => Outcome::Shown(store.show_user(extension.as_deref())),
    };

    store.persist()?;
    Ok(outcome)
}
