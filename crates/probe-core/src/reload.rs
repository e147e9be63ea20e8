//! Signalling the telephony server to re-read its configuration

use crate::error::Result;
use crate::runner::{display_command, CommandRunner};
use std::sync::Arc;
use tracing::info;

/// Runs the configured reload command; its output is not interpreted
pub struct ReloadTrigger {
    runner: Arc<dyn CommandRunner>,
    program: String,
    args: Vec<String>,
}

impl ReloadTrigger {
    pub fn new(runner: Arc<dyn CommandRunner>, program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            runner,
            program: program.into(),
            args,
        }
    }

    pub fn command_line(&self) -> String {
        display_command(&self.program, &self.args)
    }

    /// Run the reload command; a non-zero exit is an error
    pub async fn reload(&self) -> Result<()> {
        self.runner
            .run(&self.program, &self.args)
            .await?
            .into_success(&self.program)?;
        info!(command = %self.command_line(), "configuration reload signalled");
        Ok(())
    }
}
