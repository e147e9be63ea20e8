//! The narrow seam between parsing logic and real processes.
//!
//! Everything that shells out goes through [`CommandRunner`], so discovery and
//! probe parsing can be tested against fixture text with a scripted runner.

use crate::error::{ProbeError, Result};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Captured result of one process run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    /// A successful run that printed `stdout`
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code: Some(0),
        }
    }

    /// A run that exited with `code` and printed `stderr`
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            exit_code: Some(code),
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Turn a non-zero exit into [`ProbeError::NonZeroExit`]
    pub fn into_success(self, program: &str) -> Result<Self> {
        if self.success() {
            Ok(self)
        } else {
            Err(ProbeError::NonZeroExit {
                program: program.to_string(),
                code: self.exit_code,
                stderr: self.stderr.trim().to_string(),
            })
        }
    }
}

/// Runs an external program to completion and captures its output.
///
/// No timeout is applied here; a program that never exits blocks the caller.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput>;
}

/// [`CommandRunner`] backed by real child processes
#[derive(Debug, Clone, Default)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        debug!(command = %display_command(program, args), "running external command");

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| match source.kind() {
                ErrorKind::NotFound => ProbeError::ToolNotFound {
                    program: program.to_string(),
                },
                _ => ProbeError::Spawn {
                    program: program.to_string(),
                    source,
                },
            })?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        })
    }
}

/// Shell-like rendering of a command line, for logs
pub fn display_command(program: &str, args: &[String]) -> String {
    let mut line = program.to_string();
    for arg in args {
        line.push(' ');
        if arg.contains(char::is_whitespace) {
            line.push('\'');
            line.push_str(arg);
            line.push('\'');
        } else {
            line.push_str(arg);
        }
    }
    line
}
