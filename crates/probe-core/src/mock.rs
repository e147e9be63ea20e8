//! Scripted [`CommandRunner`] for tests: canned outputs instead of real processes

use crate::error::{ProbeError, Result};
use crate::runner::{CommandOutput, CommandRunner};
use async_trait::async_trait;
use parking_lot::Mutex;

#[derive(Debug, Clone)]
enum Reply {
    Output(CommandOutput),
    Missing,
}

#[derive(Debug, Clone)]
struct Rule {
    program: String,
    /// Matches when any argument equals this value
    arg: Option<String>,
    reply: Reply,
}

/// Answers each command with the first matching scripted reply.
///
/// Commands with no matching rule behave like a missing binary. Every
/// invocation is recorded and can be inspected with [`ScriptedRunner::calls`].
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    rules: Mutex<Vec<Rule>>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply to any invocation of `program`
    pub fn on(self, program: &str, output: CommandOutput) -> Self {
        self.push(program, None, Reply::Output(output))
    }

    /// Reply to invocations of `program` that pass `arg`
    pub fn on_arg(self, program: &str, arg: &str, output: CommandOutput) -> Self {
        self.push(program, Some(arg), Reply::Output(output))
    }

    /// Make `program` behave as if it were not installed
    pub fn missing(self, program: &str) -> Self {
        self.push(program, None, Reply::Missing)
    }

    fn push(self, program: &str, arg: Option<&str>, reply: Reply) -> Self {
        self.rules.lock().push(Rule {
            program: program.to_string(),
            arg: arg.map(str::to_string),
            reply,
        });
        self
    }

    /// Every command line run so far, program first
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().clone()
    }

    /// Calls whose program is `program`
    pub fn calls_to(&self, program: &str) -> Vec<Vec<String>> {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.first().map(String::as_str) == Some(program))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        let mut call = vec![program.to_string()];
        call.extend(args.iter().cloned());
        self.calls.lock().push(call);

        let reply = self
            .rules
            .lock()
            .iter()
            .find(|rule| {
                rule.program == program
                    && rule
                        .arg
                        .as_ref()
                        .map_or(true, |wanted| args.iter().any(|a| a == wanted))
            })
            .map(|rule| rule.reply.clone());

        match reply {
            Some(Reply::Output(output)) => Ok(output),
            Some(Reply::Missing) | None => Err(ProbeError::ToolNotFound {
                program: program.to_string(),
            }),
        }
    }
}
