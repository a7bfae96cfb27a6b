// Executor module - runs vagrant subcommands and captures their output

use crate::output::errors::PluginError;
use async_trait::async_trait;

pub mod local;

pub use local::VagrantCli;

/// Captured result of one subprocess run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs the virtualization tool with the given arguments.
///
/// Implementations only report whether the process could be run; a nonzero
/// exit is returned as a `CommandResult` and judged by the caller.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, args: &[&str]) -> Result<CommandResult, PluginError>;
}
