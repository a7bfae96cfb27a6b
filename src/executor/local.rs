// Local execution of the vagrant binary

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::{CommandResult, CommandRunner};
use crate::config::PluginConfig;
use crate::output::errors::{spawn_suggestion, PluginError};

/// Runs the vagrant CLI as a child process
#[derive(Debug, Clone)]
pub struct VagrantCli {
    binary: PathBuf,
    project_dir: Option<PathBuf>,
    timeout: Option<Duration>,
}

impl VagrantCli {
    /// Create a runner for the given vagrant executable
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        VagrantCli {
            binary: binary.into(),
            project_dir: None,
            timeout: None,
        }
    }

    /// Build a runner from plugin configuration
    pub fn from_config(config: &PluginConfig) -> Self {
        let mut cli = VagrantCli::new(&config.binary);
        cli.project_dir = config.project_dir.clone();
        cli.timeout = config.timeout();
        cli
    }

    /// Run vagrant from the directory holding the Vagrantfile
    pub fn with_project_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.project_dir = Some(dir.into());
        self
    }

    /// Kill the subprocess if it runs longer than `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }
}

#[async_trait]
impl CommandRunner for VagrantCli {
    async fn run(&self, args: &[&str]) -> Result<CommandResult, PluginError> {
        let subcommand = args.join(" ");

        let mut command = Command::new(&self.binary);
        command
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        if let Some(ref dir) = self.project_dir {
            command.current_dir(dir);
        }

        debug!(binary = %self.binary.display(), args = %subcommand, "Spawning vagrant");

        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, command.output())
                .await
                .map_err(|_| PluginError::Timeout {
                    operation: format!("vagrant {}", subcommand),
                    duration_secs: limit.as_secs(),
                })?,
            None => command.output().await,
        }
        .map_err(|e| {
            PluginError::invocation(
                subcommand.clone(),
                format!("Failed to execute '{}': {}", self.binary.display(), e),
                spawn_suggestion(&e),
            )
        })?;

        Ok(CommandResult {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code().unwrap_or(-1),
        })
    }
}
