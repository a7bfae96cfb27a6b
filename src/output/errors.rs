// Human-readable error messages for the vagrant inventory plugin

use std::fmt;
use std::io::IsTerminal;
use std::path::PathBuf;

use colored::*;

/// Initialize color output based on TTY detection and NO_COLOR environment variable
fn should_use_colors() -> bool {
    // https://no-color.org/
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    std::io::stderr().is_terminal()
}

/// All error types raised while producing inventory
#[derive(Debug)]
pub enum PluginError {
    /// The vagrant binary could not be run or reported failure
    ToolInvocation {
        subcommand: String,
        message: String,
        suggestion: Option<String>,
    },

    /// A vagrant subcommand did not finish in time
    Timeout {
        operation: String,
        duration_secs: u64,
    },

    /// Plugin configuration could not be loaded
    Config {
        message: String,
        path: Option<PathBuf>,
    },

    /// I/O errors outside of the vagrant subprocess
    Io {
        message: String,
        path: Option<PathBuf>,
    },

    /// A hook name the plugin does not provide
    UnknownHook { hook: String, available: Vec<String> },

    /// A hook was called without the options it needs
    HookOptions { hook: String, message: String },

    /// Output could not be serialized
    Serialization { format: String, message: String },
}

impl PluginError {
    pub(crate) fn invocation(
        subcommand: impl Into<String>,
        message: impl Into<String>,
        suggestion: Option<String>,
    ) -> Self {
        PluginError::ToolInvocation {
            subcommand: subcommand.into(),
            message: message.into(),
            suggestion,
        }
    }
}

impl std::error::Error for PluginError {}

impl fmt::Display for PluginError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !should_use_colors() {
            colored::control::set_override(false);
        }

        match self {
            PluginError::ToolInvocation {
                subcommand,
                message,
                suggestion,
            } => {
                writeln!(f, "{}: {}", "VAGRANT ERROR".red().bold(), message)?;
                writeln!(f, "  {} vagrant {}", "Command:".dimmed(), subcommand)?;

                if let Some(suggestion) = suggestion {
                    writeln!(f)?;
                    writeln!(f, "{}: {}", "Hint".yellow().bold(), suggestion)?;
                }

                Ok(())
            }

            PluginError::Timeout {
                operation,
                duration_secs,
            } => {
                writeln!(
                    f,
                    "{}: {} timed out after {}s",
                    "TIMEOUT".red().bold(),
                    operation,
                    duration_secs
                )?;
                Ok(())
            }

            PluginError::Config { message, path } => {
                writeln!(f, "{}: {}", "CONFIG ERROR".red().bold(), message)?;
                if let Some(path) = path {
                    writeln!(f, "  {} {}", "Path:".dimmed(), path.display())?;
                }
                Ok(())
            }

            PluginError::Io { message, path } => {
                writeln!(f, "{}: {}", "I/O ERROR".red().bold(), message)?;
                if let Some(path) = path {
                    writeln!(f, "  {} {}", "Path:".dimmed(), path.display())?;
                }
                Ok(())
            }

            PluginError::UnknownHook { hook, available } => {
                writeln!(f, "{}: Unknown hook '{}'", "PLUGIN ERROR".red().bold(), hook)?;
                writeln!(f)?;
                writeln!(
                    f,
                    "{}: Available hooks: {}",
                    "Hint".yellow().bold(),
                    available.join(", ")
                )?;
                Ok(())
            }

            PluginError::HookOptions { hook, message } => {
                writeln!(f, "{}: {}", "PLUGIN ERROR".red().bold(), message)?;
                writeln!(f, "  {} {}", "Hook:".dimmed(), hook)?;
                Ok(())
            }

            PluginError::Serialization { format, message } => {
                writeln!(
                    f,
                    "{}: Failed to render {} output: {}",
                    "OUTPUT ERROR".red().bold(),
                    format,
                    message
                )?;
                Ok(())
            }
        }
    }
}

/// Suggest a fix for a failed process spawn
pub fn spawn_suggestion(e: &std::io::Error) -> Option<String> {
    match e.kind() {
        std::io::ErrorKind::NotFound => Some(
            "Install vagrant or point --vagrant-binary at the vagrant executable".to_string(),
        ),
        std::io::ErrorKind::PermissionDenied => {
            Some("Check that the vagrant binary is executable".to_string())
        }
        _ => None,
    }
}
