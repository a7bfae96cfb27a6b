// Output module - renders targets and parsed vagrant data

use colored::*;
use serde::Serialize;

pub mod errors;

pub use errors::*;

use crate::inventory::Target;
use crate::parser::Value;

/// Output format for rendered inventory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text output with colors
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
    /// YAML document
    Yaml,
}

impl std::str::FromStr for OutputFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            _ => Err(()),
        }
    }
}

/// Serialize any value in a structured format
fn render_structured<T: Serialize + ?Sized>(
    value: &T,
    format: OutputFormat,
) -> Result<String, PluginError> {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(value).map_err(|e| PluginError::Serialization {
                format: "json".to_string(),
                message: e.to_string(),
            })
        }
        OutputFormat::Yaml | OutputFormat::Text => {
            serde_yaml::to_string(value).map_err(|e| PluginError::Serialization {
                format: "yaml".to_string(),
                message: e.to_string(),
            })
        }
    }
}

/// Render the target list
pub fn render_targets(targets: &[Target], format: OutputFormat) -> Result<String, PluginError> {
    match format {
        OutputFormat::Text => Ok(render_targets_text(targets)),
        _ => render_structured(targets, format),
    }
}

fn render_targets_text(targets: &[Target]) -> String {
    let mut out = format!("{} {} running target(s)\n\n", "Found".green(), targets.len());

    for target in targets {
        let ssh = &target.config.ssh;
        let name = target.name.as_deref().unwrap_or("<unnamed>");

        out.push_str(&format!("  {} {}\n", "•".cyan(), name.white().bold()));
        out.push_str(&format!("    {} {}\n", "URI:".dimmed(), target.uri));
        if let Some(ref user) = ssh.user {
            out.push_str(&format!("    {} {}\n", "User:".dimmed(), user));
        }
        out.push_str(&format!("    {} {}\n", "Run as:".dimmed(), ssh.run_as));
        if let Some(ref key) = ssh.private_key {
            out.push_str(&format!("    {} {}\n", "Private key:".dimmed(), key));
        }
        out.push_str(&format!(
            "    {} {}\n",
            "Host key check:".dimmed(),
            ssh.host_key_check
        ));
        out.push('\n');
    }

    out
}

/// Render an arbitrary value tree (status, ssh settings, resolved config)
pub fn render_value(value: &Value, format: OutputFormat) -> Result<String, PluginError> {
    match format {
        OutputFormat::Text => {
            let mut out = String::new();
            render_value_text(value, 0, &mut out);
            Ok(out)
        }
        _ => render_structured(value, format),
    }
}

fn render_value_text(value: &Value, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);

    match value {
        Value::Dict(d) => {
            for (key, child) in d {
                match child {
                    Value::Dict(_) | Value::List(_) => {
                        out.push_str(&format!("{}{}:\n", indent, key.yellow()));
                        render_value_text(child, depth + 1, out);
                    }
                    leaf => out.push_str(&format!("{}{} = {}\n", indent, key.yellow(), leaf)),
                }
            }
        }
        Value::List(l) => {
            for item in l {
                match item {
                    Value::Dict(_) | Value::List(_) => {
                        out.push_str(&format!("{}-\n", indent));
                        render_value_text(item, depth + 1, out);
                    }
                    leaf => out.push_str(&format!("{}- {}\n", indent, leaf)),
                }
            }
        }
        leaf => out.push_str(&format!("{}{}\n", indent, leaf)),
    }
}
