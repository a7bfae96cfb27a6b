// Inventory module - target records built from running vagrant machines

mod cache;
mod vagrant;

pub use cache::*;
pub use vagrant::*;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::parser::{Dict, SshConfigMap, Value};

/// Account the orchestration engine escalates to on every target
pub const RUN_AS: &str = "root";

/// SSH settings every target record is built from
pub const EXPECTED_SSH_PROPERTIES: [&str; 5] = ["Host", "HostName", "Port", "User", "IdentityFile"];

/// A single connectable target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub config: TargetConfig,
}

/// Transport configuration attached to a target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetConfig {
    pub ssh: SshTargetConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SshTargetConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    pub run_as: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
    pub host_key_check: bool,
}

impl Target {
    /// Map a host's SSH settings onto a target record.
    ///
    /// Missing settings leave the matching field empty.
    pub fn from_ssh_config(config: &SshConfigMap) -> Self {
        let setting = |key: &str| config.get(key).cloned();

        Target {
            uri: format!(
                "ssh://{}:{}",
                config.get("HostName").map(String::as_str).unwrap_or_default(),
                config.get("Port").map(String::as_str).unwrap_or_default()
            ),
            name: setting("Host"),
            config: TargetConfig {
                ssh: SshTargetConfig {
                    user: setting("User"),
                    run_as: RUN_AS.to_string(),
                    private_key: setting("IdentityFile"),
                    host_key_check: false,
                },
            },
        }
    }

    /// Plain nested-mapping form handed to the orchestration engine
    pub fn to_value(&self) -> Value {
        let ssh = &self.config.ssh;

        let mut ssh_map = Dict::new();
        if let Some(ref user) = ssh.user {
            ssh_map.insert("user".to_string(), Value::from(user.as_str()));
        }
        ssh_map.insert("run-as".to_string(), Value::from(ssh.run_as.as_str()));
        if let Some(ref key) = ssh.private_key {
            ssh_map.insert("private-key".to_string(), Value::from(key.as_str()));
        }
        ssh_map.insert("host-key-check".to_string(), Value::Bool(ssh.host_key_check));

        let mut config = Dict::new();
        config.insert("ssh".to_string(), Value::Dict(ssh_map));

        let mut target = Dict::new();
        target.insert("uri".to_string(), Value::from(self.uri.as_str()));
        if let Some(ref name) = self.name {
            target.insert("name".to_string(), Value::from(name.as_str()));
        }
        target.insert("config".to_string(), Value::Dict(config));

        Value::Dict(target)
    }
}

/// Log a setting that a vagrant resource did not provide
pub fn warn_missing_property(name: &str, property: &str) {
    warn!(
        resource = name,
        property = property,
        "Could not find property {} of vagrant resource {}",
        property,
        name
    );
}

/// Warn about every expected SSH setting absent from `config`
pub fn check_ssh_properties(name: &str, config: &SshConfigMap) -> Vec<&'static str> {
    let missing: Vec<&'static str> = EXPECTED_SSH_PROPERTIES
        .iter()
        .copied()
        .filter(|property| !config.contains_key(*property))
        .collect();

    for property in &missing {
        warn_missing_property(name, property);
    }

    missing
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_ssh_config;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_target_from_full_ssh_config() {
        let config = parse_ssh_config(
            "Host default\n  HostName 127.0.0.1\n  Port 2222\n  User vagrant\n  IdentityFile /home/u/.vagrant/key",
        );

        let target = Target::from_ssh_config(&config);
        assert_eq!(
            target,
            Target {
                uri: "ssh://127.0.0.1:2222".to_string(),
                name: Some("default".to_string()),
                config: TargetConfig {
                    ssh: SshTargetConfig {
                        user: Some("vagrant".to_string()),
                        run_as: "root".to_string(),
                        private_key: Some("/home/u/.vagrant/key".to_string()),
                        host_key_check: false,
                    },
                },
            }
        );
    }

    #[test]
    fn test_target_serializes_with_kebab_case_keys() {
        let config = parse_ssh_config(
            "Host default\n  HostName 127.0.0.1\n  Port 2222\n  User vagrant\n  IdentityFile /home/u/.vagrant/key",
        );
        let json = serde_json::to_value(Target::from_ssh_config(&config)).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "uri": "ssh://127.0.0.1:2222",
                "name": "default",
                "config": {
                    "ssh": {
                        "user": "vagrant",
                        "run-as": "root",
                        "private-key": "/home/u/.vagrant/key",
                        "host-key-check": false
                    }
                }
            })
        );
    }

    #[test]
    fn test_to_value_matches_serialized_form() {
        let config = parse_ssh_config("Host web\n  HostName 10.0.0.5\n  Port 22\n  User deploy\n");
        let target = Target::from_ssh_config(&config);
        let json = serde_json::to_value(&target).unwrap();

        assert_eq!(target.to_value(), Value::from(&json));
    }

    #[test]
    fn test_partial_config_leaves_fields_empty() {
        let config = parse_ssh_config("Host web\n  HostName 10.0.0.5\n");
        let target = Target::from_ssh_config(&config);

        assert_eq!(target.uri, "ssh://10.0.0.5:");
        assert_eq!(target.name.as_deref(), Some("web"));
        assert_eq!(target.config.ssh.user, None);
        assert_eq!(target.config.ssh.private_key, None);
        assert_eq!(target.config.ssh.run_as, "root");
    }

    #[test]
    fn test_check_ssh_properties_reports_missing() {
        let config = parse_ssh_config("Host web\n  HostName 10.0.0.5\n  User deploy\n");
        assert_eq!(check_ssh_properties("web", &config), vec!["Port", "IdentityFile"]);
        assert_eq!(
            check_ssh_properties("web", &SshConfigMap::new()),
            EXPECTED_SSH_PROPERTIES.to_vec()
        );
    }
}
