// Vagrant inventory - builds targets from `vagrant status` and `vagrant ssh-config`
//
// Both subcommands are run with `--machine-readable`:
// - `status` lists every machine of the environment with its state
// - `ssh-config <host>` prints the OpenSSH client block for one machine

use tracing::{debug, warn};

use super::{check_ssh_properties, Target, TargetCache};
use crate::config::PluginConfig;
use crate::executor::{CommandRunner, VagrantCli};
use crate::output::errors::PluginError;
use crate::parser::{
    parse_machine_readable, parse_ssh_config, Dict, SshConfigMap, StatusTree, Value,
};

/// Arguments for the machine list
pub const STATUS_ARGS: [&str; 2] = ["status", "--machine-readable"];

/// State leaf value of a machine that can be connected to
pub const RUNNING_STATE: &str = "running";

/// Target builder backed by a vagrant environment
#[derive(Debug)]
pub struct VagrantInventory<R: CommandRunner = VagrantCli> {
    runner: R,
    cache: TargetCache,
}

impl VagrantInventory<VagrantCli> {
    /// Create an inventory that runs the vagrant binary named in `config`
    pub fn from_config(config: &PluginConfig) -> Self {
        VagrantInventory::new(VagrantCli::from_config(config))
    }
}

impl<R: CommandRunner> VagrantInventory<R> {
    pub fn new(runner: R) -> Self {
        VagrantInventory {
            runner,
            cache: TargetCache::new(),
        }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn cache(&self) -> &TargetCache {
        &self.cache
    }

    /// Run a vagrant subcommand and return its stdout.
    ///
    /// A nonzero exit or empty output is a failure of that subcommand.
    async fn run_subcommand(&self, args: &[&str]) -> Result<String, PluginError> {
        let subcommand = args.join(" ");
        let result = self.runner.run(args).await?;

        if !result.success() {
            let stderr = result.stderr.trim();
            return Err(PluginError::invocation(
                subcommand,
                format!("vagrant exited with status {}", result.exit_code),
                if stderr.is_empty() {
                    Some("Check that the project directory contains a Vagrantfile".to_string())
                } else {
                    Some(stderr.to_string())
                },
            ));
        }

        if result.stdout.trim().is_empty() {
            return Err(PluginError::invocation(
                subcommand,
                "vagrant produced no output",
                Some("Run the command by hand to inspect vagrant's behaviour".to_string()),
            ));
        }

        Ok(result.stdout)
    }

    /// Parsed `vagrant status`, computed on first use
    pub async fn status(&mut self) -> Result<&StatusTree, PluginError> {
        let fresh = if self.cache.status().is_some() {
            debug!("Using cached vagrant status");
            None
        } else {
            debug!("Running 'vagrant status' to get the machine list");
            let output = self.run_subcommand(&STATUS_ARGS).await?;
            Some(parse_machine_readable(&output))
        };

        Ok(self.cache.store_status(fresh.unwrap_or_default()))
    }

    /// Names of machines whose state is `running`, in name order
    pub async fn running_machines(&mut self) -> Result<Vec<String>, PluginError> {
        let status = self.status().await?;

        Ok(status
            .iter()
            .filter(|(_, details)| {
                details.get("state").and_then(Value::as_str) == Some(RUNNING_STATE)
            })
            .map(|(name, _)| name.clone())
            .collect())
    }

    /// Parsed `vagrant ssh-config <host>`, computed once per host
    pub async fn ssh_config(&mut self, host: &str) -> Result<&SshConfigMap, PluginError> {
        let fresh = if self.cache.ssh_config(host).is_some() {
            debug!(host, "Using cached ssh-config");
            None
        } else {
            debug!(host, "Running 'vagrant ssh-config {}' to get the ssh details", host);
            let args = ["ssh-config", host, "--machine-readable"];
            let output = self.run_subcommand(&args).await?;
            Some(extract_ssh_config(host, &output))
        };

        Ok(self
            .cache
            .store_ssh_config(host, fresh.unwrap_or_default()))
    }

    /// Build one target per running machine.
    ///
    /// Missing SSH settings are logged and left empty on the target; a failed
    /// vagrant invocation aborts the listing.
    pub async fn list_targets(&mut self) -> Result<Vec<Target>, PluginError> {
        let running = self.running_machines().await?;
        debug!(count = running.len(), "Found running vagrant machines");

        let mut targets = Vec::with_capacity(running.len());
        for name in &running {
            let config = self.ssh_config(name).await?;
            check_ssh_properties(name, config);
            targets.push(Target::from_ssh_config(config));
        }

        Ok(targets)
    }

    /// Resource object for one machine: its status subtree plus an
    /// `ssh_config` mapping of its SSH settings
    pub async fn resource(&mut self, name: &str) -> Result<Value, PluginError> {
        let mut resource = match self.status().await?.get(name) {
            Some(details) if details.as_dict().is_some() => details.clone(),
            _ => Value::Dict(Dict::new()),
        };

        let ssh: Dict = self
            .ssh_config(name)
            .await?
            .iter()
            .map(|(k, v)| (k.clone(), Value::from(v.as_str())))
            .collect();

        let mut extra = Dict::new();
        extra.insert("ssh_config".to_string(), Value::Dict(ssh));
        resource.deep_merge(Value::Dict(extra));

        Ok(resource)
    }
}

/// Pull the SSH settings for `host` out of `ssh-config` machine-readable output
fn extract_ssh_config(host: &str, output: &str) -> SshConfigMap {
    let parsed = parse_machine_readable(output);

    let block = parsed
        .get(host)
        .and_then(|details| details.get("ssh-config"))
        .and_then(Value::as_str);

    match block {
        Some(block) => parse_ssh_config(block),
        None => {
            warn!(host, "vagrant ssh-config returned no ssh-config block");
            SshConfigMap::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::CommandResult;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Replays canned vagrant output and records every invocation
    #[derive(Default)]
    struct FakeVagrant {
        responses: HashMap<String, CommandResult>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeVagrant {
        fn respond(mut self, args: &str, stdout: &str) -> Self {
            self.responses.insert(
                args.to_string(),
                CommandResult {
                    stdout: stdout.to_string(),
                    stderr: String::new(),
                    exit_code: 0,
                },
            );
            self
        }

        fn fail(mut self, args: &str, exit_code: i32, stderr: &str) -> Self {
            self.responses.insert(
                args.to_string(),
                CommandResult {
                    stdout: String::new(),
                    stderr: stderr.to_string(),
                    exit_code,
                },
            );
            self
        }

        fn calls_to(&self, args: &str) -> usize {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|c| c.as_str() == args)
                .count()
        }
    }

    #[async_trait]
    impl CommandRunner for FakeVagrant {
        async fn run(&self, args: &[&str]) -> Result<CommandResult, PluginError> {
            let key = args.join(" ");
            self.calls.lock().unwrap().push(key.clone());
            self.responses
                .get(&key)
                .cloned()
                .ok_or_else(|| PluginError::invocation(key, "no such command", None))
        }
    }

    const STATUS: &str = "\
1528830000,,ui,info,Current machine states:
1528830000,default,metadata,provider,virtualbox
1528830000,default,state,running
1528830000,stopped,metadata,provider,virtualbox
1528830000,stopped,state,poweroff
";

    const DEFAULT_SSH: &str = "\
1528830000,default,metadata,provider,virtualbox
1528830000,default,ssh-config,Host default\\n  HostName 127.0.0.1\\n  Port 2222\\n  User vagrant\\n  IdentityFile /home/u/.vagrant/key\\n
";

    fn single_machine() -> FakeVagrant {
        FakeVagrant::default()
            .respond("status --machine-readable", STATUS)
            .respond("ssh-config default --machine-readable", DEFAULT_SSH)
    }

    #[tokio::test]
    async fn test_list_targets_end_to_end() {
        let mut inventory = VagrantInventory::new(single_machine());
        let targets = inventory.list_targets().await.unwrap();

        assert_eq!(targets.len(), 1);
        assert_eq!(
            serde_json::to_value(&targets[0]).unwrap(),
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

    #[tokio::test]
    async fn test_only_running_machines_are_listed() {
        let mut inventory = VagrantInventory::new(single_machine());
        assert_eq!(inventory.running_machines().await.unwrap(), vec!["default"]);

        inventory.list_targets().await.unwrap();
        assert_eq!(
            inventory
                .runner()
                .calls_to("ssh-config stopped --machine-readable"),
            0
        );
    }

    #[tokio::test]
    async fn test_second_listing_uses_cache() {
        let mut inventory = VagrantInventory::new(single_machine());

        let first = inventory.list_targets().await.unwrap();
        let second = inventory.list_targets().await.unwrap();

        assert_eq!(first, second);
        let runner = inventory.runner();
        assert_eq!(runner.calls_to("status --machine-readable"), 1);
        assert_eq!(runner.calls_to("ssh-config default --machine-readable"), 1);
        assert_eq!(inventory.cache().cached_hosts(), vec!["default"]);
    }

    #[tokio::test]
    async fn test_target_name_comes_from_ssh_host_setting() {
        let runner = FakeVagrant::default()
            .respond("status --machine-readable", "1528830000,web,state,running\n")
            .respond(
                "ssh-config web --machine-readable",
                "1528830000,web,ssh-config,Host web.lab\\n  HostName 10.0.0.5\\n  Port 22\\n",
            );
        let mut inventory = VagrantInventory::new(runner);
        let targets = inventory.list_targets().await.unwrap();

        assert_eq!(targets[0].name.as_deref(), Some("web.lab"));
        assert_eq!(targets[0].uri, "ssh://10.0.0.5:22");
    }

    #[tokio::test]
    async fn test_missing_properties_degrade_to_partial_target() {
        let runner = FakeVagrant::default()
            .respond("status --machine-readable", "1528830000,web,state,running\n")
            .respond(
                "ssh-config web --machine-readable",
                "1528830000,web,ssh-config,Host web\\n  HostName 10.0.0.5\\n",
            );
        let mut inventory = VagrantInventory::new(runner);
        let targets = inventory.list_targets().await.unwrap();

        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].uri, "ssh://10.0.0.5:");
        assert_eq!(targets[0].config.ssh.user, None);
        assert_eq!(targets[0].config.ssh.private_key, None);
    }

    #[tokio::test]
    async fn test_empty_config_block_yields_empty_target() {
        let runner = FakeVagrant::default()
            .respond("status --machine-readable", "1528830000,web,state,running\n")
            .respond(
                "ssh-config web --machine-readable",
                "1528830000,web,metadata,provider,docker\n",
            );
        let mut inventory = VagrantInventory::new(runner);
        let targets = inventory.list_targets().await.unwrap();

        assert_eq!(targets[0].uri, "ssh://:");
        assert_eq!(targets[0].name, None);
    }

    #[tokio::test]
    async fn test_status_failure_names_subcommand() {
        let runner = FakeVagrant::default().fail(
            "status --machine-readable",
            1,
            "A Vagrant environment or target machine is required",
        );
        let mut inventory = VagrantInventory::new(runner);
        let err = inventory.list_targets().await.unwrap_err();

        match err {
            PluginError::ToolInvocation {
                subcommand,
                suggestion,
                ..
            } => {
                assert_eq!(subcommand, "status --machine-readable");
                assert!(suggestion.unwrap().contains("Vagrant environment"));
            }
            other => panic!("Expected ToolInvocation, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_status_output_is_failure() {
        let runner = FakeVagrant::default().respond("status --machine-readable", "  \n");
        let mut inventory = VagrantInventory::new(runner);

        assert!(matches!(
            inventory.status().await,
            Err(PluginError::ToolInvocation { .. })
        ));
    }

    #[tokio::test]
    async fn test_ssh_config_failure_keeps_cached_status() {
        let runner = FakeVagrant::default()
            .respond("status --machine-readable", STATUS)
            .fail("ssh-config default --machine-readable", 1, "");
        let mut inventory = VagrantInventory::new(runner);

        assert!(inventory.list_targets().await.is_err());
        assert!(inventory.list_targets().await.is_err());

        let runner = inventory.runner();
        assert_eq!(runner.calls_to("status --machine-readable"), 1);
        assert_eq!(runner.calls_to("ssh-config default --machine-readable"), 2);
        assert!(inventory.cache().status().is_some());
    }

    #[tokio::test]
    async fn test_resource_combines_status_and_ssh_config() {
        let mut inventory = VagrantInventory::new(single_machine());
        let resource = inventory.resource("default").await.unwrap();

        assert_eq!(resource.get("state"), Some(&Value::from("running")));
        assert_eq!(
            resource.dig("metadata.provider"),
            Some(&Value::from("virtualbox"))
        );
        assert_eq!(
            resource.dig("ssh_config.User"),
            Some(&Value::from("vagrant"))
        );
    }

    #[test]
    fn test_extract_ssh_config_ignores_other_machines_blocks() {
        let output = "1528830000,db,ssh-config,Host db\\n  HostName 10.0.0.9\\n  Port 22\\n\n";
        let config = extract_ssh_config("web", output);
        assert!(config.is_empty());
    }

    #[test]
    fn test_extract_ssh_config_picks_requested_host() {
        let output = "\
1528830000,db,ssh-config,Host db\\n  Port 22\\n
1528830000,web,ssh-config,Host web\\n  Port 2200\\n
";
        let config = extract_ssh_config("web", output);
        assert_eq!(config.get("Host").map(String::as_str), Some("web"));
        assert_eq!(config.get("Port").map(String::as_str), Some("2200"));
    }
}
