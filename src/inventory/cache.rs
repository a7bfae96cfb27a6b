// Process-lifetime memo of vagrant output

use std::collections::HashMap;

use crate::parser::{SshConfigMap, StatusTree};

/// Parsed vagrant output kept for the life of a plugin instance.
///
/// Entries are written once and never expire: a machine that changes state
/// after the first `status` call is not observed until a new instance is
/// created. Access goes through `&mut` on the owning inventory, so there is
/// never more than one computation in flight per key.
#[derive(Debug, Clone, Default)]
pub struct TargetCache {
    status: Option<StatusTree>,
    ssh_configs: HashMap<String, SshConfigMap>,
}

impl TargetCache {
    pub fn new() -> Self {
        TargetCache::default()
    }

    pub fn status(&self) -> Option<&StatusTree> {
        self.status.as_ref()
    }

    /// Store the status tree unless one is already cached
    pub fn store_status(&mut self, status: StatusTree) -> &StatusTree {
        self.status.get_or_insert(status)
    }

    pub fn ssh_config(&self, host: &str) -> Option<&SshConfigMap> {
        self.ssh_configs.get(host)
    }

    /// Store a host's SSH settings unless they are already cached
    pub fn store_ssh_config(&mut self, host: &str, config: SshConfigMap) -> &SshConfigMap {
        self.ssh_configs.entry(host.to_string()).or_insert(config)
    }

    /// Hosts with cached SSH settings
    pub fn cached_hosts(&self) -> Vec<&str> {
        let mut hosts: Vec<&str> = self.ssh_configs.keys().map(String::as_str).collect();
        hosts.sort_unstable();
        hosts
    }
}
