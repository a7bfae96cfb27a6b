// Vagrant Inventory - connectable targets from running Vagrant machines
//
// Queries `vagrant status` and `vagrant ssh-config` in machine-readable mode
// and turns the result into inventory targets for an orchestration engine.

pub mod config;
pub mod executor;
pub mod inventory;
pub mod output;
pub mod parser;
pub mod plugins;

pub use config::PluginConfig;
pub use executor::{CommandResult, CommandRunner, VagrantCli};
pub use inventory::{Target, TargetCache, VagrantInventory};
pub use output::{OutputFormat, PluginError};
pub use parser::{parse_machine_readable, parse_ssh_config, SshConfigMap, StatusTree, Value};
pub use plugins::{call_hook, resolve_config, InventoryPlugin, VagrantPlugin};

/// Version of the plugin
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::PluginConfig;
    pub use crate::inventory::{Target, VagrantInventory};
    pub use crate::output::PluginError;
    pub use crate::parser::Value;
    pub use crate::plugins::{InventoryPlugin, VagrantPlugin};
}
