// Plugin infrastructure - the hooks an orchestration engine calls for inventory

pub mod lookups;

pub use lookups::{
    resolve_config, InterpolationLookup, PlaceholderLookup, ResourcePathLookup,
};

use async_trait::async_trait;

use crate::config::PluginConfig;
use crate::executor::{CommandRunner, VagrantCli};
use crate::inventory::VagrantInventory;
use crate::output::errors::PluginError;
use crate::parser::Value;

pub const INVENTORY_TARGETS_HOOK: &str = "inventory_targets";
pub const RESOLVE_CONFIG_HOOK: &str = "resolve_config";

/// Trait for plugins that supply inventory to the orchestration engine
#[async_trait]
pub trait InventoryPlugin: Send {
    /// Get the name of this plugin
    fn name(&self) -> &str;

    /// Hooks this plugin answers
    fn hooks(&self) -> &[&'static str];

    /// Produce the list of targets as plain mappings
    async fn inventory_targets(&mut self, opts: &Value) -> Result<Vec<Value>, PluginError>;

    /// Fill a config template with values looked up on one resource
    fn resolve_config(&self, name: &str, resource: &Value, template: &Value) -> Value;
}

/// Inventory plugin backed by the local vagrant environment
pub struct VagrantPlugin<R: CommandRunner = VagrantCli> {
    inventory: VagrantInventory<R>,
    lookup: Box<dyn PlaceholderLookup + Send + Sync>,
}

impl VagrantPlugin<VagrantCli> {
    pub fn from_config(config: &PluginConfig) -> Self {
        VagrantPlugin::new(VagrantInventory::from_config(config))
    }
}

impl<R: CommandRunner> VagrantPlugin<R> {
    pub fn new(inventory: VagrantInventory<R>) -> Self {
        VagrantPlugin {
            inventory,
            lookup: Box::new(ResourcePathLookup),
        }
    }

    /// Swap the placeholder lookup used by `resolve_config`
    pub fn with_lookup(mut self, lookup: impl PlaceholderLookup + Send + Sync + 'static) -> Self {
        self.lookup = Box::new(lookup);
        self
    }

    pub fn inventory(&mut self) -> &mut VagrantInventory<R> {
        &mut self.inventory
    }
}

#[async_trait]
impl<R: CommandRunner> InventoryPlugin for VagrantPlugin<R> {
    fn name(&self) -> &str {
        "vagrant"
    }

    fn hooks(&self) -> &[&'static str] {
        &[INVENTORY_TARGETS_HOOK, RESOLVE_CONFIG_HOOK]
    }

    async fn inventory_targets(&mut self, _opts: &Value) -> Result<Vec<Value>, PluginError> {
        let targets = self.inventory.list_targets().await?;
        Ok(targets.iter().map(|t| t.to_value()).collect())
    }

    fn resolve_config(&self, name: &str, resource: &Value, template: &Value) -> Value {
        resolve_config(name, resource, template, self.lookup.as_ref())
    }
}

/// Dispatch a hook by name.
///
/// `resolve_config` expects `opts` to carry `name`, `resource` and `template`.
pub async fn call_hook(
    plugin: &mut dyn InventoryPlugin,
    hook: &str,
    opts: &Value,
) -> Result<Value, PluginError> {
    if !plugin.hooks().contains(&hook) {
        return Err(PluginError::UnknownHook {
            hook: hook.to_string(),
            available: plugin.hooks().iter().map(|h| h.to_string()).collect(),
        });
    }

    match hook {
        INVENTORY_TARGETS_HOOK => Ok(Value::List(plugin.inventory_targets(opts).await?)),
        RESOLVE_CONFIG_HOOK => {
            let name = opts
                .get("name")
                .and_then(Value::as_str)
                .ok_or_else(|| PluginError::HookOptions {
                    hook: hook.to_string(),
                    message: "missing string option 'name'".to_string(),
                })?;
            let template = opts.get("template").ok_or_else(|| PluginError::HookOptions {
                hook: hook.to_string(),
                message: "missing option 'template'".to_string(),
            })?;
            let resource = opts.get("resource").cloned().unwrap_or_default();

            Ok(plugin.resolve_config(name, &resource, template))
        }
        _ => Err(PluginError::UnknownHook {
            hook: hook.to_string(),
            available: plugin.hooks().iter().map(|h| h.to_string()).collect(),
        }),
    }
}
