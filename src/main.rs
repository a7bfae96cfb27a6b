// Vagrant Inventory CLI - print inventory targets for running Vagrant machines

use std::path::{Path, PathBuf};
use std::str::FromStr;

use clap::{Parser, Subcommand};
use colored::*;
use tracing_subscriber::EnvFilter;

use vagrant_inventory::config::PluginConfig;
use vagrant_inventory::output::{render_targets, render_value, OutputFormat, PluginError};
use vagrant_inventory::parser::{render_ssh_config, Dict, Value};
use vagrant_inventory::plugins::{call_hook, InventoryPlugin, VagrantPlugin};

#[derive(Parser)]
#[command(
    name = "vagrant-inventory",
    about = "Inventory targets from running Vagrant machines",
    version,
    author,
    disable_colored_help = true,
    term_width = 0,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode - only show errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format (text, json or yaml)
    #[arg(long, global = true, default_value = "text")]
    output_format: String,

    /// Path to the plugin config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the vagrant executable (overrides config)
    #[arg(long, global = true)]
    vagrant_binary: Option<PathBuf>,

    /// Directory containing the Vagrantfile (overrides config)
    #[arg(long, global = true)]
    project_dir: Option<PathBuf>,

    /// Timeout in seconds for each vagrant command (overrides config)
    #[arg(long, global = true)]
    timeout: Option<u64>,
}

#[derive(Subcommand)]
#[command(disable_colored_help = true)]
enum Commands {
    /// List connectable targets for running machines
    Targets,

    /// Show the parsed `vagrant status` tree
    Status,

    /// Show the SSH settings vagrant reports for a machine
    SshConfig {
        /// Machine name
        host: String,
    },

    /// Resolve a config template against every running machine
    Resolve {
        /// YAML or JSON template file
        #[arg(short, long)]
        template: PathBuf,
    },

    /// Call a plugin hook and print its result
    Hook {
        /// Hook name (inventory_targets, resolve_config)
        name: String,

        /// YAML or JSON file with hook options
        #[arg(long)]
        opts: Option<PathBuf>,
    },

    /// List the hooks this plugin provides
    Hooks,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    let output_format = OutputFormat::from_str(&cli.output_format).unwrap_or_else(|_| {
        eprintln!("Invalid output format: {}. Using 'text'.", cli.output_format);
        OutputFormat::Text
    });

    if let Err(e) = run(cli, output_format).await {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

/// Log to stderr so stdout only carries inventory output
fn init_logging(verbose: bool, quiet: bool) {
    let default_level = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Merge the config file with command line overrides
fn resolve_config_file(cli: &Cli) -> Result<PluginConfig, PluginError> {
    let mut config = PluginConfig::load(cli.config.as_deref())?;

    if let Some(ref binary) = cli.vagrant_binary {
        config.binary = binary.clone();
    }
    if let Some(ref dir) = cli.project_dir {
        config.project_dir = Some(dir.clone());
    }
    if let Some(timeout) = cli.timeout {
        if timeout == 0 {
            return Err(PluginError::Config {
                message: "--timeout must be greater than zero".to_string(),
                path: None,
            });
        }
        config.timeout_secs = Some(timeout);
    }

    Ok(config)
}

async fn run(cli: Cli, format: OutputFormat) -> Result<(), PluginError> {
    let config = resolve_config_file(&cli)?;
    let mut plugin = VagrantPlugin::from_config(&config);

    match cli.command {
        Commands::Targets => {
            let targets = plugin.inventory().list_targets().await?;
            print!("{}", render_targets(&targets, format)?);
        }
        Commands::Status => {
            let status = plugin.inventory().status().await?.clone();
            print!("{}", render_value(&Value::Dict(status), format)?);
        }
        Commands::SshConfig { host } => {
            let settings = plugin.inventory().ssh_config(&host).await?.clone();
            match format {
                OutputFormat::Text => print!("{}", render_ssh_config(&settings)),
                _ => {
                    let value: Dict = settings
                        .into_iter()
                        .map(|(k, v)| (k, Value::String(v)))
                        .collect();
                    print!("{}", render_value(&Value::Dict(value), format)?);
                }
            }
        }
        Commands::Resolve { template } => {
            let template = read_value_file(&template)?;
            let names = plugin.inventory().running_machines().await?;

            let mut resolved = Dict::new();
            for name in names {
                let resource = plugin.inventory().resource(&name).await?;
                let config = plugin.resolve_config(&name, &resource, &template);
                resolved.insert(name, config);
            }

            print!("{}", render_value(&Value::Dict(resolved), format)?);
        }
        Commands::Hook { name, opts } => {
            let opts = match opts {
                Some(path) => read_value_file(&path)?,
                None => Value::Null,
            };
            let result = call_hook(&mut plugin, &name, &opts).await?;

            // Hook results are consumed by the engine; text falls back to JSON
            let format = match format {
                OutputFormat::Text => OutputFormat::Json,
                other => other,
            };
            println!("{}", render_value(&result, format)?);
        }
        Commands::Hooks => {
            println!("{} {}", "Plugin:".dimmed(), plugin.name().white().bold());
            for hook in plugin.hooks() {
                println!("  {} {}", "•".cyan(), hook);
            }
        }
    }

    Ok(())
}

/// Read a YAML (or JSON) document into a value tree
fn read_value_file(path: &Path) -> Result<Value, PluginError> {
    let content = std::fs::read_to_string(path).map_err(|e| PluginError::Io {
        message: format!("Failed to read file: {}", e),
        path: Some(path.to_path_buf()),
    })?;

    serde_yaml::from_str(&content).map_err(|e| PluginError::Config {
        message: format!("Invalid YAML or JSON: {}", e),
        path: Some(path.to_path_buf()),
    })
}
