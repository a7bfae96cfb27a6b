// Parsers for vagrant CLI output

pub mod machine_readable;
pub mod ssh_config;
pub mod value;

pub use machine_readable::{parse_machine_readable, StatusTree};
pub use ssh_config::{parse_ssh_config, render_ssh_config, unescape_block, SshConfigMap};
pub use value::{Dict, Value};
