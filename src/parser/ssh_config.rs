// Parser for the OpenSSH client config block printed by `vagrant ssh-config`

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

/// Setting name -> value, e.g. `HostName` -> `127.0.0.1`
pub type SshConfigMap = BTreeMap<String, String>;

static SETTING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?P<setting>[A-Z]\w+)[ \t]+(?P<value>.*)$").unwrap());

/// Turn the inspect-style escapes vagrant uses back into line breaks
pub fn unescape_block(block: &str) -> String {
    block.replace("\\n", "\n")
}

/// Parse an SSH config block into a flat settings map.
///
/// Lines that are not `Setting value` are ignored. A repeated setting keeps
/// the last value seen.
pub fn parse_ssh_config(block: &str) -> SshConfigMap {
    unescape_block(block)
        .lines()
        .filter_map(|line| {
            let caps = SETTING_RE.captures(line)?;
            let value = caps["value"].trim_end_matches('\r');
            Some((caps["setting"].to_string(), value.to_string()))
        })
        .collect()
}

/// Render a settings map back into `Key value` lines
pub fn render_ssh_config(config: &SshConfigMap) -> String {
    config
        .iter()
        .map(|(setting, value)| format!("  {} {}\n", setting, value))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const VAGRANT_BLOCK: &str = "Host default\n  HostName 127.0.0.1\n  User vagrant\n  Port 2222\n  UserKnownHostsFile /dev/null\n  StrictHostKeyChecking no\n  PasswordAuthentication no\n  IdentityFile /home/u/.vagrant/machines/default/virtualbox/private_key\n  IdentitiesOnly yes\n  LogLevel FATAL\n";

    #[test]
    fn test_parse_vagrant_block() {
        let config = parse_ssh_config(VAGRANT_BLOCK);

        assert_eq!(config.get("Host").map(String::as_str), Some("default"));
        assert_eq!(config.get("HostName").map(String::as_str), Some("127.0.0.1"));
        assert_eq!(config.get("Port").map(String::as_str), Some("2222"));
        assert_eq!(config.get("User").map(String::as_str), Some("vagrant"));
        assert_eq!(
            config.get("IdentityFile").map(String::as_str),
            Some("/home/u/.vagrant/machines/default/virtualbox/private_key")
        );
        assert_eq!(config.len(), 10);
    }

    #[test]
    fn test_parse_escaped_block() {
        let config = parse_ssh_config("Host web\\n  HostName 10.0.0.5\\n  Port 22\\n");
        assert_eq!(config.get("Host").map(String::as_str), Some("web"));
        assert_eq!(config.get("HostName").map(String::as_str), Some("10.0.0.5"));
        assert_eq!(config.get("Port").map(String::as_str), Some("22"));
    }

    #[test]
    fn test_ignores_non_setting_lines() {
        let block = "# comment\n\n  lowercase value\n  X single\n  Port 2222\nnot-a-setting\n";
        let config = parse_ssh_config(block);
        assert_eq!(config.len(), 1);
        assert_eq!(config.get("Port").map(String::as_str), Some("2222"));
    }

    #[test]
    fn test_duplicate_settings_keep_last() {
        let config = parse_ssh_config("  IdentityFile /a\n  IdentityFile /b\n");
        assert_eq!(config.get("IdentityFile").map(String::as_str), Some("/b"));
    }

    #[test]
    fn test_value_is_rest_of_line() {
        let config = parse_ssh_config("  ProxyCommand ssh -W %h:%p bastion\r\n");
        assert_eq!(
            config.get("ProxyCommand").map(String::as_str),
            Some("ssh -W %h:%p bastion")
        );
    }

    #[test]
    fn test_reparse_of_rendered_config() {
        let config = parse_ssh_config(VAGRANT_BLOCK);
        assert_eq!(parse_ssh_config(&render_ssh_config(&config)), config);
    }

    #[test]
    fn test_empty_block() {
        assert!(parse_ssh_config("").is_empty());
    }
}
