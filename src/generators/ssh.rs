//! One profile per host alias in `~/.ssh/config`.

use std::path::Path;

use super::ProfileGenerator;
use strata_config::{Origin, Profile};

/// A connectable host from an SSH config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshHost {
    /// The `Host` alias, used as the profile name and as the `ssh` target
    pub alias: String,
    pub hostname: Option<String>,
    pub user: Option<String>,
    pub port: Option<u16>,
}

impl SshHost {
    pub fn new(alias: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            hostname: None,
            user: None,
            port: None,
        }
    }

    /// `user@hostname:port` with whatever parts are known.
    pub fn connection_string(&self) -> String {
        let host = self.hostname.as_deref().unwrap_or(&self.alias);
        let mut s = match &self.user {
            Some(user) => format!("{user}@{host}"),
            None => host.to_string(),
        };
        if let Some(port) = self.port.filter(|p| *p != 22) {
            s.push_str(&format!(":{port}"));
        }
        s
    }
}

/// Parse an SSH config file. A missing or unreadable file yields no hosts.
pub fn parse_ssh_config(path: &Path) -> Vec<SshHost> {
    match std::fs::read_to_string(path) {
        Ok(content) => parse_ssh_config_str(&content),
        Err(e) => {
            log::debug!("No SSH config at {:?}: {}", path, e);
            Vec::new()
        }
    }
}

/// Parse SSH config text.
///
/// Wildcard patterns (`Host *`, `Host web-?`) are defaults rather than
/// targets and are skipped. `Host a b` yields one entry per alias.
pub fn parse_ssh_config_str(content: &str) -> Vec<SshHost> {
    let mut hosts = Vec::new();
    let mut block = SshHost::new("");
    let mut aliases: Vec<String> = Vec::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (key, value) = if let Some(eq_pos) = line.find('=') {
            let (k, v) = line.split_at(eq_pos);
            (k.trim(), v[1..].trim())
        } else if let Some(space_pos) = line.find(char::is_whitespace) {
            let (k, v) = line.split_at(space_pos);
            (k.trim(), v.trim())
        } else {
            continue;
        };

        match key.to_lowercase().as_str() {
            "host" => {
                flush_host_block(&aliases, &block, &mut hosts);
                aliases = value
                    .split_whitespace()
                    .filter(|a| !a.contains('*') && !a.contains('?') && !a.starts_with('!'))
                    .map(String::from)
                    .collect();
                block = SshHost::new("");
            }
            // `Match` blocks apply conditionally; nothing after them belongs
            // to the previous `Host`.
            "match" => {
                flush_host_block(&aliases, &block, &mut hosts);
                aliases.clear();
                block = SshHost::new("");
            }
            "hostname" => block.hostname = Some(value.to_string()),
            "user" => block.user = Some(value.to_string()),
            "port" => block.port = value.parse().ok(),
            _ => {}
        }
    }

    flush_host_block(&aliases, &block, &mut hosts);
    hosts
}

fn flush_host_block(aliases: &[String], block: &SshHost, hosts: &mut Vec<SshHost>) {
    for alias in aliases {
        if hosts.iter().any(|h| &h.alias == alias) {
            continue;
        }
        hosts.push(SshHost {
            alias: alias.clone(),
            ..block.clone()
        });
    }
}

/// Generates an `ssh <alias>` profile per configured host.
#[derive(Debug, Clone, Default)]
pub struct SshHostProfileGenerator {
    hosts: Vec<SshHost>,
}

impl SshHostProfileGenerator {
    pub const NAMESPACE: &'static str = "Strata.SshHosts";

    /// Hosts from `~/.ssh/config`.
    pub fn from_user_config() -> Self {
        let hosts = dirs::home_dir()
            .map(|home| parse_ssh_config(&home.join(".ssh").join("config")))
            .unwrap_or_default();
        log::debug!("Found {} SSH hosts", hosts.len());
        Self { hosts }
    }

    pub fn with_hosts(hosts: Vec<SshHost>) -> Self {
        Self { hosts }
    }

    pub fn hosts(&self) -> &[SshHost] {
        &self.hosts
    }
}

impl ProfileGenerator for SshHostProfileGenerator {
    fn namespace(&self) -> &str {
        Self::NAMESPACE
    }

    fn generate_profiles(&self, profiles: &mut Vec<Profile>) -> anyhow::Result<()> {
        for host in &self.hosts {
            if host.alias.chars().any(char::is_whitespace) {
                anyhow::bail!("SSH host alias {:?} contains whitespace", host.alias);
            }
            let mut profile = Profile::new(&host.alias).with_origin(Origin::Generated);
            profile.source = Some(Self::NAMESPACE.to_string());
            profile.commandline = Some(format!("ssh {}", host.alias));
            profile.tab_title = Some(host.connection_string());
            profile.ensure_guid();
            profiles.push(profile);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_config::derive_profile_guid;

    #[test]
    fn test_parse_basic_host() {
        let config = r#"
Host myserver
    HostName 192.168.1.100
    User deploy
    Port 2222
"#;
        let hosts = parse_ssh_config_str(config);
        assert_eq!(hosts.len(), 1);
        assert_eq!(hosts[0].alias, "myserver");
        assert_eq!(hosts[0].hostname.as_deref(), Some("192.168.1.100"));
        assert_eq!(hosts[0].user.as_deref(), Some("deploy"));
        assert_eq!(hosts[0].port, Some(2222));
        assert_eq!(hosts[0].connection_string(), "deploy@192.168.1.100:2222");
    }

    #[test]
    fn test_wildcards_skipped_and_multi_alias_split() {
        let config = r#"
Host *
    User everyone

Host web web-alt
    HostName=web.example.com

Host db-? !bastion
    User admin
"#;
        let hosts = parse_ssh_config_str(config);
        let aliases: Vec<&str> = hosts.iter().map(|h| h.alias.as_str()).collect();
        assert_eq!(aliases, ["web", "web-alt"]);
        assert!(hosts.iter().all(|h| h.user.is_none()));
        assert_eq!(hosts[1].hostname.as_deref(), Some("web.example.com"));
    }

    #[test]
    fn test_match_block_ends_host() {
        let config = "Host a\n  User one\nMatch host a\n  User two\n";
        let hosts = parse_ssh_config_str(config);
        assert_eq!(hosts.len(), 1);
        assert_eq!(hosts[0].user.as_deref(), Some("one"));
    }

    #[test]
    fn test_generated_profiles() {
        let generator = SshHostProfileGenerator::with_hosts(vec![SshHost::new("web")]);
        let mut profiles = Vec::new();
        generator.generate_profiles(&mut profiles).unwrap();

        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].commandline.as_deref(), Some("ssh web"));
        assert_eq!(profiles[0].tab_title.as_deref(), Some("web"));
        assert_eq!(
            profiles[0].guid,
            Some(derive_profile_guid("web", Some(SshHostProfileGenerator::NAMESPACE)))
        );
        assert!(generator.preferred_default_profile_name().is_none());
    }

    #[test]
    fn test_bad_alias_fails_generation() {
        let generator = SshHostProfileGenerator::with_hosts(vec![SshHost::new("two words")]);
        let mut profiles = Vec::new();
        assert!(generator.generate_profiles(&mut profiles).is_err());
    }
}
