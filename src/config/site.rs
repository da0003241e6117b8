//! The site-specific YAML file describing how to reach the PBX.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

/// Environment variable that overrides the configuration file location.
pub const CONFIG_ENV: &str = "AUER_CFG_CONFIG";

const CONFIG_FILE: &str = "auerswald.cfg.yaml";

/// Connection settings for one PBX.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Reach the PBX through an SSH local port-forward.
    #[serde(default)]
    pub ssh_tunnel: bool,

    /// SSH jump host.
    #[serde(default)]
    pub ssh_host: Option<String>,

    #[serde(default = "default_ssh_port")]
    pub ssh_port: u16,

    #[serde(default)]
    pub ssh_user: Option<String>,

    /// Falls back to key authentication when absent.
    #[serde(default)]
    pub ssh_pass: Option<String>,

    /// Address of the PBX web interface, as seen from the SSH host when tunnelling.
    pub auer_address: String,

    pub auer_admin_user: String,

    pub auer_admin_pass: String,

    /// Pause after activating a profile before re-reading the page.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
}

fn default_ssh_port() -> u16 {
    22
}

fn default_settle_ms() -> u64 {
    1000
}

impl SiteConfig {
    /// Load the configuration, honouring an explicit path first.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = Self::config_path(explicit)?;
        Self::from_file(&path)
    }

    /// Parse a configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        tracing::debug!(path = %path.display(), tunnel = config.ssh_tunnel, "loaded configuration");
        Ok(config)
    }

    /// Resolve which file to read.
    ///
    /// Order: explicit path, `AUER_CFG_CONFIG`, next to the executable, then the
    /// user's config directory. Explicit locations must exist.
    pub fn config_path(explicit: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = explicit {
            return Ok(path.to_path_buf());
        }
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Ok(PathBuf::from(path));
        }

        let candidates = Self::default_locations();
        candidates
            .iter()
            .find(|p| p.is_file())
            .cloned()
            .ok_or_else(|| {
                let looked: Vec<String> =
                    candidates.iter().map(|p| p.display().to_string()).collect();
                Error::NoConfigFound(looked.join(", "))
            })
    }

    fn default_locations() -> Vec<PathBuf> {
        let mut locations = Vec::new();
        if let Ok(exe) = std::env::current_exe()
            && let Some(dir) = exe.parent()
        {
            locations.push(dir.join(CONFIG_FILE));
        }
        if let Some(dir) = dirs::config_dir() {
            locations.push(dir.join("auer-cfg").join(CONFIG_FILE));
        }
        locations
    }

    fn validate(&self) -> Result<()> {
        if self.auer_address.trim().is_empty() {
            return Err(Error::Config("auer_address must not be empty".into()));
        }
        if self.ssh_tunnel {
            if self.ssh_host.as_deref().is_none_or(|h| h.trim().is_empty()) {
                return Err(Error::Config("ssh_tunnel requires ssh_host".into()));
            }
            if self.ssh_user.as_deref().is_none_or(|u| u.trim().is_empty()) {
                return Err(Error::Config("ssh_tunnel requires ssh_user".into()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn loads_tunnelled_site() {
        let temp = TempDir::new().unwrap();
        let path = write(
            &temp,
            "ssh_tunnel: true\n\
             ssh_host: gw.example.org\n\
             ssh_user: ops\n\
             ssh_pass: hunter2\n\
             auer_address: 192.168.0.240\n\
             auer_admin_user: admin\n\
             auer_admin_pass: secret\n",
        );

        let config = SiteConfig::from_file(&path).unwrap();
        assert!(config.ssh_tunnel);
        assert_eq!(config.ssh_port, 22);
        assert_eq!(config.ssh_host.as_deref(), Some("gw.example.org"));
        assert_eq!(config.auer_address, "192.168.0.240");
    }

    #[test]
    fn direct_site_needs_no_ssh_keys() {
        let temp = TempDir::new().unwrap();
        let path = write(
            &temp,
            "auer_address: pbx.lan\nauer_admin_user: admin\nauer_admin_pass: secret\n",
        );

        let config = SiteConfig::from_file(&path).unwrap();
        assert!(!config.ssh_tunnel);
        assert!(config.ssh_pass.is_none());
        assert_eq!(config.settle_ms, 1000);
    }

    #[test]
    fn tunnel_without_host_is_rejected() {
        let temp = TempDir::new().unwrap();
        let path = write(
            &temp,
            "ssh_tunnel: true\nssh_user: ops\nauer_address: pbx.lan\n\
             auer_admin_user: admin\nauer_admin_pass: secret\n",
        );

        let err = SiteConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn missing_required_key_is_a_yaml_error() {
        let temp = TempDir::new().unwrap();
        let path = write(&temp, "auer_address: pbx.lan\n");

        let err = SiteConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, Error::Yaml(_)));
    }

    #[test]
    fn explicit_path_wins() {
        let path = Path::new("/nonexistent/site.yaml");
        assert_eq!(SiteConfig::config_path(Some(path)).unwrap(), path);
    }
}
