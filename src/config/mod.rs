// ABOUTME: Configuration types and parsing for shopstack.yml.
// ABOUTME: Handles YAML parsing, defaults for every section, and environment overrides.

mod healthcheck;
mod init;
mod ports;
mod stack;
mod timing;

pub use healthcheck::HealthcheckConfig;
pub use init::init_config;
pub use ports::PortsConfig;
pub use stack::StackConfig;
pub use timing::{ApplicationPolling, DatabasePolling, FinalizeConfig, LaunchConfig, ProgressConfig};

use crate::error::{Error, Result};
use crate::runtime::RuntimeConfig;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

pub const CONFIG_FILENAME: &str = "shopstack.yml";
pub const CONFIG_FILENAME_ALT: &str = "shopstack.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".shopstack/config.yml";

/// Environment variable overriding `ports.base`.
pub const ENV_BASE_PORT: &str = "BASE_PORT";
/// Environment variable overriding `public_host`.
pub const ENV_SERVER_IP: &str = "SERVER_IP";
/// Environment variable overriding `listen`.
pub const ENV_LISTEN: &str = "SHOPSTACK_LISTEN";
/// Environment variable overriding `tenants_dir`.
pub const ENV_TENANTS_DIR: &str = "SHOPSTACK_TENANTS_DIR";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub listen: SocketAddr,
    pub tenants_dir: PathBuf,

    /// Host name or address used in store URLs handed back to callers.
    pub public_host: Option<String>,

    /// Ask the EC2 instance metadata service for the public address when
    /// `public_host` is unset.
    pub detect_public_host: bool,

    pub ports: PortsConfig,
    pub runtime: RuntimeConfig,
    pub launch: LaunchConfig,
    pub database: DatabasePolling,
    pub application: ApplicationPolling,
    pub finalize: FinalizeConfig,
    pub progress: ProgressConfig,
    pub stack: StackConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            listen: SocketAddr::from(([0, 0, 0, 0], 5000)),
            tenants_dir: PathBuf::from("tenants"),
            public_host: None,
            detect_public_host: false,
            ports: PortsConfig::default(),
            runtime: RuntimeConfig::default(),
            launch: LaunchConfig::default(),
            database: DatabasePolling::default(),
            application: ApplicationPolling::default(),
            finalize: FinalizeConfig::default(),
            progress: ProgressConfig::default(),
            stack: StackConfig::default(),
        }
    }
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty document deserializes to unit, not to an empty map.
        if yaml.trim().is_empty() {
            return Ok(Config::default());
        }
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    /// Load an explicit file, or discover one in `dir`, falling back to
    /// defaults when nothing is found. Environment overrides apply last.
    pub fn resolve(explicit: Option<&Path>, dir: &Path) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::load(path)?,
            None => match Self::discover(dir) {
                Ok(config) => config,
                Err(Error::ConfigNotFound(_)) => {
                    tracing::debug!(dir = %dir.display(), "no config file found, using defaults");
                    Config::default()
                }
                Err(e) => return Err(e),
            },
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup. Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(value) = get(ENV_BASE_PORT) {
            self.ports.base = value.trim().parse().map_err(|_| {
                Error::InvalidConfig(format!("{ENV_BASE_PORT} is not a port: {value}"))
            })?;
        }

        if let Some(value) = get(ENV_SERVER_IP) {
            self.public_host = Some(value.trim().to_string());
        }

        if let Some(value) = get(ENV_LISTEN) {
            self.listen = value.trim().parse().map_err(|_| {
                Error::InvalidConfig(format!("{ENV_LISTEN} is not a socket address: {value}"))
            })?;
        }

        if let Some(value) = get(ENV_TENANTS_DIR) {
            self.tenants_dir = PathBuf::from(value);
        }

        self.validate()
    }

    fn validate(&self) -> Result<()> {
        if self.ports.base == 0 {
            return Err(Error::InvalidConfig("ports.base must be non-zero".into()));
        }
        if self.ports.last().is_none() {
            return Err(Error::InvalidConfig(format!(
                "ports.base {} plus ports.range {} exceeds 65535",
                self.ports.base, self.ports.range
            )));
        }
        if self.database.max_attempts == 0 || self.application.max_attempts == 0 {
            return Err(Error::InvalidConfig(
                "max_attempts must be at least 1".into(),
            ));
        }
        if !self.stack.admin_folder.starts_with(&self.stack.admin_prefix) {
            return Err(Error::InvalidConfig(format!(
                "stack.admin_folder '{}' must start with stack.admin_prefix '{}'",
                self.stack.admin_folder, self.stack.admin_prefix
            )));
        }
        Ok(())
    }

    pub fn template() -> Self {
        Config::default()
    }
}
