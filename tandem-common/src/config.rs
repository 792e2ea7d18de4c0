//! Configuration loading and resolution
//!
//! Priority order for every setting:
//! 1. Command-line argument / environment variable (parsed by the binary)
//! 2. TOML config file
//! 3. Compiled defaults

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::ids::DEFAULT_CODE_LENGTH;
use crate::{Error, Result};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "TANDEM_CONFIG";

/// Compiled default values
pub mod defaults {
    pub const HOST: &str = "127.0.0.1";
    pub const PORT: u16 = 5780;
    pub const MIN_ITEMS: usize = 3;
    pub const CHOICE_TIMEOUT_SECS: u64 = 0;
    pub const OUTBOUND_BUFFER: usize = 64;
    pub const EVENT_CAPACITY: usize = 256;
}

/// Settings as they appear in `config.toml`; every key is optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TomlConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub code_length: Option<usize>,
    pub min_items: Option<usize>,
    pub choice_timeout_secs: Option<u64>,
    pub outbound_buffer: Option<usize>,
    pub event_capacity: Option<usize>,
}

/// Highest-priority overrides, normally filled from clap
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub choice_timeout_secs: Option<u64>,
}

/// Fully resolved server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Room code length
    pub code_length: usize,
    /// Minimum valid names per submission (checked by the adapter)
    pub min_items: usize,
    /// Auto-neutral deadline per card; 0 disables it
    pub choice_timeout_secs: u64,
    /// Per-connection outbound queue depth
    pub outbound_buffer: usize,
    /// Lifecycle event bus capacity
    pub event_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: defaults::HOST.to_string(),
            port: defaults::PORT,
            code_length: DEFAULT_CODE_LENGTH,
            min_items: defaults::MIN_ITEMS,
            choice_timeout_secs: defaults::CHOICE_TIMEOUT_SECS,
            outbound_buffer: defaults::OUTBOUND_BUFFER,
            event_capacity: defaults::EVENT_CAPACITY,
        }
    }
}

impl ServerConfig {
    /// Layer overrides over the file over compiled defaults, then validate
    pub fn resolve(overrides: ConfigOverrides, file: Option<TomlConfig>) -> Result<Self> {
        let file = file.unwrap_or_default();
        let base = Self::default();

        let config = Self {
            host: overrides.host.or(file.host).unwrap_or(base.host),
            port: overrides.port.or(file.port).unwrap_or(base.port),
            code_length: file.code_length.unwrap_or(base.code_length),
            min_items: file.min_items.unwrap_or(base.min_items),
            choice_timeout_secs: overrides
                .choice_timeout_secs
                .or(file.choice_timeout_secs)
                .unwrap_or(base.choice_timeout_secs),
            outbound_buffer: file.outbound_buffer.unwrap_or(base.outbound_buffer),
            event_capacity: file.event_capacity.unwrap_or(base.event_capacity),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject values the server cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.code_length == 0 {
            return Err(Error::Config("code_length must be at least 1".to_string()));
        }
        if self.outbound_buffer == 0 {
            return Err(Error::Config("outbound_buffer must be at least 1".to_string()));
        }
        if self.event_capacity == 0 {
            return Err(Error::Config("event_capacity must be at least 1".to_string()));
        }
        if self.host.trim().is_empty() {
            return Err(Error::Config("host must not be empty".to_string()));
        }
        Ok(())
    }

    /// `host:port` string for binding
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Locate the config file
///
/// Explicit path first, then `TANDEM_CONFIG`, then the user config directory,
/// then `/etc/tandem/config.toml` on Linux. Only the explicit path and the
/// environment variable are required to exist.
pub fn config_file_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        return require_file(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return require_file(PathBuf::from(path));
        }
    }

    if let Some(user) = dirs::config_dir().map(|d| d.join("tandem").join("config.toml")) {
        if user.exists() {
            return Ok(Some(user));
        }
    }

    if cfg!(target_os = "linux") {
        let system = PathBuf::from("/etc/tandem/config.toml");
        if system.exists() {
            return Ok(Some(system));
        }
    }

    Ok(None)
}

fn require_file(path: PathBuf) -> Result<Option<PathBuf>> {
    if path.is_file() {
        Ok(Some(path))
    } else {
        Err(Error::Config(format!("Config file not found: {}", path.display())))
    }
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Find and parse the config file, falling back to defaults when none exists
///
/// A missing default-location file is not an error; a named file that is
/// missing or malformed is.
pub fn load_config(explicit: Option<&Path>, overrides: ConfigOverrides) -> Result<ServerConfig> {
    let file = match config_file_path(explicit)? {
        Some(path) => {
            debug!("Loading config from {}", path.display());
            Some(load_toml_config(&path)?)
        }
        None => {
            warn!("No config file found, using defaults");
            None
        }
    };
    ServerConfig::resolve(overrides, file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 5780);
        assert_eq!(config.code_length, 6);
        assert_eq!(config.min_items, 3);
        assert_eq!(config.choice_timeout_secs, 0);
        assert!(config.validate().is_ok());
        assert_eq!(config.bind_addr(), "127.0.0.1:5780");
    }

    #[test]
    fn test_priority_order() {
        let file = TomlConfig {
            host: Some("0.0.0.0".to_string()),
            port: Some(9000),
            min_items: Some(5),
            ..Default::default()
        };
        let overrides = ConfigOverrides {
            port: Some(9100),
            ..Default::default()
        };
        let config = ServerConfig::resolve(overrides, Some(file)).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 9100);
        assert_eq!(config.min_items, 5);
        assert_eq!(config.outbound_buffer, defaults::OUTBOUND_BUFFER);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let file = TomlConfig {
            code_length: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            ServerConfig::resolve(ConfigOverrides::default(), Some(file)),
            Err(Error::Config(_))
        ));

        let file = TomlConfig {
            outbound_buffer: Some(0),
            ..Default::default()
        };
        assert!(ServerConfig::resolve(ConfigOverrides::default(), Some(file)).is_err());
    }

    #[test]
    fn test_toml_parsing() {
        let parsed: TomlConfig = toml::from_str("port = 6000\nchoice_timeout_secs = 10\n").unwrap();
        assert_eq!(parsed.port, Some(6000));
        assert_eq!(parsed.choice_timeout_secs, Some(10));
        assert_eq!(parsed.host, None);

        assert!(toml::from_str::<TomlConfig>("colour = \"blue\"").is_err());
    }
}
