//! Configuration loading and config file resolution
//!
//! Bootstrap settings come from a TOML file. The file is located in priority order:
//! 1. Command-line argument (highest priority)
//! 2. `DARS_CONFIG` environment variable
//! 3. `~/.config/dars/config.toml`
//! 4. Built-in defaults (no file)
//!
//! A missing file is never fatal: defaults are used and the caller logs a warning
//! through [`ConfigSource::log`].
//! A file that exists but does not parse or validate is a configuration error.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming the configuration file
pub const CONFIG_ENV_VAR: &str = "DARS_CONFIG";

/// Catalog search endpoint used when none is configured
pub const DEFAULT_CATALOG_URL: &str = "https://content.osu.edu/v2/classes/search";

/// Academic terms queried most-recent-first: AU25, SU25, SP25, AU24
///
/// Shift this window as the catalog's valid terms move.
pub const DEFAULT_TERMS: [u32; 4] = [1258, 1254, 1252, 1248];

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub aggregation: AggregationConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// External catalog service settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CatalogConfig {
    /// Search endpoint
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Value of the `client` query parameter
    #[serde(default = "default_client")]
    pub client: String,

    /// Campus used for the filtered first pass of each term
    #[serde(default = "default_campus")]
    pub campus: String,

    /// Term identifiers, highest priority first
    #[serde(default = "default_terms")]
    pub terms: Vec<u32>,

    /// Per-request network timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Minimum spacing between catalog requests (0 disables)
    #[serde(default)]
    pub min_request_interval_ms: u64,
}

/// Requirement aggregation settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AggregationConfig {
    /// Course lookups allowed in flight at once (1 = strictly sequential)
    #[serde(default = "default_max_concurrent_lookups")]
    pub max_concurrent_lookups: usize,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_base_url() -> String {
    DEFAULT_CATALOG_URL.to_string()
}

fn default_client() -> String {
    "class-search-ui".to_string()
}

fn default_campus() -> String {
    "col".to_string()
}

fn default_terms() -> Vec<u32> {
    DEFAULT_TERMS.to_vec()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_concurrent_lookups() -> usize {
    1
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            client: default_client(),
            campus: default_campus(),
            terms: default_terms(),
            timeout_secs: default_timeout_secs(),
            min_request_interval_ms: 0,
        }
    }
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            max_concurrent_lookups: default_max_concurrent_lookups(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl TomlConfig {
    /// Parse and validate configuration text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Reject settings the resolver and aggregator cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.catalog.terms.is_empty() {
            return Err(Error::Config("catalog.terms must list at least one term".to_string()));
        }
        if self.catalog.base_url.trim().is_empty() {
            return Err(Error::Config("catalog.base_url must not be empty".to_string()));
        }
        if self.catalog.timeout_secs == 0 {
            return Err(Error::Config("catalog.timeout_secs must be at least 1".to_string()));
        }
        if self.aggregation.max_concurrent_lookups == 0 {
            return Err(Error::Config(
                "aggregation.max_concurrent_lookups must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Locate the configuration file by priority order
///
/// Returns `None` when no candidate names a file, meaning built-in defaults apply.
/// CLI and environment paths are returned even if missing so the caller can warn.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: User config directory
    dirs::config_dir()
        .map(|d| d.join("dars").join("config.toml"))
        .filter(|p| p.exists())
}

/// Where the loaded configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// No candidate file; built-in defaults
    Defaults,
    /// A file was named but does not exist; built-in defaults
    Missing(PathBuf),
    /// Parsed from this file
    File(PathBuf),
}

impl ConfigSource {
    /// Report the source once logging is up
    ///
    /// Config is read before the subscriber exists (its level comes from the
    /// file), so the outcome is carried here and logged afterwards.
    pub fn log(&self) {
        match self {
            ConfigSource::Defaults => {
                info!("No configuration file found, using built-in defaults")
            }
            ConfigSource::Missing(path) => warn!(
                "Configuration file {} does not exist, using built-in defaults",
                path.display()
            ),
            ConfigSource::File(path) => info!("Configuration loaded from {}", path.display()),
        }
    }
}

/// Configuration together with its source
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedConfig {
    pub config: TomlConfig,
    pub source: ConfigSource,
}

/// Resolve and load configuration, falling back to defaults when no file exists
pub fn load_config(cli_arg: Option<&Path>) -> Result<LoadedConfig> {
    let Some(path) = resolve_config_path(cli_arg) else {
        return Ok(LoadedConfig {
            config: TomlConfig::default(),
            source: ConfigSource::Defaults,
        });
    };

    if !path.exists() {
        return Ok(LoadedConfig {
            config: TomlConfig::default(),
            source: ConfigSource::Missing(path),
        });
    }

    let config = TomlConfig::load(&path)?;
    Ok(LoadedConfig {
        config,
        source: ConfigSource::File(path),
    })
}
