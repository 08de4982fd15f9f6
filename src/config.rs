//! Configuration loading
//!
//! Settings come from an optional YAML file (path in `FACTSYNC_CONFIG`,
//! default `config/factsync.yaml`) with environment variables taking
//! precedence. Credentials are normally supplied through the environment.
//!
//! ```yaml
//! verbose: true
//! http_timeout_secs: 30
//! facts:
//!   url: http://puppetdb.example.com:8080/v2/facts/
//!   filter_mapped: true
//! inventory:
//!   url: https://satellite.example.com/rpc/api
//!   username: factsync
//! mapping:
//!   location: location
//!   server_environment: environment
//! ```

use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::time::Duration;
use url::Url;

use crate::error::ConfigError;
use crate::mapping::MappingRule;

pub const CONFIG_PATH_ENV: &str = "FACTSYNC_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config/factsync.yaml";

pub const FACTS_URL_ENV: &str = "FACTSYNC_FACTS_URL";
pub const INVENTORY_URL_ENV: &str = "FACTSYNC_INVENTORY_URL";
pub const INVENTORY_USER_ENV: &str = "FACTSYNC_INVENTORY_USER";
pub const INVENTORY_PASSWORD_ENV: &str = "FACTSYNC_INVENTORY_PASSWORD";
pub const VERBOSE_ENV: &str = "FACTSYNC_VERBOSE";

const DEFAULT_FACTS_URL: &str = "http://localhost:8080/v2/facts/";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Resolved configuration for one run
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub facts: FactFeedConfig,
    pub inventory: InventoryConfig,
    pub http_timeout_secs: u64,
    pub verbose: bool,
    pub mapping: MappingRule,
}

/// Where to fetch facts from
#[derive(Debug, Clone)]
pub struct FactFeedConfig {
    pub url: Url,
    /// Ask the feed for mapped fact names only
    pub filter_mapped: bool,
}

/// Inventory RPC endpoint and login
#[derive(Debug, Clone)]
pub struct InventoryConfig {
    pub url: Url,
    pub credentials: Credentials,
}

/// Inventory login. Debug output never shows the password.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// On-disk shape; every field optional so the environment can fill gaps
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    #[serde(default)]
    verbose: Option<bool>,
    #[serde(default)]
    http_timeout_secs: Option<u64>,
    #[serde(default)]
    facts: FileFactsSection,
    #[serde(default)]
    inventory: FileInventorySection,
    #[serde(default)]
    mapping: Option<MappingRule>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileFactsSection {
    url: Option<String>,
    #[serde(default)]
    filter_mapped: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileInventorySection {
    url: Option<String>,
    username: Option<String>,
    password: Option<String>,
}

impl SyncConfig {
    /// Load from `FACTSYNC_CONFIG` (or the default path) plus the process environment
    pub fn load() -> Result<Self, ConfigError> {
        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::from_file(&path, |name| std::env::var(name).ok())
    }

    /// Load from `path`; a missing file means "defaults plus environment"
    pub fn from_file<E>(path: impl AsRef<Path>, env: E) -> Result<Self, ConfigError>
    where
        E: Fn(&str) -> Option<String>,
    {
        let path = path.as_ref();
        let file = match std::fs::read_to_string(path) {
            Ok(content) => parse_file(&content, path)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file, using environment only");
                FileConfig::default()
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.display().to_string(),
                    source,
                })
            }
        };
        Self::resolve(file, env)
    }

    /// Load from a YAML string plus an environment lookup
    pub fn from_yaml<E>(content: &str, env: E) -> Result<Self, ConfigError>
    where
        E: Fn(&str) -> Option<String>,
    {
        let file = parse_file(content, Path::new("<inline>"))?;
        Self::resolve(file, env)
    }

    fn resolve<E>(file: FileConfig, env: E) -> Result<Self, ConfigError>
    where
        E: Fn(&str) -> Option<String>,
    {
        let env = |name: &str| env(name).filter(|v| !v.trim().is_empty());

        let facts_url = env(FACTS_URL_ENV)
            .or(file.facts.url)
            .unwrap_or_else(|| DEFAULT_FACTS_URL.to_string());
        let facts_url = parse_url("facts.url", &facts_url)?;

        let inventory_url = env(INVENTORY_URL_ENV)
            .or(file.inventory.url)
            .ok_or(ConfigError::Missing {
                setting: "inventory.url",
                env: INVENTORY_URL_ENV,
            })?;
        let inventory_url = parse_url("inventory.url", &inventory_url)?;

        let username = env(INVENTORY_USER_ENV)
            .or(file.inventory.username)
            .ok_or(ConfigError::Missing {
                setting: "inventory.username",
                env: INVENTORY_USER_ENV,
            })?;
        let password = env(INVENTORY_PASSWORD_ENV)
            .or(file.inventory.password)
            .ok_or(ConfigError::Missing {
                setting: "inventory.password",
                env: INVENTORY_PASSWORD_ENV,
            })?;

        let verbose = match env(VERBOSE_ENV) {
            Some(flag) => parse_flag(&flag),
            None => file.verbose.unwrap_or(false),
        };

        let mapping = match file.mapping {
            Some(rule) => {
                rule.validate()?;
                rule
            }
            None => MappingRule::builtin(),
        };

        let http_timeout_secs = file
            .http_timeout_secs
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);
        if http_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout);
        }

        Ok(Self {
            facts: FactFeedConfig {
                url: facts_url,
                filter_mapped: file.facts.filter_mapped,
            },
            inventory: InventoryConfig {
                url: inventory_url,
                credentials: Credentials { username, password },
            },
            http_timeout_secs,
            verbose,
            mapping,
        })
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn credentials(&self) -> &Credentials {
        &self.inventory.credentials
    }
}

fn parse_file(content: &str, path: &Path) -> Result<FileConfig, ConfigError> {
    serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

fn parse_url(setting: &'static str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw.trim()).map_err(|source| ConfigError::InvalidUrl { setting, source })
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
