//! Server configuration: YAML file plus environment overrides.
//!
//! The file is `visitbadge.yaml` in the working directory, or whatever
//! `VISITBADGE_CONFIG` points to. Every field has a default, so an absent
//! default file is not an error. After the file, these environment variables
//! are applied:
//!
//! | variable | effect |
//! |----------|--------|
//! | `PORT` | `server.port` |
//! | `KEY` | `key.secret` |
//! | `REDIS_URL` | `store` becomes Redis at that address |
//! | `SHIELDS_URL` | `render.primary` |
//! | `DEBUG=enabled` | `server.debug` |
//! | `MAINTENANCE=enabled` | `server.maintenance` |

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use visitbadge::offload::OffloadConfig;
use visitbadge::{CacheConfig, RenderConfig, ServiceConfig};
use visitbadge_redis::RedisStore;
use visitbadge_store::{MemoryStore, SharedStore};

use crate::error::{ConfigError, ServerError};

/// Default config file name.
pub const DEFAULT_CONFIG_PATH: &str = "visitbadge.yaml";

/// Environment variable overriding the config file path.
pub const CONFIG_PATH_VAR: &str = "VISITBADGE_CONFIG";

/// Complete server configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Listener and lifecycle.
    pub server: ServerConfig,
    /// Page hashing.
    pub key: KeyConfig,
    /// Durable counter store.
    pub store: StoreConfig,
    /// Counter cache.
    pub cache: CacheConfig,
    /// Badge renderer.
    pub render: RenderConfig,
    /// Background resyncs.
    pub offload: OffloadConfig,
}

/// Listener and lifecycle settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// TCP port, bound on all interfaces.
    pub port: u16,
    /// Deadline for connection draining plus resync draining.
    #[serde(with = "humantime_serde")]
    pub shutdown_timeout: Duration,
    /// Upper bound on serving one badge.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Debug logging when `RUST_LOG` is unset.
    pub debug: bool,
    /// Exposes `/rec`.
    pub maintenance: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            shutdown_timeout: Duration::from_secs(15),
            request_timeout: Duration::from_secs(10),
            debug: false,
            maintenance: false,
        }
    }
}

/// Page hashing settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyConfig {
    /// Secret appended to page identifiers before hashing.
    pub secret: String,
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            secret: "guess_what".to_owned(),
        }
    }
}

/// Which durable store to use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StoreBackend {
    /// Redis at `url`.
    Redis {
        /// `redis://host:port[/db]`.
        url: String,
    },
    /// Process-local map; counts are lost on restart.
    Memory,
}

impl Default for StoreBackend {
    fn default() -> Self {
        Self::Redis {
            url: "redis://localhost:6379".to_owned(),
        }
    }
}

/// Durable store settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Store implementation.
    pub backend: StoreBackend,
    /// Deadline for a single store call.
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            timeout: visitbadge_moka::DEFAULT_STORE_TIMEOUT,
        }
    }
}

impl StoreConfig {
    /// Creates the configured store. Redis connects lazily on first use.
    pub fn connect(&self) -> Result<SharedStore, ServerError> {
        Ok(match &self.backend {
            StoreBackend::Redis { url } => Arc::new(RedisStore::builder().server(url).build()?),
            StoreBackend::Memory => Arc::new(MemoryStore::new()),
        })
    }
}

impl Config {
    /// Loads the config file and applies environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let explicit = std::env::var_os(CONFIG_PATH_VAR).map(PathBuf::from);
        let mut config = match &explicit {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_PATH))?
            }
            None => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Reads and parses one YAML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        Self::from_yaml(&raw)
    }

    /// Parses YAML text.
    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        serde_saphyr::from_str(raw).map_err(|error| ConfigError::Parse(error.to_string()))
    }

    /// Applies the environment overrides, reading variables through `var`.
    pub fn apply_env<F>(&mut self, var: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let set = |name: &str| var(name).filter(|value| !value.is_empty());

        if let Some(port) = set("PORT") {
            self.server.port = port.parse().map_err(|_| ConfigError::InvalidEnv {
                name: "PORT",
                value: port,
            })?;
        }
        if let Some(secret) = set("KEY") {
            self.key.secret = secret;
        }
        if let Some(url) = set("REDIS_URL") {
            self.store.backend = StoreBackend::Redis {
                url: redis_url(&url),
            };
        }
        if let Some(url) = set("SHIELDS_URL") {
            self.render.primary = url;
        }
        if set("DEBUG").is_some_and(|value| value.eq_ignore_ascii_case("enabled")) {
            self.server.debug = true;
        }
        if set("MAINTENANCE").is_some_and(|value| value.eq_ignore_ascii_case("enabled")) {
            self.server.maintenance = true;
        }
        Ok(())
    }

    /// The part handed to [`BadgeService`](visitbadge::BadgeService).
    pub fn service(&self) -> ServiceConfig {
        ServiceConfig {
            cache: self.cache.clone(),
            render: self.render.clone(),
            offload: self.offload.clone(),
        }
    }
}

/// Accepts bare `host:port` as well as full `redis://` URLs.
fn redis_url(raw: &str) -> String {
    if raw.contains("://") {
        raw.to_owned()
    } else {
        format!("redis://{raw}")
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use visitbadge::Capacity;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.shutdown_timeout, Duration::from_secs(15));
        assert!(!config.server.maintenance);
        assert_eq!(config.key.secret, "guess_what");
        assert_eq!(
            config.store.backend,
            StoreBackend::Redis {
                url: "redis://localhost:6379".to_owned()
            }
        );
        assert_eq!(config.store.timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_yaml() {
        let config = Config::from_yaml(
            r#"
server:
  port: 9000
  shutdown_timeout: 5s
key:
  secret: hush
store:
  backend:
    type: Memory
  timeout: 250ms
cache:
  ttl: 1d
  capacity:
    max_entries: 500
render:
  primary: http://shields:8080
"#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.shutdown_timeout, Duration::from_secs(5));
        assert_eq!(config.key.secret, "hush");
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.store.timeout, Duration::from_millis(250));
        assert_eq!(config.cache.ttl, Duration::from_secs(86_400));
        assert_eq!(config.cache.capacity, Capacity::MaxEntries(500));
        assert_eq!(config.service().render.primary, "http://shields:8080");
        assert_eq!(config.service().render.fallback, "https://img.shields.io");
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(matches!(
            Config::from_yaml("server: [1, 2"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_env(env(&[
                ("PORT", "3000"),
                ("KEY", "s3cr3t"),
                ("REDIS_URL", "cache.internal:6380"),
                ("SHIELDS_URL", "http://shields.local"),
                ("DEBUG", "Enabled"),
                ("MAINTENANCE", "enabled"),
            ]))
            .unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.key.secret, "s3cr3t");
        assert_eq!(
            config.store.backend,
            StoreBackend::Redis {
                url: "redis://cache.internal:6380".to_owned()
            }
        );
        assert_eq!(config.render.primary, "http://shields.local");
        assert!(config.server.debug);
        assert!(config.server.maintenance);
    }

    #[test]
    fn test_env_flags_need_enabled() {
        let mut config = Config::default();
        config
            .apply_env(env(&[("DEBUG", "true"), ("MAINTENANCE", ""), ("PORT", "")]))
            .unwrap();
        assert!(!config.server.debug);
        assert!(!config.server.maintenance);
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_invalid_port() {
        let mut config = Config::default();
        let result = config.apply_env(env(&[("PORT", "eighty")]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidEnv { name: "PORT", .. })
        ));
    }

    #[test]
    fn test_memory_store_connects() {
        let store = StoreConfig {
            backend: StoreBackend::Memory,
            ..StoreConfig::default()
        };
        assert_eq!(store.connect().unwrap().name(), "memory");
    }
}
