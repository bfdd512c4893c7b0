//! External configuration: a validated TOML document describing the
//! pipeline topology. Loaded raw, then validated as a separate step so
//! callers can decide how to report a malformed file versus an invalid one.

use std::collections::HashMap;
use std::fs;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_CONFIG_PATH: &str = "/etc/collector/collector.toml";
const DEFAULT_CACHE_TTL_SECS: u64 = 30;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("reading config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("parsing config file: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub sources: HashMap<String, SourceConfig>,
    #[serde(default)]
    pub transforms: HashMap<String, TransformConfig>,
    #[serde(default)]
    pub sinks: HashMap<String, SinkConfig>,
    #[serde(default)]
    pub resolve: ResolveConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceConfig {
    Stdin {
        service: String,
    },
    File {
        service: String,
        path: String,
    },
    Docker {
        service: String,
        container_id: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformConfig {
    #[serde(rename = "type")]
    pub kind: String,
    pub inputs: Vec<String>,
    #[serde(default)]
    pub add_fields: HashMap<String, String>,
    pub case: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    #[serde(rename = "type")]
    pub kind: String,
    pub inputs: Vec<String>,
    #[serde(default)]
    pub pretty: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveConfig {
    /// `pattern, service` pairs as a TOML array of 2-tuples (`static =
    /// [["foo-*", "foo"]]`) rather than an inline table — tables lose
    /// declaration order on deserialization, and the static resolver's
    /// exact-before-wildcard, first-wildcard-wins scan depends on
    /// seeing entries in the order they were written.
    #[serde(rename = "static")]
    pub static_entries: Vec<(String, String)>,
    pub docker: bool,
    pub cache: CacheConfig,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            static_entries: Vec::new(),
            docker: false,
            cache: CacheConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_secs: u64,
    pub max_size: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_CACHE_TTL_SECS,
            max_size: 0,
        }
    }
}

impl Config {
    /// Reads `COLLECTOR_CONFIG_FILE`, falling back to the well-known path,
    /// then validates. An explicit override env var beats the default
    /// location.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("COLLECTOR_CONFIG_FILE")
            .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let config = Self::from_file(&path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Checks referential integrity of `inputs[]`: at least one
    /// source, exactly one sink, every input name resolves to a source or
    /// transform, and any configured transform must appear in the sink's
    /// inputs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sources.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one source must be configured".to_string(),
            ));
        }
        if self.sinks.len() != 1 {
            return Err(ConfigError::Invalid(format!(
                "exactly one sink must be configured, found {}",
                self.sinks.len()
            )));
        }
        if self.transforms.len() > 1 {
            return Err(ConfigError::Invalid(format!(
                "at most one transform is supported currently, found {}",
                self.transforms.len()
            )));
        }

        for (name, transform) in &self.transforms {
            for input in &transform.inputs {
                if !self.sources.contains_key(input) {
                    return Err(ConfigError::Invalid(format!(
                        "transform '{name}' input '{input}' does not reference a configured source"
                    )));
                }
            }
        }

        let (sink_name, sink) = self.sinks.iter().next().expect("checked len == 1 above");
        for input in &sink.inputs {
            if !self.sources.contains_key(input) && !self.transforms.contains_key(input) {
                return Err(ConfigError::Invalid(format!(
                    "sink '{sink_name}' input '{input}' does not reference a configured source or transform"
                )));
            }
        }
        if let Some(transform_name) = self.transforms.keys().next() {
            if !sink.inputs.iter().any(|i| i == transform_name) {
                return Err(ConfigError::Invalid(format!(
                    "transform '{transform_name}' is configured but sink '{sink_name}' does not include it in inputs"
                )));
            }
        }

        Ok(())
    }
}
