use crate::search::SearchConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Key/value lookup for application configuration options.
///
/// Engine host and port are looked up through this seam; an absent value means
/// the option was never configured.
pub trait ConfigSource: Send + Sync {
    /// Get a configuration option by key
    fn get_config_value(&self, key: &str) -> Option<String>;
}

impl ConfigSource for HashMap<String, String> {
    fn get_config_value(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Search engine settings
    #[serde(default)]
    pub engine: SearchConfig,

    /// Application configuration options served through [`ConfigSource`]
    #[serde(default)]
    pub app_config: HashMap<String, String>,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/default.toml".to_string());
        Self::load_from(&config_path)
    }

    /// Load configuration, overriding the embedded defaults with `path` if it exists
    pub fn load_from(path: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            // Override with config file if it exists
            .add_source(config::File::with_name(path).required(false))
            // Override with environment variables (prefix: FLIGHTPAX_)
            .add_source(
                config::Environment::with_prefix("FLIGHTPAX")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine: SearchConfig::default(),
            app_config: HashMap::new(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl ConfigSource for Config {
    fn get_config_value(&self, key: &str) -> Option<String> {
        // Keys may come back lowercased from the environment source
        self.app_config
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, value)| value)
            .filter(|value| !value.trim().is_empty())
            .cloned()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level filter used when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit JSON formatted logs
    #[serde(default)]
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
        }
    }
}

fn default_log_level() -> String {
    "flightpax_search=info".to_string()
}
