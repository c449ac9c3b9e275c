//! Search configuration

use serde::{Deserialize, Serialize};

/// Config key holding the engine host name
pub const ENGINE_HOSTNAME_KEY: &str = "ELASTIC_HOSTNAME";

/// Config key holding the engine port
pub const ENGINE_PORT_KEY: &str = "ELASTIC_PORT";

/// Search service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Index holding flight-passenger documents
    #[serde(default = "default_index_name")]
    pub index_name: String,

    /// Document type within the index
    #[serde(default = "default_doc_type")]
    pub doc_type: String,

    /// URL scheme used to reach the engine
    #[serde(default = "default_scheme")]
    pub scheme: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Connect timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Maximum passenger/flight pairs written concurrently per message
    #[serde(default = "default_index_concurrency")]
    pub index_concurrency: usize,
}

fn default_index_name() -> String {
    "flightpax".to_string()
}

fn default_doc_type() -> String {
    "flightpax".to_string()
}

fn default_scheme() -> String {
    "http".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    5
}

fn default_index_concurrency() -> usize {
    8
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            index_name: default_index_name(),
            doc_type: default_doc_type(),
            scheme: default_scheme(),
            request_timeout_secs: default_request_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            index_concurrency: default_index_concurrency(),
        }
    }
}

/// Builder for SearchConfig
pub struct SearchConfigBuilder {
    config: SearchConfig,
}

impl SearchConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: SearchConfig::default(),
        }
    }

    pub fn index_name(mut self, name: impl Into<String>) -> Self {
        self.config.index_name = name.into();
        self
    }

    pub fn doc_type(mut self, doc_type: impl Into<String>) -> Self {
        self.config.doc_type = doc_type.into();
        self
    }

    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.config.scheme = scheme.into();
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn connect_timeout_secs(mut self, secs: u64) -> Self {
        self.config.connect_timeout_secs = secs;
        self
    }

    pub fn index_concurrency(mut self, concurrency: usize) -> Self {
        self.config.index_concurrency = concurrency.max(1);
        self
    }

    pub fn build(self) -> SearchConfig {
        self.config
    }
}

impl Default for SearchConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
