//! Configuration types for the parameter sync client
//!
//! This module defines the client's public configuration surface.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

use crate::wire;

/// Main client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Namespace announced to the backend
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Backend address
    #[serde(default)]
    pub backend: BackendConfig,

    /// Per-operation socket timeout (in milliseconds)
    ///
    /// Bounds each receive in the background loop so it stays responsive,
    /// and bounds each outbound send.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Largest datagram the client sends or receives
    #[serde(default = "default_max_datagram_size")]
    pub max_datagram_size: usize,

    /// Capacity of the sync event broadcast channel
    ///
    /// Subscribers that fall further behind than this skip missed events.
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,

    /// Parameters seeded into the store before any network activity
    #[serde(default)]
    pub defaults: Map<String, Value>,
}

impl ClientConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self {
            namespace: default_namespace(),
            backend: BackendConfig::default(),
            timeout_ms: default_timeout_ms(),
            max_datagram_size: default_max_datagram_size(),
            event_channel_capacity: default_event_channel_capacity(),
            defaults: Map::new(),
        }
    }

    /// Set the namespace
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Set the backend address
    pub fn with_backend(mut self, host: impl Into<String>, port: u16) -> Self {
        self.backend = BackendConfig {
            host: host.into(),
            port,
        };
        self
    }

    /// Set the socket timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = timeout.as_millis().try_into().unwrap_or(u64::MAX);
        self
    }

    /// Seed a default parameter
    pub fn with_default(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.defaults.insert(name.into(), value.into());
        self
    }

    /// Socket timeout as a [`Duration`]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.namespace.is_empty() {
            return Err(crate::Error::config("Namespace cannot be empty"));
        }

        self.backend.validate()?;

        if self.timeout_ms == 0 {
            return Err(crate::Error::config("Timeout must be > 0"));
        }

        // 65507 is the largest UDP payload over IPv4
        if !(64..=65507).contains(&self.max_datagram_size) {
            return Err(crate::Error::config(format!(
                "Max datagram size must be between 64 and 65507 bytes. Got: {}",
                self.max_datagram_size
            )));
        }

        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }

        if let Some(name) = self.defaults.keys().find(|name| wire::is_reserved(name)) {
            return Err(crate::Error::config(format!(
                "Default parameter uses reserved name '{}'",
                name
            )));
        }

        Ok(())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Backend address configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Hostname or IP literal
    #[serde(default = "default_host")]
    pub host: String,

    /// UDP port
    #[serde(default = "default_port")]
    pub port: u16,
}

impl BackendConfig {
    /// Validate the backend address
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.host.is_empty() {
            return Err(crate::Error::config("Backend host cannot be empty"));
        }
        if self.port == 0 {
            return Err(crate::Error::config("Backend port must be > 0"));
        }
        Ok(())
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_namespace() -> String {
    "default".to_string()
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    9165
}

fn default_timeout_ms() -> u64 {
    1000
}

fn default_max_datagram_size() -> usize {
    wire::MAX_DATAGRAM_SIZE
}

fn default_event_channel_capacity() -> usize {
    256
}
