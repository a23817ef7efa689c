//! Server configuration

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the record store server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind
    pub address: String,
    /// TCP port to listen on
    pub port: u16,
    /// Path of the active log file
    pub data_path: PathBuf,
    /// Poll interval for tailing readers, in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".to_string(),
            port: 8000,
            data_path: PathBuf::from("data.bin"),
            poll_interval_ms: 10,
        }
    }
}

impl ServerConfig {
    /// Set the bind address
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    /// Set the TCP port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the log file path
    pub fn with_data_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.data_path = path.as_ref().to_path_buf();
        self
    }

    /// Set the tailing poll interval in milliseconds
    pub fn with_poll_interval_ms(mut self, millis: u64) -> Self {
        self.poll_interval_ms = millis;
        self
    }

    /// Full `address:port` string for binding
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    /// Poll interval as a `Duration`
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
