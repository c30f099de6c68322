//! Server configuration from the environment

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Default host address
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default pipeline server port
pub const DEFAULT_PORT: u16 = 8000;

/// Default biomedical summary server port
pub const DEFAULT_BIOMED_PORT: u16 = 7860;

/// Listener settings for both servers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host both servers bind to
    pub host: String,

    /// Pipeline server port
    pub port: u16,

    /// Biomedical summary server port
    pub biomed_port: u16,

    /// Domain YAML file; built-in cardiometabolic panel when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_file: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            biomed_port: DEFAULT_BIOMED_PORT,
            domain_file: None,
        }
    }
}

impl ServerConfig {
    /// Load config from environment variables with fallback to defaults
    ///
    /// Environment variables:
    /// - `POLYRISK_HOST` - Server host
    /// - `POLYRISK_PORT` - Pipeline server port
    /// - `POLYRISK_BIOMED_PORT` - Biomedical summary server port
    /// - `POLYRISK_DOMAIN_FILE` - Domain YAML file
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(host) = std::env::var("POLYRISK_HOST") {
            config.host = host;
        }

        if let Ok(port) = std::env::var("POLYRISK_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                config.port = port;
            }
        }

        if let Ok(port) = std::env::var("POLYRISK_BIOMED_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                config.biomed_port = port;
            }
        }

        if let Ok(path) = std::env::var("POLYRISK_DOMAIN_FILE") {
            if !path.trim().is_empty() {
                config.domain_file = Some(PathBuf::from(path));
            }
        }

        config
    }

    /// Pipeline server address
    pub fn socket_addr(&self) -> Result<SocketAddr, String> {
        Self::parse_addr(&self.host, self.port)
    }

    /// Biomedical summary server address
    pub fn biomed_socket_addr(&self) -> Result<SocketAddr, String> {
        Self::parse_addr(&self.host, self.biomed_port)
    }

    fn parse_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
        format!("{}:{}", host, port)
            .parse()
            .map_err(|e| format!("Invalid address: {}", e))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.host.is_empty() {
            return Err("Host cannot be empty".to_string());
        }

        if self.port == 0 || self.biomed_port == 0 {
            return Err("Port cannot be zero".to_string());
        }

        if self.port == self.biomed_port {
            return Err(format!(
                "Pipeline and biomedical servers cannot share port {}",
                self.port
            ));
        }

        if let Some(path) = &self.domain_file {
            if !path.is_file() {
                return Err(format!("Domain file not found: {}", path.display()));
            }
        }

        Ok(())
    }
}
