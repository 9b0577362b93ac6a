//! Configuration types for the admin gateway

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Main configuration for the gateway
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct McpConfig {
    /// HTTP listener configuration
    pub server: ServerConfig,
    /// Remote platform connection
    pub supabase: PlatformConfig,
}

impl McpConfig {
    /// Check the settings that cannot be defaulted sensibly.
    ///
    /// # Errors
    /// Returns `ConfigError` if the platform URL is empty or not http(s).
    pub fn validate(&self) -> Result<()> {
        let url = self.supabase.url.trim();
        if url.is_empty() {
            return Err(Error::ConfigError("supabase.url must be set".to_string()));
        }

        let parsed = url::Url::parse(url)
            .map_err(|e| Error::ConfigError(format!("invalid supabase.url '{url}': {e}")))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(Error::ConfigError(format!(
                "supabase.url must use http or https, got '{}'",
                parsed.scheme()
            )));
        }

        if self.server.port == 0 {
            return Err(Error::ConfigError("server.port must be non-zero".to_string()));
        }

        Ok(())
    }
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on (default: 3000)
    pub port: u16,
    /// Worker threads (0 = one per core)
    pub workers: usize,
    /// CORS allowed origins ("*" = any)
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            workers: 0,
            cors_origins: vec!["*".to_string()],
        }
    }
}

/// Remote Supabase instance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Base URL of the instance (Kong gateway)
    pub url: String,
    /// Service role key, sent as `apikey` and bearer token
    pub service_key: String,
    /// Timeout for outbound requests in seconds
    pub request_timeout_secs: u64,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8000".to_string(),
            service_key: String::new(),
            request_timeout_secs: 30,
        }
    }
}
