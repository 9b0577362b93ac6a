//! Supabase Admin Gateway
//!
//! A REST service that exposes administration of a self-hosted Supabase
//! instance (tables, schemas, RLS policies, storage buckets and edge
//! functions) as simple JSON endpoints.
//!
//! # Crates
//!
//! - [`common`] configuration, errors and shared types
//! - [`client`] backends that reach the instance
//! - [`api`] HTTP handlers and server

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub use supabase_api as api;
pub use supabase_client as client;
pub use supabase_common as common;

use std::sync::Arc;
use tracing::info;

use supabase_api::{ApiServer, ApiState};
use supabase_client::PlatformClient;
use supabase_common::config::McpConfig;
use supabase_common::error::Result;

/// Main gateway server
pub struct McpServer {
    config: McpConfig,
    api_server: ApiServer,
}

impl McpServer {
    /// Create a gateway for the configured instance
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be built.
    pub fn new(config: McpConfig) -> Result<Self> {
        info!("Initializing admin gateway");
        config.validate()?;

        let client = PlatformClient::new(&config.supabase)?;
        let api_server = ApiServer::new(config.server.clone(), ApiState::new(Arc::new(client)));

        Ok(Self { config, api_server })
    }

    /// Get reference to the HTTP server
    #[must_use]
    pub fn api(&self) -> &ApiServer {
        &self.api_server
    }

    /// Get the configuration
    #[must_use]
    pub fn config(&self) -> &McpConfig {
        &self.config
    }

    /// Serve requests until stopped
    ///
    /// # Errors
    /// Returns an error if the listener cannot be bound.
    pub async fn run(&self) -> Result<()> {
        info!("Starting admin gateway");
        info!("  - Supabase instance: {}", self.config.supabase.url);
        info!(
            "  - Listening on: http://{}:{}",
            self.config.server.host, self.config.server.port
        );

        self.api_server.run().await
    }

    /// Shutdown gracefully
    ///
    /// # Errors
    /// Returns an error if shutdown fails.
    pub async fn shutdown(&self) -> Result<()> {
        info!("Shutting down admin gateway");
        Ok(())
    }
}
