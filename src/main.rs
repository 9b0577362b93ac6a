//! Supabase Admin Gateway
//!
//! Binary entry point. Settings come from the TOML file, then from the
//! environment (a `.env` file is honoured) and command-line flags.

use clap::Parser;
use dotenv::dotenv;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use supabase_common::config::McpConfig;
use supabase_mcp::McpServer;

#[derive(Parser, Debug)]
#[command(name = "supabase-mcp")]
#[command(about = "REST administration gateway for self-hosted Supabase", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "supabase-mcp.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Base URL of the Supabase instance
    #[arg(long, env = "SUPABASE_URL")]
    supabase_url: Option<String>,

    /// Service role key
    #[arg(long, env = "SUPABASE_KEY", hide_env_values = true)]
    supabase_key: Option<String>,

    /// Host to bind to
    #[arg(long, env = "HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,
}

impl Args {
    /// Flags and environment take precedence over the file
    fn apply(self, config: &mut McpConfig) {
        if let Some(url) = self.supabase_url {
            config.supabase.url = url;
        }
        if let Some(key) = self.supabase_key {
            config.supabase.service_key = key;
        }
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)))
        .init();

    info!("Supabase Admin Gateway v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let mut config = if args.config.exists() {
        let content = std::fs::read_to_string(&args.config)?;
        toml::from_str(&content)?
    } else {
        info!("No configuration file, using defaults and environment");
        McpConfig::default()
    };
    args.apply(&mut config);

    if config.supabase.service_key.is_empty() {
        tracing::warn!("SUPABASE_KEY is not set; requests to the instance will be rejected");
    }

    // Create and run server
    let server = McpServer::new(config)?;

    // Handle shutdown signals
    let shutdown = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received shutdown signal"),
            Err(e) => {
                error!("Failed to listen for CTRL+C: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!("Server error: {}", e);
            }
        }
        () = shutdown => {
            server.shutdown().await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_file() {
        let args = Args::try_parse_from([
            "supabase-mcp",
            "--supabase-url",
            "https://db.example.com",
            "--port",
            "8089",
        ])
        .unwrap();

        let mut config = McpConfig::default();
        args.apply(&mut config);
        assert_eq!(config.supabase.url, "https://db.example.com");
        assert_eq!(config.server.port, 8089);
    }

    #[test]
    fn test_unused_platform_flags_are_rejected() {
        for flag in ["--supabase-anon-key", "--supabase-jwt-secret"] {
            assert!(Args::try_parse_from(["supabase-mcp", flag, "x"]).is_err());
        }
    }
}
