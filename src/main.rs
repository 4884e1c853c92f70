//! HTTP service binary for tickstats
//!
//! Starts the rolling-statistics engine as a service with a REST API for
//! batch ingestion and window queries.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tickstats::service::StatsService;
use tickstats::{RegistryConfig, SymbolRegistry};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "tickstats")]
#[command(about = "Rolling statistics service for streaming symbol data", long_about = None)]
struct Args {
    /// HTTP service port
    #[arg(long, default_value = "8080")]
    http_port: u16,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Debug, Default, serde::Deserialize)]
struct Config {
    #[serde(default)]
    service: ServiceConfig,
    #[serde(default)]
    registry: RegistrySection,
}

#[derive(Debug, serde::Deserialize)]
struct ServiceConfig {
    #[serde(default = "default_http_port")]
    http_port: u16,
}

#[derive(Debug, serde::Deserialize)]
struct RegistrySection {
    #[serde(default = "default_max_symbols")]
    max_symbols: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            http_port: default_http_port(),
        }
    }
}

impl Default for RegistrySection {
    fn default() -> Self {
        Self {
            max_symbols: default_max_symbols(),
        }
    }
}

fn default_http_port() -> u16 {
    8080
}
fn default_max_symbols() -> usize {
    10
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Setup logging
    if args.debug {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .init();
    }

    info!("Starting tickstats service");

    // Load configuration if provided; CLI flags cover the common case
    let (http_port, max_symbols) = if let Some(config_path) = &args.config {
        info!("Loading configuration from: {}", config_path.display());
        let config_str = std::fs::read_to_string(config_path)?;
        let config: Config = toml::from_str(&config_str)?;
        (config.service.http_port, config.registry.max_symbols)
    } else {
        (args.http_port, default_max_symbols())
    };

    let registry = Arc::new(SymbolRegistry::new(RegistryConfig { max_symbols }));
    let service = StatsService::new(Arc::clone(&registry));
    let addr: SocketAddr = ([0, 0, 0, 0], http_port).into();

    info!("Service ready");
    info!("  HTTP: http://localhost:{}/health", http_port);
    info!("  Symbol cap: {}", max_symbols);
    info!("Press Ctrl+C to shutdown");

    // Run the service or wait for shutdown
    tokio::select! {
        result = service.serve(addr) => {
            if let Err(e) = result {
                error!("Service error: {}", e);
                std::process::exit(1);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
    }

    info!("Service stopped");
    Ok(())
}
