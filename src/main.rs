//! Worknot Proxy Server
//!
//! Loads the site configuration, sets up logging, and serves the proxied site.

use anyhow::Context;
use std::env;
use std::sync::Arc;
use tracing::{error, info};
use worknot_proxy::{ProxyServer, SiteConfig};

/// Main entry point for the Worknot proxy server
///
/// # Usage
/// ```bash
/// # Start with default config (worknot_proxy.yaml)
/// worknot-proxy
///
/// # Start with custom config
/// worknot-proxy /path/to/config.yaml
/// ```
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .init();

    info!("Starting Worknot Proxy Server");

    let config_path = env::args()
        .nth(1)
        .unwrap_or_else(|| "worknot_proxy.yaml".to_string());

    info!("Loading configuration from: {}", config_path);

    let config = match SiteConfig::from_file(&config_path) {
        Ok(cfg) => {
            info!("Configuration loaded successfully");
            info!("  - Domain: {}", cfg.domain);
            info!("  - Upstream: {}", cfg.upstream_base_url);
            info!("  - Slugs: {}", cfg.slug_index.len());
            info!("  - Listen address: {}", cfg.server.listen_address);
            info!("  - Custom 404: {}", cfg.custom_404_page_id.as_deref().unwrap_or("none"));
            info!("  - Subdomain redirects: {}", cfg.subdomain_redirects.len());
            info!("  - Image transform: {}", cfg.image.is_enabled());
            cfg
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            error!("Please ensure the configuration file exists and is valid");
            std::process::exit(1);
        }
    };

    let server = Arc::new(ProxyServer::new(Arc::new(config)).context("failed to create proxy")?);

    tokio::select! {
        result = server.run() => {
            result.context("proxy server stopped")?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl-C, shutting down");
        }
    }

    Ok(())
}
