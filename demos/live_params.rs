//! Live parameter demo
//!
//! Seeds two parameters, then once a second prints them, appends to the
//! string and doubles the number. Every write is forwarded to the backend;
//! updates pushed by the backend show up on the next print.
//!
//! ## Configuration
//!
//! - `CONPARAM_NAMESPACE`: Namespace to announce (default: test)
//! - `CONPARAM_BACKEND_HOST`: Backend host (default: localhost)
//! - `CONPARAM_BACKEND_PORT`: Backend UDP port (default: 9165)
//! - `CONPARAM_TIMEOUT_MS`: Socket timeout in milliseconds (default: 1000)
//! - `CONPARAM_LOG_LEVEL`: trace, debug, info, warn or error (default: info)

use anyhow::{Context, Result};
use conparam_core::{ClientConfig, ParamClient};
use std::env;
use std::time::Duration;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

fn config_from_env() -> Result<ClientConfig> {
    let mut config = ClientConfig::new()
        .with_namespace(env::var("CONPARAM_NAMESPACE").unwrap_or_else(|_| "test".to_string()))
        .with_default("param1", "value1")
        .with_default("param2", 2);

    if let Ok(host) = env::var("CONPARAM_BACKEND_HOST") {
        config.backend.host = host;
    }
    if let Ok(port) = env::var("CONPARAM_BACKEND_PORT") {
        config.backend.port = port
            .parse()
            .with_context(|| format!("CONPARAM_BACKEND_PORT is not a port: {}", port))?;
    }
    if let Ok(timeout) = env::var("CONPARAM_TIMEOUT_MS") {
        config.timeout_ms = timeout
            .parse()
            .with_context(|| format!("CONPARAM_TIMEOUT_MS is not a number: {}", timeout))?;
    }

    config.validate()?;
    Ok(config)
}

fn log_level_from_env() -> Result<Level> {
    let level = env::var("CONPARAM_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "CONPARAM_LOG_LEVEL '{}' is not valid. \
            Valid levels: trace, debug, info, warn, error",
            level
        ),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level_from_env()?)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    let config = config_from_env()?;
    info!(
        "Connecting namespace '{}' to {}:{}",
        config.namespace, config.backend.host, config.backend.port
    );
    let client = ParamClient::connect(config).await?;

    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let param1: String = client.get_as("param1").await?;
                let param2: i64 = client.get_as("param2").await?;
                println!("{} {}", param1, param2);

                client.set("param1", format!("{} updated", param1)).await?;
                client.set("param2", param2.saturating_mul(2)).await?;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    Ok(())
}
