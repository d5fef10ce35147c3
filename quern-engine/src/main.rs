//! Quern Engine
//!
//! A single-worker job-execution agent: it claims one job at a time from
//! a central coordinator, materializes an isolated docker environment for
//! the job's application, stages its inputs, runs it to completion,
//! integrity-stamps and uploads the produced files, and reports a
//! terminal status.
//!
//! Architecture:
//! - Configuration: settings from environment variables
//! - Client: authenticated HTTP communication with the coordinator
//! - Staging: scoped per-job working directory with fixed layout
//! - Docker: container lifecycle through the docker CLI
//! - Engine: the claim/resolve/stage/execute/submit/report state machine

mod config;
mod context;
mod docker;
mod engine;
mod image;
mod inputs;
mod outputs;
mod staging;

use anyhow::{Context, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::engine::Engine;
use quern_client::CoordinatorClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quern_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Quern Engine");

    let config = load_config()?;
    info!(
        "Loaded configuration: engine_id={}, api_url={}",
        config.engine_id, config.api_url
    );

    docker::check_available()?;

    let identity = match &config.ssl_cert {
        Some(path) => Some(std::fs::read(path).with_context(|| {
            format!("failed to read client certificate {}", path.display())
        })?),
        None => None,
    };

    let client = Arc::new(CoordinatorClient::with_tls(
        &config.api_url,
        &config.engine_id,
        identity.as_deref(),
        config.verify_tls,
    )?);
    info!("Coordinator client initialized");

    // Cooperative halt: the flag is only sampled between loop iterations,
    // so the current job finishes before shutdown.
    let halt = Arc::new(AtomicBool::new(false));
    {
        let halt = Arc::clone(&halt);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("received interrupt - halting after the current iteration");
                halt.store(true, Ordering::Relaxed);
            }
        });
    }

    let engine = Engine::new(config, client, halt);
    engine.run().await?;

    warn!("Engine halted");
    Ok(())
}

/// Loads and validates configuration from the environment
fn load_config() -> Result<Config> {
    let config = Config::from_env().context("failed to load configuration from environment")?;
    config.validate()?;
    Ok(config)
}
