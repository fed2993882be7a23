// src/main.rs
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod adjustment;
mod clock;
mod engine;
mod error;
mod evaluator;
mod late_notice;
mod resolver;
mod schedule;
mod server;

#[cfg(test)]
mod evaluator_tests;

use clock::Clock;
use engine::AttendanceEngine;

#[derive(Debug, Clone, Deserialize)]
struct Config {
    #[serde(default = "default_bind_addr")]
    bind_addr: String,
}

fn default_bind_addr() -> String {
    "127.0.0.1:8080".to_string()
}

#[derive(Parser, Debug)]
#[command(
    name = "fichaje-core",
    about = "Attendance and schedule resolution engine"
)]
struct Cli {
    /// Overrides BIND_ADDR from the environment.
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    let config: Config = envy::from_env().context("reading configuration from environment")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let bind_addr = cli.bind.unwrap_or(config.bind_addr);
    let engine = Arc::new(AttendanceEngine::new(Clock::system()));
    let app = server::router(engine);

    info!("Attendance engine listening on {}", bind_addr);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding {}", bind_addr))?;
    axum::serve(listener, app).await.context("serving HTTP")?;

    Ok(())
}
