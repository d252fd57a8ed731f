//! enrolld - Enrollment workflow service
//!
//! Exposes the enrollment workflow engine over JSON/HTTP:
//! - REST API for opening enrollments, requesting transitions, and
//!   reading status and history
//! - Pluggable storage (in-memory or PostgreSQL)
//! - Structured logging of every committed transition

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod config;
mod error;
mod server;
mod storage;

use config::ServiceConfig;
use server::Server;

/// Enrollment service CLI
#[derive(Parser)]
#[command(name = "enrolld")]
#[command(about = "Enrollment workflow service", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "ENROLL_CONFIG")]
    config: Option<String>,

    /// Listen address
    #[arg(
        short,
        long,
        env = "ENROLL_LISTEN_ADDR",
        default_value = "127.0.0.1:8080"
    )]
    listen: String,

    /// Log level
    #[arg(long, env = "ENROLL_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Enable JSON logging
    #[arg(long, env = "ENROLL_LOG_JSON")]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| cli.log_level.clone().into());

    if cli.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    // Load configuration
    let mut config = ServiceConfig::load(cli.config.as_deref())
        .map_err(|e| error::ServiceError::Config(e.to_string()))?;

    // Override with CLI args
    config.server.listen_addr = cli
        .listen
        .parse()
        .map_err(|e| error::ServiceError::Config(format!("Invalid listen address: {}", e)))?;

    println!(
        r#"
  enrolld - Enrollment Workflow Service
  Version: {}
  Storage: {}
  Listening: {}
"#,
        env!("CARGO_PKG_VERSION"),
        config.storage.kind(),
        config.server.listen_addr
    );

    let server = Server::new(config).await?;
    server.run().await?;
    Ok(())
}
