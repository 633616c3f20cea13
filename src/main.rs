//! rest-stub: header-driven HTTP stub server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────▶ axum router (any method, any path)
//!                │
//!                ▼
//!     request_id → access_log → delay → content_type → content_mode → charset
//!                │
//!                ▼
//!     ResponseSynthesizer ──▶ status + headers ──▶ empty | echo | file body
//!                │
//!     Client Response ◀──────┘
//! ```
//!
//! Every response is shaped by `X-Stub-*` request headers; there are no
//! routes to configure.

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;

use rest_stub::config::{validate_config, ConfigError, StubArgs};
use rest_stub::lifecycle::{spawn_signal_handler, Shutdown};
use rest_stub::observability::init_logging;
use rest_stub::StubServer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = StubArgs::parse();
    let config = args.load().context("failed to load configuration")?;

    if args.print_config {
        print!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    if args.validate {
        println!("configuration is valid");
        return Ok(());
    }

    init_logging(&config.observability)?;

    tracing::info!(
        event = "start",
        bind_address = %config.listener.bind_address,
        content_root = %config.content.root.display(),
        max_body_bytes = config.content.max_body_bytes,
        "rest-stub v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    let listener = TcpListener::bind(&config.listener.bind_address)
        .await
        .with_context(|| format!("failed to bind {}", config.listener.bind_address))?;

    let shutdown = Shutdown::new();
    spawn_signal_handler(shutdown.clone());

    let server = StubServer::new(config);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!(event = "stop", "Shutdown complete");
    Ok(())
}
