//! Marquee HTTP server.
//!
//! Movie catalog, seat selection, bookings, and admin back-office.

use anyhow::Context;
use marquee::{
    bootstrap::{Resources, app_state},
    config::Config,
    metrics::register_business_metrics,
    server::build_router,
};
use marquee_core::environment::SystemClock;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::Notify;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration (reads .env first)
    let config = Config::from_env();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,marquee=debug,sqlx=warn,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        backend = ?config.storage.backend,
        production = config.is_production(),
        client_url = %config.server.client_url,
        "Starting Marquee"
    );

    if config.server.metrics_enabled {
        let metrics_addr: SocketAddr = format!("{}:{}", config.server.metrics_host, config.server.metrics_port)
            .parse()
            .context("invalid METRICS_HOST/METRICS_PORT")?;
        PrometheusBuilder::new()
            .with_http_listener(metrics_addr)
            .install()
            .context("failed to install Prometheus exporter")?;
        register_business_metrics();
        info!(address = %metrics_addr, "Prometheus metrics available at /metrics");
    }

    let resources = Resources::from_config(&config, Arc::new(SystemClock))
        .await
        .context("failed to initialise storage")?;
    tokio::fs::create_dir_all(&config.uploads.dir)
        .await
        .with_context(|| format!("failed to create upload directory {}", config.uploads.dir.display()))?;

    let app = build_router(app_state(&config, &resources));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(address = %addr, "HTTP server listening");

    // Run server with graceful shutdown
    let stop = Arc::new(Notify::new());
    let stopped = Arc::clone(&stop);
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { stopped.notified().await })
            .await
    });

    tokio::select! {
        joined = &mut server => {
            joined.context("server task panicked")?.context("server failed")?;
            return Ok(());
        },
        () = shutdown_signal() => {},
    }

    stop.notify_one();
    let grace = Duration::from_secs(config.server.shutdown_timeout);
    match tokio::time::timeout(grace, server).await {
        Ok(joined) => joined.context("server task panicked")?.context("server failed")?,
        Err(_) => warn!(timeout_secs = grace.as_secs(), "Graceful shutdown timed out"),
    }

    info!("Server stopped");
    Ok(())
}

/// Waits for:
/// - Ctrl+C (SIGINT)
/// - SIGTERM (in production environments)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            },
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}
