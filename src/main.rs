// Main entry point for the PuppetDB v3 -> v4 translation proxy

use anyhow::Context;
use puppetdb_proxy::api::middleware::ProxyMetrics;
use puppetdb_proxy::api::{create_router, AppState};
use puppetdb_proxy::config::Config;
use puppetdb_proxy::proxy::PuppetDbClient;

use std::fs::OpenOptions;
use std::sync::{Arc, Mutex};
use tokio::signal;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load and validate configuration first (before any logging)
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    // 2. Initialize tracing subscriber with config values
    init_tracing(&config)?;

    info!(
        listen_address = %config.listen_address,
        port = config.port,
        puppetdb_url = %config.puppetdb_url,
        environment = %config.environment,
        producer = %config.producer,
        "Starting PuppetDB proxy"
    );

    if let Some(host) = &config.dump_hostname {
        info!(
            host = %host,
            facts = config.dump_facts,
            catalog = config.dump_catalog,
            report = config.dump_report,
            dir = %config.dump_dir.display(),
            "Payload dumps enabled"
        );
    }

    // 3. Backend client
    let puppetdb = Arc::new(PuppetDbClient::from_config(&config).map_err(|e| {
        error!(error = %e, "Failed to create PuppetDB client");
        e
    })?);

    // 4. Metrics registry
    let metrics = Arc::new(ProxyMetrics::new()?);

    // 5. Router
    let addr = format!("{}:{}", config.listen_address, config.port);
    let router = create_router(AppState::new(puppetdb, metrics, config));

    // 6. Start HTTP server
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!(addr = %addr, "Server listening on {}", addr);

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize tracing subscriber based on configuration
///
/// `RUST_LOG` overrides `LOG_LEVEL`. With `LOG_FILE` set, logs are appended
/// there instead of stdout.
fn init_tracing(config: &Config) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.to_lowercase()))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = fmt()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_env_filter(filter);

    match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            let subscriber = subscriber.with_ansi(false).with_writer(Mutex::new(file));
            if config.log_format == "json" {
                subscriber.json().init();
            } else {
                subscriber.init();
            }
        }
        None => {
            if config.log_format == "json" {
                subscriber.json().init();
            } else {
                subscriber.init();
            }
        }
    }

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Ctrl+C received, starting graceful shutdown");
        },
        _ = terminate => {
            info!("SIGTERM received, starting graceful shutdown");
        },
    }
}
