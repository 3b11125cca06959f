//! `run` command implementation.

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use config_loader::ConfigLoader;
use contracts::RelayConfig;

use crate::cli::RunArgs;
use crate::error::CliError;

/// Execute the `run` command
pub async fn run_relay(args: &RunArgs) -> Result<()> {
    let config = resolve_config(args)?;

    info!(
        listen = %config.server.listen_addr,
        capacity = config.queue.capacity,
        drain_format = ?config.queue.drain_format,
        max_rps = config.rate_limit.max_requests_per_second,
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&config);
        return Ok(());
    }

    if let Some(port) = config.observability.metrics_port {
        observability::init_metrics_only(port)?;
    }

    serve(config).await.context("Relay execution failed")?;

    info!("Relay finished");
    Ok(())
}

/// Load the config file (if any), apply CLI overrides and validate the result.
fn resolve_config(args: &RunArgs) -> crate::error::Result<RelayConfig> {
    let mut config = match &args.config {
        Some(path) => {
            if !path.exists() {
                return Err(CliError::config_not_found(path.display().to_string()));
            }
            info!(config = %path.display(), "Loading configuration");
            ConfigLoader::load_from_path(path)?
        }
        None => RelayConfig::default(),
    };

    if let Some(ref listen) = args.listen {
        config.server.listen_addr = normalize_listen_addr(listen);
    }
    if let Some(capacity) = args.buffer_size {
        config.queue.capacity = capacity;
    }
    if let Some(rps) = args.max_rps {
        config.rate_limit.max_requests_per_second = rps;
    }
    if let Some(port) = args.metrics_port {
        config.observability.metrics_port = (port != 0).then_some(port);
    }

    ConfigLoader::validate(&config)?;
    Ok(config)
}

/// Accept the `:port` shorthand for "all interfaces".
fn normalize_listen_addr(addr: &str) -> String {
    if addr.starts_with(':') {
        format!("0.0.0.0{addr}")
    } else {
        addr.to_string()
    }
}

async fn serve(config: RelayConfig) -> crate::error::Result<()> {
    let (relay, dispatcher) = dispatcher::create_relay(config.queue.capacity)?;
    let dispatcher_task = dispatcher.spawn();

    let app = gateway::router(relay.clone(), &config)?;
    let listener = gateway::bind(&config.server.listen_addr).await?;

    info!("Starting relay...");
    let served = gateway::serve(listener, app, shutdown_signal()).await;

    let snapshot = relay.metrics();
    info!(
        submitted = snapshot.submitted,
        enqueued = snapshot.enqueued,
        dropped = snapshot.dropped,
        drained = snapshot.drained,
        sources = snapshot.sources,
        "Relay statistics"
    );

    // Last handle gone -> dispatcher sees a closed channel and exits.
    drop(relay);
    dispatcher_task
        .await
        .map_err(|e| CliError::dispatcher(e.to_string()))?;

    served?;
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    warn!("Received shutdown signal, stopping relay...");
}

/// Print configuration summary for dry-run mode
fn print_config_summary(config: &RelayConfig) {
    println!("\n=== Configuration Summary ===\n");
    println!("Server:");
    println!("  Listen: {}", config.server.listen_addr);
    println!("  CORS origins: {}", config.server.cors.allow_origins.join(", "));
    println!("\nQueues:");
    println!("  Capacity per source: {}", config.queue.capacity);
    println!("  Drain format: {:?}", config.queue.drain_format);
    println!("\nRate limit:");
    println!(
        "  {} req/s per client (burst {})",
        config.rate_limit.max_requests_per_second,
        config.rate_limit.effective_burst()
    );
    match config.observability.metrics_port {
        Some(port) => println!("\nMetrics: port {port}"),
        None => println!("\nMetrics: disabled"),
    }
    println!();
}
