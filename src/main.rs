use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

mod auth;
mod config;
mod core;
mod desired;
mod docker_discovery;
mod error;
mod ip_lookup;
mod providers;
mod reconciler;
mod runner;
mod status;

use crate::config::{AppConfig, LogConfig, LogFormat};
use crate::core::registry::ZoneRegistry;
use crate::desired::{DesiredStateResolver, DiscoverySource};
use crate::docker_discovery::DockerDiscovery;
use crate::ip_lookup::HttpIpLookup;
use crate::reconciler::Reconciler;
use crate::runner::Runner;
use crate::status::StatusView;

/// Time an in-flight pass gets to finish after shutdown is requested.
const PASS_GRACE: Duration = Duration::from_secs(10);
/// Time the status server gets to drain open connections.
const HTTP_DRAIN: Duration = Duration::from_secs(5);

#[derive(Debug, Parser)]
#[command(version, about = "Keeps DNS records in sync with configured and discovered domains")]
struct Args {
    /// Path to the YAML configuration file
    #[arg(long, env = "DNSSYNC_CONFIG", default_value = "config.yaml")]
    config: PathBuf,
}

fn init_logging(log: &LogConfig) {
    // RUST_LOG wins over the configured level
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log.level));

    match log.format {
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .json()
                .init();
        }
        LogFormat::Simple => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .compact()
                .init();
        }
    }
}

fn build_registry(config: &AppConfig) -> Result<ZoneRegistry> {
    let mut registry = ZoneRegistry::new();
    for zone in &config.zones {
        let provider = providers::build(zone)
            .with_context(|| format!("failed to set up provider for zone {}", zone.name))?;
        debug!(zone = %zone.name, provider = provider.kind(), "registered zone");
        registry.register(&zone.name, provider);
    }
    Ok(registry)
}

fn discovery(config: &AppConfig) -> Option<Box<dyn DiscoverySource>> {
    if !config.discovery.docker {
        return None;
    }
    match DockerDiscovery::new(config.discovery.traefik) {
        Ok(docker) => Some(Box::new(docker)),
        Err(e) => {
            warn!(error = %e, "docker unavailable, using static domains only");
            None
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = AppConfig::load(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))?;

    init_logging(&config.log);
    info!(config = %args.config.display(), zones = config.zones.len(), "starting dnssync");

    let registry = build_registry(&config)?;
    let ip_lookup = HttpIpLookup::new(&config.ip_lookup)?;
    let runner = Runner::new(
        registry,
        DesiredStateResolver::new(config.domains.clone(), discovery(&config)),
        Reconciler::new(config.dns),
        Box::new(ip_lookup),
        config.interval(),
        PASS_GRACE,
    );

    let cancel = CancellationToken::new();
    let mut pool = JoinSet::new();

    pool.spawn({
        let cancel = cancel.clone();
        async move { runner.run(cancel).await }
    });

    if config.http.enabled {
        let listener = TcpListener::bind(config.http.listen)
            .await
            .with_context(|| format!("failed to bind {}", config.http.listen))?;
        let view = Arc::new(StatusView::from_config(&config));
        let http_cancel = cancel.clone();
        pool.spawn(async move {
            let server = status::serve(listener, view, http_cancel.clone());
            tokio::pin!(server);
            tokio::select! {
                result = &mut server => {
                    if let Err(e) = result {
                        error!(error = %e, "status server failed");
                    }
                }
                () = async {
                    http_cancel.cancelled().await;
                    tokio::time::sleep(HTTP_DRAIN).await;
                } => warn!("status server did not drain in time"),
            }
        });
    }

    shutdown_signal().await;
    info!("shutdown signal received");
    cancel.cancel();

    while let Some(joined) = pool.join_next().await {
        if let Err(e) = joined {
            error!(error = %e, "task ended abnormally");
        }
    }
    info!("stopped all tasks");
    Ok(())
}
