//! AdBoard limit sweeper
//!
//! Entry point for the subscription-limit sweep. Runs either as a one-shot
//! command (`--once`) printing counts, or as a long-lived daemon that
//! sweeps on an interval and serves Prometheus metrics.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};
use uuid::Uuid;

use adboard_backend::config::Settings;
use adboard_backend::db::Database;
use adboard_backend::observability::{self, Metrics};
use adboard_backend::plan::{self, PlanGate};
use adboard_backend::sweep::{PgCompanyStore, PgNotificationStore, Sweeper};
use adboard_backend::usage::PgUsageRepository;

/// Subscription limit sweeper for the AdBoard platform
#[derive(Debug, Parser)]
#[command(name = "adboard-backend", version)]
struct Cli {
    /// Run a single sweep and expiry pass, print counts, and exit
    #[arg(long)]
    once: bool,

    /// Restrict the sweep to a single company
    #[arg(long, value_name = "UUID")]
    company: Option<Uuid>,

    /// Skip running database migrations on startup
    #[arg(long)]
    skip_migrations: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let settings = Settings::load()?;
    observability::init_tracing(&settings.tracing);

    info!("Starting AdBoard backend v{}", env!("CARGO_PKG_VERSION"));

    let db = Database::connect(&settings.database).await?;
    if !cli.skip_migrations {
        db.run_migrations().await?;
    }

    // Seed the rule store, then build the gate once from the loaded rules
    plan::seed_default_rules(db.pool()).await?;
    let rules = plan::load_rules(db.pool()).await?;
    let gate = Arc::new(PlanGate::from_rules(rules));
    info!(rules = gate.rule_count(), "Plan gate initialized");

    let metrics = Arc::new(Metrics::new());
    let sweeper = Sweeper::new(
        gate,
        PgCompanyStore::new(db.pool().clone()),
        PgUsageRepository::new(db.pool().clone()),
        PgNotificationStore::new(db.pool().clone()),
        metrics.clone(),
    );

    if cli.once {
        let report = sweeper.sweep_once(cli.company).await?;
        let expired = sweeper.purge_expired().await?;

        println!(
            "companies checked: {}, notifications created: {}, errors: {}, expired deleted: {}",
            report.companies_checked, report.notifications_created, report.errors, expired
        );

        db.close().await;
        return Ok(());
    }

    // Daemon mode: metrics listener + interval sweeps until shutdown
    let metrics_addr = SocketAddr::new(settings.metrics.host.parse()?, settings.metrics.port);
    let metrics_handle = tokio::spawn(observability::start_metrics_server(
        metrics_addr,
        metrics.clone(),
    ));
    info!(%metrics_addr, "Metrics server listening");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(shutdown_signal(shutdown_tx));

    if let Err(e) = sweeper.run(&settings.sweep, shutdown_rx).await {
        error!(error = %e, "Sweeper error");
    }

    metrics_handle.abort();
    db.close().await;
    info!("Shutdown complete");

    Ok(())
}

/// Listens for shutdown signals (Ctrl+C or SIGTERM)
async fn shutdown_signal(shutdown_tx: watch::Sender<bool>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }

    let _ = shutdown_tx.send(true);
}
