//! Observability for the AdBoard backend
//!
//! Provides logging initialization, Prometheus metrics, and the metrics
//! listener used by the sweep daemon.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{routing::get, Router};
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Registry, TextEncoder};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::TracingSettings;

/// Initialize tracing/logging
pub fn init_tracing(settings: &TracingSettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("adboard_backend=debug,sqlx=warn"));

    let registry = tracing_subscriber::registry().with(filter);

    if settings.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Metrics collection for the sweep daemon
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,

    // Sweep metrics
    pub sweeps_total: IntCounter,
    pub sweep_errors_total: IntCounter,
    pub sweep_duration: Histogram,
    pub companies_checked: IntGauge,

    // Notification metrics
    pub notifications_created_total: IntCounter,
    pub notifications_expired_total: IntCounter,
}

impl Metrics {
    /// Create a new metrics instance
    pub fn new() -> Self {
        let registry = Registry::new();

        let sweeps_total = IntCounter::new("adboard_sweeps_total", "Total limit sweeps completed")
            .expect("metric creation failed");
        let sweep_errors_total = IntCounter::new(
            "adboard_sweep_errors_total",
            "Companies that failed during a sweep",
        )
        .expect("metric creation failed");

        let sweep_duration_opts = HistogramOpts::new(
            "adboard_sweep_duration_seconds",
            "Limit sweep duration in seconds",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 15.0, 60.0]);
        let sweep_duration =
            Histogram::with_opts(sweep_duration_opts).expect("metric creation failed");

        let companies_checked = IntGauge::new(
            "adboard_companies_checked",
            "Companies checked by the last sweep",
        )
        .expect("metric creation failed");

        let notifications_created_total = IntCounter::new(
            "adboard_notifications_created_total",
            "Limit notifications created",
        )
        .expect("metric creation failed");
        let notifications_expired_total = IntCounter::new(
            "adboard_notifications_expired_total",
            "Expired notifications deleted",
        )
        .expect("metric creation failed");

        registry.register(Box::new(sweeps_total.clone())).unwrap();
        registry
            .register(Box::new(sweep_errors_total.clone()))
            .unwrap();
        registry.register(Box::new(sweep_duration.clone())).unwrap();
        registry
            .register(Box::new(companies_checked.clone()))
            .unwrap();
        registry
            .register(Box::new(notifications_created_total.clone()))
            .unwrap();
        registry
            .register(Box::new(notifications_expired_total.clone()))
            .unwrap();

        Self {
            registry: Arc::new(registry),
            sweeps_total,
            sweep_errors_total,
            sweep_duration,
            companies_checked,
            notifications_created_total,
            notifications_expired_total,
        }
    }

    /// Encode metrics to Prometheus format
    pub fn encode(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Start the metrics server
pub async fn start_metrics_server(addr: SocketAddr, metrics: Arc<Metrics>) {
    let app = Router::new()
        .route(
            "/metrics",
            get(move || {
                let metrics = metrics.clone();
                async move { metrics.encode() }
            }),
        )
        .route("/health", get(|| async { "OK" }));

    tracing::info!(%addr, "Metrics server starting");

    match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "Metrics server stopped");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, %addr, "Failed to bind metrics listener");
        }
    }
}
