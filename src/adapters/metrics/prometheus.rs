//! Prometheus Metrics Registry - Exchange Observability
//!
//! Registers and exposes Prometheus metrics on :9090. Covers throws,
//! catches, returns, quota rejections, pick conflicts, replies,
//! greetings and the size of the sea.

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use tokio::sync::broadcast;
use tracing::{info, instrument, warn};

use crate::domain::quota::QuotaKind;
use crate::ports::ExchangeTelemetry;

/// Centralized Prometheus metrics for the bottle exchange.
///
/// All metrics follow the naming convention `treehole_bottles_*`.
pub struct MetricsRegistry {
    /// Prometheus registry.
    registry: Registry,
    /// Bottles thrown.
    pub thrown: IntCounter,
    /// Successful catches, labelled by what the draw did to the bottle.
    pub caught: IntCounterVec,
    /// Catches that found nothing.
    pub empty_sea: IntCounter,
    /// Actions refused by the daily quota.
    pub quota_rejections: IntCounterVec,
    /// Conditional picks lost to a concurrent catch.
    pub pick_conflicts: IntCounter,
    /// Replies written.
    pub replies: IntCounter,
    /// Conversations opened from a bottle.
    pub greetings: IntCounter,
    /// Bottles currently floating (sampled by the census loop).
    pub floating: IntGauge,
}

impl MetricsRegistry {
    /// Create and register all Prometheus metrics.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let thrown = IntCounter::new("treehole_bottles_thrown_total", "Bottles thrown into the sea")?;

        let caught = IntCounterVec::new(
            Opts::new("treehole_bottles_caught_total", "Bottles caught"),
            &["outcome"],
        )?;

        let empty_sea = IntCounter::new(
            "treehole_bottles_empty_sea_total",
            "Catches that found no eligible bottle",
        )?;

        let quota_rejections = IntCounterVec::new(
            Opts::new(
                "treehole_bottles_quota_rejections_total",
                "Actions refused by the daily quota",
            ),
            &["kind"],
        )?;

        let pick_conflicts = IntCounter::new(
            "treehole_bottles_pick_conflicts_total",
            "Conditional picks lost to a concurrent catch",
        )?;

        let replies = IntCounter::new("treehole_bottles_replies_total", "Replies written")?;

        let greetings = IntCounter::new(
            "treehole_bottles_greetings_total",
            "Conversations opened with a bottle's creator",
        )?;

        let floating = IntGauge::new(
            "treehole_bottles_floating",
            "Bottles currently floating in the sea",
        )?;

        // Register all metrics
        registry.register(Box::new(thrown.clone()))?;
        registry.register(Box::new(caught.clone()))?;
        registry.register(Box::new(empty_sea.clone()))?;
        registry.register(Box::new(quota_rejections.clone()))?;
        registry.register(Box::new(pick_conflicts.clone()))?;
        registry.register(Box::new(replies.clone()))?;
        registry.register(Box::new(greetings.clone()))?;
        registry.register(Box::new(floating.clone()))?;

        Ok(Self {
            registry,
            thrown,
            caught,
            empty_sea,
            quota_rejections,
            pick_conflicts,
            replies,
            greetings,
            floating,
        })
    }

    /// Record the latest sea census.
    pub fn set_floating(&self, count: u64) {
        self.floating.set(i64::try_from(count).unwrap_or(i64::MAX));
    }

    /// Text exposition of every registered metric.
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            warn!(error = %e, "Failed to encode metrics");
        }
        String::from_utf8(buffer).unwrap_or_default()
    }

    /// Serve Prometheus metrics on the configured bind address.
    #[instrument(skip(self, shutdown_rx))]
    pub async fn serve(
        self: Arc<Self>,
        bind_address: String,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> anyhow::Result<()> {
        let metrics_self = Arc::clone(&self);

        let app = Router::new().route(
            "/metrics",
            get(move || {
                let metrics = Arc::clone(&metrics_self);
                async move { metrics.render() }
            }),
        );

        let listener = tokio::net::TcpListener::bind(&bind_address).await?;
        info!(address = %bind_address, "Prometheus metrics server started");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await?;

        Ok(())
    }
}

impl ExchangeTelemetry for MetricsRegistry {
    fn bottle_thrown(&self) {
        self.thrown.inc();
    }

    fn bottle_caught(&self, returned: bool) {
        let outcome = if returned { "returned" } else { "floating" };
        self.caught.with_label_values(&[outcome]).inc();
    }

    fn empty_sea(&self) {
        self.empty_sea.inc();
    }

    fn quota_rejected(&self, kind: QuotaKind) {
        self.quota_rejections
            .with_label_values(&[kind.column()])
            .inc();
    }

    fn pick_conflict(&self) {
        self.pick_conflicts.inc();
    }

    fn reply_written(&self) {
        self.replies.inc();
    }

    fn creator_greeted(&self) {
        self.greetings.inc();
    }
}
