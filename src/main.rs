//! TreeHole Bottles - Entry Point
//!
//! Hosts the bottle exchange next to its operational surface. Runs
//! until SIGINT.
//!
//! Wiring sequence:
//! 1. Load config.toml + validate
//! 2. Init tracing (JSON structured logging)
//! 3. Start the config watcher (live exchange settings)
//! 4. Build the store backend (memory + snapshot, or PostgREST)
//! 5. Wire the exchange with Prometheus telemetry
//! 6. Spawn health (/live, /ready) and metrics (/metrics) servers
//! 7. Spawn the sea census and periodic snapshots
//! 8. Wait for SIGINT → drain → snapshot → exit

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use treehole_bottles::adapters::memory::{InMemoryStore, SnapshotStore};
use treehole_bottles::adapters::metrics::{HealthServer, HealthState, MetricsRegistry};
use treehole_bottles::adapters::postgrest::{
  PostgrestAuth, PostgrestClient, PostgrestClientConfig, PostgrestStore,
};
use treehole_bottles::config::hot_reload::ConfigWatcher;
use treehole_bottles::config::{loader, AppConfig, StoreBackend};
use treehole_bottles::usecases::{BottleExchange, ExchangePorts};

/// The configured store, kept concrete so shutdown can snapshot it.
enum Backend {
  Memory {
    store: Arc<InMemoryStore>,
    snapshots: Option<Arc<SnapshotStore>>,
  },
  Postgrest(Arc<PostgrestStore>),
}

impl Backend {
  fn ports(&self) -> ExchangePorts {
    match self {
      Self::Memory { store, .. } => ExchangePorts::from_backend(Arc::clone(store)),
      Self::Postgrest(store) => ExchangePorts::from_backend(Arc::clone(store)),
    }
  }
}

#[tokio::main]
async fn main() -> Result<()> {
  // ── 1. Load configuration ───────────────────────────────
  let config_path = std::env::args()
    .nth(1)
    .unwrap_or_else(|| "config.toml".to_string());
  let config = loader::load_config(&config_path).context("Failed to load configuration")?;

  // ── 2. Initialize structured JSON logging ───────────────
  tracing_subscriber::fmt()
    .with_env_filter(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.service.log_level)),
    )
    .json()
    .init();

  info!(
    name = %config.service.name,
    version = env!("CARGO_PKG_VERSION"),
    backend = ?config.store.backend,
    "Starting TreeHole bottle exchange"
  );

  // ── 3. Shutdown channel + live settings ─────────────────
  let (shutdown_tx, _shutdown_rx) = broadcast::channel::<()>(4);

  let (mut watcher, settings_rx) = ConfigWatcher::new(&config_path, &config);
  let watcher_shutdown = shutdown_tx.subscribe();
  let watcher_handle = tokio::spawn(async move {
    if let Err(e) = watcher.run(watcher_shutdown).await {
      error!(error = %e, "Config watcher failed");
    }
  });

  // ── 4. Store backend ────────────────────────────────────
  let backend = build_backend(&config).await?;

  // ── 5. Exchange with Prometheus telemetry ───────────────
  let metrics = Arc::new(MetricsRegistry::new().context("Failed to register metrics")?);
  let ports = backend.ports().with_telemetry(metrics.clone());
  let exchange = Arc::new(BottleExchange::new(ports, settings_rx));

  // ── 6. Health and metrics servers ───────────────────────
  let health = Arc::new(HealthState::new());
  let health_server = HealthServer::new(Arc::clone(&health), config.metrics.health_port);
  let health_shutdown = shutdown_tx.subscribe();
  let health_handle = tokio::spawn(async move {
    if let Err(e) = health_server.run(health_shutdown).await {
      error!(error = %e, "Health server failed");
    }
  });

  let metrics_handle = if config.metrics.enabled {
    let metrics_shutdown = shutdown_tx.subscribe();
    let metrics_ref = Arc::clone(&metrics);
    let bind_address = config.metrics.bind_address.clone();
    Some(tokio::spawn(async move {
      if let Err(e) = metrics_ref.serve(bind_address, metrics_shutdown).await {
        error!(error = %e, "Metrics server failed");
      }
    }))
  } else {
    None
  };

  // ── 7. Sea census + periodic snapshots ──────────────────
  let census_handle = tokio::spawn(run_census(
    Arc::clone(&exchange),
    Arc::clone(&metrics),
    Arc::clone(&health),
    Duration::from_secs(config.service.census_interval_seconds.max(1)),
    shutdown_tx.subscribe(),
  ));

  let snapshot_handle = match &backend {
    Backend::Memory {
      store,
      snapshots: Some(snapshots),
    } if config.persistence.snapshot_interval_seconds > 0 => Some(tokio::spawn(run_snapshots(
      Arc::clone(store),
      Arc::clone(snapshots),
      Duration::from_secs(config.persistence.snapshot_interval_seconds),
      shutdown_tx.subscribe(),
    ))),
    _ => None,
  };

  info!("All tasks spawned, exchange is running");

  // ── 8. Wait for SIGINT ──────────────────────────────────
  signal::ctrl_c()
    .await
    .context("Failed to listen for SIGINT")?;
  info!("SIGINT received, initiating graceful shutdown");

  // Readiness check → 503 before anything stops
  health.begin_drain();
  let _ = shutdown_tx.send(());

  if let Backend::Memory {
    store,
    snapshots: Some(snapshots),
  } = &backend
  {
    match snapshots.save(&store.snapshot().await).await {
      Ok(()) => info!("Final sea snapshot written"),
      Err(e) => warn!(error = %e, "Failed to write final sea snapshot"),
    }
  }

  let grace = Duration::from_secs(5);
  let _ = tokio::time::timeout(grace, census_handle).await;
  let _ = tokio::time::timeout(grace, watcher_handle).await;
  if let Some(handle) = snapshot_handle {
    let _ = tokio::time::timeout(grace, handle).await;
  }
  if let Some(handle) = metrics_handle {
    let _ = tokio::time::timeout(grace, handle).await;
  }
  let _ = tokio::time::timeout(grace, health_handle).await;

  info!("Shutdown complete");
  Ok(())
}

/// Build the configured backend, restoring the sea from disk if asked.
async fn build_backend(config: &AppConfig) -> Result<Backend> {
  match config.store.backend {
    StoreBackend::Memory => {
      let Some(path) = config.persistence.snapshot_path.as_deref() else {
        info!("In-memory sea without persistence");
        return Ok(Backend::Memory {
          store: Arc::new(InMemoryStore::new()),
          snapshots: None,
        });
      };

      let snapshots = SnapshotStore::new(path)
        .await
        .context("Failed to prepare snapshot store")?;
      let store = match snapshots.load().await.context("Failed to restore sea snapshot")? {
        Some(state) => InMemoryStore::from_state(state),
        None => InMemoryStore::new(),
      };

      Ok(Backend::Memory {
        store: Arc::new(store),
        snapshots: Some(Arc::new(snapshots)),
      })
    }
    StoreBackend::Postgrest => {
      let auth = Arc::new(
        PostgrestAuth::from_env().context("Failed to load backend credentials from env")?,
      );
      let client = PostgrestClient::new(auth, PostgrestClientConfig::from_store(&config.store))
        .context("Failed to create PostgREST client")?;
      let store = PostgrestStore::new(client);

      if store.health_check().await {
        info!(base_url = %config.store.base_url, "PostgREST backend reachable");
      } else {
        warn!(base_url = %config.store.base_url, "PostgREST backend not reachable yet");
      }

      Ok(Backend::Postgrest(Arc::new(store)))
    }
  }
}

/// Periodically count floating bottles; doubles as the store health check.
async fn run_census(
  exchange: Arc<BottleExchange>,
  metrics: Arc<MetricsRegistry>,
  health: Arc<HealthState>,
  interval: Duration,
  mut shutdown_rx: broadcast::Receiver<()>,
) {
  loop {
    match exchange.floating_count().await {
      Ok(count) => {
        metrics.set_floating(count);
        health.set_store_healthy(true);
        info!(floating = count, "Sea census");
      }
      Err(e) => {
        health.set_store_healthy(false);
        warn!(error = %e, "Sea census failed");
      }
    }

    tokio::select! {
      biased;
      _ = shutdown_rx.recv() => {
        info!("Census received shutdown signal");
        break;
      }
      _ = tokio::time::sleep(interval) => {}
    }
  }
}

/// Periodically persist the in-memory sea.
async fn run_snapshots(
  store: Arc<InMemoryStore>,
  snapshots: Arc<SnapshotStore>,
  interval: Duration,
  mut shutdown_rx: broadcast::Receiver<()>,
) {
  loop {
    tokio::select! {
      biased;
      _ = shutdown_rx.recv() => break,
      _ = tokio::time::sleep(interval) => {
        if let Err(e) = snapshots.save(&store.snapshot().await).await {
          warn!(error = %e, path = %snapshots.path().display(), "Periodic snapshot failed");
        }
      }
    }
  }
}
