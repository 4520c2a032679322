//! Configuration Module - TOML-based Service Configuration
//!
//! Loads and validates configuration from `config.toml`. Backend
//! credentials never live here; they come from environment variables.
//! Exchange knobs (quotas, draw ceiling, beach window) are externalized
//! here - nothing is hardcoded in the use-case layer.

pub mod hot_reload;
pub mod loader;

use chrono::{Duration, FixedOffset, Offset, Utc};
use serde::Deserialize;

use crate::domain::bottle::DEFAULT_MAX_PICKS;
use crate::domain::quota::QuotaPolicy;

/// Top-level service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
  /// Service identity and logging.
  pub service: ServiceConfig,
  /// Bottle lifecycle parameters.
  #[serde(default)]
  pub bottles: BottleConfig,
  /// Daily quota parameters.
  #[serde(default)]
  pub quota: QuotaConfig,
  /// Persistent store backend.
  #[serde(default)]
  pub store: StoreConfig,
  /// Metrics and health endpoints.
  #[serde(default)]
  pub metrics: MetricsConfig,
  /// Snapshot persistence for the in-memory backend.
  #[serde(default)]
  pub persistence: PersistenceConfig,
}

/// Service identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
  /// Human-readable service name.
  pub name: String,
  /// Log level (trace, debug, info, warn, error).
  #[serde(default = "default_log_level")]
  pub log_level: String,
  /// Interval between sea census log lines (seconds).
  #[serde(default = "default_census_interval")]
  pub census_interval_seconds: u64,
  /// Interval between config file checks (seconds).
  #[serde(default = "default_reload_interval")]
  pub reload_interval_seconds: u64,
}

/// Bottle lifecycle configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BottleConfig {
  /// Draws before a bottle returns to its creator.
  #[serde(default = "default_max_picks")]
  pub max_picks: u32,
  /// Trailing window of the "my bottles" beach view (days).
  #[serde(default = "default_beach_window")]
  pub beach_window_days: u32,
  /// Re-selections allowed when a pick loses a race.
  #[serde(default = "default_catch_attempts")]
  pub max_catch_attempts: u32,
  /// Name shown when a profile has no nickname.
  #[serde(default = "default_anonymous_name")]
  pub anonymous_name: String,
  /// Notify creators about replies and returned bottles.
  #[serde(default = "default_true")]
  pub notify_creators: bool,
}

/// Daily quota configuration.
///
/// VIP users are exempt from both limits.
#[derive(Debug, Clone, Deserialize)]
pub struct QuotaConfig {
  /// Bottles a non-VIP user may throw per day.
  #[serde(default = "default_daily_limit")]
  pub daily_throw_limit: u32,
  /// Bottles a non-VIP user may catch per day.
  #[serde(default = "default_daily_limit")]
  pub daily_catch_limit: u32,
  /// Offset from UTC used to decide the calendar day (minutes).
  #[serde(default)]
  pub utc_offset_minutes: i32,
}

/// Which store backend to wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
  /// Process-local store, optionally snapshotted to disk.
  Memory,
  /// Hosted PostgREST endpoint.
  Postgrest,
}

/// Store backend configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
  #[serde(default = "default_backend")]
  pub backend: StoreBackend,
  /// REST base URL, e.g. `https://project.example.co/rest/v1`.
  #[serde(default)]
  pub base_url: String,
  /// Request timeout in milliseconds.
  #[serde(default = "default_timeout_ms")]
  pub timeout_ms: u64,
  /// Maximum concurrent in-flight requests.
  #[serde(default = "default_max_concurrent")]
  pub max_concurrent: usize,
  /// Maximum retries on transient errors.
  #[serde(default = "default_max_retries")]
  pub max_retries: u32,
  /// Base delay between retries (exponential backoff, ms).
  #[serde(default = "default_retry_delay_ms")]
  pub retry_base_delay_ms: u64,
  /// Request rate ceiling towards the backend.
  #[serde(default = "default_requests_per_second")]
  pub requests_per_second: u32,
}

/// Metrics and monitoring configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
  /// Enable Prometheus metrics export.
  #[serde(default = "default_true")]
  pub enabled: bool,
  /// Metrics server bind address.
  #[serde(default = "default_metrics_addr")]
  pub bind_address: String,
  /// Health check endpoint port.
  #[serde(default = "default_health_port")]
  pub health_port: u16,
}

/// Persistence configuration for the in-memory backend.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PersistenceConfig {
  /// JSON snapshot file restored at startup and written on shutdown.
  pub snapshot_path: Option<String>,
  /// Periodic snapshot interval (seconds); 0 disables periodic saves.
  #[serde(default)]
  pub snapshot_interval_seconds: u64,
}

impl Default for BottleConfig {
  fn default() -> Self {
    Self {
      max_picks: default_max_picks(),
      beach_window_days: default_beach_window(),
      max_catch_attempts: default_catch_attempts(),
      anonymous_name: default_anonymous_name(),
      notify_creators: true,
    }
  }
}

impl Default for QuotaConfig {
  fn default() -> Self {
    Self {
      daily_throw_limit: default_daily_limit(),
      daily_catch_limit: default_daily_limit(),
      utc_offset_minutes: 0,
    }
  }
}

impl Default for StoreConfig {
  fn default() -> Self {
    Self {
      backend: default_backend(),
      base_url: String::new(),
      timeout_ms: default_timeout_ms(),
      max_concurrent: default_max_concurrent(),
      max_retries: default_max_retries(),
      retry_base_delay_ms: default_retry_delay_ms(),
      requests_per_second: default_requests_per_second(),
    }
  }
}

impl Default for MetricsConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      bind_address: default_metrics_addr(),
      health_port: default_health_port(),
    }
  }
}

/// Live knobs read by the exchange on every operation.
///
/// Derived from `AppConfig`; republished by the config watcher when
/// `config.toml` changes so limits can move without a restart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeSettings {
  pub quota: QuotaPolicy,
  pub max_picks: u32,
  pub beach_window: Duration,
  pub max_catch_attempts: u32,
  pub anonymous_name: String,
  pub utc_offset: FixedOffset,
  pub notify_creators: bool,
}

impl Default for ExchangeSettings {
  fn default() -> Self {
    Self::from_sections(&BottleConfig::default(), &QuotaConfig::default())
  }
}

impl From<&AppConfig> for ExchangeSettings {
  fn from(config: &AppConfig) -> Self {
    Self::from_sections(&config.bottles, &config.quota)
  }
}

impl ExchangeSettings {
  /// Build settings from the `[bottles]` and `[quota]` sections.
  pub fn from_sections(bottles: &BottleConfig, quota: &QuotaConfig) -> Self {
    Self {
      quota: QuotaPolicy {
        daily_throw_limit: quota.daily_throw_limit,
        daily_catch_limit: quota.daily_catch_limit,
      },
      max_picks: bottles.max_picks,
      beach_window: Duration::days(i64::from(bottles.beach_window_days)),
      max_catch_attempts: bottles.max_catch_attempts,
      anonymous_name: bottles.anonymous_name.clone(),
      utc_offset: FixedOffset::east_opt(quota.utc_offset_minutes * 60)
        .unwrap_or_else(|| Utc.fix()),
      notify_creators: bottles.notify_creators,
    }
  }
}

// Default value functions for serde

fn default_log_level() -> String {
  "info".to_string()
}

fn default_true() -> bool {
  true
}

fn default_census_interval() -> u64 {
  60
}

fn default_reload_interval() -> u64 {
  60
}

fn default_max_picks() -> u32 {
  DEFAULT_MAX_PICKS
}

fn default_beach_window() -> u32 {
  3
}

fn default_catch_attempts() -> u32 {
  3
}

fn default_anonymous_name() -> String {
  "匿名".to_string()
}

fn default_daily_limit() -> u32 {
  3
}

fn default_backend() -> StoreBackend {
  StoreBackend::Memory
}

fn default_timeout_ms() -> u64 {
  10_000
}

fn default_max_concurrent() -> usize {
  8
}

fn default_max_retries() -> u32 {
  3
}

fn default_retry_delay_ms() -> u64 {
  200
}

fn default_requests_per_second() -> u32 {
  20
}

fn default_metrics_addr() -> String {
  "0.0.0.0:9090".to_string()
}

fn default_health_port() -> u16 {
  8080
}
