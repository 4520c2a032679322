//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, validating all parameters,
//! and providing clear error messages for misconfiguration.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::{AppConfig, StoreBackend};

/// Load and validate configuration from a TOML file.
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<AppConfig> {
  let path = Path::new(path);

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  let config = parse_config(&content)?;

  info!(
    backend = ?config.store.backend,
    throw_limit = config.quota.daily_throw_limit,
    catch_limit = config.quota.daily_catch_limit,
    max_picks = config.bottles.max_picks,
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<AppConfig> {
  let config: AppConfig =
    toml::from_str(content).with_context(|| "Failed to parse config.toml")?;

  validate_config(&config)?;
  Ok(config)
}

/// Validate all configuration parameters.
///
/// Checks for:
/// - Positive draw ceiling, beach window and catch attempts
/// - A representable UTC offset
/// - A base URL and sane client limits for the REST backend
fn validate_config(config: &AppConfig) -> Result<()> {
  anyhow::ensure!(
    !config.service.name.trim().is_empty(),
    "service.name must not be empty"
  );

  // Bottle validation
  anyhow::ensure!(
    config.bottles.max_picks > 0,
    "bottles.max_picks must be positive, got {}",
    config.bottles.max_picks
  );
  anyhow::ensure!(
    config.bottles.beach_window_days > 0,
    "bottles.beach_window_days must be positive, got {}",
    config.bottles.beach_window_days
  );
  anyhow::ensure!(
    config.bottles.max_catch_attempts > 0,
    "bottles.max_catch_attempts must be positive, got {}",
    config.bottles.max_catch_attempts
  );
  anyhow::ensure!(
    !config.bottles.anonymous_name.trim().is_empty(),
    "bottles.anonymous_name must not be empty"
  );

  // Quota validation
  anyhow::ensure!(
    config.quota.utc_offset_minutes.abs() < 24 * 60,
    "quota.utc_offset_minutes must be within ±1439, got {}",
    config.quota.utc_offset_minutes
  );

  // Store validation
  if config.store.backend == StoreBackend::Postgrest {
    anyhow::ensure!(
      !config.store.base_url.is_empty(),
      "store.base_url must be set for the postgrest backend"
    );
    anyhow::ensure!(
      config.store.base_url.starts_with("http://")
        || config.store.base_url.starts_with("https://"),
      "store.base_url must be an http(s) URL, got {}",
      config.store.base_url
    );
  }
  anyhow::ensure!(
    config.store.max_concurrent > 0,
    "store.max_concurrent must be positive"
  );
  anyhow::ensure!(
    config.store.requests_per_second > 0,
    "store.requests_per_second must be positive"
  );

  anyhow::ensure!(
    config.service.reload_interval_seconds > 0,
    "service.reload_interval_seconds must be positive"
  );

  Ok(())
}
