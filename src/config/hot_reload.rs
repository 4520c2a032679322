//! Config Hot-Reload - Republish Exchange Settings on File Changes
//!
//! Periodically re-reads config.toml and compares it with the last
//! known contents. When the file changed and still validates, the
//! derived `ExchangeSettings` are pushed through a `tokio::sync::watch`
//! channel that the exchange reads on every operation. Daily limits and
//! the draw ceiling can therefore move without restarting the service.

use std::time::Duration;

use anyhow::Result;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, instrument, warn};

use super::{AppConfig, ExchangeSettings};

/// Watches config.toml and republishes the exchange settings.
///
/// Polls instead of using a filesystem watcher, which has portability
/// issues across Linux/macOS/Docker volumes.
pub struct ConfigWatcher {
    /// Path to config.toml.
    config_path: String,
    /// How often the file is checked.
    interval: Duration,
    /// Sender side of the live settings channel.
    settings_tx: watch::Sender<ExchangeSettings>,
    /// Hash of the last file contents seen.
    last_hash: Option<u64>,
}

impl ConfigWatcher {
    /// Create a new watcher seeded from the startup config.
    ///
    /// Returns the watcher and the receiver to hand to the exchange.
    pub fn new(
        config_path: &str,
        initial: &AppConfig,
    ) -> (Self, watch::Receiver<ExchangeSettings>) {
        let (settings_tx, settings_rx) = watch::channel(ExchangeSettings::from(initial));

        let watcher = Self {
            config_path: config_path.to_string(),
            interval: Duration::from_secs(initial.service.reload_interval_seconds),
            settings_tx,
            last_hash: None,
        };

        (watcher, settings_rx)
    }

    /// Run the watcher loop until shutdown.
    #[instrument(skip(self, shutdown_rx), fields(path = %self.config_path))]
    pub async fn run(&mut self, mut shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        info!(
            interval_secs = self.interval.as_secs(),
            "Config watcher started"
        );

        self.last_hash = self.compute_hash().await;

        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => {
                    info!("Config watcher shutting down");
                    return Ok(());
                }
                _ = tokio::time::sleep(self.interval) => {
                    self.check_and_reload().await;
                }
            }
        }
    }

    /// Reload when the file hash moved; keep current settings on errors.
    async fn check_and_reload(&mut self) {
        let new_hash = self.compute_hash().await;

        if new_hash == self.last_hash {
            debug!("Config unchanged");
            return;
        }
        self.last_hash = new_hash;

        match super::loader::load_config(&self.config_path) {
            Ok(config) => self.publish(ExchangeSettings::from(&config)),
            Err(e) => {
                warn!(error = %e, "Failed to reload config - keeping current settings");
            }
        }
    }

    /// Push new settings if they differ from the live ones.
    fn publish(&self, next: ExchangeSettings) {
        let current = self.settings_tx.borrow().clone();
        if current == next {
            debug!("Config file changed but exchange settings did not");
            return;
        }

        info!(
            throw_limit = next.quota.daily_throw_limit,
            catch_limit = next.quota.daily_catch_limit,
            max_picks = next.max_picks,
            beach_window_days = next.beach_window.num_days(),
            "Exchange settings reloaded"
        );

        if self.settings_tx.send(next).is_err() {
            warn!("No settings receivers - update dropped");
        }
    }

    /// Hash of the config file contents for change detection.
    async fn compute_hash(&self) -> Option<u64> {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let content = tokio::fs::read_to_string(&self.config_path).await.ok()?;

        let mut hasher = DefaultHasher::new();
        content.hash(&mut hasher);
        Some(hasher.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const BASE: &str = "[service]\nname = \"tb\"\nreload_interval_seconds = 1\n";

    #[tokio::test]
    async fn test_reload_publishes_new_limits() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{BASE}").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let initial = super::super::loader::load_config(&path).unwrap();
        let (mut watcher, rx) = ConfigWatcher::new(&path, &initial);
        watcher.last_hash = watcher.compute_hash().await;
        assert_eq!(rx.borrow().quota.daily_throw_limit, 3);

        std::fs::write(
            file.path(),
            format!("{BASE}\n[quota]\ndaily_throw_limit = 50\n"),
        )
        .unwrap();
        watcher.check_and_reload().await;

        assert_eq!(rx.borrow().quota.daily_throw_limit, 50);
    }

    #[tokio::test]
    async fn test_invalid_reload_keeps_current() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{BASE}").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let initial = super::super::loader::load_config(&path).unwrap();
        let (mut watcher, rx) = ConfigWatcher::new(&path, &initial);
        watcher.last_hash = watcher.compute_hash().await;

        std::fs::write(file.path(), format!("{BASE}\n[bottles]\nmax_picks = 0\n")).unwrap();
        watcher.check_and_reload().await;

        assert_eq!(rx.borrow().max_picks, 10);
    }
}
