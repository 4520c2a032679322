//! Sea Snapshot - Atomic JSON Persistence for the In-Memory Store
//!
//! Saves the full `SeaState` using atomic writes (write to a tmp file,
//! then rename) so the snapshot on disk is always either the old or the
//! new version, never a partial write.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;
use tracing::{info, instrument};

use super::store::SeaState;

/// Atomic JSON snapshot file for the in-memory backend.
pub struct SnapshotStore {
    /// Path to the snapshot.
    path: PathBuf,
    /// Temporary path for atomic writes.
    tmp_path: PathBuf,
}

impl SnapshotStore {
    /// Create a snapshot store at `path`.
    ///
    /// Creates the parent directory if it doesn't exist.
    pub async fn new(path: &str) -> Result<Self> {
        let path = PathBuf::from(path);
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .await
                .with_context(|| format!("Failed to create snapshot directory {}", dir.display()))?;
        }

        let mut tmp = path.clone().into_os_string();
        tmp.push(".tmp");

        Ok(Self {
            tmp_path: PathBuf::from(tmp),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Save the sea atomically (tmp → rename).
    #[instrument(skip(self, state), fields(path = %self.path.display()))]
    pub async fn save(&self, state: &SeaState) -> Result<()> {
        let json = serde_json::to_string_pretty(state).context("Failed to serialize sea state")?;

        fs::write(&self.tmp_path, &json)
            .await
            .context("Failed to write tmp snapshot file")?;

        fs::rename(&self.tmp_path, &self.path)
            .await
            .context("Failed to rename snapshot file")?;

        info!(
            bottles = state.bottles.len(),
            replies = state.replies.len(),
            "Sea snapshot saved"
        );

        Ok(())
    }

    /// Load the most recent snapshot.
    ///
    /// Returns `None` if no snapshot exists (first startup).
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub async fn load(&self) -> Result<Option<SeaState>> {
        if !fs::try_exists(&self.path).await.unwrap_or(false) {
            info!("No snapshot found, starting with an empty sea");
            return Ok(None);
        }

        let json = fs::read_to_string(&self.path)
            .await
            .context("Failed to read snapshot file")?;

        let state: SeaState =
            serde_json::from_str(&json).context("Failed to parse snapshot JSON")?;

        info!(
            bottles = state.bottles.len(),
            conversations = state.conversations.len(),
            "Sea snapshot loaded"
        );

        Ok(Some(state))
    }
}
