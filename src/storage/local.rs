// src/storage/local.rs

//! JSON file state store.
//!
//! Writes go to a temp sibling first and are renamed into place, so a
//! crash mid-save cannot leave a half-written record behind.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::Snapshot;
use crate::storage::StateStore;

/// State store backed by a single JSON file on local storage.
#[derive(Debug, Clone)]
pub struct JsonStateStore {
    path: PathBuf,
}

impl JsonStateStore {
    /// Create a store backed by the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    async fn write_atomic(&self, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| AppError::state(format!("create {}: {e}", parent.display())))?;
            }
        }

        let tmp = self.path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp)
            .await
            .map_err(|e| AppError::state(format!("create {}: {e}", tmp.display())))?;
        file.write_all(bytes)
            .await
            .map_err(|e| AppError::state(format!("write {}: {e}", tmp.display())))?;
        file.flush()
            .await
            .map_err(|e| AppError::state(format!("flush {}: {e}", tmp.display())))?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| AppError::state(format!("rename into {}: {e}", self.path.display())))?;
        Ok(())
    }
}

#[async_trait]
impl StateStore for JsonStateStore {
    async fn load(&self) -> Result<Option<Snapshot>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No previous state at {}, starting fresh", self.path.display());
                return Ok(None);
            }
            Err(e) => {
                return Err(AppError::state(format!(
                    "read {}: {e}",
                    self.path.display()
                )));
            }
        };

        match serde_json::from_slice::<Snapshot>(&bytes) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(e) => {
                // Undecodable state means a fresh baseline, not a crash.
                log::warn!(
                    "State file {} is corrupt ({}), treating as absent",
                    self.path.display(),
                    e
                );
                Ok(None)
            }
        }
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(snapshot)?;
        self.write_atomic(&bytes).await?;
        log::debug!("Saved state to {}", self.path.display());
        Ok(())
    }
}
