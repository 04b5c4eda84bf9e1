// src/storage/mod.rs

//! Persisted-state abstraction.
//!
//! One durable record: the most recently observed snapshot, read once
//! per tick before detection and overwritten once per tick after it.

pub mod local;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Snapshot;

// Re-export for convenience
pub use local::JsonStateStore;

/// Durable store for the last observed snapshot.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load the last snapshot.
    ///
    /// Returns `None` on first run or when the backing record is
    /// missing or undecodable — corruption is treated as absence,
    /// never as a fatal error.
    async fn load(&self) -> Result<Option<Snapshot>>;

    /// Overwrite the stored snapshot.
    ///
    /// Must be atomic with respect to a crash: a failed save leaves the
    /// previous record readable.
    async fn save(&self, snapshot: &Snapshot) -> Result<()>;
}
