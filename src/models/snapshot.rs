// src/models/snapshot.rs

//! Point-in-time reading of the monitored page.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Open/closed state of a single pizza store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StoreStatus {
    Open,
    Closed,
    Busy,
    /// Card was present but its status text could not be classified.
    Unknown,
}

impl StoreStatus {
    /// Classify the status from a store card's text.
    ///
    /// BUSY takes precedence over OPEN since busy cards usually
    /// contain both words.
    pub fn from_card_text(text: &str) -> Self {
        let upper = text.to_uppercase();
        if upper.contains("BUSY") {
            Self::Busy
        } else if upper.contains("OPEN") {
            Self::Open
        } else if upper.contains("CLOSED") {
            Self::Closed
        } else {
            Self::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Closed => "CLOSED",
            Self::Busy => "BUSY",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for StoreStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One structured reading of the Pizza Index page.
///
/// Immutable once created; the persisted state is simply the most
/// recent `Snapshot`, overwritten each tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// DOUGHCON threat level, 1–5 (1 = highest alert)
    pub threat_level: u8,

    /// DOUGHCON label shown next to the level, e.g. "DOUBLE TAKE"
    #[serde(default)]
    pub threat_label: Option<String>,

    /// Nothing Ever Happens Index status, if shown
    #[serde(default)]
    pub nehi_status: Option<String>,

    /// Store statuses keyed by uppercased store name.
    ///
    /// `BTreeMap` keeps iteration in a stable identifier order, which
    /// makes downstream event ordering reproducible.
    #[serde(default)]
    pub stores: BTreeMap<String, StoreStatus>,

    /// Aggregate order-activity reading across all stores
    #[serde(default)]
    pub activity_count: u64,

    /// When this reading was taken
    pub captured_at: DateTime<Utc>,
}

impl Snapshot {
    /// Number of stores observed in this reading.
    pub fn store_count(&self) -> usize {
        self.stores.len()
    }
}
