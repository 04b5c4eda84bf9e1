// src/models/event.rs

//! Change events produced by snapshot comparison.

use std::fmt;

use crate::models::StoreStatus;

/// A detected change between two successive snapshots.
///
/// Events are transient: they are produced per tick, rendered into
/// notifications, and never persisted.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// DOUGHCON threat level moved
    LevelChanged { old: u8, new: u8 },

    /// A store's status differs from the previous reading
    StoreStatusChanged {
        store: String,
        old: StoreStatus,
        new: StoreStatus,
    },

    /// Order activity rose past the configured threshold
    ActivitySpike {
        old_count: u64,
        new_count: u64,
        percent_change: f64,
    },

    /// Nothing Ever Happens Index flipped
    NehiChanged { old: String, new: String },
}

impl Event {
    /// Short machine-friendly kind name, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::LevelChanged { .. } => "level_changed",
            Self::StoreStatusChanged { .. } => "store_status_changed",
            Self::ActivitySpike { .. } => "activity_spike",
            Self::NehiChanged { .. } => "nehi_changed",
        }
    }

    /// Category emoji for the rendered notification.
    ///
    /// A lower DOUGHCON number means a higher alert, so a decreasing
    /// level is an escalation.
    pub fn emoji(&self) -> &'static str {
        match self {
            Self::LevelChanged { old, new } if new < old => "🚨",
            Self::LevelChanged { .. } => "✅",
            Self::StoreStatusChanged { .. } => "🔥",
            Self::ActivitySpike { .. } => "📈",
            Self::NehiChanged { .. } => "🌍",
        }
    }

    /// Human-readable notification title.
    pub fn title(&self) -> &'static str {
        match self {
            Self::LevelChanged { old, new } if new < old => "DOUGHCON escalation!",
            Self::LevelChanged { .. } => "DOUGHCON de-escalation",
            Self::StoreStatusChanged { .. } => "Store status change",
            Self::ActivitySpike { .. } => "Order activity spike detected!",
            Self::NehiChanged { .. } => "Nothing Ever Happens Index change",
        }
    }

    /// One-line description used as the notification body.
    pub fn describe(&self) -> String {
        match self {
            Self::LevelChanged { old, new } if new < old => {
                format!("Threat level escalated from {old} to {new}")
            }
            Self::LevelChanged { old, new } => {
                format!("Threat level dropped from {old} to {new}")
            }
            Self::StoreStatusChanged { store, old, new } => {
                format!("{store} went from {old} to {new}")
            }
            Self::ActivitySpike {
                old_count,
                new_count,
                percent_change,
            } => format!(
                "Order activity rose {percent_change:.1}% ({old_count} → {new_count})"
            ),
            Self::NehiChanged { old, new } => {
                format!("Index moved from '{old}' to '{new}'")
            }
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind(), self.describe())
    }
}
