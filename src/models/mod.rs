// src/models/mod.rs

//! Domain models for the monitor application.

mod config;
mod event;
mod snapshot;

// Re-export all public types
pub use config::{Config, FetchConfig, LoggingConfig, MonitorConfig, NotifyConfig, StateConfig};
pub use event::Event;
pub use snapshot::{Snapshot, StoreStatus};
