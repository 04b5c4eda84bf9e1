// src/pipeline/mod.rs

//! Pipeline entry points for monitor operations.
//!
//! - `ChangeDetector`: diff two snapshots into events
//! - `run_tick`: one fetch → parse → detect → notify → persist cycle
//! - `Monitor`: the cancellable polling loop

pub mod detect;
pub mod monitor;
pub mod tick;

pub use detect::ChangeDetector;
pub use monitor::Monitor;
pub use tick::{TickOutcome, run_tick};
