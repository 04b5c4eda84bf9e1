// src/services/mod.rs

//! Collaborator services: page fetch, extraction, and webhook delivery.

pub mod fetcher;
pub mod notifier;
pub mod parser;

pub use fetcher::{HttpFetcher, PageFetcher};
pub use notifier::{Notifier, WebhookNotifier};
pub use parser::PageParser;
