// src/services/notifier.rs

//! Discord webhook notifier.
//!
//! Renders events into embed payloads and posts them to the configured
//! webhook. Each event is delivered independently so one failed POST
//! never blocks the rest of a tick's notifications.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde_json::{Value, json};

use crate::error::{AppError, Result};
use crate::models::{Event, NotifyConfig, Snapshot, StoreStatus};

/// Embed colors keyed by DOUGHCON level.
const DOUGHCON_COLORS: [(u8, u32); 5] = [
    (1, 0xFF0000), // Red - Critical
    (2, 0xFF6600), // Orange - High
    (3, 0xFFCC00), // Yellow - Elevated
    (4, 0x0099FF), // Blue - Guarded
    (5, 0x00FF00), // Green - Low
];

const FALLBACK_COLOR: u32 = 0x808080;
const FOOTER_TEXT: &str = "Pizza Index Monitor 🍕";

/// Delivery target for detected events.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Render and deliver one event.
    async fn send(&self, event: &Event, snapshot: &Snapshot) -> Result<()>;
}

/// Sends Discord-compatible embed payloads to a webhook URL.
pub struct WebhookNotifier {
    client: Client,
    webhook_url: String,
}

impl WebhookNotifier {
    pub fn new(config: &NotifyConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            webhook_url: config.webhook_url.clone(),
        })
    }

    async fn post_embed(&self, embed: Value) -> Result<()> {
        let payload = json!({ "embeds": [embed] });

        let response = self
            .client
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await
            .map_err(AppError::notify)?;

        response.error_for_status().map_err(AppError::notify)?;
        Ok(())
    }

    /// Announce startup with the current reading and store roster.
    pub async fn send_startup(&self, snapshot: &Snapshot) -> Result<()> {
        let mut roster = String::new();
        for (name, status) in snapshot.stores.iter().take(5) {
            let status_emoji = match status {
                StoreStatus::Open => "🟢",
                StoreStatus::Closed => "🔴",
                StoreStatus::Busy => "🟡",
                StoreStatus::Unknown => "⚪",
            };
            roster.push_str(&format!("{status_emoji} **{name}**: {status}\n"));
        }
        if snapshot.store_count() > 5 {
            roster.push_str(&format!("_...and {} more_", snapshot.store_count() - 5));
        }
        if roster.is_empty() {
            roster.push_str("No stores detected");
        }

        let embed = json!({
            "title": "🍕 Pizza Index Monitor started",
            "description": "Now watching pizza-adjacent geopolitical indicators.",
            "color": color_for_level(snapshot.threat_level),
            "fields": [
                {
                    "name": "🎯 Current DOUGHCON",
                    "value": format!("**{}**{}", snapshot.threat_level, label_suffix(snapshot)),
                    "inline": false
                },
                {
                    "name": "🏪 Stores",
                    "value": roster,
                    "inline": false
                }
            ],
            "timestamp": Utc::now().to_rfc3339(),
            "footer": { "text": FOOTER_TEXT }
        });

        self.post_embed(embed).await?;
        log::info!("Sent startup notification");
        Ok(())
    }

    /// Send a test embed to verify the webhook is reachable.
    pub async fn send_test(&self) -> Result<()> {
        let embed = json!({
            "title": "🔔 Test notification",
            "description": "The Pizza Index Monitor webhook is configured correctly!",
            "color": 0x00FF00,
            "timestamp": Utc::now().to_rfc3339(),
            "footer": { "text": FOOTER_TEXT }
        });

        self.post_embed(embed).await?;
        log::info!("Test notification sent successfully");
        Ok(())
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, event: &Event, snapshot: &Snapshot) -> Result<()> {
        let embed = build_embed(event, snapshot);
        self.post_embed(embed).await?;
        log::info!("Sent alert: {}", event.kind());
        Ok(())
    }
}

/// Embed color for a DOUGHCON level.
fn color_for_level(level: u8) -> u32 {
    DOUGHCON_COLORS
        .iter()
        .find(|(l, _)| *l == level)
        .map(|(_, c)| *c)
        .unwrap_or(FALLBACK_COLOR)
}

fn label_suffix(snapshot: &Snapshot) -> String {
    snapshot
        .threat_label
        .as_deref()
        .map(|label| format!(" - {label}"))
        .unwrap_or_default()
}

/// Build the embed payload for one event.
fn build_embed(event: &Event, snapshot: &Snapshot) -> Value {
    let mut fields = Vec::new();

    let change = match event {
        Event::LevelChanged { old, new } => Some(format!("`{old}` → `{new}`")),
        Event::StoreStatusChanged { old, new, .. } => Some(format!("`{old}` → `{new}`")),
        Event::ActivitySpike {
            old_count,
            new_count,
            ..
        } => Some(format!("`{old_count}` → `{new_count}`")),
        Event::NehiChanged { old, new } => Some(format!("`{old}` → `{new}`")),
    };
    if let Some(change) = change {
        fields.push(json!({ "name": "📊 Change", "value": change, "inline": true }));
    }

    if let Event::StoreStatusChanged { store, .. } = event {
        fields.push(json!({ "name": "🍕 Store", "value": store, "inline": true }));
    }

    fields.push(json!({
        "name": "🎯 Current DOUGHCON",
        "value": format!("**{}**{}", snapshot.threat_level, label_suffix(snapshot)),
        "inline": false
    }));

    json!({
        "title": format!("{} {}", event.emoji(), event.title()),
        "description": event.describe(),
        "color": color_for_level(snapshot.threat_level),
        "fields": fields,
        "timestamp": Utc::now().to_rfc3339(),
        "footer": { "text": FOOTER_TEXT }
    })
}
