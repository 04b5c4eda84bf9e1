// src/pipeline/monitor.rs

//! The polling loop.
//!
//! A single task runs one tick, sleeps for the configured interval, and
//! repeats until a termination signal arrives. The sleep races the
//! shutdown future, so a signal during the interval stops the loop
//! immediately instead of waiting out the timer.

use std::time::Duration;

use crate::error::Result;
use crate::models::Config;
use crate::pipeline::{ChangeDetector, TickOutcome, run_tick};
use crate::services::{HttpFetcher, PageParser, WebhookNotifier};
use crate::storage::JsonStateStore;

/// The monitor: configuration plus its wired-up collaborators.
pub struct Monitor {
    polling_interval: Duration,
    startup_notification: bool,
    fetcher: HttpFetcher,
    parser: PageParser,
    detector: ChangeDetector,
    notifier: WebhookNotifier,
    store: JsonStateStore,
}

impl Monitor {
    /// Wire up all collaborators from configuration.
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            polling_interval: Duration::from_secs(config.monitor.polling_interval_secs),
            startup_notification: config.monitor.startup_notification,
            fetcher: HttpFetcher::new(&config.fetch)?,
            parser: PageParser::new(),
            detector: ChangeDetector::new(config.monitor.spike_threshold_percent),
            notifier: WebhookNotifier::new(&config.notify)?,
            store: JsonStateStore::new(config.state.file.clone()),
        })
    }

    /// Run a single tick.
    pub async fn tick(&self) -> Result<TickOutcome> {
        run_tick(
            &self.fetcher,
            &self.parser,
            &self.detector,
            &self.notifier,
            &self.store,
        )
        .await
    }

    /// Run the polling loop until a termination signal.
    ///
    /// Per-tick failures are logged and the loop carries on; the next
    /// tick retries from the last good state.
    pub async fn run(&self) -> Result<()> {
        log::info!("Pizza Index Monitor starting...");
        log::info!("Polling interval: {} seconds", self.polling_interval.as_secs());
        log::info!("Watching {}", self.fetcher.url());

        // Initial tick establishes (or resumes) the baseline.
        match self.tick().await {
            Ok(outcome) => {
                log::info!(
                    "Initial state captured - DOUGHCON level: {}, stores: {}",
                    outcome.snapshot.threat_level,
                    outcome.snapshot.store_count()
                );
                if self.startup_notification {
                    if let Err(e) = self.notifier.send_startup(&outcome.snapshot).await {
                        log::error!("Failed to send startup notification: {}", e);
                    }
                }
            }
            Err(e) => log::error!("Initial fetch failed: {}. Will retry next tick.", e),
        }

        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.polling_interval) => {}
                _ = &mut shutdown => {
                    log::info!("Received termination signal, shutting down...");
                    break;
                }
            }

            if let Err(e) = self.tick().await {
                log::error!("Tick failed: {}", e);
            }
        }

        log::info!("Goodbye! 🍕");
        Ok(())
    }

    /// Webhook access for startup/test messages driven by the CLI.
    pub fn notifier(&self) -> &WebhookNotifier {
        &self.notifier
    }
}

/// Resolves when SIGINT or SIGTERM arrives.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::warn!("Failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                log::warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
