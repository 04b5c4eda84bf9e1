// src/pipeline/tick.rs

//! One full monitoring cycle.
//!
//! Fetch → parse → detect → notify → persist, with the collaborators
//! threaded through as trait objects so the cycle is testable with
//! injected fakes. Error policy per step:
//!
//! - fetch/parse failure aborts the tick and leaves state untouched;
//!   the next scheduled tick retries from the last good baseline
//! - a failed delivery is logged and the remaining events are still
//!   attempted
//! - a failed save is logged; the stale baseline may re-alert the same
//!   change next tick, which beats losing it

use crate::error::Result;
use crate::models::Snapshot;
use crate::pipeline::ChangeDetector;
use crate::services::{Notifier, PageFetcher, PageParser};
use crate::storage::StateStore;

/// Summary of a completed tick.
#[derive(Debug)]
pub struct TickOutcome {
    /// The reading taken this tick
    pub snapshot: Snapshot,
    /// Number of events detected
    pub events_detected: usize,
    /// Number of events successfully delivered
    pub events_sent: usize,
    /// Whether the snapshot reached durable storage
    pub state_saved: bool,
}

/// Run one fetch → parse → detect → notify → persist cycle.
pub async fn run_tick(
    fetcher: &dyn PageFetcher,
    parser: &PageParser,
    detector: &ChangeDetector,
    notifier: &dyn Notifier,
    store: &dyn StateStore,
) -> Result<TickOutcome> {
    let body = fetcher.fetch().await?;
    let current = parser.parse(&body)?;
    let previous = store.load().await?;

    let events = detector.detect(previous.as_ref(), &current);
    if events.is_empty() {
        log::debug!("No changes detected");
    } else {
        log::info!("Detected {} change(s), sending alerts...", events.len());
    }

    let mut events_sent = 0;
    for event in &events {
        match notifier.send(event, &current).await {
            Ok(()) => events_sent += 1,
            Err(e) => log::error!("Failed to deliver {} alert: {}", event.kind(), e),
        }
    }
    if !events.is_empty() {
        log::info!("Sent {}/{} alert(s)", events_sent, events.len());
    }

    let state_saved = match store.save(&current).await {
        Ok(()) => true,
        Err(e) => {
            log::error!("Failed to persist snapshot: {}", e);
            false
        }
    };

    Ok(TickOutcome {
        snapshot: current,
        events_detected: events.len(),
        events_sent,
        state_saved,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::Event;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    use crate::storage::JsonStateStore;

    struct FixedFetcher(String);

    #[async_trait]
    impl PageFetcher for FixedFetcher {
        async fn fetch(&self) -> Result<String> {
            Ok(self.0.clone())
        }
    }

    struct FailingFetcher;

    #[async_trait]
    impl PageFetcher for FailingFetcher {
        async fn fetch(&self) -> Result<String> {
            Err(AppError::fetch("https://example.test/", "connection refused"))
        }
    }

    /// Records deliveries; fails the first `fail_first` of them.
    #[derive(Default)]
    struct RecordingNotifier {
        fail_first: usize,
        attempts: AtomicUsize,
        delivered: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, event: &Event, _snapshot: &Snapshot) -> Result<()> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
            if attempt < self.fail_first {
                return Err(AppError::notify("simulated delivery failure"));
            }
            self.delivered.lock().unwrap().push(event.kind().to_string());
            Ok(())
        }
    }

    fn page(level: u8, store_status: &str) -> String {
        format!(
            r#"<html><body>
                <h1>DOUGHCON {level}</h1>
                <div class="bg-gray-900">
                    <h3 class="font-mono font-bold">EXTREME PIZZA</h3>
                    <span>{store_status}</span><span>40%</span>
                </div>
            </body></html>"#
        )
    }

    fn deps() -> (PageParser, ChangeDetector) {
        (PageParser::new(), ChangeDetector::new(30.0))
    }

    #[tokio::test]
    async fn first_tick_saves_baseline_without_alerts() {
        let tmp = TempDir::new().unwrap();
        let store = JsonStateStore::new(tmp.path().join("state.json"));
        let (parser, detector) = deps();
        let notifier = RecordingNotifier::default();
        let fetcher = FixedFetcher(page(4, "OPEN"));

        let outcome = run_tick(&fetcher, &parser, &detector, &notifier, &store)
            .await
            .unwrap();

        assert_eq!(outcome.events_detected, 0);
        assert_eq!(outcome.events_sent, 0);
        assert!(outcome.state_saved);
        assert!(store.load().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn second_tick_alerts_on_changes() {
        let tmp = TempDir::new().unwrap();
        let store = JsonStateStore::new(tmp.path().join("state.json"));
        let (parser, detector) = deps();
        let notifier = RecordingNotifier::default();

        let first = FixedFetcher(page(4, "OPEN"));
        run_tick(&first, &parser, &detector, &notifier, &store)
            .await
            .unwrap();

        let second = FixedFetcher(page(2, "BUSY"));
        let outcome = run_tick(&second, &parser, &detector, &notifier, &store)
            .await
            .unwrap();

        assert_eq!(outcome.events_detected, 2);
        assert_eq!(outcome.events_sent, 2);
        let delivered = notifier.delivered.lock().unwrap();
        assert_eq!(
            *delivered,
            vec!["level_changed".to_string(), "store_status_changed".to_string()]
        );
    }

    #[tokio::test]
    async fn one_failed_delivery_does_not_block_the_rest() {
        let tmp = TempDir::new().unwrap();
        let store = JsonStateStore::new(tmp.path().join("state.json"));
        let (parser, detector) = deps();

        let first = FixedFetcher(page(4, "OPEN"));
        run_tick(
            &first,
            &parser,
            &detector,
            &RecordingNotifier::default(),
            &store,
        )
        .await
        .unwrap();

        let notifier = RecordingNotifier {
            fail_first: 1,
            ..RecordingNotifier::default()
        };
        let second = FixedFetcher(page(2, "BUSY"));
        let outcome = run_tick(&second, &parser, &detector, &notifier, &store)
            .await
            .unwrap();

        // The first delivery failed but the second was still attempted.
        assert_eq!(outcome.events_detected, 2);
        assert_eq!(outcome.events_sent, 1);
        let delivered = notifier.delivered.lock().unwrap();
        assert_eq!(*delivered, vec!["store_status_changed".to_string()]);

        // Delivery failures never block the state save.
        assert!(outcome.state_saved);
    }

    #[tokio::test]
    async fn fetch_failure_leaves_state_untouched() {
        let tmp = TempDir::new().unwrap();
        let store = JsonStateStore::new(tmp.path().join("state.json"));
        let (parser, detector) = deps();
        let notifier = RecordingNotifier::default();

        let first = FixedFetcher(page(4, "OPEN"));
        run_tick(&first, &parser, &detector, &notifier, &store)
            .await
            .unwrap();
        let baseline = store.load().await.unwrap().unwrap();

        let result = run_tick(&FailingFetcher, &parser, &detector, &notifier, &store).await;
        assert!(matches!(result, Err(AppError::Fetch { .. })));

        let after = store.load().await.unwrap().unwrap();
        assert_eq!(after, baseline);
    }

    #[tokio::test]
    async fn parse_failure_leaves_state_untouched() {
        let tmp = TempDir::new().unwrap();
        let store = JsonStateStore::new(tmp.path().join("state.json"));
        let (parser, detector) = deps();
        let notifier = RecordingNotifier::default();

        let fetcher = FixedFetcher("<html><body>down for maintenance</body></html>".into());
        let result = run_tick(&fetcher, &parser, &detector, &notifier, &store).await;

        assert!(matches!(result, Err(AppError::Parse(_))));
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unchanged_page_is_quiet() {
        let tmp = TempDir::new().unwrap();
        let store = JsonStateStore::new(tmp.path().join("state.json"));
        let (parser, detector) = deps();
        let notifier = RecordingNotifier::default();
        let fetcher = FixedFetcher(page(4, "OPEN"));

        run_tick(&fetcher, &parser, &detector, &notifier, &store)
            .await
            .unwrap();
        let outcome = run_tick(&fetcher, &parser, &detector, &notifier, &store)
            .await
            .unwrap();

        assert_eq!(outcome.events_detected, 0);
        assert!(notifier.delivered.lock().unwrap().is_empty());
    }
}
