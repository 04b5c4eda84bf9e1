// src/pipeline/detect.rs

//! Change detection between successive snapshots.
//!
//! Pure comparison: given the previous reading (if any) and the current
//! one, produce the ordered list of events worth alerting on. Ordering
//! is fixed — level, then store statuses in ascending identifier order,
//! then the activity spike, then the NEHI flip — so notification order
//! is reproducible.

use crate::models::{Event, Snapshot};

/// Detects significant changes between snapshot pairs.
#[derive(Debug, Clone)]
pub struct ChangeDetector {
    spike_threshold_percent: f64,
}

impl ChangeDetector {
    pub fn new(spike_threshold_percent: f64) -> Self {
        Self {
            spike_threshold_percent,
        }
    }

    /// Compare the current snapshot against the previous one.
    ///
    /// With no previous snapshot the current reading only establishes
    /// the baseline and nothing is emitted.
    pub fn detect(&self, previous: Option<&Snapshot>, current: &Snapshot) -> Vec<Event> {
        let Some(previous) = previous else {
            log::info!("First run - no previous state to compare");
            return Vec::new();
        };

        let mut events = Vec::new();

        if current.threat_level != previous.threat_level {
            if current.threat_level < previous.threat_level {
                log::warn!(
                    "DOUGHCON ESCALATION: {} → {}",
                    previous.threat_level,
                    current.threat_level
                );
            } else {
                log::info!(
                    "DOUGHCON de-escalation: {} → {}",
                    previous.threat_level,
                    current.threat_level
                );
            }
            events.push(Event::LevelChanged {
                old: previous.threat_level,
                new: current.threat_level,
            });
        }

        // BTreeMap iteration keeps store events in identifier order.
        // Stores without a previous reading are baseline, not changes.
        for (store, status) in &current.stores {
            let Some(old) = previous.stores.get(store) else {
                continue;
            };
            if old != status {
                log::info!("Store {} status change: {} → {}", store, old, status);
                events.push(Event::StoreStatusChanged {
                    store: store.clone(),
                    old: *old,
                    new: *status,
                });
            }
        }

        if let Some(event) = self.check_spike(previous, current) {
            events.push(event);
        }

        if let (Some(old), Some(new)) = (&previous.nehi_status, &current.nehi_status) {
            if !old.eq_ignore_ascii_case(new) {
                log::info!("NEHI change: {} → {}", old, new);
                events.push(Event::NehiChanged {
                    old: old.clone(),
                    new: new.clone(),
                });
            }
        }

        events
    }

    fn check_spike(&self, previous: &Snapshot, current: &Snapshot) -> Option<Event> {
        let old_count = previous.activity_count;
        let new_count = current.activity_count;

        // Clamp the denominator so a zero baseline cannot divide by zero.
        let baseline = old_count.max(1) as f64;
        let percent_change = (new_count as f64 - old_count as f64) / baseline * 100.0;

        if percent_change >= self.spike_threshold_percent {
            log::info!(
                "Activity spike: {} → {} (+{:.1}%)",
                old_count,
                new_count,
                percent_change
            );
            Some(Event::ActivitySpike {
                old_count,
                new_count,
                percent_change,
            })
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StoreStatus;
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn snapshot(level: u8, stores: &[(&str, StoreStatus)], activity: u64) -> Snapshot {
        Snapshot {
            threat_level: level,
            threat_label: None,
            nehi_status: None,
            stores: stores
                .iter()
                .map(|(name, status)| (name.to_string(), *status))
                .collect::<BTreeMap<_, _>>(),
            activity_count: activity,
            captured_at: Utc::now(),
        }
    }

    fn detector() -> ChangeDetector {
        ChangeDetector::new(30.0)
    }

    #[test]
    fn first_run_emits_nothing() {
        let current = snapshot(2, &[("A", StoreStatus::Open)], 500);
        assert!(detector().detect(None, &current).is_empty());
    }

    #[test]
    fn identical_snapshots_emit_nothing() {
        let prev = snapshot(3, &[("A", StoreStatus::Open), ("B", StoreStatus::Busy)], 80);
        let curr = prev.clone();
        assert!(detector().detect(Some(&prev), &curr).is_empty());
    }

    #[test]
    fn level_change_emits_one_event() {
        let prev = snapshot(2, &[], 0);
        let curr = snapshot(4, &[], 0);

        let events = detector().detect(Some(&prev), &curr);
        assert_eq!(events, vec![Event::LevelChanged { old: 2, new: 4 }]);
    }

    #[test]
    fn store_flip_emits_one_event() {
        let prev = snapshot(
            4,
            &[("A", StoreStatus::Open), ("B", StoreStatus::Closed)],
            0,
        );
        let curr = snapshot(
            4,
            &[("A", StoreStatus::Closed), ("B", StoreStatus::Closed)],
            0,
        );

        let events = detector().detect(Some(&prev), &curr);
        assert_eq!(
            events,
            vec![Event::StoreStatusChanged {
                store: "A".into(),
                old: StoreStatus::Open,
                new: StoreStatus::Closed,
            }]
        );
    }

    #[test]
    fn new_store_is_not_a_change() {
        let prev = snapshot(4, &[("A", StoreStatus::Open)], 0);
        let curr = snapshot(
            4,
            &[("A", StoreStatus::Open), ("B", StoreStatus::Busy)],
            0,
        );

        assert!(detector().detect(Some(&prev), &curr).is_empty());
    }

    #[test]
    fn spike_fires_at_threshold() {
        let prev = snapshot(5, &[], 100);
        let curr = snapshot(5, &[], 135);

        let events = detector().detect(Some(&prev), &curr);
        assert_eq!(events.len(), 1);
        match &events[0] {
            Event::ActivitySpike {
                old_count,
                new_count,
                percent_change,
            } => {
                assert_eq!(*old_count, 100);
                assert_eq!(*new_count, 135);
                assert_eq!(*percent_change, 35.0);
            }
            other => panic!("expected spike, got {other:?}"),
        }
    }

    #[test]
    fn below_threshold_is_quiet() {
        let prev = snapshot(5, &[], 100);
        let curr = snapshot(5, &[], 125);

        assert!(detector().detect(Some(&prev), &curr).is_empty());
    }

    #[test]
    fn zero_baseline_does_not_divide_by_zero() {
        let prev = snapshot(5, &[], 0);
        let curr = snapshot(5, &[], 50);

        let events = detector().detect(Some(&prev), &curr);
        assert_eq!(events.len(), 1);
        match &events[0] {
            Event::ActivitySpike { percent_change, .. } => {
                assert_eq!(*percent_change, 5000.0);
            }
            other => panic!("expected spike, got {other:?}"),
        }
    }

    #[test]
    fn activity_drop_is_not_a_spike() {
        let prev = snapshot(5, &[], 200);
        let curr = snapshot(5, &[], 50);

        assert!(detector().detect(Some(&prev), &curr).is_empty());
    }

    #[test]
    fn nehi_flip_emits_event() {
        let mut prev = snapshot(5, &[], 0);
        prev.nehi_status = Some("NOTHING EVER HAPPENS".into());
        let mut curr = snapshot(5, &[], 0);
        curr.nehi_status = Some("IT HAPPENED".into());

        let events = detector().detect(Some(&prev), &curr);
        assert_eq!(
            events,
            vec![Event::NehiChanged {
                old: "NOTHING EVER HAPPENS".into(),
                new: "IT HAPPENED".into(),
            }]
        );
    }

    #[test]
    fn nehi_case_difference_is_not_a_change() {
        let mut prev = snapshot(5, &[], 0);
        prev.nehi_status = Some("It Happened".into());
        let mut curr = snapshot(5, &[], 0);
        curr.nehi_status = Some("IT HAPPENED".into());

        assert!(detector().detect(Some(&prev), &curr).is_empty());
    }

    #[test]
    fn events_come_out_in_fixed_order() {
        let mut prev = snapshot(
            4,
            &[("B", StoreStatus::Open), ("A", StoreStatus::Open)],
            100,
        );
        prev.nehi_status = Some("NOTHING EVER HAPPENS".into());

        let mut curr = snapshot(
            2,
            &[("B", StoreStatus::Busy), ("A", StoreStatus::Busy)],
            200,
        );
        curr.nehi_status = Some("IT HAPPENED".into());

        let events = detector().detect(Some(&prev), &curr);
        let kinds: Vec<_> = events.iter().map(|e| e.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                "level_changed",
                "store_status_changed",
                "store_status_changed",
                "activity_spike",
                "nehi_changed",
            ]
        );

        // Store events sort by identifier.
        match (&events[1], &events[2]) {
            (
                Event::StoreStatusChanged { store: first, .. },
                Event::StoreStatusChanged { store: second, .. },
            ) => {
                assert_eq!(first, "A");
                assert_eq!(second, "B");
            }
            other => panic!("expected two store events, got {other:?}"),
        }
    }
}
