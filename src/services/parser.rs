// src/services/parser.rs

//! Snapshot extraction from rendered page content.
//!
//! Pure and deterministic apart from the capture timestamp: the same
//! HTML always yields the same reading. The DOUGHCON marker is the one
//! structural element that must be present; store cards and the NEHI
//! status are extracted on a best-effort basis.

use std::collections::BTreeMap;

use chrono::Utc;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{Snapshot, StoreStatus};

/// DOUGHCON labels shown on the page, by level.
const KNOWN_LABELS: &[&str] = &[
    "MAXIMUM READINESS",
    "NEXT STEP TO MAXIMUM READINESS",
    "INCREASE IN FORCE READINESS",
    "INCREASED INTELLIGENCE WATCH",
    "DOUBLE TAKE",
    "LOWEST STATE OF READINESS",
];

/// Known Nothing Ever Happens Index statuses, most specific first.
const KNOWN_NEHI_STATUSES: &[&str] = &[
    "IT HAPPENED",
    "SOMETHING IS HAPPENING",
    "SOMETHING MIGHT HAPPEN",
    "NOTHING EVER HAPPENS",
];

/// Store names known to appear on the page.
const KNOWN_STORES: &[&str] = &[
    "DOMINO'S PIZZA",
    "DOMINOS PIZZA",
    "EXTREME PIZZA",
    "DISTRICT PIZZA PALACE",
    "WE, THE PIZZA",
    "PIZZATO PIZZA",
    "PAPA JOHNS PIZZA",
    "PAPA JOHN'S PIZZA",
];

/// Words that mark a "PIZZA" heading as page copy rather than a store.
const NON_STORE_WORDS: &[&str] = &[
    "INDEX",
    "HISTORY",
    "INTELLIGENCE",
    "THEORY",
    "PENTAGON",
    "MAGAZINE",
    "TIME",
    "CRISIS",
    "GULF",
    "IRAN",
    "LAUNCHES",
    "DELIVERED",
    "CIA",
    "DOCUMENTED",
    "RUNNER",
    "→",
    "—",
    "REAL",
    "ACCURATE",
    "READ",
    "DASHBOARD",
    "CELEBRATED",
    "PIZZAS",
    "VIRAL",
    "FREQUENCIES",
    "PETE-ZA",
    "PIZZINT",
];

/// Extracts a [`Snapshot`] from rendered page HTML.
pub struct PageParser {
    level_re: Regex,
    nehi_re: Regex,
    activity_re: Regex,
    card_heading: Selector,
    any_heading: Selector,
}

impl PageParser {
    pub fn new() -> Self {
        Self {
            level_re: Regex::new(r"(?i)DOUGHCON\s*([1-5])").expect("valid level regex"),
            nehi_re: Regex::new(r"Status:\s*([A-Za-z\s]+)").expect("valid NEHI regex"),
            activity_re: Regex::new(r"(\d+)\s*%").expect("valid activity regex"),
            card_heading: Selector::parse("h3.font-mono.font-bold").expect("valid card selector"),
            any_heading: Selector::parse("h3").expect("valid heading selector"),
        }
    }

    /// Parse page content into a snapshot.
    ///
    /// Fails with a parse error when the DOUGHCON marker is absent,
    /// which usually means the page layout changed.
    pub fn parse(&self, html: &str) -> Result<Snapshot> {
        let document = Html::parse_document(html);
        let page_text = Self::page_text(&document);

        let threat_level = self.extract_level(&page_text)?;
        let threat_label = Self::extract_label(&page_text);
        let nehi_status = self.extract_nehi(&page_text);
        let (stores, activity_count) = self.extract_stores(&document);

        log::debug!(
            "Parsed snapshot: DOUGHCON {}, {} stores, activity {}",
            threat_level,
            stores.len(),
            activity_count
        );

        Ok(Snapshot {
            threat_level,
            threat_label,
            nehi_status,
            stores,
            activity_count,
            captured_at: Utc::now(),
        })
    }

    /// Flatten the document into newline-separated text.
    fn page_text(document: &Html) -> String {
        document
            .root_element()
            .text()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn extract_level(&self, page_text: &str) -> Result<u8> {
        let captures = self
            .level_re
            .captures(page_text)
            .ok_or_else(|| AppError::parse("DOUGHCON marker not found in page"))?;

        // The capture group only admits 1-5.
        captures[1]
            .parse::<u8>()
            .map_err(|e| AppError::parse(format!("Bad DOUGHCON digit: {e}")))
    }

    fn extract_label(page_text: &str) -> Option<String> {
        let upper = page_text.to_uppercase();
        KNOWN_LABELS
            .iter()
            .find(|label| upper.contains(*label))
            .map(|label| (*label).to_string())
    }

    fn extract_nehi(&self, page_text: &str) -> Option<String> {
        // Prefer an explicit "Status: X" line.
        if let Some(captures) = self.nehi_re.captures(page_text) {
            let found = captures[1].trim().to_uppercase();
            if let Some(status) = KNOWN_NEHI_STATUSES.iter().find(|s| found.contains(*s)) {
                return Some((*status).to_string());
            }
        }

        // Fallback: scan the whole page for a known status.
        let upper = page_text.to_uppercase();
        KNOWN_NEHI_STATUSES
            .iter()
            .find(|status| upper.contains(*status))
            .map(|status| (*status).to_string())
    }

    /// Extract store statuses and the aggregate activity reading.
    ///
    /// Store identifiers are uppercased names; the first reading wins
    /// when a name appears twice.
    fn extract_stores(&self, document: &Html) -> (BTreeMap<String, StoreStatus>, u64) {
        let mut headings: Vec<ElementRef<'_>> =
            document.select(&self.card_heading).collect();

        // Layout drift: fall back to every h3 on the page.
        if headings.is_empty() {
            headings = document.select(&self.any_heading).collect();
        }

        let mut stores = BTreeMap::new();
        let mut activity_count: u64 = 0;

        for heading in headings {
            let name = heading.text().collect::<String>().trim().to_uppercase();
            if !Self::is_store_name(&name) {
                continue;
            }
            if stores.contains_key(&name) {
                continue;
            }

            let card_text = Self::store_card(&heading)
                .map(|card| card.text().collect::<Vec<_>>().join("\n"))
                .unwrap_or_default();

            let status = StoreStatus::from_card_text(&card_text);
            activity_count += self.extract_activity(&card_text);

            log::debug!("Found store: {} - {}", name, status);
            stores.insert(name, status);
        }

        (stores, activity_count)
    }

    /// Per-card order-activity reading, 0 if the card shows none.
    fn extract_activity(&self, card_text: &str) -> u64 {
        self.activity_re
            .captures(card_text)
            .and_then(|c| c[1].parse::<u64>().ok())
            .unwrap_or(0)
    }

    /// Nearest store-card container for a heading.
    ///
    /// Cards are `div.bg-gray-900` on the live page; when that class is
    /// missing we settle for a grandparent so status text nearby is
    /// still in scope.
    fn store_card<'a>(heading: &ElementRef<'a>) -> Option<ElementRef<'a>> {
        let mut fallback = None;

        for (depth, node) in heading.ancestors().enumerate() {
            let Some(element) = ElementRef::wrap(node) else {
                continue;
            };
            let classes = element.value().attr("class").unwrap_or_default();
            if classes.contains("bg-gray-900") {
                return Some(element);
            }
            if depth < 3 {
                fallback = Some(element);
            }
        }

        fallback
    }

    fn is_store_name(name: &str) -> bool {
        if KNOWN_STORES
            .iter()
            .any(|known| name.contains(known) || known.contains(name))
        {
            return true;
        }

        name.contains("PIZZA") && !NON_STORE_WORDS.iter().any(|word| name.contains(word))
    }
}

impl Default for PageParser {
    fn default() -> Self {
        Self::new()
    }
}
