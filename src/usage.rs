use std::sync::Mutex;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::registry::RegistryEntry;

/// One record per outcome that reached the forwarder. Admission denials are
/// never recorded here.
#[derive(Debug, Clone, serde::Serialize)]
pub struct UsageEvent {
    pub id: Uuid,
    pub listing_id: String,
    pub slug: String,
    pub caller: String,
    /// True only for a settled call whose origin status was below 400
    pub success: bool,
    /// Amount actually moved by settlement (0 when nothing was billed)
    pub cost: f64,
    pub timestamp: DateTime<Utc>,
    pub error: Option<String>,
}

impl UsageEvent {
    /// A settled, billed call.
    pub fn billed(entry: &RegistryEntry, caller: &str, origin_status: u16) -> Self {
        Self {
            id: Uuid::new_v4(),
            listing_id: entry.listing_id.clone(),
            slug: entry.slug.clone(),
            caller: caller.to_string(),
            success: origin_status < 400,
            cost: entry.price_per_call,
            timestamp: Utc::now(),
            error: None,
        }
    }

    /// A call that reached the forwarder but was not billed.
    pub fn unbilled(entry: &RegistryEntry, caller: &str, error: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            listing_id: entry.listing_id.clone(),
            slug: entry.slug.clone(),
            caller: caller.to_string(),
            success: false,
            cost: 0.0,
            timestamp: Utc::now(),
            error: Some(error),
        }
    }
}

/// Per-slug rollup for the analytics endpoints.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SlugUsage {
    pub slug: String,
    pub calls: u64,
    pub billed_calls: u64,
    pub revenue: f64,
    pub last_call_at: Option<DateTime<Utc>>,
}

/// Append-only in-process usage sink.
///
/// Recording is fire-and-forget: a failure to record must never fail the
/// request it belongs to.
pub struct UsageLog {
    events: Mutex<Vec<UsageEvent>>,
}

impl UsageLog {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn record(&self, event: UsageEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(_) => tracing::warn!("usage log lock poisoned, dropping event"),
        }
    }

    pub fn snapshot(&self) -> Vec<UsageEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Rollups for every slug seen so far, sorted by slug.
    pub fn summarize(&self) -> Vec<SlugUsage> {
        let events = self.snapshot();
        let mut by_slug: std::collections::HashMap<String, SlugUsage> =
            std::collections::HashMap::new();

        for event in &events {
            let summary = by_slug
                .entry(event.slug.clone())
                .or_insert_with(|| SlugUsage {
                    slug: event.slug.clone(),
                    calls: 0,
                    billed_calls: 0,
                    revenue: 0.0,
                    last_call_at: None,
                });
            summary.calls += 1;
            if event.cost > 0.0 {
                summary.billed_calls += 1;
                summary.revenue += event.cost;
            }
            if summary.last_call_at.map_or(true, |t| event.timestamp > t) {
                summary.last_call_at = Some(event.timestamp);
            }
        }

        let mut summaries: Vec<SlugUsage> = by_slug.into_values().collect();
        summaries.sort_by(|a, b| a.slug.cmp(&b.slug));
        summaries
    }

    pub fn summarize_slug(&self, slug: &str) -> Option<SlugUsage> {
        self.summarize().into_iter().find(|s| s.slug == slug)
    }
}

impl Default for UsageLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> RegistryEntry {
        RegistryEntry {
            slug: "weather".to_string(),
            origin_base_url: "https://example.test".to_string(),
            price_per_call: 50.0,
            owner: "P1".to_string(),
            listing_id: "api_weather".to_string(),
        }
    }

    #[test]
    fn billed_event_success_follows_origin_status() {
        let e = entry();
        assert!(UsageEvent::billed(&e, "C1", 200).success);
        assert!(UsageEvent::billed(&e, "C1", 399).success);
        assert!(!UsageEvent::billed(&e, "C1", 404).success);
        assert!(!UsageEvent::billed(&e, "C1", 500).success);
        // Billed either way
        assert_eq!(UsageEvent::billed(&e, "C1", 500).cost, 50.0);
    }

    #[test]
    fn unbilled_event_carries_no_cost() {
        let event = UsageEvent::unbilled(&entry(), "C1", "connect refused".to_string());
        assert!(!event.success);
        assert_eq!(event.cost, 0.0);
        assert_eq!(event.error.as_deref(), Some("connect refused"));
    }

    #[test]
    fn summarize_rolls_up_per_slug() {
        let log = UsageLog::new();
        let e = entry();
        log.record(UsageEvent::billed(&e, "C1", 200));
        log.record(UsageEvent::billed(&e, "C2", 500));
        log.record(UsageEvent::unbilled(&e, "C1", "timeout".to_string()));

        let summaries = log.summarize();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].calls, 3);
        assert_eq!(summaries[0].billed_calls, 2);
        assert_eq!(summaries[0].revenue, 100.0);
        assert!(summaries[0].last_call_at.is_some());
    }

    #[test]
    fn summarize_slug_misses_unknown() {
        let log = UsageLog::new();
        assert!(log.summarize_slug("nope").is_none());
    }
}
