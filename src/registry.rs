use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::GatewayError;

/// A registered API known to the gateway.
///
/// Entries are immutable once registered; re-registering the same slug
/// replaces the entry wholesale. The core never deletes entries.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RegistryEntry {
    /// Routing key, unique within the gateway's URL space
    pub slug: String,
    /// Upstream API root the gateway forwards to
    pub origin_base_url: String,
    /// Price charged per proxied call, fixed at registration time
    pub price_per_call: f64,
    /// Wallet identity credited on settlement
    pub owner: String,
    /// Back-reference to the external listing record
    pub listing_id: String,
}

/// In-memory route table mapping slugs to origin APIs.
///
/// Read on every proxied request, written only on registration, so a single
/// reader-writer lock is sufficient.
pub struct Registry {
    entries: RwLock<HashMap<String, RegistryEntry>>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Insert or replace the entry keyed by its slug. Idempotent by key.
    /// Origin reachability is deliberately not checked here.
    pub fn register(&self, entry: RegistryEntry) -> Result<(), GatewayError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| GatewayError::Internal("registry lock poisoned".to_string()))?;
        entries.insert(entry.slug.clone(), entry);
        Ok(())
    }

    /// Match an inbound path against all registered slugs.
    ///
    /// The path must begin with `/{slug}/`; the returned remainder is
    /// everything after the slug, including its leading `/`. A path equal to
    /// exactly `/{slug}` is a hard non-match: callers must always include at
    /// least a trailing `/`.
    ///
    /// When one registered slug is a prefix of another, the longest matching
    /// slug wins. Iteration order over the map must never decide a match.
    pub fn resolve(
        &self,
        path: &str,
    ) -> Result<Option<(RegistryEntry, String)>, GatewayError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| GatewayError::Internal("registry lock poisoned".to_string()))?;

        let mut best: Option<&RegistryEntry> = None;
        for entry in entries.values() {
            let rest = match path
                .strip_prefix('/')
                .and_then(|p| p.strip_prefix(entry.slug.as_str()))
            {
                Some(rest) => rest,
                None => continue,
            };
            if !rest.starts_with('/') {
                continue;
            }
            if best.map_or(true, |b| entry.slug.len() > b.slug.len()) {
                best = Some(entry);
            }
        }

        Ok(best.map(|entry| {
            let remainder = path[entry.slug.len() + 1..].to_string();
            (entry.clone(), remainder)
        }))
    }

    /// Snapshot of all entries, sorted by slug. A copy, never a live view.
    pub fn list(&self) -> Result<Vec<RegistryEntry>, GatewayError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| GatewayError::Internal("registry lock poisoned".to_string()))?;
        let mut snapshot: Vec<RegistryEntry> = entries.values().cloned().collect();
        snapshot.sort_by(|a, b| a.slug.cmp(&b.slug));
        Ok(snapshot)
    }

    pub fn len(&self) -> Result<usize, GatewayError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| GatewayError::Internal("registry lock poisoned".to_string()))?;
        Ok(entries.len())
    }

    pub fn is_empty(&self) -> Result<bool, GatewayError> {
        Ok(self.len()? == 0)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(slug: &str) -> RegistryEntry {
        RegistryEntry {
            slug: slug.to_string(),
            origin_base_url: format!("https://{}.example.test", slug.replace('/', "-")),
            price_per_call: 1.0,
            owner: "P1".to_string(),
            listing_id: format!("api_{}", slug),
        }
    }

    #[test]
    fn resolve_returns_entry_and_remainder() {
        let registry = Registry::new();
        registry.register(entry("weather")).unwrap();

        let (matched, remainder) = registry.resolve("/weather/today").unwrap().unwrap();
        assert_eq!(matched.slug, "weather");
        assert_eq!(remainder, "/today");
    }

    #[test]
    fn longest_slug_wins() {
        let registry = Registry::new();
        registry.register(entry("a")).unwrap();
        registry.register(entry("ab")).unwrap();

        let (matched, remainder) = registry.resolve("/ab/x").unwrap().unwrap();
        assert_eq!(matched.slug, "ab");
        assert_eq!(remainder, "/x");

        let (matched, _) = registry.resolve("/a/x").unwrap().unwrap();
        assert_eq!(matched.slug, "a");
    }

    #[test]
    fn nested_slug_beats_its_prefix() {
        let registry = Registry::new();
        registry.register(entry("weather")).unwrap();
        registry.register(entry("weather/v2")).unwrap();

        let (matched, remainder) = registry.resolve("/weather/v2/today").unwrap().unwrap();
        assert_eq!(matched.slug, "weather/v2");
        assert_eq!(remainder, "/today");

        let (matched, _) = registry.resolve("/weather/today").unwrap().unwrap();
        assert_eq!(matched.slug, "weather");
    }

    #[test]
    fn no_trailing_segment_is_not_a_match() {
        let registry = Registry::new();
        registry.register(entry("weather")).unwrap();

        assert!(registry.resolve("/weather").unwrap().is_none());
        // A bare trailing slash is the minimum acceptable remainder
        let (_, remainder) = registry.resolve("/weather/").unwrap().unwrap();
        assert_eq!(remainder, "/");
    }

    #[test]
    fn unknown_path_resolves_to_none() {
        let registry = Registry::new();
        registry.register(entry("weather")).unwrap();

        assert!(registry.resolve("/nope/x").unwrap().is_none());
        // Similar but not equal slugs must not match
        assert!(registry.resolve("/weathering/x").unwrap().is_none());
    }

    #[test]
    fn reregistration_replaces_wholesale() {
        let registry = Registry::new();
        registry.register(entry("weather")).unwrap();

        let mut updated = entry("weather");
        updated.price_per_call = 99.0;
        updated.origin_base_url = "https://new.example.test".to_string();
        registry.register(updated).unwrap();

        assert_eq!(registry.len().unwrap(), 1);
        let (matched, _) = registry.resolve("/weather/x").unwrap().unwrap();
        assert_eq!(matched.price_per_call, 99.0);
        assert_eq!(matched.origin_base_url, "https://new.example.test");
    }

    #[test]
    fn list_is_a_sorted_snapshot() {
        let registry = Registry::new();
        registry.register(entry("zebra")).unwrap();
        registry.register(entry("aardvark")).unwrap();

        let snapshot = registry.list().unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].slug, "aardvark");
        assert_eq!(snapshot[1].slug, "zebra");

        // Mutating the registry after the snapshot must not affect it
        registry.register(entry("middle")).unwrap();
        assert_eq!(snapshot.len(), 2);
    }
}
