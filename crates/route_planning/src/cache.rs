use std::collections::HashMap;
use std::time::Duration;

use itertools::Itertools;
use model::location::GeocodedAddress;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// Cache key for an address: trimmed, whitespace collapsed, lowercased.
pub fn normalize_address(address: &str) -> String {
    address.split_whitespace().join(" ").to_lowercase()
}

struct CacheEntry {
    value: GeocodedAddress,
    inserted_at: Instant,
}

/// Successful geocoding results, shared across requests for the lifetime of
/// the process.
pub struct AddressCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Option<Duration>,
}

impl Default for AddressCache {
    fn default() -> Self {
        Self::new(None)
    }
}

impl AddressCache {
    /// Entries never expire when `ttl` is `None`.
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub async fn get(&self, address: &str) -> Option<GeocodedAddress> {
        let entries = self.entries.read().await;
        let entry = entries.get(&normalize_address(address))?;
        match self.ttl {
            Some(ttl) if entry.inserted_at.elapsed() >= ttl => None,
            _ => Some(entry.value.clone()),
        }
    }

    /// Also drops every entry whose TTL has run out.
    pub async fn insert(&self, address: &str, value: GeocodedAddress) {
        let mut entries = self.entries.write().await;
        if let Some(ttl) = self.ttl {
            entries.retain(|_, entry| entry.inserted_at.elapsed() < ttl);
        }
        entries.insert(
            normalize_address(address),
            CacheEntry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn bangkok() -> GeocodedAddress {
        GeocodedAddress {
            latitude: 13.7563,
            longitude: 100.5018,
            formatted_address: "กรุงเทพมหานคร ประเทศไทย".to_owned(),
            place_id: None,
            location_type: None,
        }
    }

    #[rstest]
    #[case("Bangkok", "bangkok")]
    #[case("  Chatuchak   Market\tBangkok ", "chatuchak market bangkok")]
    #[case("ตลาด  จตุจักร", "ตลาด จตุจักร")]
    fn normalizes(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize_address(input), expected);
    }

    #[tokio::test]
    async fn equivalent_addresses_share_an_entry() {
        let cache = AddressCache::default();
        cache.insert("Bangkok ", bangkok()).await;
        assert_eq!(cache.get("  BANGKOK").await, Some(bangkok()));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let cache = AddressCache::new(Some(Duration::from_secs(60)));
        cache.insert("Bangkok", bangkok()).await;
        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(cache.get("Bangkok").await.is_some());
        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cache.get("Bangkok").await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn inserting_evicts_expired_entries() {
        let cache = AddressCache::new(Some(Duration::from_secs(60)));
        cache.insert("Bangkok", bangkok()).await;
        cache.insert("Nonthaburi", bangkok()).await;
        tokio::time::advance(Duration::from_secs(61)).await;

        cache.insert("Pathum Thani", bangkok()).await;
        assert_eq!(cache.len().await, 1);
        assert!(cache.get("Pathum Thani").await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn entries_without_ttl_are_kept() {
        let cache = AddressCache::default();
        cache.insert("Bangkok", bangkok()).await;
        tokio::time::advance(Duration::from_secs(86_400)).await;
        cache.insert("Nonthaburi", bangkok()).await;
        assert_eq!(cache.len().await, 2);
    }
}
