// =============================================================================
// Analysis Cache — optional time-based memoisation for the scan driver
// =============================================================================
//
// `analyze` and `rank` never see the cache. Only the `Scanner` consults it,
// and only when one was injected.
// =============================================================================

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use crate::analysis::AnalysisResult;

/// Memoisation of analysis results.
///
/// Keys are opaque to the cache. The scanner builds them from the symbol
/// plus a fingerprint of its thresholds and data window, so scanners with
/// different settings can share one cache without seeing each other's
/// results.
pub trait AnalysisCache: Send + Sync {
    /// A still-fresh result stored under `key`, if any.
    fn get(&self, key: &str) -> Option<AnalysisResult>;

    fn put(&self, key: &str, result: AnalysisResult);
}

struct Entry {
    result: AnalysisResult,
    stored_at: Instant,
}

/// Process-local cache with a fixed time-to-live per entry.
pub struct TtlCache {
    entries: RwLock<HashMap<String, Entry>>,
    ttl: Duration,
}

impl TtlCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Drop every expired entry.
    pub fn purge_expired(&self) {
        let ttl = self.ttl;
        self.entries
            .write()
            .retain(|_, e| e.stored_at.elapsed() < ttl);
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl Default for TtlCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(30 * 60))
    }
}

impl AnalysisCache for TtlCache {
    fn get(&self, key: &str) -> Option<AnalysisResult> {
        let map = self.entries.read();
        let entry = map.get(key)?;
        if entry.stored_at.elapsed() >= self.ttl {
            return None;
        }
        Some(entry.result.clone())
    }

    fn put(&self, key: &str, result: AnalysisResult) {
        self.entries.write().insert(
            key.to_string(),
            Entry {
                result,
                stored_at: Instant::now(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{analyze, tests::series_with_band};

    fn sample(symbol: &str) -> AnalysisResult {
        analyze(&series_with_band(symbol, &vec![100.0; 60], 0.5)).unwrap()
    }

    #[test]
    fn hit_within_ttl() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.put("EQNR.OL", sample("EQNR.OL"));
        let hit = cache.get("EQNR.OL").unwrap();
        assert_eq!(hit.symbol, "EQNR.OL");
        assert!(cache.get("DNB.OL").is_none());
    }

    #[test]
    fn zero_ttl_always_misses() {
        let cache = TtlCache::new(Duration::ZERO);
        cache.put("EQNR.OL", sample("EQNR.OL"));
        assert!(cache.get("EQNR.OL").is_none());
        assert_eq!(cache.len(), 1);
        cache.purge_expired();
        assert!(cache.is_empty());
    }

    #[test]
    fn put_replaces_previous_entry() {
        let cache = TtlCache::default();
        cache.put("A", sample("A"));
        let mut newer = sample("A");
        newer.last_price = 123.0;
        cache.put("A", newer);
        assert_eq!(cache.len(), 1);
        assert!((cache.get("A").unwrap().last_price - 123.0).abs() < 1e-12);
        cache.clear();
        assert!(cache.is_empty());
    }
}
