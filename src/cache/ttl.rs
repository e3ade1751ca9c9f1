//! Generic bounded TTL cache with FIFO eviction.
//!
//! Entries expire lazily: an expired entry is removed the moment a read
//! sees it, so no background sweeper is required (`clear_expired` exists
//! for callers that want proactive cleanup). When an insert pushes the
//! cache over capacity the earliest-inserted entry is evicted (insertion
//! order, not access order). Overwriting a key keeps its original position.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use metrics::counter;

use super::lock::{read_guard, write_guard};

const METRIC_CACHE_HIT: &str = "lesto_cache_hit_total";
const METRIC_CACHE_MISS: &str = "lesto_cache_miss_total";
const METRIC_CACHE_EXPIRED: &str = "lesto_cache_expired_total";
const METRIC_CACHE_EVICT: &str = "lesto_cache_evict_total";

struct Entry<V> {
    value: V,
    stored_at: Instant,
    ttl: Duration,
}

impl<V> Entry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.stored_at) > self.ttl
    }
}

/// Map plus insertion order. The order queue may carry keys already removed
/// by lazy expiry; eviction skips them and `clear_expired` compacts.
struct Slots<K, V> {
    map: HashMap<K, Entry<V>>,
    order: VecDeque<K>,
}

/// A bounded key→value cache with per-entry TTL and FIFO eviction.
pub struct TtlCache<K, V> {
    slots: RwLock<Slots<K, V>>,
    ttl: Duration,
    max_size: usize,
    /// Label attached to this cache's metric series.
    name: &'static str,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(name: &'static str, ttl: Duration, max_size: NonZeroUsize) -> Self {
        Self {
            slots: RwLock::new(Slots {
                map: HashMap::new(),
                order: VecDeque::new(),
            }),
            ttl,
            max_size: max_size.get(),
            name,
        }
    }

    /// Look up a key, removing it when expired.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut slots = write_guard(&self.slots, self.name);
        let now = Instant::now();
        let fresh = slots
            .map
            .get(key)
            .and_then(|entry| (!entry.is_expired(now)).then(|| entry.value.clone()));
        match fresh {
            Some(value) => {
                counter!(METRIC_CACHE_HIT, "cache" => self.name).increment(1);
                Some(value)
            }
            None => {
                // anything still present under this key is expired
                if slots.map.remove(key).is_some() {
                    counter!(METRIC_CACHE_EXPIRED, "cache" => self.name).increment(1);
                }
                counter!(METRIC_CACHE_MISS, "cache" => self.name).increment(1);
                None
            }
        }
    }

    /// Insert or overwrite an entry under the cache-wide TTL.
    ///
    /// Returns the key evicted to stay within capacity, if any.
    pub fn set(&self, key: K, value: V) -> Option<K> {
        self.set_with_ttl(key, value, self.ttl)
    }

    /// Insert or overwrite an entry with a per-entry TTL override.
    pub fn set_with_ttl(&self, key: K, value: V, ttl: Duration) -> Option<K> {
        let mut slots = write_guard(&self.slots, self.name);
        let entry = Entry {
            value,
            stored_at: Instant::now(),
            ttl,
        };
        if slots.map.insert(key.clone(), entry).is_none() {
            slots.order.push_back(key);
        }
        let evicted = self.evict_over_capacity(&mut slots);
        if evicted.is_some() {
            counter!(METRIC_CACHE_EVICT, "cache" => self.name).increment(1);
        }
        evicted
    }

    fn evict_over_capacity(&self, slots: &mut Slots<K, V>) -> Option<K> {
        while slots.map.len() > self.max_size {
            let Some(oldest) = slots.order.pop_front() else {
                return None;
            };
            // skip order entries whose key was already removed by expiry
            if slots.map.remove(&oldest).is_some() {
                return Some(oldest);
            }
        }
        None
    }

    /// Drop every entry.
    pub fn clear(&self) {
        let mut slots = write_guard(&self.slots, self.name);
        slots.map.clear();
        slots.order.clear();
    }

    /// Remove every expired entry, returning how many were dropped.
    pub fn clear_expired(&self) -> usize {
        let mut slots = write_guard(&self.slots, self.name);
        let now = Instant::now();
        let before = slots.map.len();
        slots.map.retain(|_, entry| !entry.is_expired(now));
        let dropped = before - slots.map.len();
        if dropped > 0 {
            counter!(METRIC_CACHE_EXPIRED, "cache" => self.name).increment(dropped as u64);
        }
        // compact the order queue while we hold the write guard anyway
        let Slots { map, order } = &mut *slots;
        order.retain(|key| map.contains_key(key));
        dropped
    }

    /// Number of live entries (expired-but-unread entries count until a
    /// read or `clear_expired` removes them).
    pub fn len(&self) -> usize {
        read_guard(&self.slots, self.name).map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::thread::sleep;

    use super::*;

    fn cache(ttl_ms: u64, max: usize) -> TtlCache<String, u32> {
        TtlCache::new(
            "test",
            Duration::from_millis(ttl_ms),
            NonZeroUsize::new(max).expect("non-zero capacity"),
        )
    }

    #[test]
    fn get_before_ttl_returns_value() {
        let cache = cache(1_000, 8);
        cache.set("a".to_string(), 1);
        assert_eq!(cache.get(&"a".to_string()), Some(1));
        assert_eq!(cache.get(&"missing".to_string()), None);
    }

    #[test]
    fn expired_entry_is_removed_on_read() {
        let cache = cache(20, 8);
        cache.set("a".to_string(), 1);
        sleep(Duration::from_millis(50));
        assert_eq!(cache.get(&"a".to_string()), None);
        // removal happened, not just a hidden value
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn per_entry_ttl_override() {
        let cache = cache(20, 8);
        cache.set_with_ttl("long".to_string(), 1, Duration::from_secs(60));
        cache.set("short".to_string(), 2);
        sleep(Duration::from_millis(50));
        assert_eq!(cache.get(&"long".to_string()), Some(1));
        assert_eq!(cache.get(&"short".to_string()), None);
    }

    #[test]
    fn fifo_eviction_drops_earliest_inserted() {
        let cache = cache(60_000, 2);
        cache.set("a".to_string(), 1);
        cache.set("b".to_string(), 2);
        // touch "a" so an LRU policy would evict "b" instead
        assert_eq!(cache.get(&"a".to_string()), Some(1));
        let evicted = cache.set("c".to_string(), 3);
        assert_eq!(evicted, Some("a".to_string()));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&"a".to_string()), None);
        assert_eq!(cache.get(&"b".to_string()), Some(2));
        assert_eq!(cache.get(&"c".to_string()), Some(3));
    }

    #[test]
    fn size_bound_holds_after_every_insert() {
        let cache = cache(60_000, 3);
        for i in 0..10 {
            cache.set(format!("k{i}"), i);
            assert!(cache.len() <= 3);
        }
        // survivors are the three most recent inserts
        assert_eq!(cache.get(&"k7".to_string()), Some(7));
        assert_eq!(cache.get(&"k8".to_string()), Some(8));
        assert_eq!(cache.get(&"k9".to_string()), Some(9));
        assert_eq!(cache.get(&"k6".to_string()), None);
    }

    #[test]
    fn overwrite_keeps_original_insertion_position() {
        let cache = cache(60_000, 2);
        cache.set("a".to_string(), 1);
        cache.set("b".to_string(), 2);
        // overwriting "a" must not move it to the back of the queue
        cache.set("a".to_string(), 10);
        let evicted = cache.set("c".to_string(), 3);
        assert_eq!(evicted, Some("a".to_string()));
    }

    #[test]
    fn eviction_skips_keys_already_removed_by_expiry() {
        let cache = cache(20, 2);
        cache.set("a".to_string(), 1);
        cache.set("b".to_string(), 2);
        sleep(Duration::from_millis(50));
        // both expired; reads remove them but leave order entries behind
        assert_eq!(cache.get(&"a".to_string()), None);
        assert_eq!(cache.get(&"b".to_string()), None);
        cache.set_with_ttl("c".to_string(), 3, Duration::from_secs(60));
        cache.set_with_ttl("d".to_string(), 4, Duration::from_secs(60));
        let evicted = cache.set_with_ttl("e".to_string(), 5, Duration::from_secs(60));
        assert_eq!(evicted, Some("c".to_string()));
        assert_eq!(cache.get(&"d".to_string()), Some(4));
        assert_eq!(cache.get(&"e".to_string()), Some(5));
    }

    #[test]
    fn clear_expired_drops_only_stale_entries() {
        let cache = cache(20, 8);
        cache.set("stale".to_string(), 1);
        cache.set_with_ttl("fresh".to_string(), 2, Duration::from_secs(60));
        sleep(Duration::from_millis(50));
        assert_eq!(cache.clear_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&"fresh".to_string()), Some(2));
    }

    #[test]
    fn clear_removes_everything() {
        let cache = cache(60_000, 8);
        cache.set("a".to_string(), 1);
        cache.set("b".to_string(), 2);
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.get(&"a".to_string()), None);
    }
}
