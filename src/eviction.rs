//! Bounded eviction for identity maps.

use dashmap::DashMap;
use std::hash::Hash;

/// Entries inspected per eviction.
pub(crate) const EVICTION_SAMPLE: usize = 8;

/// Remove the stalest of the first [`EVICTION_SAMPLE`] entries.
///
/// Only a handful of entries are looked at, so the cost does not grow with
/// the map. Expired entries are removed wholesale by `prune_expired`.
pub(crate) fn evict_sampled<K, V, F>(map: &DashMap<K, V>, last_seen: F) -> Option<K>
where
    K: Eq + Hash + Clone,
    F: Fn(&V) -> u64,
{
    let victim = map
        .iter()
        .take(EVICTION_SAMPLE)
        .map(|entry| (last_seen(entry.value()), entry.key().clone()))
        .min_by_key(|(seen, _)| *seen)
        .map(|(_, key)| key)?;

    map.remove(&victim).map(|(key, _)| key)
}
