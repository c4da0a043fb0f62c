//! Summary cache
//!
//! One slot per identifier. A slot is only returned while its fingerprint
//! matches the caller's; an outdated slot is treated as absent and gets
//! overwritten by the next store. When full, the least recently stored slot
//! is evicted.

use super::{FallbackReason, Fingerprint};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Pseudo-identifier for the inbox-wide briefing.
pub const OVERALL_KEY: &str = "overall";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryCacheEntry {
    pub key: String,
    pub fingerprint: Fingerprint,
    pub text: String,
    pub generated_with_ai: bool,
    pub fallback_reason: Option<FallbackReason>,
}

struct Slot {
    stamp: u64,
    entry: SummaryCacheEntry,
}

#[derive(Default)]
struct CacheInner {
    slots: HashMap<String, Slot>,
    next_stamp: u64,
}

pub struct SummaryCache {
    capacity: usize,
    inner: Mutex<CacheInner>,
}

impl SummaryCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(CacheInner::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, key: &str, fingerprint: &Fingerprint) -> Option<SummaryCacheEntry> {
        self.get_stamped(key, fingerprint).map(|(entry, _)| entry)
    }

    /// Entry plus the write stamp it was stored under.
    pub(crate) fn get_stamped(
        &self,
        key: &str,
        fingerprint: &Fingerprint,
    ) -> Option<(SummaryCacheEntry, u64)> {
        let inner = self.lock();
        inner
            .slots
            .get(key)
            .filter(|slot| slot.entry.fingerprint == *fingerprint)
            .map(|slot| (slot.entry.clone(), slot.stamp))
    }

    /// Write stamp currently held for `key`, regardless of fingerprint.
    pub(crate) fn stamp(&self, key: &str) -> Option<u64> {
        self.lock().slots.get(key).map(|slot| slot.stamp)
    }

    pub fn insert(&self, entry: SummaryCacheEntry) {
        let mut inner = self.lock();

        if !inner.slots.contains_key(&entry.key) && inner.slots.len() >= self.capacity {
            let oldest = inner
                .slots
                .iter()
                .min_by_key(|(_, slot)| slot.stamp)
                .map(|(key, _)| key.clone());
            if let Some(oldest) = oldest {
                log::debug!("Summary cache full, evicting {}", oldest);
                inner.slots.remove(&oldest);
            }
        }

        inner.next_stamp += 1;
        let stamp = inner.next_stamp;
        inner.slots.insert(entry.key.clone(), Slot { stamp, entry });
    }

    /// Drop every entry, returning how many were removed.
    pub fn clear(&self) -> usize {
        let mut inner = self.lock();
        let removed = inner.slots.len();
        inner.slots.clear();
        removed
    }

    pub fn len(&self) -> usize {
        self.lock().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
