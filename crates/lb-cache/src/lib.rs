//! A single-slot response cache keyed by a fixed fingerprint.
//!
//! There is exactly one slot: every write overwrites whatever was there
//! before, and reads are probabilistic rather than a plain lookup. This is a
//! degenerate case of an LRU cache kept deliberately single-slot to preserve
//! the observed probabilistic serve-from-memory behavior; promoting it to a
//! bounded multi-key store would not change the external contract.

use rand::Rng;
use std::sync::Mutex;

/// The one entry a [`ResponseCache`] can ever hold.
#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub body: Vec<u8>,
}

/// Single-slot cache guarded by a plain mutex; gets and sets are both O(1)
/// and never hold the lock across an await point.
pub struct ResponseCache {
    slot: Mutex<Option<CachedResponse>>,
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseCache {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    /// Overwrites the slot unconditionally. Called on every healthy upstream
    /// response, regardless of whether this request was itself served from
    /// cache.
    pub fn store(&self, body: Vec<u8>) {
        let mut slot = self.slot.lock().expect("cache mutex poisoned");
        *slot = Some(CachedResponse { body });
    }

    /// Returns a clone of the cached entry, if any, without consuming it.
    pub fn peek(&self) -> Option<CachedResponse> {
        self.slot.lock().expect("cache mutex poisoned").clone()
    }

    /// Bernoulli trial with parameter `probability` (0.0–1.0); a hit only
    /// occurs when a cached entry also exists, and on a hit returns a clone
    /// of it so the caller can serve it without holding the lock.
    pub fn probe(&self, probability: f64) -> Option<CachedResponse> {
        if probability <= 0.0 {
            return None;
        }
        let cached = self.peek()?;
        if probability >= 1.0 {
            return Some(cached);
        }
        let roll: f64 = rand::rng().random();
        if roll < probability {
            Some(cached)
        } else {
            None
        }
    }
}
