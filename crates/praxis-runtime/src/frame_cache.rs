// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Frame Cache
//!
//! Memoizes expensive per-frame transforms under a fixed time-to-live.
//!
//! The map lock is held only around lookup, insert and the eviction sweep.
//! `compute` runs with no lock held; concurrent misses on the same key wait
//! on an in-flight marker instead of computing twice.

use ahash::AHashMap;
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::trace;

/// Default entry lifetime
pub const DEFAULT_TTL: Duration = Duration::from_millis(1000);

/// Fast, possibly-lossy digest of an input used as the cache key
///
/// Collisions are tolerated: a colliding entry is served at most until it expires.
pub trait Fingerprint {
    fn fingerprint(&self) -> u64;
}

impl Fingerprint for [u8] {
    fn fingerprint(&self) -> u64 {
        let mut hasher = ahash::AHasher::default();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

impl Fingerprint for Vec<u8> {
    fn fingerprint(&self) -> u64 {
        self.as_slice().fingerprint()
    }
}

impl Fingerprint for str {
    fn fingerprint(&self) -> u64 {
        self.as_bytes().fingerprint()
    }
}

impl Fingerprint for u64 {
    fn fingerprint(&self) -> u64 {
        *self
    }
}

enum Slot<V> {
    Ready { value: V, inserted_at: Instant },
    Pending,
}

/// Point-in-time cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Entries currently stored, including expired ones not yet swept
    pub entries: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// TTL cache keyed by [`Fingerprint`]
pub struct FrameCache<V> {
    ttl: Duration,
    slots: Mutex<AHashMap<u64, Slot<V>>>,
    settled: Condvar,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V: Clone> FrameCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slots: Mutex::new(AHashMap::new()),
            settled: Condvar::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the cached transform of `input`, computing it on a miss
    ///
    /// An entry aged `ttl` or more is treated as absent. A failed `compute`
    /// stores nothing; callers waiting on the same key then compute themselves.
    /// `compute` must not re-enter the cache with the same key.
    pub fn get_or_compute<I, F, E>(&self, input: &I, compute: F) -> Result<V, E>
    where
        I: Fingerprint + ?Sized,
        F: FnOnce(&I) -> Result<V, E>,
    {
        let key = input.fingerprint();
        self.get_or_compute_keyed(key, || compute(input))
    }

    /// Same as [`get_or_compute`](Self::get_or_compute) with a precomputed key
    pub fn get_or_compute_keyed<F, E>(&self, key: u64, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        let mut slots = self.slots.lock();
        loop {
            match slots.get(&key) {
                Some(Slot::Ready { value, inserted_at }) if inserted_at.elapsed() < self.ttl => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    return Ok(value.clone());
                }
                Some(Slot::Pending) => self.settled.wait(&mut slots),
                _ => break,
            }
        }

        slots.insert(key, Slot::Pending);
        self.misses.fetch_add(1, Ordering::Relaxed);
        drop(slots);

        let mut marker = PendingMarker {
            cache: self,
            key,
            armed: true,
        };
        let result = compute();
        marker.armed = false;

        let mut slots = self.slots.lock();
        match &result {
            Ok(value) => {
                let now = Instant::now();
                slots.insert(
                    key,
                    Slot::Ready {
                        value: value.clone(),
                        inserted_at: now,
                    },
                );
                self.sweep(&mut slots, now);
            }
            Err(_) => {
                slots.remove(&key);
            }
        }
        drop(slots);
        self.settled.notify_all();

        result
    }

    /// Unexpired value for `key`, without computing
    pub fn get(&self, key: u64) -> Option<V> {
        let slots = self.slots.lock();
        match slots.get(&key) {
            Some(Slot::Ready { value, inserted_at }) if inserted_at.elapsed() < self.ttl => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(value.clone())
            }
            _ => None,
        }
    }

    /// Drop every expired entry now
    pub fn purge_expired(&self) -> usize {
        let mut slots = self.slots.lock();
        self.sweep(&mut slots, Instant::now())
    }

    /// Drop every ready entry; in-flight computations are left alone
    pub fn clear(&self) {
        self.slots
            .lock()
            .retain(|_, slot| matches!(slot, Slot::Pending));
    }

    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }

    fn sweep(&self, slots: &mut MutexGuard<'_, AHashMap<u64, Slot<V>>>, now: Instant) -> usize {
        let before = slots.len();
        let ttl = self.ttl;
        slots.retain(|_, slot| match slot {
            Slot::Ready { inserted_at, .. } => now.saturating_duration_since(*inserted_at) < ttl,
            Slot::Pending => true,
        });
        let evicted = before - slots.len();
        if evicted > 0 {
            trace!("[FRAME-CACHE] Evicted {} expired entries", evicted);
        }
        evicted
    }
}

impl<V: Clone> Default for FrameCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

/// Clears the in-flight marker if `compute` unwinds
struct PendingMarker<'a, V: Clone> {
    cache: &'a FrameCache<V>,
    key: u64,
    armed: bool,
}

impl<V: Clone> Drop for PendingMarker<'_, V> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut slots = self.cache.slots.lock();
        if matches!(slots.get(&self.key), Some(Slot::Pending)) {
            slots.remove(&self.key);
        }
        drop(slots);
        self.cache.settled.notify_all();
    }
}
