// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! LRU cache for recovered recipient public keys.
//!
//! Recovering a key costs an event query plus a raw transaction fetch.
//! Registrations can change, so entries expire after a TTL.

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use alloy::primitives::Address;
use k256::ecdsa::VerifyingKey;
use lru::LruCache;

/// Default number of addresses kept.
pub const DEFAULT_CAPACITY: usize = 256;

/// Default lifetime of a cached key.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

struct CacheEntry {
    key: VerifyingKey,
    inserted_at: Instant,
}

/// In-process LRU cache of public keys by account address.
pub struct PublicKeyCache {
    cache: Mutex<LruCache<Address, CacheEntry>>,
    ttl: Duration,
}

impl PublicKeyCache {
    /// Create a new cache with the given capacity and TTL.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
            )),
            ttl,
        }
    }

    /// Cached key for `address`, `None` if absent or expired.
    pub fn get(&self, address: &Address) -> Option<VerifyingKey> {
        let mut cache = self.cache.lock().ok()?;
        if let Some(entry) = cache.get(address) {
            if entry.inserted_at.elapsed() < self.ttl {
                return Some(entry.key.clone());
            }
            cache.pop(address);
        }
        None
    }

    pub fn put(&self, address: Address, key: VerifyingKey) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(
                address,
                CacheEntry {
                    key,
                    inserted_at: Instant::now(),
                },
            );
        }
    }

    pub fn invalidate(&self, address: &Address) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.pop(address);
        }
    }
}

impl Default for PublicKeyCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_TTL)
    }
}
