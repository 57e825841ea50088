//! Response cache.
//!
//! Successful (`200`) network responses are kept so a repeated fetch of the same
//! resource can be answered without touching the network. Whether a response is
//! kept, and for how long, follows its `Cache-Control` header:
//!
//! - no header: kept indefinitely;
//! - `no-store`: never kept;
//! - `max-age=N`: kept for `N` seconds;
//! - any other directive: not kept.
//!
//! Expired entries are dropped lazily when they are read. Nothing is ever evicted
//! proactively, so the in-memory store grows for as long as the engine lives. A
//! bounded store can be plugged in through the [`CacheStore`] trait.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use http::header::CACHE_CONTROL;
use http::HeaderMap;

use crate::net::identifier::CacheKey;
use crate::net::response::Response;

/// Source of the current time for expiry decisions.
pub trait Clock: Send {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub response: Response,
    /// `None` means the entry never expires
    pub expires_at: Option<Instant>,
}

/// Storage backend for cached responses.
pub trait CacheStore: Send {
    fn get(&self, key: &CacheKey) -> Option<&CacheEntry>;
    fn insert(&mut self, key: CacheKey, entry: CacheEntry);
    fn remove(&mut self, key: &CacheKey);
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Unbounded in-memory store.
#[derive(Debug, Default)]
pub struct InMemoryCacheStore {
    entries: HashMap<CacheKey, CacheEntry>,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for InMemoryCacheStore {
    fn get(&self, key: &CacheKey) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    fn insert(&mut self, key: CacheKey, entry: CacheEntry) {
        self.entries.insert(key, entry);
    }

    fn remove(&mut self, key: &CacheKey) {
        self.entries.remove(key);
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// What `Cache-Control` allows us to do with a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    NoStore,
    Indefinite,
    MaxAge(Duration),
}

impl CachePolicy {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let Some(value) = headers.get(CACHE_CONTROL) else {
            return CachePolicy::Indefinite;
        };
        let Ok(value) = value.to_str() else {
            return CachePolicy::NoStore;
        };

        let mut max_age = None;
        let directives = value
            .split(',')
            .map(|d| d.trim().to_ascii_lowercase())
            .filter(|d| !d.is_empty());

        for directive in directives {
            if directive == "no-store" {
                return CachePolicy::NoStore;
            }

            if let Some(seconds) = directive.strip_prefix("max-age=") {
                if seconds.is_empty() || !seconds.bytes().all(|b| b.is_ascii_digit()) {
                    return CachePolicy::NoStore;
                }
                match seconds.parse::<u64>() {
                    Ok(secs) => max_age = Some(Duration::from_secs(secs)),
                    Err(_) => return CachePolicy::NoStore,
                }
                continue;
            }

            // Anything we don't understand might forbid caching
            return CachePolicy::NoStore;
        }

        match max_age {
            Some(age) => CachePolicy::MaxAge(age),
            None => CachePolicy::Indefinite,
        }
    }
}

/// Cache-Control aware response cache on top of a [`CacheStore`].
pub struct ResponseCache {
    store: Box<dyn CacheStore>,
    clock: Box<dyn Clock>,
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(Box::new(InMemoryCacheStore::new()), Box::new(SystemClock))
    }
}

impl ResponseCache {
    pub fn new(store: Box<dyn CacheStore>, clock: Box<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Returns the cached response for `key`, dropping it first if it has expired.
    pub fn read(&mut self, key: &CacheKey) -> Option<Response> {
        let entry = self.store.get(key)?;

        if let Some(expires_at) = entry.expires_at {
            if self.clock.now() > expires_at {
                log::debug!("Cache entry for {}{} expired", key.host, key.path);
                self.store.remove(key);
                return None;
            }
        }

        Some(entry.response.clone())
    }

    /// Stores `response` under `key` when its status and `Cache-Control` allow it.
    pub fn write(&mut self, key: CacheKey, response: &Response) {
        if response.status != 200 {
            return;
        }

        let expires_at = match CachePolicy::from_headers(&response.headers) {
            CachePolicy::NoStore => {
                log::debug!("Not caching {}{}", key.host, key.path);
                return;
            }
            CachePolicy::Indefinite => None,
            CachePolicy::MaxAge(age) => self.clock.now().checked_add(age),
        };

        self.store.insert(
            key,
            CacheEntry {
                response: response.clone(),
                expires_at,
            },
        );
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.store.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}
