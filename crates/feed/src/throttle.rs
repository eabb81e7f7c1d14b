//! Dual-gate fetch throttle: a freshness TTL layered over a hard
//! one-fetch-per-window budget.
//!
//! The TTL decides whether the cached value is still good; the window decides
//! whether an upstream call is allowed at all. The window token is spent the
//! moment a fetch is granted, so a failed fetch still counts against the
//! window and cannot trigger a retry storm.

use std::time::{Duration, Instant};

/// What the caller should do after asking for a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchDecision {
    /// Cached value is fresh for the same request parameters; serve it as-is.
    ServeCached,
    /// Exactly one upstream fetch is granted; the window token is already
    /// spent by the time the caller sees this.
    Fetch,
    /// Cache is stale or missing and this window's fetch is gone. Serve
    /// whatever is cached, or an empty payload.
    ServeStaleOrEmpty,
}

#[derive(Debug)]
struct CacheEntry<T> {
    value: T,
    fingerprint: String,
    fetched_at: Instant,
}

/// Per-resource gate combining a value cache with the fetch budget.
///
/// Callers pass `now` explicitly so the gate can be driven deterministically
/// in tests without sleeping.
#[derive(Debug)]
pub struct ResourceGate<T> {
    name: &'static str,
    ttl: Duration,
    window: Duration,
    entry: Option<CacheEntry<T>>,
    window_start: Option<Instant>,
    window_used: bool,
}

impl<T> ResourceGate<T> {
    pub fn new(name: &'static str, ttl: Duration, window: Duration) -> Self {
        Self {
            name,
            ttl,
            window,
            entry: None,
            window_start: None,
            window_used: false,
        }
    }

    /// Decide how to serve a request arriving at `now` with the given
    /// parameter fingerprint.
    pub fn acquire(&mut self, fingerprint: &str, now: Instant) -> FetchDecision {
        // 1. A fresh cache entry for the same parameters wins outright and
        //    leaves the window untouched.
        if let Some(entry) = &self.entry {
            if entry.fingerprint == fingerprint
                && now.saturating_duration_since(entry.fetched_at) < self.ttl
            {
                return FetchDecision::ServeCached;
            }
        }

        // 2. Roll the window forward once it has fully elapsed.
        match self.window_start {
            Some(start) if now.saturating_duration_since(start) <= self.window => {}
            _ => {
                self.window_start = Some(now);
                self.window_used = false;
            }
        }

        // 3. Spend the window token at grant time, not on fetch completion.
        if !self.window_used {
            self.window_used = true;
            tracing::debug!("{}: fetch granted, window token spent", self.name);
            FetchDecision::Fetch
        } else {
            tracing::debug!("{}: window token already spent, serving stale", self.name);
            FetchDecision::ServeStaleOrEmpty
        }
    }

    /// Record a successful fetch. Failed fetches must not call this, which
    /// leaves the previous entry (if any) in place for stale serves.
    pub fn store(&mut self, value: T, fingerprint: &str, now: Instant) {
        self.entry = Some(CacheEntry {
            value,
            fingerprint: fingerprint.to_string(),
            fetched_at: now,
        });
    }

    /// Last successfully stored value, regardless of freshness.
    pub fn cached(&self) -> Option<&T> {
        self.entry.as_ref().map(|entry| &entry.value)
    }

    /// Age of the cached value, if any.
    pub fn age(&self, now: Instant) -> Option<Duration> {
        self.entry
            .as_ref()
            .map(|entry| now.saturating_duration_since(entry.fetched_at))
    }
}
