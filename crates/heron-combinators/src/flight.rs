//! Per-key call coalescing.
//!
//! Concurrent misses on the same key would each invoke the memoized
//! callable. A flight lock serializes them: the first caller computes while
//! the rest wait, then find the result in the cache. Distinct keys never
//! block each other.
//!
//! Lock entries are removed when the last holder releases them, so the map
//! only holds keys with a computation in progress.

use dashmap::DashMap;
use heron_core::CacheKey;
use std::sync::Arc;

type SyncLock = Arc<parking_lot::Mutex<()>>;
type AsyncLock = Arc<tokio::sync::Mutex<()>>;

/// Flight locks for synchronous callables. Waiters block their thread.
#[derive(Debug, Default)]
pub struct SyncFlights {
    locks: Arc<DashMap<CacheKey, SyncLock>>,
}

impl SyncFlights {
    /// Creates an empty lock table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocks until the flight for `key` is free, then holds it.
    pub fn acquire(&self, key: &CacheKey) -> SyncFlightGuard {
        let lock = Arc::clone(self.locks.entry(key.clone()).or_default().value());
        let guard = lock.lock_arc();
        SyncFlightGuard {
            guard: Some(guard),
            key: key.clone(),
            locks: Arc::clone(&self.locks),
        }
    }

    /// Number of keys with a flight in progress or awaited.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.locks.len()
    }
}

/// Holds a synchronous flight until dropped.
pub struct SyncFlightGuard {
    guard: Option<parking_lot::lock_api::ArcMutexGuard<parking_lot::RawMutex, ()>>,
    key: CacheKey,
    locks: Arc<DashMap<CacheKey, SyncLock>>,
}

impl Drop for SyncFlightGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.locks
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}

/// Flight locks for asynchronous callables. Waiters suspend.
#[derive(Debug, Default)]
pub struct AsyncFlights {
    locks: Arc<DashMap<CacheKey, AsyncLock>>,
}

impl AsyncFlights {
    /// Creates an empty lock table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until the flight for `key` is free, then holds it.
    pub async fn acquire(&self, key: &CacheKey) -> AsyncFlightGuard {
        let lock = Arc::clone(self.locks.entry(key.clone()).or_default().value());
        let guard = lock.lock_owned().await;
        AsyncFlightGuard {
            guard: Some(guard),
            key: key.clone(),
            locks: Arc::clone(&self.locks),
        }
    }

    /// Number of keys with a flight in progress or awaited.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.locks.len()
    }
}

/// Holds an asynchronous flight until dropped.
pub struct AsyncFlightGuard {
    guard: Option<tokio::sync::OwnedMutexGuard<()>>,
    key: CacheKey,
    locks: Arc<DashMap<CacheKey, AsyncLock>>,
}

impl Drop for AsyncFlightGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.locks
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    fn key(s: &str) -> CacheKey {
        CacheKey::from_args(&s).unwrap()
    }

    #[test]
    fn test_sync_flight_is_released() {
        let flights = SyncFlights::new();
        {
            let _guard = flights.acquire(&key("a"));
            assert_eq!(flights.in_flight(), 1);
        }
        assert_eq!(flights.in_flight(), 0);
    }

    #[test]
    fn test_sync_flights_serialize_same_key() {
        let flights = Arc::new(SyncFlights::new());
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let flights = Arc::clone(&flights);
                let active = Arc::clone(&active);
                let peak = Arc::clone(&peak);
                thread::spawn(move || {
                    let _guard = flights.acquire(&key("same"));
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(5));
                    active.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(peak.load(Ordering::SeqCst), 1);
        assert_eq!(flights.in_flight(), 0);
    }

    #[test]
    fn test_distinct_keys_do_not_block() {
        let flights = SyncFlights::new();
        let _a = flights.acquire(&key("a"));
        let _b = flights.acquire(&key("b"));
        assert_eq!(flights.in_flight(), 2);
    }

    #[tokio::test]
    async fn test_async_flight_is_released() {
        let flights = AsyncFlights::new();
        let guard = flights.acquire(&key("a")).await;
        assert_eq!(flights.in_flight(), 1);
        drop(guard);
        assert_eq!(flights.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_async_waiter_keeps_entry_alive() {
        let flights = Arc::new(AsyncFlights::new());
        let first = flights.acquire(&key("k")).await;

        let waiter = {
            let flights = Arc::clone(&flights);
            tokio::spawn(async move {
                let _guard = flights.acquire(&key("k")).await;
            })
        };
        tokio::task::yield_now().await;

        drop(first);
        assert_eq!(flights.in_flight(), 1);
        waiter.await.unwrap();
        assert_eq!(flights.in_flight(), 0);
    }
}
