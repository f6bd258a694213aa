use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use crate::store::abd::ValueCell;
use crate::store::clock::TimestampGenerator;

// A lease older than this is preemptible; bounds how long a crashed
// lock-holder can stall a key.
pub const LOCK_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
struct LockEntry {
    owner: i32,
    // Monotonic, so wall-clock jumps cannot expire or revive a lease.
    acquired_at: Instant,
}

#[derive(Debug)]
struct Inner {
    map: HashMap<String, ValueCell>,
    locks: HashMap<String, LockEntry>,
    clock: TimestampGenerator,
}

#[derive(Debug)]
pub struct BlockingStore {
    inner: Mutex<Inner>,
    lease_timeout: Duration,
}

impl BlockingStore {
    pub fn new() -> Self {
        Self::with_lease_timeout(LOCK_TIMEOUT)
    }

    pub fn with_lease_timeout(lease_timeout: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner {
                map: HashMap::new(),
                locks: HashMap::new(),
                clock: TimestampGenerator::new(),
            }),
            lease_timeout,
        }
    }

    // Grant when unheld, held by the caller (re-entrant, lease refreshed), or
    // held by a lease past the timeout. Denial returns immediately.
    pub async fn acquire_lock(&self, key: &str, client_id: i32) -> bool {
        let mut inner = self.inner.lock().await;
        let now = Instant::now();
        let granted = match inner.locks.get(key) {
            None => true,
            Some(entry) if entry.owner == client_id => true,
            Some(entry) if now.duration_since(entry.acquired_at) > self.lease_timeout => true,
            Some(_) => false,
        };
        if granted {
            inner.locks.insert(
                key.to_string(),
                LockEntry {
                    owner: client_id,
                    acquired_at: now,
                },
            );
        }
        granted
    }

    pub async fn release_lock(&self, key: &str, client_id: i32) -> bool {
        let mut inner = self.inner.lock().await;
        let owned = matches!(inner.locks.get(key), Some(entry) if entry.owner == client_id);
        if owned {
            inner.locks.remove(key);
        }
        owned
    }

    pub async fn read(&self, key: &str, client_id: i32) -> Option<ValueCell> {
        let inner = self.inner.lock().await;
        match inner.locks.get(key) {
            Some(entry) if entry.owner == client_id => {
                Some(inner.map.get(key).cloned().unwrap_or_else(ValueCell::absent))
            }
            _ => None,
        }
    }

    pub async fn write(&self, key: &str, value: String, client_ts: i64, client_id: i32) -> Option<i64> {
        let mut inner = self.inner.lock().await;
        match inner.locks.get(key) {
            Some(entry) if entry.owner == client_id => {}
            _ => return None,
        }
        let server_ts = inner.clock.generate();
        let final_ts = client_ts.max(server_ts);
        inner.map.insert(key.to_string(), ValueCell { value, ts: final_ts });
        inner.clock.observe(final_ts);
        Some(final_ts)
    }

    pub async fn lock_owner(&self, key: &str) -> Option<i32> {
        let inner = self.inner.lock().await;
        inner.locks.get(key).map(|entry| entry.owner)
    }

    pub async fn timestamp_of(&self, key: &str) -> i64 {
        let inner = self.inner.lock().await;
        inner.map.get(key).map(|cell| cell.ts).unwrap_or(0)
    }

    pub async fn value_of(&self, key: &str) -> String {
        let inner = self.inner.lock().await;
        inner.map.get(key).map(|cell| cell.value.clone()).unwrap_or_default()
    }
}

impl Default for BlockingStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lock_is_exclusive_between_clients() {
        let store = BlockingStore::new();
        assert!(store.acquire_lock("k", 1).await);
        assert!(!store.acquire_lock("k", 2).await);
        assert_eq!(store.lock_owner("k").await, Some(1));
    }

    #[tokio::test]
    async fn lock_is_reentrant_for_the_owner() {
        let store = BlockingStore::new();
        assert!(store.acquire_lock("k", 1).await);
        assert!(store.acquire_lock("k", 1).await);
    }

    #[tokio::test]
    async fn expired_lease_is_preempted() {
        let store = BlockingStore::with_lease_timeout(Duration::from_millis(50));
        assert!(store.acquire_lock("k", 1).await);
        assert!(!store.acquire_lock("k", 2).await);
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(store.acquire_lock("k", 2).await);
        assert_eq!(store.lock_owner("k").await, Some(2));
    }

    #[tokio::test]
    async fn release_requires_ownership() {
        let store = BlockingStore::new();
        assert!(store.acquire_lock("k", 1).await);
        assert!(!store.release_lock("k", 2).await);
        assert_eq!(store.lock_owner("k").await, Some(1));
        assert!(store.release_lock("k", 1).await);
        assert_eq!(store.lock_owner("k").await, None);
    }

    #[tokio::test]
    async fn reads_and_writes_are_gated_on_the_lock() {
        let store = BlockingStore::new();
        assert!(store.write("k", "v".into(), 0, 1).await.is_none());
        assert!(store.read("k", 1).await.is_none());

        assert!(store.acquire_lock("k", 1).await);
        let ts = store.write("k", "v".into(), 0, 1).await.unwrap();
        let cell = store.read("k", 1).await.unwrap();
        assert_eq!(cell.value, "v");
        assert_eq!(cell.ts, ts);

        // A rival with no lock sees a refusal, not a value.
        assert!(store.read("k", 2).await.is_none());
    }

    #[tokio::test]
    async fn locked_read_of_a_missing_key_is_empty_and_ok() {
        let store = BlockingStore::new();
        assert!(store.acquire_lock("k", 1).await);
        let cell = store.read("k", 1).await.unwrap();
        assert_eq!(cell.value, "");
        assert_eq!(cell.ts, 0);
    }
}
