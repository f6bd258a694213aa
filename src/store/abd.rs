use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::store::clock::TimestampGenerator;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueCell {
    pub value: String,
    pub ts: i64,
}

impl ValueCell {
    // Absent keys read as ("", 0); a stored empty string has a nonzero tag.
    pub(crate) fn absent() -> Self {
        Self {
            value: String::new(),
            ts: 0,
        }
    }
}

#[derive(Debug)]
struct Cells {
    map: HashMap<String, ValueCell>,
    clock: TimestampGenerator,
}

#[derive(Debug)]
pub struct AbdStore {
    inner: Mutex<Cells>,
}

impl AbdStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Cells {
                map: HashMap::new(),
                clock: TimestampGenerator::new(),
            }),
        }
    }

    pub async fn read(&self, key: &str) -> ValueCell {
        let cells = self.inner.lock().await;
        cells.map.get(key).cloned().unwrap_or_else(ValueCell::absent)
    }

    pub async fn write(&self, key: &str, value: String, client_ts: i64) -> i64 {
        let mut cells = self.inner.lock().await;
        let server_ts = cells.clock.generate();
        let final_ts = client_ts.max(server_ts);
        cells.map.insert(key.to_string(), ValueCell { value, ts: final_ts });
        // A later write with a stale client tag must still land above this cell.
        cells.clock.observe(final_ts);
        final_ts
    }

    pub async fn timestamp_of(&self, key: &str) -> i64 {
        let cells = self.inner.lock().await;
        cells.map.get(key).map(|cell| cell.ts).unwrap_or(0)
    }

    pub async fn value_of(&self, key: &str) -> String {
        let cells = self.inner.lock().await;
        cells.map.get(key).map(|cell| cell.value.clone()).unwrap_or_default()
    }
}

impl Default for AbdStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn absent_key_reads_as_empty_with_zero_tag() {
        let store = AbdStore::new();
        let cell = store.read("missing").await;
        assert_eq!(cell, ValueCell::absent());
    }

    #[tokio::test]
    async fn write_wins_over_a_stale_client_tag() {
        let store = AbdStore::new();
        let first = store.write("k", "a".into(), 0).await;
        let second = store.write("k", "b".into(), 0).await;
        assert!(second > first);
        assert_eq!(store.read("k").await.value, "b");
    }

    #[tokio::test]
    async fn a_far_future_client_tag_is_kept() {
        let store = AbdStore::new();
        let huge = 5_000_000_000_000_000_000;
        let installed = store.write("k", "a".into(), huge).await;
        assert_eq!(installed, huge);

        // A follow-up write with an old tag must still move the cell forward.
        let next = store.write("k", "b".into(), 0).await;
        assert!(next > huge);
        assert_eq!(store.read("k").await.value, "b");
    }

    #[tokio::test]
    async fn cell_tags_never_decrease() {
        let store = AbdStore::new();
        let mut last = 0;
        for i in 0..100 {
            store.write("k", format!("v{i}"), 0).await;
            let ts = store.timestamp_of("k").await;
            assert!(ts > last);
            last = ts;
        }
    }

    #[tokio::test]
    async fn empty_string_is_a_real_value() {
        let store = AbdStore::new();
        store.write("k", String::new(), 0).await;
        let cell = store.read("k").await;
        assert_eq!(cell.value, "");
        assert!(cell.ts > 0);
    }
}
