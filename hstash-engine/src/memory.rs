//! # In-Memory Hash Engine
//!
//! Stores hash records in a process-local map. Nothing is persisted; use it
//! for tests and anywhere a real server is not needed.
//!
//! ## Design Principles
//!
//! 1. **Redis Semantics**: A hash whose last field is removed stops existing,
//!    and `KEYS` uses the same glob rules as the server.
//! 2. **Ordered Records**: Fields keep insertion order so `HGETALL` and `HKEYS`
//!    replies are deterministic.
//! 3. **Short Critical Sections**: The keyspace lock is never held across an
//!    await point.

use std::sync::atomic::{AtomicU64, Ordering};

use ahash::RandomState;
use async_trait::async_trait;
use bytes::Bytes;
use hashbrown::HashMap;
use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::debug;

use hstash_common::{EngineResult, FieldMap, SIGNAL_CHANNEL_CAPACITY, Signal};

use crate::engine::HashEngine;
use crate::glob::glob_match;

/// One hash record: field name to value, in insertion order.
type HashRecord = FieldMap<Bytes>;

/// In-memory engine implementing the hash command vocabulary.
pub struct MemoryEngine {
    keyspace: RwLock<HashMap<String, HashRecord, RandomState>>,
    signals: broadcast::Sender<Signal>,
    commands: AtomicU64,
}

impl MemoryEngine {
    /// Creates an empty engine.
    pub fn new() -> Self {
        let (signals, _) = broadcast::channel(SIGNAL_CHANNEL_CAPACITY);
        MemoryEngine {
            keyspace: RwLock::new(HashMap::with_hasher(RandomState::new())),
            signals,
            commands: AtomicU64::new(0),
        }
    }

    /// Publishes a lifecycle signal to every subscriber.
    ///
    /// The in-memory engine has no connection of its own; this lets hosts and
    /// tests drive the lifecycle explicitly.
    pub fn emit(&self, signal: Signal) {
        debug!(signal = signal.name(), "memory engine signal");
        let _ = self.signals.send(signal);
    }

    /// Total number of commands executed since creation.
    pub fn commands_executed(&self) -> u64 {
        self.commands.load(Ordering::Relaxed)
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.keyspace.read().len()
    }

    /// Returns true if no keys are stored.
    pub fn is_empty(&self) -> bool {
        self.keyspace.read().is_empty()
    }

    /// Returns the stored bytes of one field, bypassing the command counter.
    pub fn raw_field(&self, key: &str, field: &str) -> Option<Bytes> {
        self.keyspace.read().get(key)?.get(field).cloned()
    }

    fn record(&self, command: &'static str, key: &str) {
        self.commands.fetch_add(1, Ordering::Relaxed);
        debug!(command, key, "memory engine command");
    }
}

impl Default for MemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HashEngine for MemoryEngine {
    async fn hash_read_all(&self, key: &str) -> EngineResult<Vec<(Bytes, Bytes)>> {
        self.record("HGETALL", key);
        let keyspace = self.keyspace.read();
        Ok(keyspace
            .get(key)
            .map(|record| {
                record
                    .iter()
                    .map(|(name, value)| (Bytes::copy_from_slice(name.as_bytes()), value.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn hash_read_many(
        &self,
        key: &str,
        fields: &[String],
    ) -> EngineResult<Vec<Option<Bytes>>> {
        self.record("HMGET", key);
        let keyspace = self.keyspace.read();
        let record = keyspace.get(key);
        Ok(fields
            .iter()
            .map(|field| record.and_then(|record| record.get(field)).cloned())
            .collect())
    }

    async fn hash_write_many(&self, key: &str, pairs: Vec<(String, Bytes)>) -> EngineResult<()> {
        self.record("HSET", key);
        if pairs.is_empty() {
            return Ok(());
        }
        let mut keyspace = self.keyspace.write();
        let record = keyspace.entry(key.to_owned()).or_default();
        for (field, value) in pairs {
            record.insert(field, value);
        }
        Ok(())
    }

    async fn hash_field_exists(&self, key: &str, field: &str) -> EngineResult<bool> {
        self.record("HEXISTS", key);
        let keyspace = self.keyspace.read();
        Ok(keyspace
            .get(key)
            .is_some_and(|record| record.get(field).is_some()))
    }

    async fn hash_delete_fields(&self, key: &str, fields: &[String]) -> EngineResult<u64> {
        self.record("HDEL", key);
        let mut keyspace = self.keyspace.write();
        let Some(record) = keyspace.get_mut(key) else {
            return Ok(0);
        };
        let removed = record.remove_many(fields) as u64;
        if record.is_empty() {
            keyspace.remove(key);
        }
        Ok(removed)
    }

    async fn hash_list_fields(&self, key: &str) -> EngineResult<Vec<Bytes>> {
        self.record("HKEYS", key);
        let keyspace = self.keyspace.read();
        Ok(keyspace
            .get(key)
            .map(|record| {
                record
                    .keys()
                    .map(|name| Bytes::copy_from_slice(name.as_bytes()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn search_keys(&self, pattern: &str) -> EngineResult<Vec<Bytes>> {
        self.record("KEYS", pattern);
        let keyspace = self.keyspace.read();
        let mut keys: Vec<&String> = keyspace
            .keys()
            .filter(|key| glob_match(pattern.as_bytes(), key.as_bytes()))
            .collect();
        keys.sort();
        Ok(keys
            .into_iter()
            .map(|key| Bytes::copy_from_slice(key.as_bytes()))
            .collect())
    }

    async fn delete_keys(&self, keys: &[String]) -> EngineResult<u64> {
        self.commands.fetch_add(1, Ordering::Relaxed);
        debug!(command = "DEL", count = keys.len(), "memory engine command");
        let mut keyspace = self.keyspace.write();
        Ok(keys.iter().filter(|key| keyspace.remove(*key).is_some()).count() as u64)
    }

    fn subscribe(&self) -> broadcast::Receiver<Signal> {
        self.signals.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, Bytes)> {
        items
            .iter()
            .map(|(field, value)| (field.to_string(), Bytes::copy_from_slice(value.as_bytes())))
            .collect()
    }

    #[tokio::test]
    async fn write_then_read_many() {
        let engine = MemoryEngine::new();
        engine
            .hash_write_many("icao", pairs(&[("alpha", "a"), ("bravo", "b")]))
            .await
            .unwrap();
        let values = engine
            .hash_read_many("icao", &["bravo".into(), "zulu".into()])
            .await
            .unwrap();
        assert_eq!(values, vec![Some(Bytes::from_static(b"b")), None]);
    }

    #[tokio::test]
    async fn deleting_last_field_removes_key() {
        let engine = MemoryEngine::new();
        engine
            .hash_write_many("icao", pairs(&[("alpha", "a")]))
            .await
            .unwrap();
        let removed = engine
            .hash_delete_fields("icao", &["alpha".into(), "nope".into()])
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert!(engine.is_empty());
    }

    #[tokio::test]
    async fn large_records_keep_order_and_lookups() {
        let engine = MemoryEngine::new();
        let count = 20_000;
        let fields: Vec<(String, Bytes)> = (0..count)
            .map(|n| (format!("f{n}"), Bytes::from(n.to_string())))
            .collect();
        engine.hash_write_many("big", fields).await.unwrap();
        engine
            .hash_write_many("big", pairs(&[("f0", "zero")]))
            .await
            .unwrap();

        let removed: Vec<String> = (0..count).step_by(2).map(|n| format!("f{n}")).collect();
        let removed = engine.hash_delete_fields("big", &removed).await.unwrap();
        assert_eq!(removed, count as u64 / 2);

        let names = engine.hash_list_fields("big").await.unwrap();
        assert_eq!(names.len(), count / 2);
        assert_eq!(names[0], Bytes::from_static(b"f1"));
        assert_eq!(engine.raw_field("big", "f19999"), Some(Bytes::from_static(b"19999")));
        assert_eq!(engine.raw_field("big", "f0"), None);
    }

    #[tokio::test]
    async fn search_keys_is_sorted_and_filtered() {
        let engine = MemoryEngine::new();
        for key in ["itu", "icao:more", "icao"] {
            engine.hash_write_many(key, pairs(&[("f", "v")])).await.unwrap();
        }
        let keys = engine.search_keys("ic*").await.unwrap();
        assert_eq!(
            keys,
            vec![Bytes::from_static(b"icao"), Bytes::from_static(b"icao:more")]
        );
    }

    #[tokio::test]
    async fn emitted_signals_reach_subscribers() {
        let engine = MemoryEngine::new();
        let mut rx = engine.subscribe();
        engine.emit(Signal::Ready);
        assert_eq!(rx.recv().await.unwrap(), Signal::Ready);
    }

    #[tokio::test]
    async fn counts_commands() {
        let engine = MemoryEngine::new();
        engine.hash_list_fields("nope").await.unwrap();
        engine.delete_keys(&["nope".into()]).await.unwrap();
        assert_eq!(engine.commands_executed(), 2);
    }
}
