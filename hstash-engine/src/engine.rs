//! # Hash Engine Interface
//!
//! ## Design Principles
//!
//! 1. **Strategy Pattern**: Abstract the engine behind a trait so the store can
//!    drive an in-memory map or a networked server without touching the caller.
//! 2. **Fixed Vocabulary**: Only the eight hash/key commands the store needs are
//!    exposed; everything else stays inside the engine.
//! 3. **Binary-Safe Values**: Field values cross the boundary as `Bytes`; keys
//!    and field names are text.
//! 4. **Observable Lifecycle**: Connection state changes are published on a
//!    broadcast channel rather than through callbacks.

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::broadcast;

use hstash_common::{EngineResult, Signal};

/// Strategy pattern: the command surface the store issues against an engine.
///
/// Every method maps to exactly one engine command. Implementations must be
/// safe to share across tasks.
#[async_trait]
pub trait HashEngine: Send + Sync + 'static {
    /// Returns every field of the hash at `key` (`HGETALL`).
    ///
    /// A missing key yields an empty vector.
    async fn hash_read_all(&self, key: &str) -> EngineResult<Vec<(Bytes, Bytes)>>;

    /// Returns the values of `fields`, aligned by position (`HMGET`).
    ///
    /// Absent fields yield `None` at their position.
    async fn hash_read_many(&self, key: &str, fields: &[String])
    -> EngineResult<Vec<Option<Bytes>>>;

    /// Sets every pair on the hash at `key` (`HSET` with multiple pairs).
    async fn hash_write_many(&self, key: &str, pairs: Vec<(String, Bytes)>) -> EngineResult<()>;

    /// Returns true if `field` exists on the hash at `key` (`HEXISTS`).
    async fn hash_field_exists(&self, key: &str, field: &str) -> EngineResult<bool>;

    /// Removes `fields` from the hash at `key`, returning how many existed (`HDEL`).
    async fn hash_delete_fields(&self, key: &str, fields: &[String]) -> EngineResult<u64>;

    /// Returns the field names of the hash at `key` (`HKEYS`).
    async fn hash_list_fields(&self, key: &str) -> EngineResult<Vec<Bytes>>;

    /// Returns every key matching a glob-style `pattern` (`KEYS`).
    async fn search_keys(&self, pattern: &str) -> EngineResult<Vec<Bytes>>;

    /// Removes `keys`, returning how many existed (`DEL`).
    async fn delete_keys(&self, keys: &[String]) -> EngineResult<u64>;

    /// Subscribes to lifecycle signals emitted after this call.
    fn subscribe(&self) -> broadcast::Receiver<Signal>;
}
