//! Store configuration.
//!
//! Set once when the store is built and read-only afterwards. The JSON form
//! mirrors the bundle callers pass around:
//!
//! ```text
//! { "connection": { "host": "127.0.0.1", "port": 6379 },
//!   "delimiter": ":",
//!   "castMode": true }
//! ```

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer};

use hstash_client::ConnectParams;
use hstash_common::{StashError, StashResult};
use hstash_engine::HashEngine;

use crate::key::Delimiter;

/// Where the store's engine comes from.
#[derive(Clone)]
pub enum Connection {
    /// An engine handle created by the caller and shared with the store.
    Engine(Arc<dyn HashEngine>),
    /// Parameters for a network engine the store creates and owns.
    Params(ConnectParams),
}

impl Default for Connection {
    fn default() -> Self {
        Connection::Params(ConnectParams::default())
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Connection::Engine(_) => f.write_str("Engine(..)"),
            Connection::Params(params) => f.debug_tuple("Params").field(params).finish(),
        }
    }
}

impl<'de> Deserialize<'de> for Connection {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        ConnectParams::deserialize(deserializer).map(Connection::Params)
    }
}

/// Construction-time settings for a [`HashStore`](crate::HashStore).
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoreConfig {
    pub connection: Connection,
    pub delimiter: Delimiter,
    pub cast_mode: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            connection: Connection::default(),
            delimiter: Delimiter::default(),
            cast_mode: true,
        }
    }
}

impl StoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration around an existing engine handle.
    pub fn with_engine(engine: Arc<dyn HashEngine>) -> Self {
        StoreConfig {
            connection: Connection::Engine(engine),
            ..Self::default()
        }
    }

    pub fn with_params(params: ConnectParams) -> Self {
        StoreConfig {
            connection: Connection::Params(params),
            ..Self::default()
        }
    }

    pub fn with_delimiter(mut self, delimiter: impl Into<Delimiter>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    pub fn with_cast_mode(mut self, cast_mode: bool) -> Self {
        self.cast_mode = cast_mode;
        self
    }

    /// Parses a JSON configuration bundle.
    ///
    /// A malformed bundle is reported as `InvalidData`.
    pub fn from_json(json: &str) -> StashResult<Self> {
        serde_json::from_str(json).map_err(|_| StashError::InvalidData)
    }
}
