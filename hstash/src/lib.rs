// hstash - Hash-oriented key/value store adapter
//
// Turns flexible positional call shapes into canonical hash commands for a
// `HashEngine`, composes composite keys, and encodes/decodes field values.

pub mod args;
pub mod codec;
pub mod config;
pub mod key;
pub mod lifecycle;
pub mod request;
pub mod store;

mod callback;

pub use args::Arg;
pub use codec::{EncodedValue, ValueCodec};
pub use config::{Connection, StoreConfig};
pub use key::{Delimiter, KeyComposer};
pub use lifecycle::ConnectionLifecycle;
pub use request::FieldSelection;
pub use store::{HashStore, ReadReply};

// Re-export for convenience
pub use hstash_client::{ConnectParams, RespEngine};
pub use hstash_common::{EngineError, FieldMap, Signal, StashError, StashResult, Value};
pub use hstash_engine::{HashEngine, MemoryEngine};
