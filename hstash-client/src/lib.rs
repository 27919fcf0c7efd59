// hstash-client - Redis network engine for HashStash
//
// Connects to a Redis-compatible server with the `redis` crate and exposes it
// through the `HashEngine` trait.

pub mod engine;
pub mod params;

pub use engine::{CONNECT_TIMEOUT, RespEngine};
pub use params::ConnectParams;
