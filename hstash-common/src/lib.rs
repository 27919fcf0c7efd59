// hstash-common - Shared types and error definitions for HashStash
//
// This crate defines the values, errors and lifecycle signals exchanged
// between the adapter core and the engines it drives.

pub mod error;
pub mod signal;
pub mod types;

// Re-export for convenience
pub use error::*;
pub use signal::*;
pub use types::*;
