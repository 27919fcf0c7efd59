
pub mod engine;
pub mod glob;
pub mod memory;

pub use engine::HashEngine;
pub use glob::glob_match;
pub use memory::MemoryEngine;
