//! Database-style cache store implementations
//!
//! These stores keep identity records in process memory, optionally
//! snapshotting them to disk.

mod in_memory;

pub use in_memory::InMemory;
