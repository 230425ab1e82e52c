//! In-memory store implementation.

pub mod store;

pub use store::MemoryStore;
