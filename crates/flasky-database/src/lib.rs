//! # flasky-database
//!
//! Persistence contracts used by the Flasky services, with two
//! implementations: PostgreSQL repositories built on sqlx, and an in-memory
//! store built on dashmap for tests and embedded use. Both enforce the
//! uniqueness constraints on email, username, and follow-edge pairs and
//! translate violations into domain errors.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use memory::MemoryStore;
pub use store::{FollowStore, PostStore, RoleStore, Stores, UserStore};
