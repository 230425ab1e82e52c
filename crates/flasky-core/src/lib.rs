//! # flasky-core
//!
//! Core crate for Flasky. Contains the unified error system, configuration
//! schemas, typed identifiers, pagination types, and the collaborator traits
//! (clock, notification sink) the domain crates are built against.
//!
//! This crate has **no** internal dependencies on other Flasky crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
