//! Role catalog reconciliation.

pub mod service;

pub use service::RoleService;
