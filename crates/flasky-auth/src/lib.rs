//! # flasky-auth
//!
//! Credential and authorization primitives for Flasky.
//!
//! ## Modules
//!
//! - `token` — signed, expiring bearer tokens for confirmation, reset, and API sessions
//! - `password` — Argon2id password hashing and policy enforcement
//! - `rbac` — role catalog, the caller identity, and permission enforcement
//! - `acl` — ownership-based content gate

pub mod acl;
pub mod password;
pub mod rbac;
pub mod token;

pub use acl::ContentGate;
pub use password::{PasswordHasher, PasswordValidator};
pub use rbac::{Identity, RbacEnforcer, RoleCatalog};
pub use token::{TokenClaims, TokenCodec, TokenPurpose};
