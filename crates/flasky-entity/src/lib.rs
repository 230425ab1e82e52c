//! # flasky-entity
//!
//! Domain entity models for Flasky. Every struct in this crate represents a
//! database row or a domain value object. Row types additionally derive
//! `sqlx::FromRow`.

pub mod follow;
pub mod permission;
pub mod post;
pub mod user;
