//! Permission flags shared by roles, access control, and the content gate.

pub mod flags;

pub use flags::Permission;
