//! User and role domain entities.

pub mod avatar;
pub mod model;
pub mod role;

pub use model::{NewUser, Persisted, User};
pub use role::{NewRole, Role};
