//! Account lifecycle and profile management.

pub mod forms;
pub mod profile;
pub mod seed;
pub mod service;

pub use forms::{AdminProfileUpdate, NewAccount, ProfileUpdate, RegisterUser};
pub use service::{IdentityService, IdentitySettings};
