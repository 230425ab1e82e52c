//! # flasky-service
//!
//! Business logic service layer for Flasky. Each service orchestrates the
//! stores, the token codec, password hashing, and access control to
//! implement application-level use cases.
//!
//! Services follow constructor injection: all dependencies are provided
//! at construction time via `Arc` references.

pub mod follow;
pub mod identity;
pub mod notification;
pub mod post;
pub mod role;
pub mod services;
pub mod session;

pub use follow::FollowService;
pub use identity::{IdentityService, IdentitySettings};
pub use notification::{LogNotificationSink, Mailer};
pub use post::PostService;
pub use role::RoleService;
pub use services::Services;
pub use session::{ApiAuthService, ApiSession, ApiToken};
