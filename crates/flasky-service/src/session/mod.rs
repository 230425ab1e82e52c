//! API caller authentication and token issuance.

pub mod api_auth;

pub use api_auth::{ApiAuthService, ApiSession, ApiToken};
