//! Signed token issuance and verification.

pub mod claims;
pub mod codec;

pub use claims::{IssuedToken, TokenClaims, TokenPurpose};
pub use codec::TokenCodec;
