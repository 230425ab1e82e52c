//! Content-addressed avatar keys.

/// Base URL of the Gravatar-compatible avatar service.
pub const AVATAR_BASE_URL: &str = "https://secure.gravatar.com/avatar";

/// Computes the avatar key for an email: MD5 hex of the lowercased address.
pub fn avatar_hash(email: &str) -> String {
    format!("{:x}", md5::compute(email.to_lowercase().as_bytes()))
}

/// Builds the avatar image URL for a key.
pub fn avatar_url(hash: &str, size: u32, default: &str, rating: &str) -> String {
    format!("{AVATAR_BASE_URL}/{hash}?s={size}&d={default}&r={rating}")
}
