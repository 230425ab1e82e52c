//! HMAC-signed token creation and validation.

use std::sync::Arc;

use chrono::Duration;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::debug;

use flasky_core::config::AuthConfig;
use flasky_core::error::AppError;
use flasky_core::traits::Clock;
use flasky_core::types::UserId;

use super::claims::{IssuedToken, TokenClaims, TokenPurpose};

/// Issues and verifies signed, self-contained, expiring tokens.
///
/// Nothing is stored server-side. Expiry is evaluated against the injected
/// [`Clock`], not the library's wall clock, so tests can move time.
#[derive(Clone)]
pub struct TokenCodec {
    /// HMAC secret key for signing.
    encoding_key: EncodingKey,
    /// HMAC secret key for verification.
    decoding_key: DecodingKey,
    /// Signature and structure checks; expiry is checked separately.
    validation: Validation,
    /// Time source for `iat`, `exp`, and expiry checks.
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("validation", &self.validation)
            .field("clock", &self.clock)
            .finish()
    }
}

impl TokenCodec {
    /// Creates a codec from auth configuration.
    pub fn new(config: &AuthConfig, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding_key: EncodingKey::from_secret(config.secret_key.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret_key.as_bytes()),
            validation,
            clock,
        }
    }

    /// Signs a token for `subject` that expires `expiration` from now.
    pub fn issue(
        &self,
        subject: UserId,
        purpose: Option<TokenPurpose>,
        expiration: Duration,
    ) -> Result<IssuedToken, AppError> {
        let now = self.clock.now();
        let expires_at = now
            .checked_add_signed(expiration)
            .ok_or_else(|| AppError::validation("Token expiration out of range"))?;

        let claims = TokenClaims {
            sub: subject,
            purpose,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to encode token: {e}")))?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Signs an untagged session token.
    pub fn issue_session(
        &self,
        subject: UserId,
        expiration: Duration,
    ) -> Result<IssuedToken, AppError> {
        self.issue(subject, None, expiration)
    }

    /// Verifies signature, structure, expiry, and purpose.
    ///
    /// `expected_purpose = None` accepts only untagged session tokens. Every
    /// failure yields the same [`AppError::invalid_token`]; the concrete
    /// reason is only logged at debug level.
    pub fn verify(
        &self,
        token: &str,
        expected_purpose: Option<TokenPurpose>,
    ) -> Result<TokenClaims, AppError> {
        let claims = decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                debug!(reason = %e, "Token rejected");
                AppError::invalid_token()
            })?
            .claims;

        if claims.is_expired_at(self.clock.now()) {
            debug!(user_id = %claims.sub, exp = claims.exp, "Token rejected: expired");
            return Err(AppError::invalid_token());
        }

        if claims.purpose != expected_purpose {
            debug!(
                user_id = %claims.sub,
                found = ?claims.purpose,
                expected = ?expected_purpose,
                "Token rejected: purpose mismatch"
            );
            return Err(AppError::invalid_token());
        }

        Ok(claims)
    }
}
