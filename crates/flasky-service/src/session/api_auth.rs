//! Authenticates API callers by password or bearer token.

use std::sync::Arc;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use flasky_auth::password::PasswordHasher;
use flasky_auth::rbac::Identity;
use flasky_auth::token::TokenCodec;
use flasky_core::config::AuthConfig;
use flasky_core::error::AppError;
use flasky_database::{RoleStore, Stores, UserStore};

use crate::identity::service::resolve_identity;

const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// An authenticated API caller.
#[derive(Debug, Clone)]
pub struct ApiSession {
    /// The caller.
    pub identity: Identity,
    /// Whether the caller presented a bearer token rather than a password.
    pub token_used: bool,
}

impl ApiSession {
    /// Rejects callers whose account is not confirmed.
    pub fn require_confirmed(&self) -> Result<(), AppError> {
        match self.identity.user() {
            Some(user) if user.confirmed => Ok(()),
            _ => Err(AppError::forbidden("Unconfirmed account")),
        }
    }
}

/// A bearer token handed to an API caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiToken {
    /// The token.
    pub token: String,
    /// Lifetime in seconds.
    pub expiration: u64,
}

/// Resolves API credentials into an [`ApiSession`].
#[derive(Debug, Clone)]
pub struct ApiAuthService {
    /// User store.
    users: Arc<dyn UserStore>,
    /// Role store.
    roles: Arc<dyn RoleStore>,
    /// Token codec.
    codec: Arc<TokenCodec>,
    /// Password hasher.
    hasher: Arc<PasswordHasher>,
    /// Lifetime of issued API tokens.
    token_ttl: Duration,
    /// The same lifetime in whole seconds, as reported to callers.
    token_ttl_seconds: u64,
}

impl ApiAuthService {
    /// Creates a new API authentication service.
    pub fn new(
        stores: &Stores,
        codec: Arc<TokenCodec>,
        hasher: Arc<PasswordHasher>,
        config: &AuthConfig,
    ) -> Result<Self, AppError> {
        Ok(Self {
            users: stores.users.clone(),
            roles: stores.roles.clone(),
            codec,
            hasher,
            token_ttl: config.api_token_ttl()?,
            token_ttl_seconds: config.api_token_ttl_seconds,
        })
    }

    /// Authenticates with `identifier` and `credential`.
    ///
    /// With an empty credential the identifier is a bearer token; otherwise
    /// it is an email address and the credential is the password. Anonymous
    /// access is refused.
    pub async fn authenticate(
        &self,
        identifier: &str,
        credential: &str,
    ) -> Result<ApiSession, AppError> {
        if identifier.is_empty() {
            return Err(AppError::unauthorized(INVALID_CREDENTIALS));
        }

        if credential.is_empty() {
            let claims = self
                .codec
                .verify(identifier, None)
                .map_err(|_| AppError::unauthorized(INVALID_CREDENTIALS))?;
            let user = self
                .users
                .find_by_id(claims.sub)
                .await?
                .ok_or_else(|| AppError::unauthorized(INVALID_CREDENTIALS))?;

            debug!(user_id = %user.id, "API caller authenticated by token");
            return Ok(ApiSession {
                identity: resolve_identity(self.roles.as_ref(), user).await?,
                token_used: true,
            });
        }

        let user = self
            .users
            .find_by_email(identifier)
            .await?
            .ok_or_else(|| AppError::unauthorized(INVALID_CREDENTIALS))?;
        if !self.hasher.verify_password(credential, user.password_hash()) {
            debug!(user_id = %user.id, "API password rejected");
            return Err(AppError::unauthorized(INVALID_CREDENTIALS));
        }

        debug!(user_id = %user.id, "API caller authenticated by password");
        Ok(ApiSession {
            identity: resolve_identity(self.roles.as_ref(), user).await?,
            token_used: false,
        })
    }

    /// Issues a session token. A session that itself came from a token may
    /// not mint another.
    pub fn issue_api_token(&self, session: &ApiSession) -> Result<ApiToken, AppError> {
        if session.token_used {
            return Err(AppError::unauthorized(INVALID_CREDENTIALS));
        }
        let user_id = session
            .identity
            .user_id()
            .ok_or_else(|| AppError::unauthorized(INVALID_CREDENTIALS))?;

        let issued = self
            .codec
            .issue_session(user_id, self.token_ttl)?;

        info!(user_id = %user_id, "API token issued");
        Ok(ApiToken {
            token: issued.token,
            expiration: self.token_ttl_seconds,
        })
    }
}
