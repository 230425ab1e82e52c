//! Identity lifecycle: account creation, credentials, confirmation, and
//! password reset.

use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, info, warn};
use validator::Validate;

use flasky_auth::password::{PasswordHasher, PasswordValidator};
use flasky_auth::rbac::catalog::ADMINISTRATOR;
use flasky_auth::rbac::{Identity, RbacEnforcer};
use flasky_auth::token::{TokenCodec, TokenPurpose};
use flasky_core::config::{AuthConfig, IdentityConfig};
use flasky_core::error::{AppError, ErrorKind};
use flasky_core::traits::Clock;
use flasky_core::types::UserId;
use flasky_database::{FollowStore, RoleStore, Stores, UserStore};
use flasky_entity::follow::Follow;
use flasky_entity::user::{NewUser, Role, User};

use super::forms::{NewAccount, RegisterUser, validate_username};
use crate::notification::Mailer;

/// Token lifetimes and the bootstrap administrator address.
#[derive(Debug, Clone)]
pub struct IdentitySettings {
    /// Accounts registered with this address become administrators.
    pub admin_email: Option<String>,
    /// Lifetime of confirmation tokens sent by email.
    pub confirmation_ttl: Duration,
    /// Lifetime of reset tokens sent by email.
    pub reset_ttl: Duration,
}

impl IdentitySettings {
    /// Builds settings from the loaded configuration sections.
    pub fn from_config(identity: &IdentityConfig, auth: &AuthConfig) -> Result<Self, AppError> {
        Ok(Self {
            admin_email: identity.admin_email.clone(),
            confirmation_ttl: auth.confirmation_ttl()?,
            reset_ttl: auth.reset_ttl()?,
        })
    }
}

/// Creates and maintains user accounts.
#[derive(Debug, Clone)]
pub struct IdentityService {
    /// User store.
    pub(crate) users: Arc<dyn UserStore>,
    /// Role store.
    pub(crate) roles: Arc<dyn RoleStore>,
    /// Follow store, for the reflexive edge.
    follows: Arc<dyn FollowStore>,
    /// Token codec.
    codec: Arc<TokenCodec>,
    /// Password hasher.
    pub(crate) hasher: Arc<PasswordHasher>,
    /// Password validator.
    pub(crate) validator: Arc<PasswordValidator>,
    /// RBAC enforcer.
    pub(crate) rbac: Arc<RbacEnforcer>,
    /// Account email composition.
    mailer: Arc<Mailer>,
    /// Time source.
    pub(crate) clock: Arc<dyn Clock>,
    /// Lifetimes and bootstrap admin.
    settings: IdentitySettings,
}

impl IdentityService {
    /// Creates a new identity service.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        stores: &Stores,
        codec: Arc<TokenCodec>,
        hasher: Arc<PasswordHasher>,
        validator: Arc<PasswordValidator>,
        rbac: Arc<RbacEnforcer>,
        mailer: Arc<Mailer>,
        clock: Arc<dyn Clock>,
        settings: IdentitySettings,
    ) -> Self {
        Self {
            users: stores.users.clone(),
            roles: stores.roles.clone(),
            follows: stores.follows.clone(),
            codec,
            hasher,
            validator,
            rbac,
            mailer,
            clock,
            settings,
        }
    }

    /// Creates an account.
    ///
    /// The bootstrap admin address receives the Administrator role; everyone
    /// else gets the default role. The account follows itself from the
    /// start. Email and username clashes fail with `DuplicateEmail` and
    /// `DuplicateUsername`; the store's constraints decide when two
    /// registrations race.
    pub async fn create(&self, account: NewAccount) -> Result<User, AppError> {
        if self.users.find_by_email(&account.email).await?.is_some() {
            return Err(AppError::duplicate_email(&account.email));
        }
        if self.users.find_by_username(&account.username).await?.is_some() {
            return Err(AppError::duplicate_username(&account.username));
        }

        let role = self.initial_role(&account.email).await?;
        let now = self.clock.now();

        let since = account.member_since.unwrap_or(now);
        let mut new_user = NewUser::new(account.email, account.username, since);
        new_user.role_id = Some(role.id);
        new_user.password_hash = Some(self.hasher.hash_password(&account.password)?);
        new_user.confirmed = account.confirmed;
        new_user.name = account.name;
        new_user.location = account.location;
        new_user.about_me = account.about_me;

        let user = self.users.insert(&new_user).await?;

        let self_edge = Follow {
            follower_id: user.id,
            followed_id: user.id,
            timestamp: now,
        };
        if let Err(e) = self.follows.insert(&self_edge).await {
            // keep creation all-or-nothing
            if let Err(cleanup) = self.users.delete(user.id).await {
                warn!(user_id = %user.id, error = %cleanup, "Failed to roll back user creation");
            }
            return Err(e);
        }

        info!(user_id = %user.id, username = %user.username, role = %role.name, "User created");
        Ok(user)
    }

    /// Role for a new account with `email`.
    async fn initial_role(&self, email: &str) -> Result<Role, AppError> {
        if self.settings.admin_email.as_deref() == Some(email) {
            if let Some(admin) = self.roles.find_by_name(ADMINISTRATOR).await? {
                return Ok(admin);
            }
            warn!("Bootstrap admin registered before the Administrator role exists");
        }
        self.roles
            .find_default()
            .await?
            .ok_or_else(AppError::no_default_role)
    }

    /// Validates a registration form, creates the account, and emails a
    /// confirmation token.
    pub async fn register(&self, form: RegisterUser) -> Result<User, AppError> {
        form.validate()?;
        self.validator.validate(&form.password)?;

        let user = self.create(form.into()).await?;
        self.resend_confirmation(&user).await?;
        Ok(user)
    }

    /// Whether `candidate` matches the stored credential.
    ///
    /// False when no credential is set. Never an error.
    pub fn verify_password(&self, user: &User, candidate: &str) -> bool {
        self.hasher.verify_password(candidate, user.password_hash())
    }

    /// Issues a `confirm` token for `user`.
    pub fn generate_confirmation_token(
        &self,
        user: &User,
        expiration: Duration,
    ) -> Result<String, AppError> {
        Ok(self
            .codec
            .issue(user.id, Some(TokenPurpose::Confirm), expiration)?
            .token)
    }

    /// Emails a fresh confirmation token.
    pub async fn resend_confirmation(&self, user: &User) -> Result<(), AppError> {
        let token = self.generate_confirmation_token(user, self.settings.confirmation_ttl)?;
        self.mailer.send_confirmation(user, &token).await;
        Ok(())
    }

    /// Redeems a confirmation token.
    ///
    /// Returns `true` straight away when the user is already confirmed.
    /// Returns `false`, changing nothing, when the token is invalid, expired,
    /// for another purpose, or for another user.
    pub async fn confirm(&self, user: &mut User, token: &str) -> Result<bool, AppError> {
        if user.confirmed {
            return Ok(true);
        }

        let claims = match self.codec.verify(token, Some(TokenPurpose::Confirm)) {
            Ok(claims) => claims,
            Err(e) if e.is(ErrorKind::InvalidToken) => return Ok(false),
            Err(e) => return Err(e),
        };
        if claims.sub != user.id {
            debug!(user_id = %user.id, "Confirmation token belongs to another user");
            return Ok(false);
        }

        let mut updated = user.clone();
        updated.confirmed = true;
        *user = self.users.update(&updated).await?;

        info!(user_id = %user.id, "Account confirmed");
        Ok(true)
    }

    /// Issues a `reset` token for `user`.
    pub fn generate_reset_token(
        &self,
        user: &User,
        expiration: Duration,
    ) -> Result<String, AppError> {
        Ok(self
            .codec
            .issue(user.id, Some(TokenPurpose::Reset), expiration)?
            .token)
    }

    /// Emails a reset token to the owner of `email`.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), AppError> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::not_found("No account is registered with that email"))?;

        let token = self.generate_reset_token(&user, self.settings.reset_ttl)?;
        self.mailer.send_password_reset(&user, &token).await;
        Ok(())
    }

    /// Sets a new password for the subject of a reset token.
    ///
    /// Returns `false` when the token does not verify or names an unknown
    /// user.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<bool, AppError> {
        let claims = match self.codec.verify(token, Some(TokenPurpose::Reset)) {
            Ok(claims) => claims,
            Err(e) if e.is(ErrorKind::InvalidToken) => return Ok(false),
            Err(e) => return Err(e),
        };

        let Some(mut user) = self.users.find_by_id(claims.sub).await? else {
            debug!(user_id = %claims.sub, "Reset token names an unknown user");
            return Ok(false);
        };

        self.validator.validate(new_password)?;
        user.set_password_hash(self.hasher.hash_password(new_password)?);
        self.users.update(&user).await?;

        info!(user_id = %user.id, "Password reset");
        Ok(true)
    }

    /// Replaces the password after checking the current one. The new
    /// password must differ from it.
    pub async fn change_password(
        &self,
        user: &mut User,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        if !self.verify_password(user, old_password) {
            return Err(AppError::unauthorized("Invalid password"));
        }
        self.validator.validate_not_same(old_password, new_password)?;
        self.validator.validate(new_password)?;

        let mut updated = user.clone();
        updated.set_password_hash(self.hasher.hash_password(new_password)?);
        *user = self.users.update(&updated).await?;

        info!(user_id = %user.id, "Password changed");
        Ok(())
    }

    /// Renames the account.
    pub async fn change_username(&self, user: &mut User, username: &str) -> Result<(), AppError> {
        if username.is_empty() || username.chars().count() > 64 {
            return Err(AppError::validation("Username must be 1 to 64 characters"));
        }
        validate_username(username).map_err(|e| {
            AppError::validation(
                e.message
                    .map(|m| m.into_owned())
                    .unwrap_or_else(|| "Invalid username".to_string()),
            )
        })?;

        if let Some(existing) = self.users.find_by_username(username).await? {
            if existing.id != user.id {
                return Err(AppError::duplicate_username(username));
            }
        }

        let mut updated = user.clone();
        updated.username = username.to_string();
        *user = self.users.update(&updated).await?;

        info!(user_id = %user.id, username, "Username changed");
        Ok(())
    }

    /// Records activity. Store failures are logged and swallowed.
    pub async fn touch_activity(&self, user: &mut User) {
        let now = self.clock.now();
        user.last_seen = now;
        if let Err(e) = self.users.touch_last_seen(user.id, now).await {
            warn!(user_id = %user.id, error = %e, "Failed to record activity");
        }
    }

    /// Looks up a user by id.
    pub async fn get_user(&self, user_id: UserId) -> Result<User, AppError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {user_id} not found")))
    }

    /// Looks up a user by username.
    pub async fn get_by_username(&self, username: &str) -> Result<User, AppError> {
        self.users
            .find_by_username(username)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User '{username}' not found")))
    }

    /// Resolves a session's user into an [`Identity`].
    ///
    /// No id, or an id that no longer exists, is `Anonymous`.
    pub async fn load_identity(&self, user_id: Option<UserId>) -> Result<Identity, AppError> {
        let Some(user_id) = user_id else {
            return Ok(Identity::Anonymous);
        };
        match self.users.find_by_id(user_id).await? {
            Some(user) => resolve_identity(self.roles.as_ref(), user).await,
            None => Ok(Identity::Anonymous),
        }
    }
}

/// Pairs `user` with its stored role.
pub(crate) async fn resolve_identity(
    roles: &dyn RoleStore,
    user: User,
) -> Result<Identity, AppError> {
    let role = match user.role_id {
        Some(role_id) => roles.find_by_id(role_id).await?,
        None => None,
    };
    Ok(Identity::authenticated(user, role))
}
