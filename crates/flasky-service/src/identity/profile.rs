//! Profile edits by the owner and by administrators.

use tracing::info;
use validator::Validate;

use flasky_auth::rbac::Identity;
use flasky_core::error::AppError;
use flasky_core::types::UserId;
use flasky_entity::permission::Permission;
use flasky_entity::user::User;

use super::forms::{AdminProfileUpdate, ProfileUpdate};
use super::service::IdentityService;

impl IdentityService {
    /// Updates the caller's own name, location, and profile text.
    pub async fn update_profile(
        &self,
        user: &mut User,
        update: ProfileUpdate,
    ) -> Result<(), AppError> {
        update.validate()?;

        let mut updated = user.clone();
        updated.name = update.name;
        updated.location = update.location;
        updated.about_me = update.about_me;
        *user = self.users.update(&updated).await?;

        info!(user_id = %user.id, "Profile updated");
        Ok(())
    }

    /// Edits any account. Requires ADMIN.
    pub async fn admin_update_profile(
        &self,
        actor: &Identity,
        user_id: UserId,
        update: AdminProfileUpdate,
    ) -> Result<User, AppError> {
        self.rbac.require_permission(actor, Permission::ADMIN)?;
        update.validate()?;

        let mut user = self.get_user(user_id).await?;

        if let Some(email) = update.email {
            if email != user.email {
                if self.users.find_by_email(&email).await?.is_some() {
                    return Err(AppError::duplicate_email(&email));
                }
                user.set_email(email);
            }
        }
        if let Some(username) = update.username {
            if username != user.username {
                if self.users.find_by_username(&username).await?.is_some() {
                    return Err(AppError::duplicate_username(&username));
                }
                user.username = username;
            }
        }
        if let Some(confirmed) = update.confirmed {
            user.confirmed = confirmed;
        }
        if let Some(role_id) = update.role_id {
            if self.roles.find_by_id(role_id).await?.is_none() {
                return Err(AppError::not_found(format!("Role {role_id} not found")));
            }
            user.role_id = Some(role_id);
        }
        if update.name.is_some() {
            user.name = update.name;
        }
        if update.location.is_some() {
            user.location = update.location;
        }
        if update.about_me.is_some() {
            user.about_me = update.about_me;
        }

        let user = self.users.update(&user).await?;
        info!(
            user_id = %user.id,
            actor_id = ?actor.user_id(),
            "Profile updated by administrator"
        );
        Ok(user)
    }

    /// Gravatar-compatible image URL, filling the cached avatar key if needed.
    pub async fn avatar_url(
        &self,
        user: &mut User,
        size: u32,
        default: &str,
        rating: &str,
    ) -> Result<String, AppError> {
        if user.avatar_hash.is_none() {
            user.ensure_avatar_hash();
            *user = self.users.update(user).await?;
        }
        Ok(user.avatar_url(size, default, rating))
    }
}
