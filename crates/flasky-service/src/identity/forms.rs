//! Input payloads for identity operations, validated with `validator`.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use flasky_core::types::RoleId;

/// Usernames start with a letter and continue with letters, digits,
/// underscores, or dots.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    let mut chars = username.chars();
    let starts_with_letter = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    let rest_ok = chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
    if starts_with_letter && rest_ok {
        Ok(())
    } else {
        let mut err = ValidationError::new("username_format");
        err.message = Some(
            "Usernames must have only letters, numbers, dots or underscores".into(),
        );
        Err(err)
    }
}

/// Data for creating an account directly, without form validation.
#[derive(Clone, Default, Deserialize)]
pub struct NewAccount {
    /// Email address.
    pub email: String,
    /// Login name.
    pub username: String,
    /// Plaintext password; hashed before storage.
    pub password: String,
    /// Whether the address starts out confirmed.
    #[serde(default)]
    pub confirmed: bool,
    /// Real name.
    #[serde(default)]
    pub name: Option<String>,
    /// Location.
    #[serde(default)]
    pub location: Option<String>,
    /// Profile text.
    #[serde(default)]
    pub about_me: Option<String>,
    /// Registration instant; defaults to now.
    #[serde(default)]
    pub member_since: Option<DateTime<Utc>>,
}

impl NewAccount {
    /// Account with just the required fields.
    pub fn new(
        email: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            username: username.into(),
            password: password.into(),
            ..Self::default()
        }
    }
}

impl fmt::Debug for NewAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewAccount")
            .field("email", &self.email)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("confirmed", &self.confirmed)
            .finish_non_exhaustive()
    }
}

/// Self-service registration form.
#[derive(Clone, Deserialize, Validate)]
pub struct RegisterUser {
    /// Email address.
    #[validate(
        email(message = "Invalid email address"),
        length(min = 1, max = 64)
    )]
    pub email: String,
    /// Login name.
    #[validate(
        length(min = 1, max = 64),
        custom(function = "validate_username")
    )]
    pub username: String,
    /// Plaintext password.
    pub password: String,
}

impl fmt::Debug for RegisterUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterUser")
            .field("email", &self.email)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl From<RegisterUser> for NewAccount {
    fn from(form: RegisterUser) -> Self {
        Self::new(form.email, form.username, form.password)
    }
}

/// Fields a user may change on their own profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ProfileUpdate {
    /// Real name.
    #[validate(length(max = 64))]
    pub name: Option<String>,
    /// Location.
    #[validate(length(max = 64))]
    pub location: Option<String>,
    /// Profile text.
    pub about_me: Option<String>,
}

/// Fields an administrator may change on any profile.
///
/// `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct AdminProfileUpdate {
    /// New email; recomputes the avatar key.
    #[validate(email(message = "Invalid email address"), length(min = 1, max = 64))]
    pub email: Option<String>,
    /// New username.
    #[validate(
        length(min = 1, max = 64),
        custom(function = "validate_username")
    )]
    pub username: Option<String>,
    /// Confirmation flag.
    pub confirmed: Option<bool>,
    /// Role assignment.
    pub role_id: Option<RoleId>,
    /// Real name.
    #[validate(length(max = 64))]
    pub name: Option<String>,
    /// Location.
    #[validate(length(max = 64))]
    pub location: Option<String>,
    /// Profile text.
    pub about_me: Option<String>,
}
