//! Password policy enforcement for new passwords.

use flasky_core::config::AuthConfig;
use flasky_core::error::AppError;

/// Validates password strength against configured policies.
#[derive(Debug, Clone)]
pub struct PasswordValidator {
    /// Minimum password length, in characters.
    min_length: usize,
    /// Minimum zxcvbn score; `None` skips the entropy check.
    min_score: Option<zxcvbn::Score>,
}

impl PasswordValidator {
    /// Creates a new validator from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            min_length: config.password_min_length.max(1),
            min_score: score_from_config(config.password_min_score),
        }
    }

    /// Validates a password against all configured policies.
    ///
    /// Returns `Ok(())` if the password meets all requirements,
    /// or an error describing the first violation found.
    pub fn validate(&self, password: &str) -> Result<(), AppError> {
        if password.chars().count() < self.min_length {
            return Err(AppError::validation(format!(
                "Password must be at least {} characters long",
                self.min_length
            )));
        }

        if let Some(min_score) = self.min_score {
            let estimate = zxcvbn::zxcvbn(password, &[]);
            if estimate.score() < min_score {
                return Err(AppError::validation(
                    "Password is too weak. Please use a stronger password with more entropy.",
                ));
            }
        }

        Ok(())
    }

    /// Validates that a new password differs from the old one.
    pub fn validate_not_same(
        &self,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        if old_password == new_password {
            return Err(AppError::validation(
                "New password must be different from the current password",
            ));
        }
        Ok(())
    }
}

fn score_from_config(score: u8) -> Option<zxcvbn::Score> {
    match score {
        0 => None,
        1 => Some(zxcvbn::Score::One),
        2 => Some(zxcvbn::Score::Two),
        3 => Some(zxcvbn::Score::Three),
        _ => Some(zxcvbn::Score::Four),
    }
}
