//! Unified application error types for Flasky.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator. The domain failures of the identity,
//! token, and authorization layers each get their own [`ErrorKind`] so the
//! route layer can translate them without parsing messages.

use std::fmt;
use thiserror::Error;

/// Top-level error kind categorization used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// The email address is already registered.
    DuplicateEmail,
    /// The username is already taken.
    DuplicateUsername,
    /// Neither the bootstrap admin role nor a default role could be resolved.
    NoDefaultRole,
    /// A token failed signature, format, expiry, or purpose checks.
    InvalidToken,
    /// Credential check failed, or the caller is anonymous.
    Unauthorized,
    /// The caller is authenticated but lacks the required permission.
    Forbidden,
    /// The referenced identity or content does not exist.
    NotFound,
    /// Input validation failed.
    Validation,
    /// A database error occurred.
    Database,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// An internal error occurred.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateEmail => write!(f, "DUPLICATE_EMAIL"),
            Self::DuplicateUsername => write!(f, "DUPLICATE_USERNAME"),
            Self::NoDefaultRole => write!(f, "NO_DEFAULT_ROLE"),
            Self::InvalidToken => write!(f, "INVALID_TOKEN"),
            Self::Unauthorized => write!(f, "UNAUTHORIZED"),
            Self::Forbidden => write!(f, "FORBIDDEN"),
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::Database => write!(f, "DATABASE"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// The unified application error used throughout Flasky.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a duplicate-email error.
    pub fn duplicate_email(email: &str) -> Self {
        Self::new(
            ErrorKind::DuplicateEmail,
            format!("Email '{email}' is already registered"),
        )
    }

    /// Create a duplicate-username error.
    pub fn duplicate_username(username: &str) -> Self {
        Self::new(
            ErrorKind::DuplicateUsername,
            format!("Username '{username}' is already in use"),
        )
    }

    /// Create a no-default-role error.
    pub fn no_default_role() -> Self {
        Self::new(
            ErrorKind::NoDefaultRole,
            "No role could be assigned: the role catalog has no default role",
        )
    }

    /// Create an invalid-token error.
    ///
    /// The message is deliberately fixed: callers must not learn which
    /// check rejected the token.
    pub fn invalid_token() -> Self {
        Self::new(ErrorKind::InvalidToken, "The token is invalid or has expired")
    }

    /// Create an unauthorized error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    /// Create a forbidden error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Returns `true` if this error is of the given kind.
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::with_source(ErrorKind::Validation, format!("Invalid input: {err}"), err)
    }
}
