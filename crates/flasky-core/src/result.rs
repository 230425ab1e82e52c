//! Convenience result type alias for Flasky.

use crate::error::AppError;

/// A specialized `Result` type for Flasky operations.
pub type AppResult<T> = Result<T, AppError>;
