//! # AppError
//!
//! Centralized error handling for picpop.
//! Every caller-facing failure is one of a small fixed set of kinds so
//! clients can branch on the kind and show the message.

use thiserror::Error;

/// The caller-facing error type for all gateway operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Malformed or missing input (e.g., oversized mediaUrl, both targets set)
    #[error("{0}")]
    InvalidArgument(String),

    /// The operation needs a signed-in caller and none is present
    #[error("{0}")]
    Unauthenticated(String),

    /// Caller is known but not allowed (not the owner, blocked network identity)
    #[error("{0}")]
    PermissionDenied(String),

    /// Referenced Post, Account or FeedbackEvent does not exist
    #[error("{0}")]
    NotFound(String),

    /// Unique resource already taken (e.g., a claimed handle)
    #[error("{0}")]
    AlreadyExists(String),

    /// Infrastructure failure. The message is safe to show; details are logged.
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// Stable kind string, e.g. `permission-denied`.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::InvalidArgument(_) => "invalid-argument",
            AppError::Unauthenticated(_) => "unauthenticated",
            AppError::PermissionDenied(_) => "permission-denied",
            AppError::NotFound(_) => "not-found",
            AppError::AlreadyExists(_) => "already-exists",
            AppError::Internal(_) => "internal",
        }
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        AppError::InvalidArgument(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    pub fn denied(msg: impl Into<String>) -> Self {
        AppError::PermissionDenied(msg.into())
    }
}

/// A stored record that can't be decoded. Reading it again gives the same
/// answer, so consumers drop it instead of retrying. Attached as context.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("malformed {0}")]
pub struct MalformedRecord(pub String);

/// A specialized Result type for picpop operations.
pub type Result<T> = std::result::Result<T, AppError>;
