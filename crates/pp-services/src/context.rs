//! Per-request caller context and input checks shared by every operation.

use pp_core::{AppError, NetworkIdentity, MEDIA_URL_MAX_LEN};

const HANDLE_MIN_LEN: usize = 3;
const HANDLE_MAX_LEN: usize = 20;
const PUSH_TOKEN_MAX_LEN: usize = 4096;

/// Who is calling, as far as we can tell.
#[derive(Debug, Clone)]
pub struct CallContext {
    /// Verified account id, `None` for anonymous callers
    pub caller: Option<String>,
    pub network: NetworkIdentity,
}

impl CallContext {
    pub fn anonymous(network: NetworkIdentity) -> Self {
        Self { caller: None, network }
    }

    pub fn signed_in(caller: impl Into<String>, network: NetworkIdentity) -> Self {
        Self {
            caller: Some(caller.into()),
            network,
        }
    }

    pub fn require_caller(&self, action: &str) -> Result<&str, AppError> {
        self.caller
            .as_deref()
            .ok_or_else(|| AppError::Unauthenticated(format!("Sign in to {action}")))
    }
}

/// Logs a storage failure and returns a caller-safe internal error.
pub(crate) fn storage_failure(
    operation: &'static str,
    message: &'static str,
) -> impl FnOnce(anyhow::Error) -> AppError {
    move |err| {
        log::error!("{operation} failed: {err:#}");
        AppError::Internal(message.to_string())
    }
}

pub(crate) fn validate_media_url(media_url: Option<&str>) -> Result<&str, AppError> {
    match media_url {
        Some(url) if !url.trim().is_empty() && url.chars().count() <= MEDIA_URL_MAX_LEN => Ok(url),
        _ => Err(AppError::invalid("Valid mediaUrl is required")),
    }
}

pub(crate) fn require_field<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str, AppError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::invalid(format!("{name} is required")))
}

/// `^[A-Za-z0-9_]{3,20}$` after trimming. Returns the trimmed handle.
pub(crate) fn validate_handle(raw: &str) -> Result<&str, AppError> {
    let handle = raw.trim();
    let len = handle.chars().count();
    let allowed = handle
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if (HANDLE_MIN_LEN..=HANDLE_MAX_LEN).contains(&len) && allowed {
        Ok(handle)
    } else {
        Err(AppError::invalid(
            "3-20 characters. Letters, numbers, underscores only.",
        ))
    }
}

pub(crate) fn validate_push_token(raw: Option<&str>) -> Result<&str, AppError> {
    match raw.map(str::trim) {
        Some(token) if !token.is_empty() && token.len() <= PUSH_TOKEN_MAX_LEN => Ok(token),
        _ => Err(AppError::invalid("Valid push token is required")),
    }
}
