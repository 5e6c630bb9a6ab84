//! Callable error envelope and the AppError -> HTTP status mapping.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use pp_core::AppError;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub AppError);

#[derive(Serialize)]
struct ErrorEnvelope<'a> {
    error: ErrorBody<'a>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    /// `INVALID_ARGUMENT`, `PERMISSION_DENIED`, ...
    status: String,
    code: &'a str,
    message: String,
}

fn status_name(kind: &str) -> String {
    kind.replace('-', "_").to_ascii_uppercase()
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self.0 {
            AppError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::AlreadyExists(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let kind = self.0.kind();
        HttpResponse::build(self.status_code()).json(ErrorEnvelope {
            error: ErrorBody {
                status: status_name(kind),
                code: kind,
                message: self.0.to_string(),
            },
        })
    }
}
