//! Per-request caller and network identity.

use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{web, FromRequest, HttpRequest};
use pp_core::{AppError, NetworkIdentity};
use pp_services::CallContext;

use crate::error::ApiError;
use crate::handlers::AppState;

const FORWARDED_FOR: &str = "x-forwarded-for";

/// The `CallContext` for a request: a verified bearer token (if any) and the
/// caller's network identity.
pub struct RequestContext(pub CallContext);

impl FromRequest for RequestContext {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(call_context(req).map(RequestContext))
    }
}

fn call_context(req: &HttpRequest) -> Result<CallContext, ApiError> {
    let forwarded = req.headers().get(FORWARDED_FOR).and_then(|v| v.to_str().ok());
    let peer = req.peer_addr().map(|addr| addr.ip().to_string());
    let network = NetworkIdentity::from_request_parts(forwarded, peer.as_deref());

    let Some(auth) = req.headers().get(header::AUTHORIZATION) else {
        return Ok(CallContext::anonymous(network));
    };

    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| AppError::Internal("Server misconfigured".into()))?;

    // A header that is present must verify; we never silently downgrade to anonymous.
    let account_id = auth
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .and_then(|token| state.identity.verify_token(token))
        .ok_or_else(|| AppError::Unauthenticated("Invalid or expired session".into()))?;

    Ok(CallContext::signed_in(account_id, network))
}
