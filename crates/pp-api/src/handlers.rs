//! # pp-api Handlers
//!
//! One handler per callable operation. Each unwraps the `{"data": ...}`
//! envelope, hands the typed request to the services layer and wraps the
//! outcome as `{"result": ...}`.

use std::sync::Arc;

use actix_web::{web, HttpResponse};
use pp_core::IdentityProvider;
use pp_services::accounts::{
    ClaimHandleRequest, CreatePostRequest, ListNotificationsRequest, PushTokenRequest,
    RecordVisitRequest,
};
use pp_services::gateway::{FeedbackRefRequest, ReportFeedbackRequest, SubmitFeedbackRequest};
use pp_services::{AccountService, FeedbackGateway};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::ApiError;
use crate::extract::RequestContext;

/// State shared across all Actix-web workers.
pub struct AppState {
    pub gateway: FeedbackGateway,
    pub accounts: AccountService,
    pub identity: Arc<dyn IdentityProvider>,
}

/// Request envelope. A missing or null `data` means "no fields".
#[derive(Debug, Deserialize)]
pub struct Callable<T> {
    pub data: Option<T>,
}

impl<T: Default> Callable<T> {
    pub fn into_data(self) -> T {
        self.data.unwrap_or_default()
    }
}

#[derive(Serialize)]
struct CallableResult<T> {
    result: T,
}

fn ok<T: Serialize>(result: T) -> HttpResponse {
    HttpResponse::Ok().json(CallableResult { result })
}

type Body<T> = web::Json<Callable<T>>;
type Reply = Result<HttpResponse, ApiError>;

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().content_type("text/plain").body("ok")
}

pub async fn submit_feedback(
    state: web::Data<AppState>,
    ctx: RequestContext,
    body: Body<SubmitFeedbackRequest>,
) -> Reply {
    let event = state
        .gateway
        .submit_feedback(&ctx.0, body.into_inner().into_data())
        .await?;
    Ok(ok(json!({ "success": true, "feedbackEventId": event.id })))
}

pub async fn report_feedback(
    state: web::Data<AppState>,
    ctx: RequestContext,
    body: Body<ReportFeedbackRequest>,
) -> Reply {
    state
        .gateway
        .report_feedback(&ctx.0, body.into_inner().into_data())
        .await?;
    Ok(ok(json!({ "success": true })))
}

pub async fn delete_inbox_feedback(
    state: web::Data<AppState>,
    ctx: RequestContext,
    body: Body<FeedbackRefRequest>,
) -> Reply {
    state
        .gateway
        .delete_inbox_feedback(&ctx.0, body.into_inner().into_data())
        .await?;
    Ok(ok(json!({ "success": true })))
}

pub async fn delete_feedback(
    state: web::Data<AppState>,
    ctx: RequestContext,
    body: Body<FeedbackRefRequest>,
) -> Reply {
    state
        .gateway
        .delete_feedback(&ctx.0, body.into_inner().into_data())
        .await?;
    Ok(ok(json!({ "success": true })))
}

pub async fn sign_in(state: web::Data<AppState>) -> Reply {
    let session = state.accounts.sign_in().await?;
    Ok(ok(session))
}

pub async fn get_account(state: web::Data<AppState>, ctx: RequestContext) -> Reply {
    let account = state.accounts.get_account(&ctx.0).await?;
    Ok(ok(account))
}

pub async fn claim_handle(
    state: web::Data<AppState>,
    ctx: RequestContext,
    body: Body<ClaimHandleRequest>,
) -> Reply {
    let handle = state
        .accounts
        .claim_handle(&ctx.0, body.into_inner().into_data())
        .await?;
    Ok(ok(json!({ "handle": handle })))
}

pub async fn register_push_token(
    state: web::Data<AppState>,
    ctx: RequestContext,
    body: Body<PushTokenRequest>,
) -> Reply {
    state
        .accounts
        .register_push_token(&ctx.0, body.into_inner().into_data())
        .await?;
    Ok(ok(json!({ "success": true })))
}

pub async fn clear_push_token(state: web::Data<AppState>, ctx: RequestContext) -> Reply {
    state.accounts.clear_push_token(&ctx.0).await?;
    Ok(ok(json!({ "success": true })))
}

pub async fn create_post(
    state: web::Data<AppState>,
    ctx: RequestContext,
    body: Body<CreatePostRequest>,
) -> Reply {
    let post = state
        .accounts
        .create_post(&ctx.0, body.into_inner().into_data())
        .await?;
    Ok(ok(post))
}

pub async fn record_visit(
    state: web::Data<AppState>,
    ctx: RequestContext,
    body: Body<RecordVisitRequest>,
) -> Reply {
    let recorded = state
        .accounts
        .record_visit(&ctx.0, body.into_inner().into_data())
        .await?;
    Ok(ok(json!({ "recorded": recorded })))
}

pub async fn list_notifications(
    state: web::Data<AppState>,
    ctx: RequestContext,
    body: Body<ListNotificationsRequest>,
) -> Reply {
    let notifications = state
        .accounts
        .list_notifications(&ctx.0, body.into_inner().into_data())
        .await?;
    Ok(ok(json!({ "notifications": notifications })))
}

pub async fn mark_notifications_read(state: web::Data<AppState>, ctx: RequestContext) -> Reply {
    let updated = state.accounts.mark_notifications_read(&ctx.0).await?;
    Ok(ok(json!({ "updated": updated })))
}
