//! # pp-api
//!
//! The callable HTTP surface for picpop: `POST /api/<operation>` with a
//! `{"data": ...}` body, answered with `{"result": ...}` or `{"error": ...}`.

pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;

use actix_web::{error::JsonPayloadError, web, HttpRequest};
use pp_core::AppError;

pub use error::ApiError;
pub use handlers::AppState;

fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    log::debug!("rejected request body: {err}");
    ApiError(AppError::invalid(format!("Malformed request body: {err}"))).into()
}

/// Configures the callable routes.
///
/// # Developer Note
/// We use a scoped configuration to allow the main binary to mount
/// the API under a different prefix if needed.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().limit(64 * 1024).error_handler(json_error))
        .route("/healthz", web::get().to(handlers::health))
        .service(
            web::scope("/api")
                .route("/submitFeedback", web::post().to(handlers::submit_feedback))
                .route("/reportFeedback", web::post().to(handlers::report_feedback))
                .route("/deleteInboxFeedback", web::post().to(handlers::delete_inbox_feedback))
                .route("/deleteFeedback", web::post().to(handlers::delete_feedback))
                .route("/signIn", web::post().to(handlers::sign_in))
                .route("/getAccount", web::post().to(handlers::get_account))
                .route("/claimHandle", web::post().to(handlers::claim_handle))
                .route("/registerPushToken", web::post().to(handlers::register_push_token))
                .route("/clearPushToken", web::post().to(handlers::clear_push_token))
                .route("/createPost", web::post().to(handlers::create_post))
                .route("/recordVisit", web::post().to(handlers::record_visit))
                .route("/listNotifications", web::post().to(handlers::list_notifications))
                .route("/markNotificationsRead", web::post().to(handlers::mark_notifications_read)),
        );
}
