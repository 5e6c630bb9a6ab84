//! # picpop Binary
//!
//! The entry point that assembles the application: configuration, the
//! SQLite store, identity and push plugins, the callable HTTP surface, and
//! the outbox worker that drives notifications.

use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use pp_api::handlers::AppState;
use pp_api::middleware::{cors_policy, security_headers, standard_middleware};
use pp_config::AppConfig;
use pp_core::{IdentityProvider, PushSender};
use pp_services::notify::{InboxWriter, PushDispatcher, RecipientResolver};
use pp_services::{AbuseBlocker, AccountService, FeedbackGateway, NotificationPipeline, OutboxWorker};
use tokio::sync::watch;

// Feature-gated plugins: each port is filled by whichever plugin is compiled in
#[cfg(feature = "db-sqlite")]
use pp_db_sqlite::SqliteStore;

#[cfg(feature = "auth-simple")]
use pp_auth_simple::SimpleIdentityProvider;

#[cfg(feature = "push-http")]
use pp_push_http::{DisabledPushSender, HttpPushSender};

#[cfg(feature = "push-http")]
fn push_sender(config: &AppConfig) -> anyhow::Result<Arc<dyn PushSender>> {
    match config.push_endpoint() {
        Some(endpoint) => {
            log::info!("push relay: {endpoint}");
            Ok(Arc::new(HttpPushSender::new(endpoint, config.push_timeout())?))
        }
        None => {
            log::warn!("no push endpoint configured; notifications will be inbox-only");
            Ok(Arc::new(DisabledPushSender))
        }
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    env_logger::init_from_env(env_logger::Env::new().default_filter_or(config.log_level.as_str()));

    // 1. Initialize Database Implementation
    #[cfg(feature = "db-sqlite")]
    let store = Arc::new(SqliteStore::connect(&config.database_url).await?);

    // 2. Initialize Identity and Push Implementations
    #[cfg(feature = "auth-simple")]
    let identity: Arc<dyn IdentityProvider> =
        Arc::new(SimpleIdentityProvider::new(&config.session_secret())?);

    #[cfg(feature = "push-http")]
    let push = push_sender(&config)?;

    // 3. Services
    let abuse = Arc::new(AbuseBlocker::new(store.clone()));
    let gateway = FeedbackGateway::new(store.clone(), store.clone(), store.clone(), abuse);
    let accounts = AccountService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        identity.clone(),
    );
    let pipeline = NotificationPipeline::new(
        RecipientResolver::new(store.clone(), store.clone()),
        InboxWriter::new(store.clone()),
        PushDispatcher::new(push),
    );

    // 4. Event trigger layer
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker = OutboxWorker::new(store.clone(), store.clone(), store.clone(), Arc::new(pipeline))
        .with_poll_interval(config.worker_poll_interval())
        .with_batch_size(config.worker_batch_size);
    let worker_handle = tokio::spawn(worker.run(shutdown_rx));

    // 5. Wrap in AppState (dynamic dispatch behind the services)
    let state = web::Data::new(AppState {
        gateway,
        accounts,
        identity,
    });

    let origins = config.cors_origin_list();
    log::info!("picpop starting on http://{}:{} ({})", config.host, config.port, config.app_env);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(cors_policy(&origins))
            .wrap(security_headers())
            .wrap(standard_middleware())
            .configure(pp_api::configure_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    // The server has stopped accepting requests; let the worker finish its batch.
    log::info!("shutting down");
    let _ = shutdown_tx.send(true);
    if let Err(err) = worker_handle.await {
        log::error!("outbox worker ended abnormally: {err}");
    }
    store.close().await;
    Ok(())
}
