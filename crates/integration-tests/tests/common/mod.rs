//! Shared harness: every service wired over one SQLite store, in memory
//! unless a test asks for a file.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use actix_web::web;
use async_trait::async_trait;
use pp_api::AppState;
use pp_auth_simple::SimpleIdentityProvider;
use pp_core::{new_id, IdentityProvider, NetworkIdentity, PushMessage, PushSender};
use pp_db_sqlite::SqliteStore;
use pp_services::accounts::{CreatePostRequest, PushTokenRequest};
use pp_services::notify::{InboxWriter, PushDispatcher, RecipientResolver};
use pp_services::{
    AbuseBlocker, AccountService, CallContext, FeedbackGateway, NotificationPipeline, OutboxWorker,
};
use secrecy::SecretString;

/// Push sender that records what it was given; can be switched to fail.
#[derive(Default)]
pub struct RecordingPush {
    sent: Mutex<Vec<PushMessage>>,
    fail: AtomicBool,
}

impl RecordingPush {
    pub fn fail_all(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<PushMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl PushSender for RecordingPush {
    async fn send(&self, message: &PushMessage) -> anyhow::Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("relay unavailable");
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

/// SQLite file under the temp dir, removed with its WAL files on drop.
pub struct TempDatabase {
    path: PathBuf,
}

impl TempDatabase {
    pub fn new(label: &str) -> Self {
        Self {
            path: std::env::temp_dir().join(format!("picpop-{label}-{}.db", new_id())),
        }
    }

    pub fn url(&self) -> String {
        format!("sqlite://{}", self.path.display())
    }
}

impl Drop for TempDatabase {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{suffix}", self.path.display()));
        }
    }
}

fn services(
    store: &Arc<SqliteStore>,
    identity: &Arc<dyn IdentityProvider>,
) -> (FeedbackGateway, AccountService) {
    let abuse = Arc::new(AbuseBlocker::new(store.clone()));
    let gateway = FeedbackGateway::new(store.clone(), store.clone(), store.clone(), abuse);
    let accounts = AccountService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        identity.clone(),
    );
    (gateway, accounts)
}

pub struct Harness {
    pub store: Arc<SqliteStore>,
    pub push: Arc<RecordingPush>,
    pub identity: Arc<dyn IdentityProvider>,
    pub gateway: FeedbackGateway,
    pub accounts: AccountService,
    pub worker: OutboxWorker,
}

impl Harness {
    pub async fn new() -> Self {
        Self::open("sqlite::memory:").await
    }

    pub async fn open(url: &str) -> Self {
        let store = Arc::new(SqliteStore::connect(url).await.unwrap());
        let push = Arc::new(RecordingPush::default());
        let identity: Arc<dyn IdentityProvider> = Arc::new(
            SimpleIdentityProvider::new(&SecretString::from("integration-secret".to_string()))
                .unwrap(),
        );

        let (gateway, accounts) = services(&store, &identity);
        let pipeline = NotificationPipeline::new(
            RecipientResolver::new(store.clone(), store.clone()),
            InboxWriter::new(store.clone()),
            PushDispatcher::new(push.clone()),
        );
        let worker = OutboxWorker::new(store.clone(), store.clone(), store.clone(), Arc::new(pipeline));

        Self {
            store,
            push,
            identity,
            gateway,
            accounts,
            worker,
        }
    }

    /// HTTP state sharing this harness's store and identity provider.
    pub fn app_state(&self) -> web::Data<AppState> {
        let (gateway, accounts) = services(&self.store, &self.identity);
        web::Data::new(AppState {
            gateway,
            accounts,
            identity: self.identity.clone(),
        })
    }

    /// Signs in a fresh account and returns its context.
    pub async fn sign_in(&self) -> CallContext {
        let session = self.accounts.sign_in().await.unwrap();
        CallContext::signed_in(session.account_id, NetworkIdentity::new("10.0.0.1"))
    }

    pub fn anonymous(ip: &str) -> CallContext {
        CallContext::anonymous(NetworkIdentity::new(ip))
    }

    pub async fn register_token(&self, ctx: &CallContext, token: &str) {
        self.accounts
            .register_push_token(ctx, PushTokenRequest { token: Some(token.to_string()) })
            .await
            .unwrap();
    }

    /// Creates a post owned by `ctx` and returns its id.
    pub async fn post(&self, ctx: &CallContext) -> String {
        self.accounts
            .create_post(
                ctx,
                CreatePostRequest {
                    media_url: Some("https://cdn.example/posts/1.jpg".to_string()),
                },
            )
            .await
            .unwrap()
            .id
    }

    /// Runs the worker until the outbox is empty.
    pub async fn drain(&self) -> usize {
        let mut total = 0;
        loop {
            let n = self.worker.drain_once().await.unwrap();
            if n == 0 {
                return total;
            }
            total += n;
        }
    }

    pub async fn count(&self, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(self.store.pool())
            .await
            .unwrap()
    }
}

pub fn caller(ctx: &CallContext) -> &str {
    ctx.caller.as_deref().unwrap()
}
