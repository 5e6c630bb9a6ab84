//! # pp-db-sqlite Implementation
//!
//! This crate implements the data mapping between the SQLite relational model
//! and the `pp-core` domain models. One `SqliteStore` implements every
//! repository port; the binary opens it once and shares it behind `Arc`s.

mod accounts;
mod events;
mod inbox;
mod moderation;

use std::str::FromStr;
use std::time::Duration;

use pp_core::EventTarget;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);
const FILE_POOL_SIZE: u32 = 8;

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens the pool and applies pending migrations.
    ///
    /// In-memory databases live and die with their connection, so they get
    /// a single connection that is never recycled.
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let in_memory = url.contains(":memory:") || url.contains("mode=memory");

        let mut options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .busy_timeout(BUSY_TIMEOUT);
        if !in_memory {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { FILE_POOL_SIZE })
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        log::info!("sqlite store ready at {url}");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Waits for checked-out connections to return, then closes the pool.
    pub async fn close(&self) {
        self.pool.close().await;
        log::info!("sqlite store closed");
    }
}

// Helper for the two-column target encoding
fn target_columns(target: &EventTarget) -> (Option<&str>, Option<&str>) {
    (target.post_id(), target.recipient_account_id())
}

fn target_from_columns(
    post_id: Option<String>,
    recipient_account_id: Option<String>,
) -> anyhow::Result<EventTarget> {
    match (post_id, recipient_account_id) {
        (Some(post_id), None) => Ok(EventTarget::Post { post_id }),
        (None, Some(recipient_account_id)) => Ok(EventTarget::Recipient { recipient_account_id }),
        _ => anyhow::bail!("malformed event target"),
    }
}
