//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.
//! Storage ports return `anyhow::Result`; the services layer decides what a
//! failure means for the caller.

use async_trait::async_trait;

use crate::models::{
    AbuseReport, Account, BlockedNetworkIdentity, FeedbackEvent, HandleClaim, Notification,
    OutboxEntry, Post, PushMessage, VisitEvent,
};

/// Accounts and the handle reservation table.
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait AccountRepo: Send + Sync {
    async fn create_account(&self, account: Account) -> anyhow::Result<()>;
    async fn get_account(&self, id: &str) -> anyhow::Result<Option<Account>>;

    /// Reserves `handle` (lowercased) for the account and sets the display
    /// handle, all-or-nothing.
    async fn claim_handle(&self, account_id: &str, handle: &str) -> anyhow::Result<HandleClaim>;

    /// Sets or clears the push token. Returns false when the account is unknown.
    async fn set_push_token(&self, account_id: &str, token: Option<String>) -> anyhow::Result<bool>;
}

#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait PostRepo: Send + Sync {
    async fn create_post(&self, post: Post) -> anyhow::Result<()>;
    async fn get_post(&self, id: &str) -> anyhow::Result<Option<Post>>;
}

/// The feedback event log. Inserts also enqueue an outbox entry.
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait FeedbackRepo: Send + Sync {
    async fn insert_feedback(&self, event: FeedbackEvent) -> anyhow::Result<()>;
    async fn get_feedback(&self, id: &str) -> anyhow::Result<Option<FeedbackEvent>>;

    /// Returns false if nothing was deleted.
    async fn delete_feedback(&self, id: &str) -> anyhow::Result<bool>;

    /// Deletes the event and every notification pointing at it, atomically.
    async fn delete_feedback_and_notifications(&self, id: &str) -> anyhow::Result<bool>;
}

/// The visit event log. Inserts also enqueue an outbox entry.
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait VisitRepo: Send + Sync {
    async fn insert_visit(&self, event: VisitEvent) -> anyhow::Result<()>;
    async fn get_visit(&self, id: &str) -> anyhow::Result<Option<VisitEvent>>;
}

#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait NotificationRepo: Send + Sync {
    /// Returns false when a notification for the same source event exists.
    async fn insert_notification(&self, notification: Notification) -> anyhow::Result<bool>;
    async fn list_notifications(&self, recipient_account_id: &str, limit: i64) -> anyhow::Result<Vec<Notification>>;
    async fn mark_all_read(&self, recipient_account_id: &str) -> anyhow::Result<u64>;
}

/// Abuse reports and network blocks.
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait ModerationRepo: Send + Sync {
    async fn is_blocked(&self, key: &str) -> anyhow::Result<bool>;

    /// Inserts the report and upserts the block in one transaction.
    /// Either both become visible or neither does.
    async fn record_report_and_block(
        &self,
        report: AbuseReport,
        block: BlockedNetworkIdentity,
    ) -> anyhow::Result<()>;
}

/// Pending event announcements, consumed in order.
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait EventOutbox: Send + Sync {
    async fn pending(&self, limit: i64) -> anyhow::Result<Vec<OutboxEntry>>;
    async fn mark_processed(&self, seq: i64) -> anyhow::Result<()>;
}

/// Push delivery contract. The token format is opaque to us.
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait PushSender: Send + Sync {
    async fn send(&self, message: &PushMessage) -> anyhow::Result<()>;
}

/// Identity contract: issues and verifies bearer tokens.
#[cfg_attr(feature = "testing", mockall::automock)]
pub trait IdentityProvider: Send + Sync {
    fn issue_token(&self, account_id: &str) -> String;

    /// Returns the account id the token was issued to.
    fn verify_token(&self, token: &str) -> Option<String>;
}
