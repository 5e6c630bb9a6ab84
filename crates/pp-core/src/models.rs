//! # Domain Models
//!
//! These structs represent the core entities of picpop.
//! IDs are opaque strings; the ones we mint are UUID v7 so they sort by time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Longest accepted `mediaUrl`.
pub const MEDIA_URL_MAX_LEN: usize = 2048;

/// Handle shown on feedback when neither the post nor the account carries one.
pub const FALLBACK_HANDLE: &str = "someone";

/// Handle shown on a visit when neither the link nor the account carries one.
pub const VISIT_FALLBACK_HANDLE: &str = "your link";

/// Reason code that requires free text.
pub const REASON_OTHER: &str = "Other";

/// Reason stored on every block created by a report.
pub const BLOCK_REASON_REPORTED: &str = "Reported feedback";

/// Mints a new time-ordered identifier.
pub fn new_id() -> String {
    Uuid::now_v7().to_string()
}

/// A signed-in user. Created on first sign-in; the handle is claimed later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    /// Display casing as claimed; uniqueness is on the lowercased form
    pub handle: Option<String>,
    pub push_token: Option<String>,
    pub push_token_updated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            handle: None,
            push_token: None,
            push_token_updated_at: None,
            created_at: Utc::now(),
        }
    }

    /// The push token, if one is registered and non-blank.
    pub fn deliverable_token(&self) -> Option<&str> {
        self.push_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

/// An image published by an Account to collect reactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub owner_account_id: String,
    pub media_url: String,
    /// Owner's handle at the time the post was created
    pub owner_handle: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// What an event points at: a Post, or an Account's inbox. Never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventTarget {
    Post {
        #[serde(rename = "postId")]
        post_id: String,
    },
    Recipient {
        #[serde(rename = "recipientAccountId")]
        recipient_account_id: String,
    },
}

impl EventTarget {
    /// Builds a target from the two optional request fields.
    /// Blank strings count as absent.
    pub fn from_parts(
        post_id: Option<String>,
        recipient_account_id: Option<String>,
    ) -> Result<Self, AppError> {
        let post_id = post_id.filter(|s| !s.trim().is_empty());
        let recipient_account_id = recipient_account_id.filter(|s| !s.trim().is_empty());
        match (post_id, recipient_account_id) {
            (Some(post_id), None) => Ok(EventTarget::Post { post_id }),
            (None, Some(recipient_account_id)) => Ok(EventTarget::Recipient { recipient_account_id }),
            (Some(_), Some(_)) => Err(AppError::invalid(
                "Provide postId or recipientAccountId, not both",
            )),
            (None, None) => Err(AppError::invalid(
                "Either postId or recipientAccountId is required",
            )),
        }
    }

    pub fn post_id(&self) -> Option<&str> {
        match self {
            EventTarget::Post { post_id } => Some(post_id),
            EventTarget::Recipient { .. } => None,
        }
    }

    pub fn recipient_account_id(&self) -> Option<&str> {
        match self {
            EventTarget::Recipient { recipient_account_id } => Some(recipient_account_id),
            EventTarget::Post { .. } => None,
        }
    }
}

/// A reaction image sent to a Post or straight to someone's inbox.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackEvent {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub media_url: String,
    pub submitter_account_id: Option<String>,
    pub target: EventTarget,
    /// Reply threading; only ever set for Post targets
    pub parent_id: Option<String>,
}

/// Someone opened a feedback-collection link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitEvent {
    pub id: String,
    pub created_at: DateTime<Utc>,
    /// Handle displayed on the visited link
    pub handle: Option<String>,
    pub target: EventTarget,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Feedback,
    Visit,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Feedback => "feedback",
            NotificationKind::Visit => "visit",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "feedback" => Some(NotificationKind::Feedback),
            "visit" => Some(NotificationKind::Visit),
            _ => None,
        }
    }
}

/// An inbox entry. Only the notification pipeline creates these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub recipient_account_id: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub kind: NotificationKind,
    pub related_post_id: Option<String>,
    pub related_feedback_id: Option<String>,
    pub handle: Option<String>,
    pub media_url: Option<String>,
    /// `<kind>:<event id>`; at most one notification per source event
    pub source_event_id: String,
}

/// A user report against a FeedbackEvent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbuseReport {
    pub id: String,
    pub feedback_event_id: String,
    pub reason_code: String,
    /// Only kept when `reason_code` is "Other"
    pub other_reason: Option<String>,
    pub reporter_network_id: String,
    pub created_at: DateTime<Utc>,
}

/// Represents a moderation block against a network identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockedNetworkIdentity {
    /// Normalized form of `network_id`, used as the storage key
    pub key: String,
    pub network_id: String,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

/// Which append-only log an outbox entry announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Feedback,
    Visit,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Feedback => "feedback",
            EventKind::Visit => "visit",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "feedback" => Some(EventKind::Feedback),
            "visit" => Some(EventKind::Visit),
            _ => None,
        }
    }
}

/// A pending announcement that an event was appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboxEntry {
    pub seq: i64,
    pub kind: EventKind,
    pub event_id: String,
}

/// What the push relay receives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushMessage {
    pub token: String,
    pub title: String,
    pub body: String,
    pub deep_link: String,
    pub data: std::collections::BTreeMap<String, String>,
}

/// Outcome of a handle claim attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleClaim {
    Claimed,
    /// Another account holds the lowercased handle
    Taken,
    /// This account already has a handle
    AlreadySet,
    /// No such account
    UnknownAccount,
}
