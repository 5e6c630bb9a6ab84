use std::sync::Arc;

use chrono::Utc;
use pp_core::{new_id, Notification, NotificationKind, NotificationRepo};

/// Everything needed to write one inbox entry.
#[derive(Debug, Clone)]
pub struct InboxEntry {
    pub recipient_account_id: String,
    pub kind: NotificationKind,
    pub message: String,
    pub display_handle: String,
    pub related_post_id: Option<String>,
    pub related_feedback_id: Option<String>,
    pub media_url: Option<String>,
    /// Event the entry was derived from; used as the dedup key
    pub source_event_id: String,
}

/// Persists inbox entries. Runs whether or not push will be attempted.
pub struct InboxWriter {
    notifications: Arc<dyn NotificationRepo>,
}

impl InboxWriter {
    pub fn new(notifications: Arc<dyn NotificationRepo>) -> Self {
        Self { notifications }
    }

    /// Returns the stored notification, or `None` if this source event was
    /// already written (redelivery).
    pub async fn write(&self, entry: InboxEntry) -> anyhow::Result<Option<Notification>> {
        let notification = Notification {
            id: new_id(),
            recipient_account_id: entry.recipient_account_id,
            message: entry.message,
            is_read: false,
            created_at: Utc::now(),
            kind: entry.kind,
            related_post_id: entry.related_post_id,
            related_feedback_id: entry.related_feedback_id,
            handle: Some(entry.display_handle),
            media_url: entry.media_url,
            source_event_id: entry.source_event_id,
        };

        let inserted = self
            .notifications
            .insert_notification(notification.clone())
            .await?;
        Ok(inserted.then_some(notification))
    }
}
