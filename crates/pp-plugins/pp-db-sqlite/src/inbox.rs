use async_trait::async_trait;
use pp_core::{Notification, NotificationKind, NotificationRepo};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::SqliteStore;

fn notification_from_row(row: &SqliteRow) -> anyhow::Result<Notification> {
    let kind: String = row.try_get("kind")?;
    Ok(Notification {
        id: row.try_get("id")?,
        recipient_account_id: row.try_get("recipient_account_id")?,
        message: row.try_get("message")?,
        is_read: row.try_get("is_read")?,
        created_at: row.try_get("created_at")?,
        kind: NotificationKind::parse(&kind)
            .ok_or_else(|| anyhow::anyhow!("unknown notification kind {kind}"))?,
        related_post_id: row.try_get("related_post_id")?,
        related_feedback_id: row.try_get("related_feedback_id")?,
        handle: row.try_get("handle")?,
        media_url: row.try_get("media_url")?,
        source_event_id: row.try_get("source_event_id")?,
    })
}

#[async_trait]
impl NotificationRepo for SqliteStore {
    async fn insert_notification(&self, notification: Notification) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "INSERT INTO notifications (id, recipient_account_id, message, is_read, created_at, kind, \
             related_post_id, related_feedback_id, handle, media_url, source_event_id) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT(source_event_id) DO NOTHING",
        )
        .bind(notification.id)
        .bind(notification.recipient_account_id)
        .bind(notification.message)
        .bind(notification.is_read)
        .bind(notification.created_at)
        .bind(notification.kind.as_str())
        .bind(notification.related_post_id)
        .bind(notification.related_feedback_id)
        .bind(notification.handle)
        .bind(notification.media_url)
        .bind(notification.source_event_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn list_notifications(&self, recipient_account_id: &str, limit: i64) -> anyhow::Result<Vec<Notification>> {
        let rows = sqlx::query(
            "SELECT id, recipient_account_id, message, is_read, created_at, kind, related_post_id, \
             related_feedback_id, handle, media_url, source_event_id \
             FROM notifications WHERE recipient_account_id = ? ORDER BY created_at DESC, id DESC LIMIT ?",
        )
        .bind(recipient_account_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(notification_from_row).collect()
    }

    async fn mark_all_read(&self, recipient_account_id: &str) -> anyhow::Result<u64> {
        let result = sqlx::query("UPDATE notifications SET is_read = 1 WHERE recipient_account_id = ? AND is_read = 0")
            .bind(recipient_account_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
