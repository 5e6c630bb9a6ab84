use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use pp_core::{
    EventKind, EventOutbox, FeedbackEvent, FeedbackRepo, MalformedRecord, OutboxEntry, VisitEvent, VisitRepo,
};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, Transaction};

use crate::{target_columns, target_from_columns, SqliteStore};

fn feedback_from_row(row: &SqliteRow) -> anyhow::Result<FeedbackEvent> {
    Ok(FeedbackEvent {
        id: row.try_get("id")?,
        created_at: row.try_get("created_at")?,
        media_url: row.try_get("media_url")?,
        submitter_account_id: row.try_get("submitter_account_id")?,
        target: target_from_columns(row.try_get("post_id")?, row.try_get("recipient_account_id")?)?,
        parent_id: row.try_get("parent_id")?,
    })
}

fn visit_from_row(row: &SqliteRow) -> anyhow::Result<VisitEvent> {
    Ok(VisitEvent {
        id: row.try_get("id")?,
        created_at: row.try_get("created_at")?,
        handle: row.try_get("handle")?,
        target: target_from_columns(row.try_get("post_id")?, row.try_get("recipient_account_id")?)?,
    })
}

/// Announces a committed event to the worker. Runs inside the caller's
/// transaction so an event is never stored without its entry.
async fn enqueue(tx: &mut Transaction<'_, Sqlite>, kind: EventKind, event_id: &str) -> sqlx::Result<()> {
    sqlx::query("INSERT INTO event_outbox (event_kind, event_id, enqueued_at) VALUES (?, ?, ?)")
        .bind(kind.as_str())
        .bind(event_id)
        .bind(Utc::now())
        .execute(&mut **tx)
        .await?;
    Ok(())
}

#[async_trait]
impl FeedbackRepo for SqliteStore {
    async fn insert_feedback(&self, event: FeedbackEvent) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;
        let (post_id, recipient_account_id) = target_columns(&event.target);

        sqlx::query(
            "INSERT INTO feedback_events (id, created_at, media_url, submitter_account_id, post_id, recipient_account_id, parent_id) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&event.id)
        .bind(event.created_at)
        .bind(&event.media_url)
        .bind(&event.submitter_account_id)
        .bind(post_id)
        .bind(recipient_account_id)
        .bind(&event.parent_id)
        .execute(&mut *tx)
        .await?;

        enqueue(&mut tx, EventKind::Feedback, &event.id).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn get_feedback(&self, id: &str) -> anyhow::Result<Option<FeedbackEvent>> {
        let row = sqlx::query(
            "SELECT id, created_at, media_url, submitter_account_id, post_id, recipient_account_id, parent_id \
             FROM feedback_events WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref()
            .map(|row| feedback_from_row(row).with_context(|| MalformedRecord(format!("feedback {id}"))))
            .transpose()
    }

    async fn delete_feedback(&self, id: &str) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM feedback_events WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_feedback_and_notifications(&self, id: &str) -> anyhow::Result<bool> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query("DELETE FROM notifications WHERE related_feedback_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let deleted = sqlx::query("DELETE FROM feedback_events WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        log::debug!(
            "deleted feedback {id} with {} notification(s)",
            removed.rows_affected()
        );
        Ok(deleted.rows_affected() > 0)
    }
}

#[async_trait]
impl VisitRepo for SqliteStore {
    async fn insert_visit(&self, event: VisitEvent) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;
        let (post_id, recipient_account_id) = target_columns(&event.target);

        sqlx::query("INSERT INTO visit_events (id, created_at, handle, post_id, recipient_account_id) VALUES (?, ?, ?, ?, ?)")
            .bind(&event.id)
            .bind(event.created_at)
            .bind(&event.handle)
            .bind(post_id)
            .bind(recipient_account_id)
            .execute(&mut *tx)
            .await?;

        enqueue(&mut tx, EventKind::Visit, &event.id).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn get_visit(&self, id: &str) -> anyhow::Result<Option<VisitEvent>> {
        let row = sqlx::query("SELECT id, created_at, handle, post_id, recipient_account_id FROM visit_events WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref()
            .map(|row| visit_from_row(row).with_context(|| MalformedRecord(format!("visit {id}"))))
            .transpose()
    }
}

#[async_trait]
impl EventOutbox for SqliteStore {
    async fn pending(&self, limit: i64) -> anyhow::Result<Vec<OutboxEntry>> {
        let rows = sqlx::query("SELECT seq, event_kind, event_id FROM event_outbox WHERE processed_at IS NULL ORDER BY seq LIMIT ?")
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                let kind: String = row.try_get("event_kind")?;
                Ok(OutboxEntry {
                    seq: row.try_get("seq")?,
                    kind: EventKind::parse(&kind)
                        .ok_or_else(|| anyhow::anyhow!("unknown outbox event kind {kind}"))?,
                    event_id: row.try_get("event_id")?,
                })
            })
            .collect()
    }

    async fn mark_processed(&self, seq: i64) -> anyhow::Result<()> {
        sqlx::query("UPDATE event_outbox SET processed_at = ? WHERE seq = ?")
            .bind(Utc::now())
            .bind(seq)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
