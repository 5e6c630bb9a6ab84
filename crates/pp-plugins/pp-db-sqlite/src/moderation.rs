use async_trait::async_trait;
use pp_core::{AbuseReport, BlockedNetworkIdentity, ModerationRepo};

use crate::SqliteStore;

#[async_trait]
impl ModerationRepo for SqliteStore {
    async fn is_blocked(&self, key: &str) -> anyhow::Result<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM blocked_network_identities WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }

    async fn record_report_and_block(
        &self,
        report: AbuseReport,
        block: BlockedNetworkIdentity,
    ) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO abuse_reports (id, feedback_event_id, reason_code, other_reason, reporter_network_id, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(report.id)
        .bind(report.feedback_event_id)
        .bind(report.reason_code)
        .bind(report.other_reason)
        .bind(report.reporter_network_id)
        .bind(report.created_at)
        .execute(&mut *tx)
        .await?;

        // Latest report wins
        sqlx::query(
            "INSERT INTO blocked_network_identities (key, network_id, reason, created_at) VALUES (?, ?, ?, ?) \
             ON CONFLICT(key) DO UPDATE SET network_id = excluded.network_id, reason = excluded.reason, created_at = excluded.created_at",
        )
        .bind(block.key)
        .bind(block.network_id)
        .bind(block.reason)
        .bind(block.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}
