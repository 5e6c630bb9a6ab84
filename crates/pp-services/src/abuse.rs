//! Abuse reporting: record the report and block the reporter's network
//! identity as one atomic unit.

use std::sync::Arc;

use chrono::Utc;
use pp_core::{
    new_id, AbuseReport, AppError, BlockedNetworkIdentity, ModerationRepo, NetworkIdentity,
    BLOCK_REASON_REPORTED, REASON_OTHER,
};

use crate::context::storage_failure;

/// Normalized report contents, already validated.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportInput {
    pub feedback_event_id: String,
    pub reason_code: String,
    pub other_reason: Option<String>,
}

impl ReportInput {
    /// Free text is required for "Other" and dropped for every other reason.
    pub fn new(
        feedback_event_id: &str,
        reason_code: &str,
        other_reason: Option<&str>,
    ) -> Result<Self, AppError> {
        let other_reason = if reason_code == REASON_OTHER {
            let text = other_reason
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .ok_or_else(|| AppError::invalid("Describe the reason when choosing Other"))?;
            Some(text.to_string())
        } else {
            None
        };

        Ok(Self {
            feedback_event_id: feedback_event_id.to_string(),
            reason_code: reason_code.to_string(),
            other_reason,
        })
    }
}

pub struct AbuseBlocker {
    moderation: Arc<dyn ModerationRepo>,
}

impl AbuseBlocker {
    pub fn new(moderation: Arc<dyn ModerationRepo>) -> Self {
        Self { moderation }
    }

    /// Stores the report and (re)blocks `reporter`. Re-reports overwrite the
    /// existing block row, so the latest timestamp wins.
    pub async fn report_and_block(
        &self,
        input: ReportInput,
        reporter: &NetworkIdentity,
    ) -> Result<AbuseReport, AppError> {
        let now = Utc::now();
        let report = AbuseReport {
            id: new_id(),
            feedback_event_id: input.feedback_event_id,
            reason_code: input.reason_code,
            other_reason: input.other_reason,
            reporter_network_id: reporter.as_str().to_string(),
            created_at: now,
        };
        let block = BlockedNetworkIdentity {
            key: reporter.block_key(),
            network_id: reporter.as_str().to_string(),
            reason: BLOCK_REASON_REPORTED.to_string(),
            created_at: now,
        };

        self.moderation
            .record_report_and_block(report.clone(), block)
            .await
            .map_err(storage_failure("reportFeedback", "Report failed"))?;

        log::info!("feedback {} reported; blocked {}", report.feedback_event_id, reporter.block_key());
        Ok(report)
    }

    pub async fn is_blocked(&self, identity: &NetworkIdentity) -> anyhow::Result<bool> {
        self.moderation.is_blocked(&identity.block_key()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pp_core::MockModerationRepo;

    #[test]
    fn other_requires_text_and_others_drop_it() {
        assert!(matches!(
            ReportInput::new("f1", "Other", Some("  ")),
            Err(AppError::InvalidArgument(_))
        ));

        let other = ReportInput::new("f1", "Other", Some(" rude ")).unwrap();
        assert_eq!(other.other_reason.as_deref(), Some("rude"));

        let spam = ReportInput::new("f1", "Spam", Some("ignored")).unwrap();
        assert_eq!(spam.other_reason, None);
    }

    #[tokio::test]
    async fn report_and_block_share_one_call() {
        let mut moderation = MockModerationRepo::new();
        moderation
            .expect_record_report_and_block()
            .withf(|report, block| {
                report.reporter_network_id == "1.2.3.4"
                    && block.key == "1_2_3_4"
                    && block.reason == "Reported feedback"
                    && report.created_at == block.created_at
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let blocker = AbuseBlocker::new(Arc::new(moderation));
        let input = ReportInput::new("f1", "Spam", None).unwrap();
        let report = blocker
            .report_and_block(input, &NetworkIdentity::new("1.2.3.4"))
            .await
            .unwrap();
        assert_eq!(report.feedback_event_id, "f1");
    }

    #[tokio::test]
    async fn transaction_failure_is_internal() {
        let mut moderation = MockModerationRepo::new();
        moderation
            .expect_record_report_and_block()
            .returning(|_, _| Err(anyhow::anyhow!("database is locked")));

        let blocker = AbuseBlocker::new(Arc::new(moderation));
        let input = ReportInput::new("f1", "Spam", None).unwrap();
        let err = blocker
            .report_and_block(input, &NetworkIdentity::new("1.2.3.4"))
            .await
            .unwrap_err();
        assert_eq!(err, AppError::Internal("Report failed".into()));
    }
}
