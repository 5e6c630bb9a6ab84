//! # Feedback gateway
//!
//! The callable operations around feedback: submit, report, and the two
//! delete paths. Validation and authorization happen before any write.

use std::sync::Arc;

use chrono::Utc;
use pp_core::{
    new_id, AccountRepo, AppError, EventTarget, FeedbackEvent, FeedbackRepo, PostRepo,
};
use serde::Deserialize;

use crate::abuse::{AbuseBlocker, ReportInput};
use crate::context::{require_field, storage_failure, validate_media_url, CallContext};

const SUBMIT_FAILED: &str = "Failed to post. Please try again.";
const DELETE_FAILED: &str = "Failed to delete. Please try again.";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitFeedbackRequest {
    pub media_url: Option<String>,
    pub post_id: Option<String>,
    pub recipient_account_id: Option<String>,
    pub parent_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportFeedbackRequest {
    #[serde(alias = "feedbackId")]
    pub feedback_event_id: Option<String>,
    #[serde(alias = "reason")]
    pub reason_code: Option<String>,
    pub other_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRefRequest {
    #[serde(alias = "feedbackId")]
    pub feedback_event_id: Option<String>,
}

pub struct FeedbackGateway {
    accounts: Arc<dyn AccountRepo>,
    posts: Arc<dyn PostRepo>,
    feedback: Arc<dyn FeedbackRepo>,
    abuse: Arc<AbuseBlocker>,
}

impl FeedbackGateway {
    pub fn new(
        accounts: Arc<dyn AccountRepo>,
        posts: Arc<dyn PostRepo>,
        feedback: Arc<dyn FeedbackRepo>,
        abuse: Arc<AbuseBlocker>,
    ) -> Self {
        Self {
            accounts,
            posts,
            feedback,
            abuse,
        }
    }

    /// Checks run in a fixed order: media url, target shape, network block,
    /// target existence.
    pub async fn submit_feedback(
        &self,
        ctx: &CallContext,
        req: SubmitFeedbackRequest,
    ) -> Result<FeedbackEvent, AppError> {
        let media_url = validate_media_url(req.media_url.as_deref())?.to_string();
        let target = EventTarget::from_parts(req.post_id, req.recipient_account_id)?;

        let blocked = self
            .abuse
            .is_blocked(&ctx.network)
            .await
            .map_err(storage_failure("submitFeedback", SUBMIT_FAILED))?;
        if blocked {
            log::info!("submission refused for blocked identity {}", ctx.network.block_key());
            return Err(AppError::denied(
                "You cannot submit feedback. Your access has been restricted.",
            ));
        }

        match &target {
            EventTarget::Post { post_id } => {
                let post = self
                    .posts
                    .get_post(post_id)
                    .await
                    .map_err(storage_failure("submitFeedback", SUBMIT_FAILED))?;
                if post.is_none() {
                    return Err(AppError::not_found("Post not found. The link may have expired."));
                }
            }
            EventTarget::Recipient { recipient_account_id } => {
                let account = self
                    .accounts
                    .get_account(recipient_account_id)
                    .await
                    .map_err(storage_failure("submitFeedback", SUBMIT_FAILED))?;
                if account.is_none() {
                    return Err(AppError::not_found("User not found."));
                }
            }
        }

        // Reply threading only exists under posts
        let parent_id = match target {
            EventTarget::Post { .. } => req.parent_id.filter(|p| !p.trim().is_empty()),
            EventTarget::Recipient { .. } => None,
        };

        let event = FeedbackEvent {
            id: new_id(),
            created_at: Utc::now(),
            media_url,
            submitter_account_id: ctx.caller.clone(),
            target,
            parent_id,
        };
        self.feedback
            .insert_feedback(event.clone())
            .await
            .map_err(storage_failure("submitFeedback", SUBMIT_FAILED))?;

        Ok(event)
    }

    /// No authorization: reporting is open to anyone, and the reporter's own
    /// network identity is what gets blocked.
    pub async fn report_feedback(
        &self,
        ctx: &CallContext,
        req: ReportFeedbackRequest,
    ) -> Result<(), AppError> {
        let (Some(feedback_event_id), Some(reason_code)) = (
            req.feedback_event_id.as_deref().map(str::trim).filter(|s| !s.is_empty()),
            req.reason_code.as_deref().map(str::trim).filter(|s| !s.is_empty()),
        ) else {
            return Err(AppError::invalid("feedbackEventId and reasonCode are required"));
        };

        let input = ReportInput::new(feedback_event_id, reason_code, req.other_reason.as_deref())?;
        self.abuse.report_and_block(input, &ctx.network).await?;
        Ok(())
    }

    /// Only the inbox owner may delete feedback sent to their inbox.
    /// Linked notifications go with it.
    pub async fn delete_inbox_feedback(
        &self,
        ctx: &CallContext,
        req: FeedbackRefRequest,
    ) -> Result<(), AppError> {
        let feedback_id = require_field(req.feedback_event_id.as_deref(), "feedbackEventId")?;
        let caller = ctx.require_caller("delete")?;
        let event = self.load_feedback(feedback_id).await?;

        if event.target.recipient_account_id() != Some(caller) {
            return Err(AppError::denied("Only the recipient can delete this feedback"));
        }

        self.feedback
            .delete_feedback_and_notifications(feedback_id)
            .await
            .map_err(storage_failure("deleteInboxFeedback", DELETE_FAILED))?;
        log::info!("inbox feedback {feedback_id} deleted by {caller}");
        Ok(())
    }

    /// Only the owner of the post a reaction belongs to may delete it.
    pub async fn delete_feedback(
        &self,
        ctx: &CallContext,
        req: FeedbackRefRequest,
    ) -> Result<(), AppError> {
        let feedback_id = require_field(req.feedback_event_id.as_deref(), "feedbackEventId")?;
        let caller = ctx.require_caller("delete")?;
        let event = self.load_feedback(feedback_id).await?;

        let post_id = event
            .target
            .post_id()
            .ok_or_else(|| AppError::invalid("Feedback is not attached to a post"))?;
        let post = self
            .posts
            .get_post(post_id)
            .await
            .map_err(storage_failure("deleteFeedback", DELETE_FAILED))?
            .ok_or_else(|| AppError::not_found("Post not found"))?;

        if post.owner_account_id != caller {
            return Err(AppError::denied("Only the post owner can delete"));
        }

        self.feedback
            .delete_feedback(feedback_id)
            .await
            .map_err(storage_failure("deleteFeedback", DELETE_FAILED))?;
        log::info!("feedback {feedback_id} on post {post_id} deleted by owner");
        Ok(())
    }

    async fn load_feedback(&self, id: &str) -> Result<FeedbackEvent, AppError> {
        self.feedback
            .get_feedback(id)
            .await
            .map_err(storage_failure("loadFeedback", DELETE_FAILED))?
            .ok_or_else(|| AppError::not_found("Feedback not found"))
    }
}
