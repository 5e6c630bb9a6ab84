use pp_core::{
    EventTarget, FeedbackEvent, NotificationKind, VisitEvent, FALLBACK_HANDLE, VISIT_FALLBACK_HANDLE,
};

use super::inbox::{InboxEntry, InboxWriter};
use super::push::{PushDispatcher, PushOutcome};
use super::resolver::RecipientResolver;

const FEEDBACK_TITLE: &str = "New feedback";
const VISIT_TITLE: &str = "Link viewed";

/// Result of one pipeline run. Informational only; nothing is raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// Inbox entry written; push outcome attached
    Notified(PushOutcome),
    /// Entry for this source event already existed
    Duplicate,
    /// No one to notify (missing post or account)
    Skipped,
    /// Storage failure while resolving or writing
    Failed,
}

/// Resolve -> write inbox -> try push, for each newly appended event.
pub struct NotificationPipeline {
    resolver: RecipientResolver,
    inbox: InboxWriter,
    push: PushDispatcher,
}

impl NotificationPipeline {
    pub fn new(resolver: RecipientResolver, inbox: InboxWriter, push: PushDispatcher) -> Self {
        Self {
            resolver,
            inbox,
            push,
        }
    }

    pub async fn on_feedback_created(&self, event: &FeedbackEvent) -> PipelineOutcome {
        let post_id = event.target.post_id();
        let job = Job {
            kind: NotificationKind::Feedback,
            source_event_id: format!("feedback:{}", event.id),
            target: &event.target,
            event_handle: None,
            fallback_handle: FALLBACK_HANDLE,
            title: FEEDBACK_TITLE,
            post_id,
            feedback_id: Some(&event.id),
            media_url: Some(&event.media_url),
        };
        self.run(job, |handle| match post_id {
            Some(_) => format!("Someone reacted to your post @{handle}"),
            None => format!("Someone sent you feedback @{handle}"),
        })
        .await
    }

    pub async fn on_visit_created(&self, event: &VisitEvent) -> PipelineOutcome {
        let job = Job {
            kind: NotificationKind::Visit,
            source_event_id: format!("visit:{}", event.id),
            target: &event.target,
            event_handle: event.handle.as_deref(),
            fallback_handle: VISIT_FALLBACK_HANDLE,
            title: VISIT_TITLE,
            post_id: event.target.post_id(),
            feedback_id: None,
            media_url: None,
        };
        self.run(job, |handle| format!("Someone viewed your feedback link @{handle}"))
            .await
    }

    async fn run(&self, job: Job<'_>, body: impl FnOnce(&str) -> String) -> PipelineOutcome {
        let recipient = match self
            .resolver
            .resolve(job.target, job.event_handle, job.fallback_handle)
            .await
        {
            Ok(recipient) => recipient,
            Err(reason) => {
                log::warn!("{}: nothing to notify ({reason})", job.source_event_id);
                return PipelineOutcome::Skipped;
            }
        };

        let message = body(&recipient.display_handle);
        let entry = InboxEntry {
            recipient_account_id: recipient.account.id.clone(),
            kind: job.kind,
            message: message.clone(),
            display_handle: recipient.display_handle.clone(),
            related_post_id: job.post_id.map(String::from),
            related_feedback_id: job.feedback_id.map(String::from),
            media_url: job.media_url.map(String::from),
            source_event_id: job.source_event_id.clone(),
        };

        match self.inbox.write(entry).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                log::info!("{}: inbox entry already written", job.source_event_id);
                return PipelineOutcome::Duplicate;
            }
            Err(err) => {
                log::error!("{}: inbox write failed: {err:#}", job.source_event_id);
                return PipelineOutcome::Failed;
            }
        }

        let pushed = self
            .push
            .dispatch(
                &recipient.account,
                job.kind,
                job.title,
                &message,
                job.post_id,
                job.feedback_id,
            )
            .await;
        PipelineOutcome::Notified(pushed)
    }
}

struct Job<'a> {
    kind: NotificationKind,
    source_event_id: String,
    target: &'a EventTarget,
    event_handle: Option<&'a str>,
    fallback_handle: &'static str,
    title: &'static str,
    post_id: Option<&'a str>,
    feedback_id: Option<&'a str>,
    media_url: Option<&'a str>,
}
