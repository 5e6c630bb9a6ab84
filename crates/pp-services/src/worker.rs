//! Outbox consumer: the event trigger layer.
//!
//! Event inserts enqueue an outbox row in the same transaction; this worker
//! picks rows up in order, runs the notification pipeline, then marks them
//! processed. A crash in between means the row is picked up again, and so
//! does a storage error while loading the event.

use std::sync::Arc;
use std::time::Duration;

use pp_core::{EventKind, EventOutbox, FeedbackRepo, MalformedRecord, OutboxEntry, VisitRepo};
use tokio::sync::watch;

use crate::notify::NotificationPipeline;

pub struct OutboxWorker {
    outbox: Arc<dyn EventOutbox>,
    feedback: Arc<dyn FeedbackRepo>,
    visits: Arc<dyn VisitRepo>,
    pipeline: Arc<NotificationPipeline>,
    poll_interval: Duration,
    batch_size: i64,
}

impl OutboxWorker {
    pub fn new(
        outbox: Arc<dyn EventOutbox>,
        feedback: Arc<dyn FeedbackRepo>,
        visits: Arc<dyn VisitRepo>,
        pipeline: Arc<NotificationPipeline>,
    ) -> Self {
        Self {
            outbox,
            feedback,
            visits,
            pipeline,
            poll_interval: Duration::from_secs(1),
            batch_size: 50,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_batch_size(mut self, batch_size: i64) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Polls until `shutdown` flips to true. The batch in flight is finished first.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        log::info!("outbox worker started");
        while !*shutdown.borrow() {
            match self.drain_once().await {
                // A full batch likely means more are waiting
                Ok(n) if n as i64 >= self.batch_size => continue,
                Ok(_) => {}
                Err(err) => log::error!("outbox poll failed: {err:#}"),
            }

            let sender_gone = tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => false,
                changed = shutdown.changed() => changed.is_err(),
            };
            if sender_gone {
                break;
            }
        }
        log::info!("outbox worker stopped");
    }

    /// Processes one batch of pending entries. Returns how many were settled;
    /// entries whose event could not be loaded stay pending for the next poll.
    pub async fn drain_once(&self) -> anyhow::Result<usize> {
        let entries = self.outbox.pending(self.batch_size).await?;
        let mut settled = 0;
        for entry in entries {
            if self.process(&entry).await {
                self.outbox.mark_processed(entry.seq).await?;
                settled += 1;
            }
        }
        Ok(settled)
    }

    /// False when the entry should be retried.
    async fn process(&self, entry: &OutboxEntry) -> bool {
        match entry.kind {
            EventKind::Feedback => match self.feedback.get_feedback(&entry.event_id).await {
                Ok(Some(event)) => {
                    let outcome = self.pipeline.on_feedback_created(&event).await;
                    log::debug!("feedback {}: {outcome:?}", entry.event_id);
                    true
                }
                Ok(None) => {
                    log::warn!("feedback {} gone before notification", entry.event_id);
                    true
                }
                Err(err) => settle_on_error("feedback", &entry.event_id, err),
            },
            EventKind::Visit => match self.visits.get_visit(&entry.event_id).await {
                Ok(Some(event)) => {
                    let outcome = self.pipeline.on_visit_created(&event).await;
                    log::debug!("visit {}: {outcome:?}", entry.event_id);
                    true
                }
                Ok(None) => {
                    log::warn!("visit {} gone before notification", entry.event_id);
                    true
                }
                Err(err) => settle_on_error("visit", &entry.event_id, err),
            },
        }
    }
}

/// Malformed events are dropped; anything else is left for a retry.
fn settle_on_error(kind: &str, event_id: &str, err: anyhow::Error) -> bool {
    if err.downcast_ref::<MalformedRecord>().is_some() {
        log::warn!("skipping {kind} {event_id}: {err:#}");
        true
    } else {
        log::error!("loading {kind} {event_id} failed, will retry: {err:#}");
        false
    }
}
