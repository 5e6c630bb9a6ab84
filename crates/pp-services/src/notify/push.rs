use std::collections::BTreeMap;
use std::sync::Arc;

use pp_core::{Account, NotificationKind, PushMessage, PushSender};

/// Best-effort push delivery. Never fails outward.
pub struct PushDispatcher {
    sender: Arc<dyn PushSender>,
}

/// What happened to a push attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Sent,
    NoToken,
    Failed,
}

impl PushDispatcher {
    pub fn new(sender: Arc<dyn PushSender>) -> Self {
        Self { sender }
    }

    pub async fn dispatch(
        &self,
        recipient: &Account,
        kind: NotificationKind,
        title: &str,
        body: &str,
        post_id: Option<&str>,
        feedback_id: Option<&str>,
    ) -> PushOutcome {
        let Some(token) = recipient.deliverable_token() else {
            return PushOutcome::NoToken;
        };

        let message = build_message(token, kind, title, body, post_id, feedback_id);
        match self.sender.send(&message).await {
            Ok(()) => {
                log::info!("{} push sent to {}", kind.as_str(), recipient.id);
                PushOutcome::Sent
            }
            Err(err) => {
                log::error!("{} push to {} failed: {err:#}", kind.as_str(), recipient.id);
                PushOutcome::Failed
            }
        }
    }
}

/// `/f?postId=<id>` when a post is involved, else `/inbox`.
pub fn deep_link(post_id: Option<&str>) -> String {
    match post_id {
        Some(id) => format!("/f?postId={id}"),
        None => "/inbox".to_string(),
    }
}

pub fn build_message(
    token: &str,
    kind: NotificationKind,
    title: &str,
    body: &str,
    post_id: Option<&str>,
    feedback_id: Option<&str>,
) -> PushMessage {
    let link = deep_link(post_id);

    let mut data = BTreeMap::new();
    data.insert("type".to_string(), kind.as_str().to_string());
    data.insert("postId".to_string(), post_id.unwrap_or_default().to_string());
    if let Some(feedback_id) = feedback_id {
        data.insert("feedbackId".to_string(), feedback_id.to_string());
    }
    data.insert("link".to_string(), link.clone());

    PushMessage {
        token: token.to_string(),
        title: title.to_string(),
        body: body.to_string(),
        deep_link: link,
        data,
    }
}
