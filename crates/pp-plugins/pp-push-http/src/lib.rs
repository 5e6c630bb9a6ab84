//! # pp-push-http
//!
//! `PushSender` implementations. `HttpPushSender` hands each message to a
//! push relay as JSON; `DisabledPushSender` is used when no relay is
//! configured and reports every send as a failure so the pipeline logs it.

use std::time::Duration;

use async_trait::async_trait;
use pp_core::models::PushMessage;
use pp_core::traits::PushSender;
use reqwest::Client;

pub struct HttpPushSender {
    client: Client,
    endpoint: String,
}

impl HttpPushSender {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let endpoint = endpoint.into();
        reqwest::Url::parse(&endpoint)
            .map_err(|e| anyhow::anyhow!("invalid push endpoint {endpoint}: {e}"))?;
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl PushSender for HttpPushSender {
    async fn send(&self, message: &PushMessage) -> anyhow::Result<()> {
        let response = self.client.post(&self.endpoint).json(message).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("push relay returned {status}: {body}");
        }
        log::debug!("push accepted by relay for link {}", message.deep_link);
        Ok(())
    }
}

/// Stand-in when `push_endpoint` is unset.
#[derive(Debug, Default)]
pub struct DisabledPushSender;

#[async_trait]
impl PushSender for DisabledPushSender {
    async fn send(&self, _message: &PushMessage) -> anyhow::Result<()> {
        anyhow::bail!("push delivery is not configured")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn message() -> PushMessage {
        PushMessage {
            token: "tok".into(),
            title: "New feedback".into(),
            body: "Someone reacted to your post @someone".into(),
            deep_link: "/f?postId=p1".into(),
            data: BTreeMap::new(),
        }
    }

    #[test]
    fn rejects_unparseable_endpoint() {
        assert!(HttpPushSender::new("not a url", Duration::from_secs(1)).is_err());
    }

    #[test]
    fn keeps_endpoint() {
        let sender = HttpPushSender::new("https://push.example.com/send", Duration::from_secs(1)).unwrap();
        assert_eq!(sender.endpoint(), "https://push.example.com/send");
    }

    #[tokio::test]
    async fn disabled_sender_always_fails() {
        let err = DisabledPushSender.send(&message()).await.unwrap_err();
        assert!(err.to_string().contains("not configured"));
    }

    #[tokio::test]
    async fn unreachable_relay_is_an_error() {
        // Port 9 on loopback: nothing listens, connection is refused.
        let sender = HttpPushSender::new("http://127.0.0.1:9/send", Duration::from_millis(500)).unwrap();
        assert!(sender.send(&message()).await.is_err());
    }
}
