use std::sync::Arc;

use pp_core::{Account, AccountRepo, EventTarget, PostRepo};

/// Who gets notified about an event, and how we address them.
#[derive(Debug, Clone, PartialEq)]
pub struct Recipient {
    pub account: Account,
    pub display_handle: String,
}

/// Why no recipient could be resolved. None of these are caller-facing.
#[derive(Debug)]
pub enum Unresolved {
    PostMissing(String),
    AccountMissing(String),
    Storage(anyhow::Error),
}

impl std::fmt::Display for Unresolved {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Unresolved::PostMissing(id) => write!(f, "post {id} not found"),
            Unresolved::AccountMissing(id) => write!(f, "account {id} not found"),
            Unresolved::Storage(err) => write!(f, "storage error: {err:#}"),
        }
    }
}

/// Read-only lookup of the account that owns an event's target.
pub struct RecipientResolver {
    accounts: Arc<dyn AccountRepo>,
    posts: Arc<dyn PostRepo>,
}

impl RecipientResolver {
    pub fn new(accounts: Arc<dyn AccountRepo>, posts: Arc<dyn PostRepo>) -> Self {
        Self { accounts, posts }
    }

    /// Handle precedence: `event_handle`, then the post's cached handle,
    /// then the account's current handle, then `fallback`.
    pub async fn resolve(
        &self,
        target: &EventTarget,
        event_handle: Option<&str>,
        fallback: &str,
    ) -> Result<Recipient, Unresolved> {
        let (owner_id, cached_handle) = match target {
            EventTarget::Recipient { recipient_account_id } => (recipient_account_id.clone(), None),
            EventTarget::Post { post_id } => {
                let post = self
                    .posts
                    .get_post(post_id)
                    .await
                    .map_err(Unresolved::Storage)?
                    .ok_or_else(|| Unresolved::PostMissing(post_id.clone()))?;
                (post.owner_account_id, post.owner_handle)
            }
        };

        let account = self
            .accounts
            .get_account(&owner_id)
            .await
            .map_err(Unresolved::Storage)?
            .ok_or(Unresolved::AccountMissing(owner_id))?;

        let display_handle = non_blank(event_handle)
            .or(non_blank(cached_handle.as_deref()))
            .or(non_blank(account.handle.as_deref()))
            .unwrap_or(fallback)
            .to_string();

        Ok(Recipient {
            account,
            display_handle,
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
