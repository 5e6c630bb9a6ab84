//! Account-facing operations: sign-in, handle claims, push registration,
//! publishing posts, recording link visits and reading the inbox.

use std::sync::Arc;

use chrono::Utc;
use pp_core::{
    new_id, Account, AccountRepo, AppError, EventTarget, HandleClaim, IdentityProvider,
    Notification, NotificationRepo, Post, PostRepo, VisitEvent, VisitRepo,
};
use serde::{Deserialize, Serialize};

use crate::context::{
    storage_failure, validate_handle, validate_media_url, validate_push_token, CallContext,
};

const DEFAULT_INBOX_LIMIT: i64 = 50;
const MAX_INBOX_LIMIT: i64 = 100;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub account_id: String,
    pub token: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimHandleRequest {
    pub handle: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushTokenRequest {
    pub token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub media_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordVisitRequest {
    pub post_id: Option<String>,
    pub recipient_account_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListNotificationsRequest {
    pub limit: Option<i64>,
}

pub struct AccountService {
    accounts: Arc<dyn AccountRepo>,
    posts: Arc<dyn PostRepo>,
    visits: Arc<dyn VisitRepo>,
    notifications: Arc<dyn NotificationRepo>,
    identity: Arc<dyn IdentityProvider>,
}

impl AccountService {
    pub fn new(
        accounts: Arc<dyn AccountRepo>,
        posts: Arc<dyn PostRepo>,
        visits: Arc<dyn VisitRepo>,
        notifications: Arc<dyn NotificationRepo>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            accounts,
            posts,
            visits,
            notifications,
            identity,
        }
    }

    /// First authentication: creates the account and hands back its token.
    pub async fn sign_in(&self) -> Result<Session, AppError> {
        let account = Account::new(new_id());
        let account_id = account.id.clone();
        self.accounts
            .create_account(account)
            .await
            .map_err(storage_failure("signIn", "Sign-in failed. Try again."))?;

        log::info!("account {account_id} created");
        Ok(Session {
            token: self.identity.issue_token(&account_id),
            account_id,
        })
    }

    /// A handle is claimed once; the lowercased form is globally unique.
    pub async fn claim_handle(
        &self,
        ctx: &CallContext,
        req: ClaimHandleRequest,
    ) -> Result<String, AppError> {
        let caller = ctx.require_caller("pick a handle")?;
        let handle = validate_handle(req.handle.as_deref().unwrap_or_default())?;

        let outcome = self
            .accounts
            .claim_handle(caller, handle)
            .await
            .map_err(storage_failure("claimHandle", "Couldn't save. Try again."))?;

        match outcome {
            HandleClaim::Claimed => {
                log::info!("account {caller} claimed handle {handle}");
                Ok(handle.to_string())
            }
            HandleClaim::Taken => Err(AppError::AlreadyExists(format!(
                "\"{handle}\" is taken. Try another?"
            ))),
            HandleClaim::AlreadySet => Err(AppError::AlreadyExists(
                "You already have a handle".to_string(),
            )),
            HandleClaim::UnknownAccount => Err(AppError::not_found("Account not found")),
        }
    }

    pub async fn register_push_token(
        &self,
        ctx: &CallContext,
        req: PushTokenRequest,
    ) -> Result<(), AppError> {
        let caller = ctx.require_caller("enable notifications")?;
        let token = validate_push_token(req.token.as_deref())?;
        self.set_push_token(caller, Some(token.to_string())).await
    }

    /// Called on sign-out or when the user turns notifications off.
    pub async fn clear_push_token(&self, ctx: &CallContext) -> Result<(), AppError> {
        let caller = ctx.require_caller("disable notifications")?;
        self.set_push_token(caller, None).await
    }

    async fn set_push_token(&self, account_id: &str, token: Option<String>) -> Result<(), AppError> {
        let found = self
            .accounts
            .set_push_token(account_id, token)
            .await
            .map_err(storage_failure("setPushToken", "Couldn't update notifications."))?;
        if found {
            Ok(())
        } else {
            Err(AppError::not_found("Account not found"))
        }
    }

    /// Publishes a post, caching the owner's current handle on it.
    pub async fn create_post(
        &self,
        ctx: &CallContext,
        req: CreatePostRequest,
    ) -> Result<Post, AppError> {
        let caller = ctx.require_caller("post")?;
        let media_url = validate_media_url(req.media_url.as_deref())?;
        let owner = self
            .accounts
            .get_account(caller)
            .await
            .map_err(storage_failure("createPost", "Failed to post. Please try again."))?
            .ok_or_else(|| AppError::not_found("Account not found"))?;

        let post = Post {
            id: new_id(),
            owner_account_id: owner.id,
            media_url: media_url.to_string(),
            owner_handle: owner.handle,
            created_at: Utc::now(),
        };
        self.posts
            .create_post(post.clone())
            .await
            .map_err(storage_failure("createPost", "Failed to post. Please try again."))?;
        Ok(post)
    }

    /// Appends a VisitEvent unless the caller is looking at their own link.
    /// Returns whether a visit was recorded.
    pub async fn record_visit(
        &self,
        ctx: &CallContext,
        req: RecordVisitRequest,
    ) -> Result<bool, AppError> {
        let target = EventTarget::from_parts(req.post_id, req.recipient_account_id)?;
        let failed = || storage_failure("recordVisit", "Couldn't record visit.");

        let (owner_id, handle) = match &target {
            EventTarget::Post { post_id } => {
                let post = self
                    .posts
                    .get_post(post_id)
                    .await
                    .map_err(failed())?
                    .ok_or_else(|| AppError::not_found("Post not found. The link may have expired."))?;
                (post.owner_account_id, post.owner_handle)
            }
            EventTarget::Recipient { recipient_account_id } => {
                let account = self
                    .accounts
                    .get_account(recipient_account_id)
                    .await
                    .map_err(failed())?
                    .ok_or_else(|| AppError::not_found("User not found."))?;
                (account.id, account.handle)
            }
        };

        if ctx.caller.as_deref() == Some(owner_id.as_str()) {
            return Ok(false);
        }

        let visit = VisitEvent {
            id: new_id(),
            created_at: Utc::now(),
            handle,
            target,
        };
        self.visits.insert_visit(visit).await.map_err(failed())?;
        Ok(true)
    }

    pub async fn list_notifications(
        &self,
        ctx: &CallContext,
        req: ListNotificationsRequest,
    ) -> Result<Vec<Notification>, AppError> {
        let caller = ctx.require_caller("view your inbox")?;
        let limit = match req.limit {
            None => DEFAULT_INBOX_LIMIT,
            Some(n) if (1..=MAX_INBOX_LIMIT).contains(&n) => n,
            Some(_) => {
                return Err(AppError::invalid(format!(
                    "limit must be between 1 and {MAX_INBOX_LIMIT}"
                )))
            }
        };
        self.notifications
            .list_notifications(caller, limit)
            .await
            .map_err(storage_failure("listNotifications", "Couldn't load inbox."))
    }

    /// Returns how many notifications flipped to read.
    pub async fn mark_notifications_read(&self, ctx: &CallContext) -> Result<u64, AppError> {
        let caller = ctx.require_caller("view your inbox")?;
        self.notifications
            .mark_all_read(caller)
            .await
            .map_err(storage_failure("markNotificationsRead", "Couldn't update inbox."))
    }

    pub async fn get_account(&self, ctx: &CallContext) -> Result<Account, AppError> {
        let caller = ctx.require_caller("view your account")?;
        self.accounts
            .get_account(caller)
            .await
            .map_err(storage_failure("getAccount", "Couldn't load account."))?
            .ok_or_else(|| AppError::not_found("Account not found"))
    }
}
