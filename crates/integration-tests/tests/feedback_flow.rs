mod common;

use common::{caller, Harness};
use pp_core::{AppError, FeedbackRepo, NotificationKind};
use pp_services::accounts::{ClaimHandleRequest, ListNotificationsRequest, RecordVisitRequest};
use pp_services::gateway::{FeedbackRefRequest, SubmitFeedbackRequest};
use pp_services::CallContext;
use tokio_test::{assert_err, assert_ok};

fn to_post(post_id: &str) -> SubmitFeedbackRequest {
    SubmitFeedbackRequest {
        media_url: Some("https://cdn.example/reactions/a.jpg".into()),
        post_id: Some(post_id.into()),
        ..Default::default()
    }
}

fn to_inbox(account_id: &str) -> SubmitFeedbackRequest {
    SubmitFeedbackRequest {
        media_url: Some("https://cdn.example/reactions/b.jpg".into()),
        recipient_account_id: Some(account_id.into()),
        ..Default::default()
    }
}

async fn inbox(h: &Harness, ctx: &CallContext) -> Vec<pp_core::Notification> {
    h.accounts
        .list_notifications(ctx, ListNotificationsRequest::default())
        .await
        .unwrap()
}

#[tokio::test]
async fn post_feedback_reaches_owner_inbox_and_push() {
    let h = Harness::new().await;
    let owner = h.sign_in().await;
    h.accounts
        .claim_handle(&owner, ClaimHandleRequest { handle: Some("aura_flow".into()) })
        .await
        .unwrap();
    h.register_token(&owner, "device-1").await;
    let post_id = h.post(&owner).await;

    let event = h
        .gateway
        .submit_feedback(&Harness::anonymous("8.8.8.8"), to_post(&post_id))
        .await
        .unwrap();
    assert_eq!(event.target.post_id(), Some(post_id.as_str()));
    assert_eq!(h.drain().await, 1);

    let notifications = inbox(&h, &owner).await;
    assert_eq!(notifications.len(), 1);
    let n = &notifications[0];
    assert_eq!(n.kind, NotificationKind::Feedback);
    assert_eq!(n.related_post_id.as_deref(), Some(post_id.as_str()));
    assert_eq!(n.related_feedback_id.as_deref(), Some(event.id.as_str()));
    assert_eq!(n.message, "Someone reacted to your post @aura_flow");
    assert!(!n.is_read);

    let sent = h.push.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].token, "device-1");
    assert_eq!(sent[0].title, "New feedback");
    assert_eq!(sent[0].deep_link, format!("/f?postId={post_id}"));
    assert_eq!(sent[0].data.get("feedbackId"), Some(&event.id));
}

#[tokio::test]
async fn inbox_feedback_without_token_is_still_recorded() {
    let h = Harness::new().await;
    let recipient = h.sign_in().await;

    assert_ok!(h.gateway.submit_feedback(&Harness::anonymous("8.8.8.8"), to_inbox(caller(&recipient))).await);
    h.drain().await;

    let notifications = inbox(&h, &recipient).await;
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].message, "Someone sent you feedback @someone");
    assert_eq!(notifications[0].related_post_id, None);
    assert!(h.push.sent().is_empty());
}

#[tokio::test]
async fn push_failure_keeps_notification_and_clears_outbox() {
    let h = Harness::new().await;
    let recipient = h.sign_in().await;
    h.register_token(&recipient, "device-2").await;
    h.push.fail_all();

    assert_ok!(h.gateway.submit_feedback(&Harness::anonymous("8.8.8.8"), to_inbox(caller(&recipient))).await);
    assert_eq!(h.drain().await, 1);

    assert_eq!(inbox(&h, &recipient).await.len(), 1);
    assert_eq!(h.drain().await, 0);
}

#[tokio::test]
async fn redelivered_events_do_not_duplicate_notifications() {
    let h = Harness::new().await;
    let owner = h.sign_in().await;
    let post_id = h.post(&owner).await;
    assert_ok!(h.gateway.submit_feedback(&Harness::anonymous("8.8.8.8"), to_post(&post_id)).await);
    h.drain().await;

    // Simulate a crash between pipeline run and acknowledgement
    sqlx::query("UPDATE event_outbox SET processed_at = NULL")
        .execute(h.store.pool())
        .await
        .unwrap();
    assert_eq!(h.drain().await, 1);

    assert_eq!(h.count("notifications").await, 1);
}

#[tokio::test]
async fn submit_validates_before_writing() {
    let h = Harness::new().await;
    let anon = Harness::anonymous("8.8.8.8");

    let missing = h.gateway.submit_feedback(&anon, to_post("missing")).await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));

    let mut both = to_post("p1");
    both.recipient_account_id = Some("acct".into());
    let both = h.gateway.submit_feedback(&anon, both).await;
    assert!(matches!(both, Err(AppError::InvalidArgument(_))));

    let neither = h
        .gateway
        .submit_feedback(
            &anon,
            SubmitFeedbackRequest {
                media_url: Some("https://cdn.example/x.jpg".into()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(neither, Err(AppError::InvalidArgument(_))));

    let no_user = h.gateway.submit_feedback(&anon, to_inbox("ghost")).await;
    assert_eq!(no_user.unwrap_err(), AppError::not_found("User not found."));

    assert_eq!(h.count("feedback_events").await, 0);
    assert_eq!(h.count("event_outbox").await, 0);
}

#[tokio::test]
async fn visits_notify_owner_unless_owner_is_looking() {
    let h = Harness::new().await;
    let owner = h.sign_in().await;
    h.accounts
        .claim_handle(&owner, ClaimHandleRequest { handle: Some("neon_dream".into()) })
        .await
        .unwrap();
    let post_id = h.post(&owner).await;

    let own_view = h
        .accounts
        .record_visit(
            &owner,
            RecordVisitRequest {
                post_id: Some(post_id.clone()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(!own_view);

    let recorded = h
        .accounts
        .record_visit(
            &Harness::anonymous("8.8.8.8"),
            RecordVisitRequest {
                post_id: Some(post_id.clone()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(recorded);
    assert_eq!(h.drain().await, 1);

    let notifications = inbox(&h, &owner).await;
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].kind, NotificationKind::Visit);
    assert_eq!(notifications[0].message, "Someone viewed your feedback link @neon_dream");
    assert_eq!(notifications[0].related_feedback_id, None);
}

#[tokio::test]
async fn inbox_delete_is_recipient_only_and_takes_notifications() {
    let h = Harness::new().await;
    let recipient = h.sign_in().await;
    let stranger = h.sign_in().await;

    let event = h
        .gateway
        .submit_feedback(&Harness::anonymous("8.8.8.8"), to_inbox(caller(&recipient)))
        .await
        .unwrap();
    h.drain().await;
    let by_id = || FeedbackRefRequest { feedback_event_id: Some(event.id.clone()) };

    let denied = h.gateway.delete_inbox_feedback(&stranger, by_id()).await;
    assert!(matches!(denied, Err(AppError::PermissionDenied(_))));
    assert!(h.store.get_feedback(&event.id).await.unwrap().is_some());

    // Inbox items have no post owner
    let wrong_path = h.gateway.delete_feedback(&recipient, by_id()).await;
    assert!(matches!(wrong_path, Err(AppError::InvalidArgument(_))));

    assert_ok!(h.gateway.delete_inbox_feedback(&recipient, by_id()).await);
    assert!(h.store.get_feedback(&event.id).await.unwrap().is_none());
    assert!(inbox(&h, &recipient).await.is_empty());

    let gone = h.gateway.delete_inbox_feedback(&recipient, by_id()).await;
    assert!(matches!(gone, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn post_feedback_delete_is_owner_only() {
    let h = Harness::new().await;
    let owner = h.sign_in().await;
    let stranger = h.sign_in().await;
    let post_id = h.post(&owner).await;

    let event = h
        .gateway
        .submit_feedback(&stranger, to_post(&post_id))
        .await
        .unwrap();
    let by_id = || FeedbackRefRequest { feedback_event_id: Some(event.id.clone()) };

    // The submitter does not own the post
    let denied = h.gateway.delete_feedback(&stranger, by_id()).await;
    assert_eq!(denied.unwrap_err(), AppError::denied("Only the post owner can delete"));
    assert!(h.store.get_feedback(&event.id).await.unwrap().is_some());

    let anonymous = h.gateway.delete_feedback(&Harness::anonymous("8.8.8.8"), by_id()).await;
    assert!(matches!(anonymous, Err(AppError::Unauthenticated(_))));

    assert_ok!(h.gateway.delete_feedback(&owner, by_id()).await);
    assert_err!(h.gateway.delete_feedback(&owner, by_id()).await);
}
