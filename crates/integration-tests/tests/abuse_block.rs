mod common;

use common::Harness;
use pp_core::{AppError, ModerationRepo};
use pp_services::gateway::{ReportFeedbackRequest, SubmitFeedbackRequest};
use tokio_test::assert_ok;

fn report(reason: &str, other: Option<&str>) -> ReportFeedbackRequest {
    ReportFeedbackRequest {
        feedback_event_id: Some("f-123".into()),
        reason_code: Some(reason.into()),
        other_reason: other.map(String::from),
    }
}

async fn submit_to_post(h: &Harness, ip: &str) -> Result<(), AppError> {
    let owner = h.sign_in().await;
    let post_id = h.post(&owner).await;
    h.gateway
        .submit_feedback(
            &Harness::anonymous(ip),
            SubmitFeedbackRequest {
                media_url: Some("https://cdn.example/r.jpg".into()),
                post_id: Some(post_id),
                ..Default::default()
            },
        )
        .await
        .map(|_| ())
}

#[tokio::test]
async fn reporter_is_blocked_from_submitting() {
    let h = Harness::new().await;
    let reporter = Harness::anonymous("1.2.3.4");

    assert_ok!(h.gateway.report_feedback(&reporter, report("Spam", None)).await);

    let (network_id, reason, other): (String, String, Option<String>) = sqlx::query_as(
        "SELECT reporter_network_id, reason_code, other_reason FROM abuse_reports",
    )
    .fetch_one(h.store.pool())
    .await
    .unwrap();
    assert_eq!(network_id, "1.2.3.4");
    assert_eq!(reason, "Spam");
    assert_eq!(other, None);

    let block_reason: String =
        sqlx::query_scalar("SELECT reason FROM blocked_network_identities WHERE key = '1_2_3_4'")
            .fetch_one(h.store.pool())
            .await
            .unwrap();
    assert_eq!(block_reason, "Reported feedback");

    let err = submit_to_post(&h, "1.2.3.4").await.unwrap_err();
    assert!(matches!(err, AppError::PermissionDenied(ref m) if m.contains("restricted")));

    // Other addresses are unaffected
    assert_ok!(submit_to_post(&h, "5.6.7.8").await);
}

#[tokio::test]
async fn ipv6_reporter_gets_normalized_key() {
    let h = Harness::new().await;
    assert_ok!(
        h.gateway
            .report_feedback(&Harness::anonymous("2001:db8::1"), report("Other", Some(" rude ")))
            .await
    );
    assert!(h.store.is_blocked("2001_db8__1").await.unwrap());

    let other: Option<String> = sqlx::query_scalar("SELECT other_reason FROM abuse_reports")
        .fetch_one(h.store.pool())
        .await
        .unwrap();
    assert_eq!(other.as_deref(), Some("rude"));
}

#[tokio::test]
async fn re_report_overwrites_block() {
    let h = Harness::new().await;
    let reporter = Harness::anonymous("1.2.3.4");
    assert_ok!(h.gateway.report_feedback(&reporter, report("Spam", None)).await);
    assert_ok!(h.gateway.report_feedback(&reporter, report("Nudity", None)).await);

    assert_eq!(h.count("abuse_reports").await, 2);
    assert_eq!(h.count("blocked_network_identities").await, 1);
}

#[tokio::test]
async fn failed_block_leaves_no_report() {
    let h = Harness::new().await;
    sqlx::query("DROP TABLE blocked_network_identities")
        .execute(h.store.pool())
        .await
        .unwrap();

    let err = h
        .gateway
        .report_feedback(&Harness::anonymous("1.2.3.4"), report("Spam", None))
        .await
        .unwrap_err();
    assert_eq!(err, AppError::Internal("Report failed".into()));
    assert_eq!(h.count("abuse_reports").await, 0);
}

#[tokio::test]
async fn other_reason_requires_text() {
    let h = Harness::new().await;
    let err = h
        .gateway
        .report_feedback(&Harness::anonymous("1.2.3.4"), report("Other", Some("   ")))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidArgument(_)));
    assert_eq!(h.count("abuse_reports").await, 0);
    assert_eq!(h.count("blocked_network_identities").await, 0);
}
