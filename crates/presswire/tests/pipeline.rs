//! End-to-end pipeline tests: draft -> version -> approval -> publish -> delivery.
//!
//! Each test drives the full stack over an in-memory store through the
//! public [`Newsroom`] API.

use presswire::NewsroomError;
use presswire_core::{
    ApprovalDecision, ContentBlock, DeliveryResult, RiskAcknowledgement, RiskFlag, RiskFlagType,
    RiskSeverity, StoryStatus, SubscriptionPlan, UserPreferences, VersionDraft,
};
use presswire_store::Store;
use presswire_testkit::{approve_blind, approve_fully, TestFixture};

// ─────────────────────────────────────────────────────────────────────────
// Happy Path
// ─────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_full_pipeline_publishes_and_delivers() {
    let fx = TestFixture::new();
    let reader = fx.add_subscriber(SubscriptionPlan::Free).await;

    let (story, version) = fx.story_with_version("Council votes on budget", "Full text").await;
    fx.newsroom
        .record_approval(&fx.editor, &story.id, approve_fully(&version))
        .await
        .unwrap();

    let published = fx
        .newsroom
        .publish(&fx.editor, &story.id, version.hash)
        .await
        .unwrap();

    assert_eq!(published.status, StoryStatus::Published);
    assert!(published.published_at.is_some());

    let logs = fx.store().list_delivery_logs(&story.id).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].user_id, reader);
    assert_eq!(logs[0].result, DeliveryResult::Delivered);
    assert_eq!(logs[0].version_hash, version.hash);
}

#[tokio::test]
async fn test_republish_is_idempotent() {
    let fx = TestFixture::new();
    fx.add_subscriber(SubscriptionPlan::Free).await;

    let (story, version) = fx.story_with_version("Headline", "Body").await;
    fx.newsroom
        .record_approval(&fx.editor, &story.id, approve_fully(&version))
        .await
        .unwrap();

    let first = fx.newsroom.publish(&fx.editor, &story.id, version.hash).await.unwrap();
    let second = fx.newsroom.publish(&fx.editor, &story.id, version.hash).await.unwrap();

    assert_eq!(first.published_at, second.published_at);

    // The no-op publish does not fan out a second time.
    let logs = fx.store().list_delivery_logs(&story.id).await.unwrap();
    assert_eq!(logs.len(), 1);
}

// ─────────────────────────────────────────────────────────────────────────
// Hash Binding
// ─────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_new_version_orphans_prior_approval() {
    let fx = TestFixture::new();
    let (story, v1) = fx.story_with_version("Headline", "First draft").await;
    fx.newsroom
        .record_approval(&fx.editor, &story.id, approve_fully(&v1))
        .await
        .unwrap();

    // Content changes after the approval; the pointer moves to v2.
    let v2 = fx
        .newsroom
        .create_version(
            &fx.journalist,
            &story.id,
            VersionDraft::new(vec![ContentBlock::text("Second draft")]),
        )
        .await
        .unwrap();
    assert_ne!(v1.hash, v2.hash);

    // Publishing the approved-but-stale v1 hash is refused.
    let err = fx.newsroom.publish(&fx.editor, &story.id, v1.hash).await.unwrap_err();
    assert!(matches!(err, NewsroomError::HashMismatch { .. }));
    assert_eq!(err.status_code(), 409);

    // And v2 has no approval of its own.
    let err = fx.newsroom.publish(&fx.editor, &story.id, v2.hash).await.unwrap_err();
    assert!(matches!(err, NewsroomError::NoApproval { .. }));
    assert_eq!(err.discriminant(), "no_approval");
}

#[tokio::test]
async fn test_identical_content_reuses_the_version() {
    let fx = TestFixture::new();
    let (story, v1) = fx.story_with_version("Headline", "Same text").await;

    let again = fx
        .newsroom
        .create_version(
            &fx.journalist,
            &story.id,
            VersionDraft::new(vec![ContentBlock::text("Same text")]),
        )
        .await
        .unwrap();

    assert_eq!(again.hash, v1.hash);
    assert_eq!(again.version_number, 1);
    assert_eq!(fx.newsroom.list_versions(&story.id).await.unwrap().len(), 1);
}

// ─────────────────────────────────────────────────────────────────────────
// Approval Gate
// ─────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_publish_without_approval_is_refused() {
    let fx = TestFixture::new();
    let (story, version) = fx.story_with_version("Headline", "Body").await;

    let err = fx.newsroom.publish(&fx.editor, &story.id, version.hash).await.unwrap_err();
    assert!(matches!(err, NewsroomError::NoApproval { .. }));
    assert_eq!(err.status_code(), 403);

    let story = fx.newsroom.get_story(&story.id).await.unwrap();
    assert_eq!(story.status, StoryStatus::Draft);
}

#[tokio::test]
async fn test_unacknowledged_risk_flag_blocks_publish() {
    let fx = TestFixture::new();
    let story = fx.draft_story("Court filing names a minor", &[]).await;
    let version = fx
        .newsroom
        .create_version(
            &fx.journalist,
            &story.id,
            VersionDraft::new(vec![ContentBlock::text("Body")]).with_risk_flags(vec![
                RiskFlag::new(
                    RiskFlagType::MinorInvolved,
                    "subject is seventeen",
                    RiskSeverity::High,
                ),
                RiskFlag::new(
                    RiskFlagType::HighDefamationRisk,
                    "unproven allegation",
                    RiskSeverity::High,
                ),
            ]),
        )
        .await
        .unwrap();

    // Approval goes through without acknowledgements; the gate bites later.
    fx.newsroom
        .record_approval(&fx.editor, &story.id, approve_blind(&version))
        .await
        .unwrap();

    let err = fx.newsroom.publish(&fx.editor, &story.id, version.hash).await.unwrap_err();
    match err {
        NewsroomError::UnacknowledgedRiskFlags { flags } => {
            assert_eq!(flags.len(), 2);
            assert!(flags.contains(&RiskFlagType::MinorInvolved));
            assert!(flags.contains(&RiskFlagType::HighDefamationRisk));
        }
        other => panic!("expected risk gate refusal, got {other}"),
    }
}

#[tokio::test]
async fn test_declined_acknowledgement_does_not_clear_the_gate() {
    let fx = TestFixture::new();
    let story = fx.draft_story("Investigation update", &[]).await;
    let version = fx
        .newsroom
        .create_version(
            &fx.journalist,
            &story.id,
            VersionDraft::new(vec![ContentBlock::text("Body")]).with_risk_flags(vec![
                RiskFlag::new(
                    RiskFlagType::OngoingInvestigation,
                    "active case",
                    RiskSeverity::Medium,
                ),
            ]),
        )
        .await
        .unwrap();

    let mut input = approve_blind(&version);
    input.acknowledgements = vec![RiskAcknowledgement::decline(
        RiskFlagType::OngoingInvestigation,
        "cannot sign off while the case is active",
    )];
    fx.newsroom
        .record_approval(&fx.editor, &story.id, input)
        .await
        .unwrap();

    let err = fx.newsroom.publish(&fx.editor, &story.id, version.hash).await.unwrap_err();
    assert_eq!(err.discriminant(), "unacknowledged_risk_flags");
}

#[tokio::test]
async fn test_second_approval_for_same_pair_is_refused() {
    let fx = TestFixture::new();
    let (story, version) = fx.story_with_version("Headline", "Body").await;

    let first = fx
        .newsroom
        .record_approval(&fx.editor, &story.id, approve_fully(&version))
        .await
        .unwrap();

    let err = fx
        .newsroom
        .record_approval(&fx.editor, &story.id, approve_fully(&version))
        .await
        .unwrap_err();
    assert!(matches!(err, NewsroomError::AlreadyApproved { .. }));
    assert_eq!(err.status_code(), 409);

    // The ledger still holds exactly the first record, untouched.
    let ledger = fx.newsroom.list_approvals(&story.id).await.unwrap();
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].id, first.id);
}

#[tokio::test]
async fn test_rejection_is_recorded_but_leaves_status_alone() {
    let fx = TestFixture::new();
    let (story, version) = fx.story_with_version("Headline", "Body").await;

    let mut input = approve_fully(&version);
    input.decision = ApprovalDecision::Rejected;
    input.notes = Some("insufficient sourcing".to_string());
    fx.newsroom
        .record_approval(&fx.editor, &story.id, input)
        .await
        .unwrap();

    let story = fx.newsroom.get_story(&story.id).await.unwrap();
    assert_eq!(story.status, StoryStatus::Draft);

    let ledger = fx.newsroom.list_approvals(&story.id).await.unwrap();
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].decision, ApprovalDecision::Rejected);
}

#[tokio::test]
async fn test_revision_request_returns_story_to_draft() {
    let fx = TestFixture::new();
    let (story, version) = fx.story_with_version("Headline", "Body").await;

    // Move it forward first so the transition back is observable.
    fx.newsroom
        .update_story(
            &fx.journalist,
            &story.id,
            presswire::StoryPatch {
                status: Some(StoryStatus::InReview),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let mut input = approve_fully(&version);
    input.decision = ApprovalDecision::RevisionRequested;
    fx.newsroom
        .record_approval(&fx.editor, &story.id, input)
        .await
        .unwrap();

    let story = fx.newsroom.get_story(&story.id).await.unwrap();
    assert_eq!(story.status, StoryStatus::Draft);
}

#[tokio::test]
async fn test_approval_sets_status_approved() {
    let fx = TestFixture::new();
    let (story, version) = fx.story_with_version("Headline", "Body").await;

    fx.newsroom
        .record_approval(&fx.editor, &story.id, approve_fully(&version))
        .await
        .unwrap();

    let story = fx.newsroom.get_story(&story.id).await.unwrap();
    assert_eq!(story.status, StoryStatus::Approved);
}

// ─────────────────────────────────────────────────────────────────────────
// Status Transitions
// ─────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_status_patch_cannot_bypass_the_publish_gate() {
    let fx = TestFixture::new();
    let (story, version) = fx.story_with_version("Headline", "Body").await;

    // Flipping the displayed status to Published through a patch is refused.
    let err = fx
        .newsroom
        .update_story(
            &fx.journalist,
            &story.id,
            presswire::StoryPatch {
                status: Some(StoryStatus::Published),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, NewsroomError::InvalidStatusTransition { .. }));
    assert_eq!(err.status_code(), 409);

    // The story never looks published, and the gate still demands approval.
    let story_after = fx.newsroom.get_story(&story.id).await.unwrap();
    assert_eq!(story_after.status, StoryStatus::Draft);
    assert!(story_after.published_at.is_none());

    let err = fx.newsroom.publish(&fx.editor, &story.id, version.hash).await.unwrap_err();
    assert!(matches!(err, NewsroomError::NoApproval { .. }));
}

#[tokio::test]
async fn test_correction_and_retraction_require_a_prior_publish() {
    let fx = TestFixture::new();
    let (story, version) = fx.story_with_version("Headline", "Body").await;

    // A draft cannot be corrected or retracted.
    let err = fx
        .newsroom
        .update_story(
            &fx.journalist,
            &story.id,
            presswire::StoryPatch {
                status: Some(StoryStatus::Corrected),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.discriminant(), "invalid_status_transition");

    fx.newsroom
        .record_approval(&fx.editor, &story.id, approve_fully(&version))
        .await
        .unwrap();
    fx.newsroom.publish(&fx.editor, &story.id, version.hash).await.unwrap();

    // Once published, the post-publish moves are open.
    let corrected = fx
        .newsroom
        .update_story(
            &fx.editor,
            &story.id,
            presswire::StoryPatch {
                status: Some(StoryStatus::Corrected),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(corrected.status, StoryStatus::Corrected);

    let retracted = fx
        .newsroom
        .update_story(
            &fx.editor,
            &story.id,
            presswire::StoryPatch {
                status: Some(StoryStatus::Retracted),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(retracted.status, StoryStatus::Retracted);

    // A retracted story does not drift back into the editorial flow.
    let err = fx
        .newsroom
        .update_story(
            &fx.editor,
            &story.id,
            presswire::StoryPatch {
                status: Some(StoryStatus::Draft),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, NewsroomError::InvalidStatusTransition { .. }));
}

// ─────────────────────────────────────────────────────────────────────────
// Authorization
// ─────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_journalist_cannot_approve_or_publish() {
    let fx = TestFixture::new();
    let (story, version) = fx.story_with_version("Headline", "Body").await;

    let err = fx
        .newsroom
        .record_approval(&fx.journalist, &story.id, approve_fully(&version))
        .await
        .unwrap_err();
    assert_eq!(err.discriminant(), "not_authorized");
    assert_eq!(err.status_code(), 403);

    let err = fx
        .newsroom
        .publish(&fx.journalist, &story.id, version.hash)
        .await
        .unwrap_err();
    assert!(matches!(err, NewsroomError::NotAuthorized { .. }));
}

#[tokio::test]
async fn test_subscriber_cannot_create_stories() {
    let fx = TestFixture::new();
    let err = fx
        .newsroom
        .create_story(
            &fx.subscriber,
            presswire::StoryInput {
                headline: "Unauthorized".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, NewsroomError::NotAuthorized { .. }));
}

// ─────────────────────────────────────────────────────────────────────────
// Delivery Suppression
// ─────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_muted_topic_subscriber_is_suppressed_with_a_log_row() {
    let fx = TestFixture::new();
    let reader = fx.add_subscriber(SubscriptionPlan::Premium).await;
    let muted = fx
        .add_subscriber_with_prefs(UserPreferences::permissive(presswire_core::ActorId::generate())
            .with_muted_topics(vec!["politics".to_string()]))
        .await;

    let story = fx.draft_story("Budget vote", &["Politics"]).await;
    let version = fx
        .newsroom
        .create_version(
            &fx.journalist,
            &story.id,
            VersionDraft::new(vec![ContentBlock::text("Body")]),
        )
        .await
        .unwrap();
    fx.newsroom
        .record_approval(&fx.editor, &story.id, approve_fully(&version))
        .await
        .unwrap();
    fx.newsroom.publish(&fx.editor, &story.id, version.hash).await.unwrap();

    let logs = fx.store().list_delivery_logs(&story.id).await.unwrap();
    assert_eq!(logs.len(), 2);

    let delivered = logs.iter().find(|l| l.user_id == reader).unwrap();
    assert_eq!(delivered.result, DeliveryResult::Delivered);

    let suppressed = logs.iter().find(|l| l.user_id == muted).unwrap();
    assert_eq!(suppressed.result, DeliveryResult::Suppressed);
}

// ─────────────────────────────────────────────────────────────────────────
// Audit Trail
// ─────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_audit_trail_records_every_story_transition() {
    let fx = TestFixture::new();
    fx.add_subscriber(SubscriptionPlan::Free).await;

    let (story, version) = fx.story_with_version("Headline", "Body").await;
    fx.newsroom
        .record_approval(&fx.editor, &story.id, approve_fully(&version))
        .await
        .unwrap();
    fx.newsroom.publish(&fx.editor, &story.id, version.hash).await.unwrap();

    let trail = fx.newsroom.audit_trail(&story.id).await.unwrap();
    let actions: Vec<&str> = trail.iter().map(|e| e.action.as_str()).collect();

    assert!(actions.contains(&"story.create"));
    assert!(actions.contains(&"story.publish"));
    assert!(actions.contains(&"story.deliver"));

    let publish = trail.iter().find(|e| e.action == "story.publish").unwrap();
    assert_eq!(publish.actor_id, Some(fx.editor.id));
}
