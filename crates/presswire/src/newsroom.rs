//! The Newsroom: unified API for the Presswire pipeline.
//!
//! The Newsroom brings together the content store, the approval ledger,
//! the publish gate, and subscriber delivery into a cohesive interface.
//! Every operation takes an explicit [`Caller`]; there is no ambient user.

use std::sync::Arc;

use chrono::Utc;
use presswire_core::{
    unacknowledged_flags, validate_acknowledgements, validate_headline, validate_version_draft,
    ApprovalDecision, ApprovalId, ApprovalRecord, AuditLogEntry, Caller, RiskAcknowledgement,
    Role, Story, StoryId, StoryStatus, StoryVersion, VersionDraft, VersionHash,
};
use presswire_delivery::{DeliveryConfig, DeliveryOrchestrator};
use presswire_store::{ApprovalInsert, Store, StoryFilter};

use crate::audit::AuditRecorder;
use crate::error::{NewsroomError, Result};
use crate::slug::slug_from_headline;

/// Configuration for the Newsroom.
#[derive(Debug, Clone)]
pub struct NewsroomConfig {
    /// Delivery configuration.
    pub delivery: DeliveryConfig,
    /// Whether publishing fans out to subscribers.
    pub deliver_on_publish: bool,
}

impl Default for NewsroomConfig {
    fn default() -> Self {
        Self {
            delivery: DeliveryConfig::default(),
            deliver_on_publish: true,
        }
    }
}

/// Input for creating a story.
#[derive(Debug, Clone, Default)]
pub struct StoryInput {
    pub headline: String,
    pub summary: Option<String>,
    pub topic_tags: Vec<String>,
    pub geo_tags: Vec<String>,
    pub is_gated: bool,
}

/// Metadata-only patch for a story. `None` fields are left unchanged.
///
/// Status moves here cover workflow transitions outside the publish gate
/// (e.g. Draft -> InReview). Patching to `Published` is refused outright;
/// only `publish` sets it. `Corrected` and `Retracted` are accepted only
/// for a story that already went through the gate.
#[derive(Debug, Clone, Default)]
pub struct StoryPatch {
    pub headline: Option<String>,
    pub summary: Option<String>,
    pub topic_tags: Option<Vec<String>>,
    pub geo_tags: Option<Vec<String>>,
    pub is_gated: Option<bool>,
    pub status: Option<StoryStatus>,
}

/// Input for recording an editorial decision.
#[derive(Debug, Clone)]
pub struct ApprovalInput {
    pub version_hash: VersionHash,
    pub decision: ApprovalDecision,
    pub notes: Option<String>,
    pub acknowledgements: Vec<RiskAcknowledgement>,
}

/// The main Newsroom struct.
///
/// Provides a unified API for:
/// - Creating and editing story envelopes
/// - Appending immutable content versions
/// - Recording approval ledger entries
/// - Publishing through the approval gate
pub struct Newsroom<S: Store> {
    /// The storage backend.
    store: Arc<S>,
    /// Configuration.
    config: NewsroomConfig,
    /// Failure-isolated audit writer.
    audit: AuditRecorder<S>,
    /// Subscriber fan-out.
    orchestrator: DeliveryOrchestrator<S>,
}

impl<S: Store> Newsroom<S> {
    /// Create a new newsroom instance.
    pub fn new(store: S, config: NewsroomConfig) -> Self {
        let store = Arc::new(store);
        let audit = AuditRecorder::new(store.clone());
        let orchestrator = DeliveryOrchestrator::new(store.clone(), config.delivery.clone());
        Self {
            store,
            config,
            audit,
            orchestrator,
        }
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    fn ensure_role(caller: &Caller, required: Role) -> Result<()> {
        if caller.role.at_least(required) {
            Ok(())
        } else {
            Err(NewsroomError::NotAuthorized {
                required,
                actual: caller.role,
            })
        }
    }

    async fn story_or_not_found(&self, story_id: &StoryId) -> Result<Story> {
        self.store
            .get_story(story_id)
            .await?
            .ok_or(NewsroomError::StoryNotFound(*story_id))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Story Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a new draft story. Requires `Journalist` or above.
    pub async fn create_story(&self, caller: &Caller, input: StoryInput) -> Result<Story> {
        Self::ensure_role(caller, Role::Journalist)?;
        validate_headline(&input.headline)?;

        let now = Utc::now();
        let slug = slug_from_headline(&input.headline);
        let mut story = Story::new_draft(caller.id, slug, input.headline, now);
        story.summary = input.summary;
        story.topic_tags = input.topic_tags;
        story.geo_tags = input.geo_tags;
        story.is_gated = input.is_gated;

        self.store.insert_story(&story).await?;

        self.audit
            .record(
                AuditLogEntry::new(Some(caller.id), "story.create", "story", story.id.to_string(), now)
                    .with_changes(serde_json::json!({
                        "headline": story.headline,
                        "slug": story.slug,
                    })),
            )
            .await;

        Ok(story)
    }

    /// Get a story by ID.
    pub async fn get_story(&self, story_id: &StoryId) -> Result<Story> {
        self.story_or_not_found(story_id).await
    }

    /// Get a story by its URL slug.
    pub async fn get_story_by_slug(&self, slug: &str) -> Result<Option<Story>> {
        Ok(self.store.get_story_by_slug(slug).await?)
    }

    /// List stories matching a filter, newest first.
    pub async fn list_stories(&self, filter: &StoryFilter) -> Result<Vec<Story>> {
        Ok(self.store.list_stories(filter).await?)
    }

    /// Apply a metadata patch to a story. Requires `Journalist` or above.
    ///
    /// Content is not editable here; content changes go through
    /// [`create_version`](Newsroom::create_version).
    pub async fn update_story(
        &self,
        caller: &Caller,
        story_id: &StoryId,
        patch: StoryPatch,
    ) -> Result<Story> {
        Self::ensure_role(caller, Role::Journalist)?;
        let mut story = self.story_or_not_found(story_id).await?;

        let mut touched: Vec<&'static str> = Vec::new();
        if let Some(headline) = patch.headline {
            validate_headline(&headline)?;
            story.headline = headline;
            touched.push("headline");
        }
        if let Some(summary) = patch.summary {
            story.summary = Some(summary);
            touched.push("summary");
        }
        if let Some(tags) = patch.topic_tags {
            story.topic_tags = tags;
            touched.push("topic_tags");
        }
        if let Some(tags) = patch.geo_tags {
            story.geo_tags = tags;
            touched.push("geo_tags");
        }
        if let Some(gated) = patch.is_gated {
            story.is_gated = gated;
            touched.push("is_gated");
        }
        if let Some(status) = patch.status {
            let allowed = match status {
                // Published is reachable only through the publish gate.
                StoryStatus::Published => false,
                StoryStatus::Corrected | StoryStatus::Retracted => {
                    story.status.is_post_publish()
                }
                _ => !story.status.is_post_publish(),
            };
            if !allowed {
                return Err(NewsroomError::InvalidStatusTransition {
                    from: story.status,
                    to: status,
                });
            }
            story.status = status;
            touched.push("status");
        }

        let now = Utc::now();
        story.updated_at = now;
        self.store.update_story(&story).await?;

        self.audit
            .record(
                AuditLogEntry::new(Some(caller.id), "story.update", "story", story.id.to_string(), now)
                    .with_changes(serde_json::json!({ "fields": touched })),
            )
            .await;

        Ok(story)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Version Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Append a new immutable content version. Requires `Journalist`+.
    ///
    /// The store assigns the version number and advances the story's
    /// current pointer, which orphans any approval bound to the previous
    /// hash. Submitting content identical to an existing version returns
    /// that version unchanged.
    pub async fn create_version(
        &self,
        caller: &Caller,
        story_id: &StoryId,
        draft: VersionDraft,
    ) -> Result<StoryVersion> {
        Self::ensure_role(caller, Role::Journalist)?;
        self.story_or_not_found(story_id).await?;
        validate_version_draft(&draft)?;

        let now = Utc::now();
        let version = draft.into_version(*story_id, now);
        let stored = self.store.append_version(&version, now).await?.into_version();

        self.audit
            .record(
                AuditLogEntry::new(
                    Some(caller.id),
                    "version.create",
                    "story_version",
                    stored.id.to_string(),
                    now,
                )
                .with_changes(serde_json::json!({
                    "story_id": story_id.to_string(),
                    "version_hash": stored.hash.to_hex(),
                    "version_number": stored.version_number,
                })),
            )
            .await;

        Ok(stored)
    }

    /// Get a version by its content hash.
    pub async fn get_version(
        &self,
        story_id: &StoryId,
        hash: &VersionHash,
    ) -> Result<Option<StoryVersion>> {
        Ok(self.store.get_version(story_id, hash).await?)
    }

    /// List all versions of a story, newest number first.
    pub async fn list_versions(&self, story_id: &StoryId) -> Result<Vec<StoryVersion>> {
        Ok(self.store.list_versions(story_id).await?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Approval Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Record an editorial decision against an exact version hash.
    /// Requires `Editor` or above.
    ///
    /// The ledger is append-only: a second `Approved` entry for the same
    /// `(story, hash)` pair is refused, never overwritten. Decisions move
    /// the story's status: approval to `Approved`, a revision request back
    /// to `Draft`; a rejection records the entry and leaves status alone.
    pub async fn record_approval(
        &self,
        caller: &Caller,
        story_id: &StoryId,
        input: ApprovalInput,
    ) -> Result<ApprovalRecord> {
        Self::ensure_role(caller, Role::Editor)?;
        let mut story = self.story_or_not_found(story_id).await?;

        if self
            .store
            .get_version(story_id, &input.version_hash)
            .await?
            .is_none()
        {
            return Err(NewsroomError::VersionNotFound {
                story_id: *story_id,
                hash: input.version_hash,
            });
        }

        validate_acknowledgements(&input.acknowledgements)?;

        let now = Utc::now();
        let record = ApprovalRecord {
            id: ApprovalId::generate(),
            story_id: *story_id,
            version_hash: input.version_hash,
            approver_id: caller.id,
            decision: input.decision,
            notes: input.notes,
            acknowledgements: input.acknowledgements,
            recorded_at: now,
        };

        match self.store.insert_approval(&record).await? {
            ApprovalInsert::Inserted => {}
            ApprovalInsert::AlreadyApproved { .. } => {
                return Err(NewsroomError::AlreadyApproved {
                    story_id: *story_id,
                    hash: input.version_hash,
                });
            }
        }

        let new_status = match record.decision {
            ApprovalDecision::Approved => Some(StoryStatus::Approved),
            ApprovalDecision::RevisionRequested => Some(StoryStatus::Draft),
            ApprovalDecision::Rejected => None,
        };
        if let Some(status) = new_status {
            story.status = status;
            story.updated_at = now;
            self.store.update_story(&story).await?;
        }

        self.audit
            .record(
                AuditLogEntry::new(
                    Some(caller.id),
                    "approval.record",
                    "approval_record",
                    record.id.to_string(),
                    now,
                )
                .with_changes(serde_json::json!({
                    "story_id": story_id.to_string(),
                    "version_hash": record.version_hash.to_hex(),
                    "decision": record.decision.as_str(),
                })),
            )
            .await;

        Ok(record)
    }

    /// List the full approval ledger for a story, newest first.
    pub async fn list_approvals(&self, story_id: &StoryId) -> Result<Vec<ApprovalRecord>> {
        Ok(self.store.list_approvals(story_id).await?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Publish Gate
    // ─────────────────────────────────────────────────────────────────────────

    /// Publish a story through the approval gate. Requires `Editor`+.
    ///
    /// Checks run in a fixed order and short-circuit:
    /// 1. the story exists
    /// 2. `requested_hash` matches the story's current version pointer
    /// 3. the version row exists
    /// 4. an approved ledger entry exists for the exact pair
    /// 5. every declared risk flag carries a positive acknowledgement
    ///
    /// Re-publishing an already-published story with the matching hash is
    /// a no-op success. After the state change, delivery fan-out runs with
    /// its failures logged and swallowed: a delivery problem never fails
    /// a publish that already happened.
    pub async fn publish(
        &self,
        caller: &Caller,
        story_id: &StoryId,
        requested_hash: VersionHash,
    ) -> Result<Story> {
        Self::ensure_role(caller, Role::Editor)?;
        let mut story = self.story_or_not_found(story_id).await?;

        if story.current_version_hash != Some(requested_hash) {
            return Err(NewsroomError::HashMismatch {
                expected: story.current_version_hash,
                provided: requested_hash,
            });
        }

        if story.status == StoryStatus::Published && story.published_at.is_some() {
            return Ok(story);
        }

        let version = self
            .store
            .get_version(story_id, &requested_hash)
            .await?
            .ok_or(NewsroomError::VersionNotFound {
                story_id: *story_id,
                hash: requested_hash,
            })?;

        let approval = self
            .store
            .find_approved(story_id, &requested_hash)
            .await?
            .ok_or(NewsroomError::NoApproval {
                story_id: *story_id,
                hash: requested_hash,
            })?;

        let missing = unacknowledged_flags(&version.risk_flags, &approval.acknowledgements);
        if !missing.is_empty() {
            return Err(NewsroomError::UnacknowledgedRiskFlags { flags: missing });
        }

        let now = Utc::now();
        story.status = StoryStatus::Published;
        story.published_at = Some(now);
        story.updated_at = now;
        self.store.update_story(&story).await?;

        self.audit
            .record(
                AuditLogEntry::new(Some(caller.id), "story.publish", "story", story.id.to_string(), now)
                    .with_changes(serde_json::json!({
                        "version_hash": requested_hash.to_hex(),
                        "version_number": version.version_number,
                    })),
            )
            .await;

        if self.config.deliver_on_publish {
            match self.orchestrator.deliver(&story, requested_hash, now).await {
                Ok(report) => {
                    self.audit
                        .record(
                            AuditLogEntry::new(None, "story.deliver", "story", story.id.to_string(), now)
                                .with_changes(serde_json::json!({
                                    "delivered": report.delivered,
                                    "suppressed": report.total() - report.delivered,
                                })),
                        )
                        .await;
                }
                Err(e) => {
                    tracing::warn!(
                        story_id = %story.id,
                        error = %e,
                        "delivery fan-out failed after publish"
                    );
                }
            }
        }

        Ok(story)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Audit Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// List the audit trail for a story, newest first.
    pub async fn audit_trail(&self, story_id: &StoryId) -> Result<Vec<AuditLogEntry>> {
        Ok(self.store.list_audit("story", &story_id.to_string()).await?)
    }
}
