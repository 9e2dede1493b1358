//! Store trait: the abstract interface for pipeline persistence.
//!
//! This trait keeps the newsroom facade storage-agnostic. Implementations
//! include SQLite (primary) and in-memory (for tests).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use presswire_core::{
    ActorId, ApprovalId, ApprovalRecord, AuditLogEntry, DeliveryLog, Story, StoryId, StoryStatus,
    StoryVersion, Subscription, UserPreferences, VersionHash,
};

use crate::error::Result;

/// Result of appending a story version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionAppend {
    /// A new version row was written, with its assigned number.
    Appended(StoryVersion),
    /// A version with this exact content hash already exists for the story
    /// (idempotent - not an error). Carries the existing row.
    Unchanged(StoryVersion),
}

impl VersionAppend {
    /// The version row, whether freshly appended or pre-existing.
    pub fn into_version(self) -> StoryVersion {
        match self {
            VersionAppend::Appended(v) | VersionAppend::Unchanged(v) => v,
        }
    }
}

/// Result of inserting an approval ledger entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalInsert {
    /// Entry was appended to the ledger.
    Inserted,
    /// An `Approved` entry already exists for this `(story, hash)` pair.
    /// The ledger refuses a second one rather than overwriting.
    AlreadyApproved {
        /// The existing approval's ID.
        existing: ApprovalId,
    },
}

/// Filter for story listings. All fields are AND-combined; `None` matches
/// everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoryFilter {
    pub status: Option<StoryStatus>,
    pub author_id: Option<ActorId>,
    /// Case-insensitive match against a story's topic tags.
    pub topic: Option<String>,
    pub limit: Option<usize>,
}

/// The Store trait: async interface for pipeline persistence.
///
/// All methods are async to support both sync (SQLite) and async backends.
/// For SQLite, we use `spawn_blocking` internally to avoid blocking the runtime.
///
/// # Design Notes
///
/// - **Append-only ledgers**: versions, approvals, delivery logs, and audit
///   entries are never updated or deleted through this interface.
/// - **Atomic version numbering**: [`append_version`](Store::append_version)
///   assigns the next per-story number and advances the story's current
///   pointer in one step, so concurrent edits cannot mint duplicate numbers.
/// - **Idempotent appends**: re-appending unchanged content returns
///   `Unchanged`; re-approving an approved hash returns `AlreadyApproved`.
#[async_trait]
pub trait Store: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Story Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Insert a new story envelope.
    ///
    /// Fails with [`StoreError::InvalidData`](crate::StoreError::InvalidData)
    /// if the slug is already taken.
    async fn insert_story(&self, story: &Story) -> Result<()>;

    /// Get a story by ID.
    async fn get_story(&self, id: &StoryId) -> Result<Option<Story>>;

    /// Get a story by its URL slug.
    async fn get_story_by_slug(&self, slug: &str) -> Result<Option<Story>>;

    /// List stories matching a filter, newest first.
    async fn list_stories(&self, filter: &StoryFilter) -> Result<Vec<Story>>;

    /// Overwrite a story envelope. The envelope is the only mutable record
    /// in the schema.
    ///
    /// Fails with `NotFound` if the story does not exist.
    async fn update_story(&self, story: &Story) -> Result<()>;

    // ─────────────────────────────────────────────────────────────────────────
    // Version Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Append a content version to a story.
    ///
    /// Atomically assigns the next version number (max + 1, starting at 1),
    /// writes the row, and advances the story's `current_version_hash` and
    /// `updated_at`. The `version_number` on the input is ignored.
    ///
    /// # Returns
    /// - `Appended` with the stored row if the hash was new for this story.
    /// - `Unchanged` with the existing row if this exact content already
    ///   exists (nothing is written).
    async fn append_version(
        &self,
        version: &StoryVersion,
        now: DateTime<Utc>,
    ) -> Result<VersionAppend>;

    /// Get a version by its content hash within a story.
    async fn get_version(
        &self,
        story_id: &StoryId,
        hash: &VersionHash,
    ) -> Result<Option<StoryVersion>>;

    /// List all versions of a story, newest number first.
    async fn list_versions(&self, story_id: &StoryId) -> Result<Vec<StoryVersion>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Approval Ledger Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Append an entry to the approval ledger.
    ///
    /// Returns `AlreadyApproved` instead of writing when the entry's
    /// decision is `Approved` and an approved entry already exists for the
    /// same `(story_id, version_hash)`. Rejections and revision requests
    /// are never deduplicated.
    async fn insert_approval(&self, record: &ApprovalRecord) -> Result<ApprovalInsert>;

    /// Find the approved ledger entry for an exact `(story, hash)` pair.
    async fn find_approved(
        &self,
        story_id: &StoryId,
        hash: &VersionHash,
    ) -> Result<Option<ApprovalRecord>>;

    /// List all ledger entries for a story, newest first.
    async fn list_approvals(&self, story_id: &StoryId) -> Result<Vec<ApprovalRecord>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Delivery Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Append a batch of delivery log rows.
    async fn append_delivery_logs(&self, logs: &[DeliveryLog]) -> Result<()>;

    /// List delivery log rows for a story, newest first.
    async fn list_delivery_logs(&self, story_id: &StoryId) -> Result<Vec<DeliveryLog>>;

    /// Count rows with result `delivered` for a subscriber at or after
    /// `since`. Used for the daily frequency cap.
    async fn count_delivered_since(
        &self,
        user_id: &ActorId,
        since: DateTime<Utc>,
    ) -> Result<u64>;

    // ─────────────────────────────────────────────────────────────────────────
    // Subscriber Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Insert or replace a subscription row.
    async fn upsert_subscription(&self, subscription: &Subscription) -> Result<()>;

    /// List subscriptions with `is_active == true`.
    async fn list_active_subscriptions(&self) -> Result<Vec<Subscription>>;

    /// Insert or replace a subscriber's notification preferences.
    async fn upsert_preferences(&self, preferences: &UserPreferences) -> Result<()>;

    /// Get a subscriber's stored preferences, if any.
    async fn get_preferences(&self, user_id: &ActorId) -> Result<Option<UserPreferences>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Audit Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Append an audit log entry.
    async fn append_audit(&self, entry: &AuditLogEntry) -> Result<()>;

    /// List audit entries for one resource, newest first.
    async fn list_audit(
        &self,
        resource_type: &str,
        resource_id: &str,
    ) -> Result<Vec<AuditLogEntry>>;
}
