//! In-memory implementation of the Store trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use presswire_core::{
    ActorId, ApprovalDecision, ApprovalRecord, AuditLogEntry, DeliveryLog, DeliveryResult, Story,
    StoryId, StoryVersion, Subscription, UserPreferences, VersionHash,
};

use crate::error::{Result, StoreError};
use crate::traits::{ApprovalInsert, Store, StoryFilter, VersionAppend};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock;
/// the single write lock gives the same serialization guarantees the
/// SQLite connection mutex does.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

struct MemoryStoreInner {
    /// Story envelopes indexed by ID.
    stories: HashMap<StoryId, Story>,

    /// Slug index: slug -> story_id.
    slugs: HashMap<String, StoryId>,

    /// Version rows indexed by (story_id, hash).
    versions: HashMap<(StoryId, VersionHash), StoryVersion>,

    /// Approval ledger, in insertion order.
    approvals: Vec<ApprovalRecord>,

    /// Delivery log, in insertion order.
    deliveries: Vec<DeliveryLog>,

    /// Subscriptions keyed by subscriber.
    subscriptions: HashMap<ActorId, Subscription>,

    /// Notification preferences keyed by subscriber.
    preferences: HashMap<ActorId, UserPreferences>,

    /// Audit log, in insertion order.
    audit: Vec<AuditLogEntry>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner {
                stories: HashMap::new(),
                slugs: HashMap::new(),
                versions: HashMap::new(),
                approvals: Vec::new(),
                deliveries: Vec::new(),
                subscriptions: HashMap::new(),
                preferences: HashMap::new(),
                audit: Vec::new(),
            }),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_story(&self, story: &Story) -> Result<()> {
        let mut inner = self.inner.write().unwrap();

        if inner.slugs.contains_key(&story.slug) {
            return Err(StoreError::InvalidData(format!(
                "slug already taken: {}",
                story.slug
            )));
        }

        inner.slugs.insert(story.slug.clone(), story.id);
        inner.stories.insert(story.id, story.clone());
        Ok(())
    }

    async fn get_story(&self, id: &StoryId) -> Result<Option<Story>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.stories.get(id).cloned())
    }

    async fn get_story_by_slug(&self, slug: &str) -> Result<Option<Story>> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .slugs
            .get(slug)
            .and_then(|id| inner.stories.get(id))
            .cloned())
    }

    async fn list_stories(&self, filter: &StoryFilter) -> Result<Vec<Story>> {
        let inner = self.inner.read().unwrap();

        let mut stories: Vec<Story> = inner
            .stories
            .values()
            .filter(|s| filter.status.map_or(true, |status| s.status == status))
            .filter(|s| filter.author_id.map_or(true, |author| s.author_id == author))
            .filter(|s| {
                filter.topic.as_deref().map_or(true, |topic| {
                    s.topic_tags.iter().any(|t| t.eq_ignore_ascii_case(topic))
                })
            })
            .cloned()
            .collect();

        stories.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        if let Some(limit) = filter.limit {
            stories.truncate(limit);
        }

        Ok(stories)
    }

    async fn update_story(&self, story: &Story) -> Result<()> {
        let mut inner = self.inner.write().unwrap();

        if !inner.stories.contains_key(&story.id) {
            return Err(StoreError::NotFound(format!("story {}", story.id)));
        }

        inner.stories.insert(story.id, story.clone());
        Ok(())
    }

    async fn append_version(
        &self,
        version: &StoryVersion,
        now: DateTime<Utc>,
    ) -> Result<VersionAppend> {
        let mut inner = self.inner.write().unwrap();

        let story_id = version.story_id;
        if !inner.stories.contains_key(&story_id) {
            return Err(StoreError::NotFound(format!("story {}", story_id)));
        }

        // Unchanged content: return the existing row, write nothing.
        if let Some(existing) = inner.versions.get(&(story_id, version.hash)) {
            return Ok(VersionAppend::Unchanged(existing.clone()));
        }

        let next_number = inner
            .versions
            .values()
            .filter(|v| v.story_id == story_id)
            .map(|v| v.version_number)
            .max()
            .unwrap_or(0)
            + 1;

        let mut stored = version.clone();
        stored.version_number = next_number;
        inner
            .versions
            .insert((story_id, stored.hash), stored.clone());

        // Advance the envelope's current pointer under the same write lock.
        let story = inner.stories.get_mut(&story_id).unwrap();
        story.current_version_hash = Some(stored.hash);
        story.updated_at = now;

        Ok(VersionAppend::Appended(stored))
    }

    async fn get_version(
        &self,
        story_id: &StoryId,
        hash: &VersionHash,
    ) -> Result<Option<StoryVersion>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.versions.get(&(*story_id, *hash)).cloned())
    }

    async fn list_versions(&self, story_id: &StoryId) -> Result<Vec<StoryVersion>> {
        let inner = self.inner.read().unwrap();

        let mut versions: Vec<StoryVersion> = inner
            .versions
            .values()
            .filter(|v| v.story_id == *story_id)
            .cloned()
            .collect();

        versions.sort_by(|a, b| b.version_number.cmp(&a.version_number));
        Ok(versions)
    }

    async fn insert_approval(&self, record: &ApprovalRecord) -> Result<ApprovalInsert> {
        let mut inner = self.inner.write().unwrap();

        if record.decision == ApprovalDecision::Approved {
            if let Some(existing) = inner.approvals.iter().find(|a| {
                a.story_id == record.story_id
                    && a.version_hash == record.version_hash
                    && a.decision == ApprovalDecision::Approved
            }) {
                return Ok(ApprovalInsert::AlreadyApproved {
                    existing: existing.id,
                });
            }
        }

        inner.approvals.push(record.clone());
        Ok(ApprovalInsert::Inserted)
    }

    async fn find_approved(
        &self,
        story_id: &StoryId,
        hash: &VersionHash,
    ) -> Result<Option<ApprovalRecord>> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .approvals
            .iter()
            .find(|a| {
                a.story_id == *story_id
                    && a.version_hash == *hash
                    && a.decision == ApprovalDecision::Approved
            })
            .cloned())
    }

    async fn list_approvals(&self, story_id: &StoryId) -> Result<Vec<ApprovalRecord>> {
        let inner = self.inner.read().unwrap();

        let mut records: Vec<ApprovalRecord> = inner
            .approvals
            .iter()
            .filter(|a| a.story_id == *story_id)
            .cloned()
            .collect();

        records.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        Ok(records)
    }

    async fn append_delivery_logs(&self, logs: &[DeliveryLog]) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        inner.deliveries.extend_from_slice(logs);
        Ok(())
    }

    async fn list_delivery_logs(&self, story_id: &StoryId) -> Result<Vec<DeliveryLog>> {
        let inner = self.inner.read().unwrap();

        let mut logs: Vec<DeliveryLog> = inner
            .deliveries
            .iter()
            .filter(|l| l.story_id == *story_id)
            .cloned()
            .collect();

        logs.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        Ok(logs)
    }

    async fn count_delivered_since(
        &self,
        user_id: &ActorId,
        since: DateTime<Utc>,
    ) -> Result<u64> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .deliveries
            .iter()
            .filter(|l| {
                l.user_id == *user_id
                    && l.result == DeliveryResult::Delivered
                    && l.recorded_at >= since
            })
            .count() as u64)
    }

    async fn upsert_subscription(&self, subscription: &Subscription) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        inner
            .subscriptions
            .insert(subscription.user_id, subscription.clone());
        Ok(())
    }

    async fn list_active_subscriptions(&self) -> Result<Vec<Subscription>> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .subscriptions
            .values()
            .filter(|s| s.is_active)
            .cloned()
            .collect())
    }

    async fn upsert_preferences(&self, preferences: &UserPreferences) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        inner
            .preferences
            .insert(preferences.user_id, preferences.clone());
        Ok(())
    }

    async fn get_preferences(&self, user_id: &ActorId) -> Result<Option<UserPreferences>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.preferences.get(user_id).cloned())
    }

    async fn append_audit(&self, entry: &AuditLogEntry) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        inner.audit.push(entry.clone());
        Ok(())
    }

    async fn list_audit(
        &self,
        resource_type: &str,
        resource_id: &str,
    ) -> Result<Vec<AuditLogEntry>> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .audit
            .iter()
            .rev()
            .filter(|e| e.resource_type == resource_type && e.resource_id == resource_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use presswire_core::{ApprovalId, ContentBlock, VersionDraft};

    fn make_story() -> Story {
        Story::new_draft(
            ActorId::generate(),
            "council-passes-budget",
            "Council passes budget",
            Utc::now(),
        )
    }

    fn make_version(story_id: StoryId, body: &str) -> StoryVersion {
        VersionDraft::new(vec![ContentBlock::text(body)]).into_version(story_id, Utc::now())
    }

    #[tokio::test]
    async fn test_memory_store_story_roundtrip() {
        let store = MemoryStore::new();
        let story = make_story();

        store.insert_story(&story).await.unwrap();
        let retrieved = store.get_story(&story.id).await.unwrap().unwrap();
        assert_eq!(retrieved, story);

        let by_slug = store
            .get_story_by_slug("council-passes-budget")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_slug.id, story.id);
    }

    #[tokio::test]
    async fn test_memory_store_duplicate_slug_rejected() {
        let store = MemoryStore::new();
        let a = make_story();
        let mut b = make_story();
        b.slug = a.slug.clone();

        store.insert_story(&a).await.unwrap();
        assert!(store.insert_story(&b).await.is_err());
    }

    #[tokio::test]
    async fn test_append_version_numbers_and_pointer() {
        let store = MemoryStore::new();
        let story = make_story();
        store.insert_story(&story).await.unwrap();

        let v1 = make_version(story.id, "first draft");
        let v2 = make_version(story.id, "second draft");

        let r1 = store.append_version(&v1, Utc::now()).await.unwrap();
        let r2 = store.append_version(&v2, Utc::now()).await.unwrap();

        let stored1 = match r1 {
            VersionAppend::Appended(v) => v,
            other => panic!("expected Appended, got {:?}", other),
        };
        let stored2 = match r2 {
            VersionAppend::Appended(v) => v,
            other => panic!("expected Appended, got {:?}", other),
        };

        assert_eq!(stored1.version_number, 1);
        assert_eq!(stored2.version_number, 2);

        let envelope = store.get_story(&story.id).await.unwrap().unwrap();
        assert_eq!(envelope.current_version_hash, Some(stored2.hash));
    }

    #[tokio::test]
    async fn test_append_version_idempotent_on_same_content() {
        let store = MemoryStore::new();
        let story = make_story();
        store.insert_story(&story).await.unwrap();

        let v = make_version(story.id, "same body");
        let first = store
            .append_version(&v, Utc::now())
            .await
            .unwrap()
            .into_version();

        // Same content hashes to the same key even from a fresh draft.
        let again = make_version(story.id, "same body");
        let result = store.append_version(&again, Utc::now()).await.unwrap();
        assert_eq!(result, VersionAppend::Unchanged(first));
    }

    #[tokio::test]
    async fn test_second_approval_of_same_hash_refused() {
        let store = MemoryStore::new();
        let story = make_story();
        store.insert_story(&story).await.unwrap();

        let v = make_version(story.id, "body");
        let stored = store
            .append_version(&v, Utc::now())
            .await
            .unwrap()
            .into_version();

        let record = ApprovalRecord {
            id: ApprovalId::generate(),
            story_id: story.id,
            version_hash: stored.hash,
            approver_id: ActorId::generate(),
            decision: ApprovalDecision::Approved,
            notes: None,
            acknowledgements: vec![],
            recorded_at: Utc::now(),
        };

        assert_eq!(
            store.insert_approval(&record).await.unwrap(),
            ApprovalInsert::Inserted
        );

        let mut second = record.clone();
        second.id = ApprovalId::generate();
        assert_eq!(
            store.insert_approval(&second).await.unwrap(),
            ApprovalInsert::AlreadyApproved {
                existing: record.id
            }
        );
    }

    #[tokio::test]
    async fn test_count_delivered_since_ignores_suppressions() {
        let store = MemoryStore::new();
        let user = ActorId::generate();
        let story_id = StoryId::generate();
        let now = Utc::now();

        let logs = vec![
            DeliveryLog::delivered(
                user,
                story_id,
                VersionHash::ZERO,
                presswire_core::DeliveryChannel::Feed,
                now,
            ),
            DeliveryLog::suppressed(
                user,
                story_id,
                VersionHash::ZERO,
                presswire_core::DeliveryChannel::Feed,
                presswire_core::SuppressionReason::MutedTopic,
                now,
            ),
        ];
        store.append_delivery_logs(&logs).await.unwrap();

        let count = store
            .count_delivered_since(&user, now - chrono::Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(count, 1);
    }
}
