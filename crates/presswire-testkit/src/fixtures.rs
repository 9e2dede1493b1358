//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use presswire::{ApprovalInput, Newsroom, NewsroomConfig, StoryInput};
use presswire_core::{
    ActorId, ApprovalDecision, Caller, ContentBlock, RiskAcknowledgement, Role, Story,
    StoryVersion, Subscription, SubscriptionPlan, UserPreferences, VersionDraft,
};
use presswire_store::{MemoryStore, Store};

/// A test fixture with an in-memory newsroom and one caller per role tier.
pub struct TestFixture {
    pub newsroom: Newsroom<MemoryStore>,
    pub journalist: Caller,
    pub editor: Caller,
    pub admin: Caller,
    pub subscriber: Caller,
}

impl TestFixture {
    /// Create a new fixture over a fresh memory store.
    pub fn new() -> Self {
        Self::with_config(NewsroomConfig::default())
    }

    /// Create a fixture with custom newsroom configuration.
    pub fn with_config(config: NewsroomConfig) -> Self {
        Self {
            newsroom: Newsroom::new(MemoryStore::new(), config),
            journalist: Caller::new(ActorId::generate(), Role::Journalist),
            editor: Caller::new(ActorId::generate(), Role::Editor),
            admin: Caller::new(ActorId::generate(), Role::Admin),
            subscriber: Caller::new(ActorId::generate(), Role::Subscriber),
        }
    }

    /// Direct access to the backing store.
    pub fn store(&self) -> &MemoryStore {
        self.newsroom.store()
    }

    /// Create a draft story with the given headline and topics.
    pub async fn draft_story(&self, headline: &str, topics: &[&str]) -> Story {
        self.newsroom
            .create_story(
                &self.journalist,
                StoryInput {
                    headline: headline.to_string(),
                    topic_tags: topics.iter().map(|t| t.to_string()).collect(),
                    ..Default::default()
                },
            )
            .await
            .expect("fixture story")
    }

    /// Create a draft story with one text version.
    pub async fn story_with_version(&self, headline: &str, body: &str) -> (Story, StoryVersion) {
        let story = self.draft_story(headline, &[]).await;
        let version = self
            .newsroom
            .create_version(
                &self.journalist,
                &story.id,
                VersionDraft::new(vec![ContentBlock::text(body)]),
            )
            .await
            .expect("fixture version");
        (story, version)
    }

    /// Register an active subscriber with permissive preferences.
    pub async fn add_subscriber(&self, plan: SubscriptionPlan) -> ActorId {
        let user_id = ActorId::generate();
        self.store()
            .upsert_subscription(&Subscription::active(user_id, plan))
            .await
            .expect("fixture subscription");
        user_id
    }

    /// Register an active subscriber with specific preferences.
    pub async fn add_subscriber_with_prefs(&self, prefs: UserPreferences) -> ActorId {
        let user_id = prefs.user_id;
        self.store()
            .upsert_subscription(&Subscription::active(user_id, SubscriptionPlan::Free))
            .await
            .expect("fixture subscription");
        self.store()
            .upsert_preferences(&prefs)
            .await
            .expect("fixture preferences");
        user_id
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// An approval input that acknowledges every risk flag on the version.
pub fn approve_fully(version: &StoryVersion) -> ApprovalInput {
    ApprovalInput {
        version_hash: version.hash,
        decision: ApprovalDecision::Approved,
        notes: None,
        acknowledgements: version
            .risk_flags
            .iter()
            .map(|f| RiskAcknowledgement::accept(f.flag_type, "reviewed with legal"))
            .collect(),
    }
}

/// An approval input that acknowledges nothing.
pub fn approve_blind(version: &StoryVersion) -> ApprovalInput {
    ApprovalInput {
        version_hash: version.hash,
        decision: ApprovalDecision::Approved,
        notes: None,
        acknowledgements: Vec::new(),
    }
}
