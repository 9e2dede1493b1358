//! Stories and their immutable versions.
//!
//! A `Story` is the mutable envelope: status, tags, and a pointer to the
//! current content version. A `StoryVersion` is an immutable snapshot;
//! edits always produce a new version with a new fingerprint and a new
//! version number. Stories are never deleted in-flow; retraction is a
//! terminal status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::content::{ContentBlock, RiskFlag, SourceEntry};
use crate::fingerprint::fingerprint;
use crate::types::{ActorId, StoryId, VersionHash, VersionId};

/// Story lifecycle states.
///
/// Forward flow is `Draft -> InReview -> Approved -> Published`.
/// `Corrected` and `Retracted` are reachable only from `Published`.
/// A revision-requested decision returns a story to `Draft`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoryStatus {
    Draft,
    InReview,
    Approved,
    Published,
    Corrected,
    Retracted,
}

impl StoryStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            StoryStatus::Draft => "draft",
            StoryStatus::InReview => "in_review",
            StoryStatus::Approved => "approved",
            StoryStatus::Published => "published",
            StoryStatus::Corrected => "corrected",
            StoryStatus::Retracted => "retracted",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(StoryStatus::Draft),
            "in_review" => Some(StoryStatus::InReview),
            "approved" => Some(StoryStatus::Approved),
            "published" => Some(StoryStatus::Published),
            "corrected" => Some(StoryStatus::Corrected),
            "retracted" => Some(StoryStatus::Retracted),
            _ => None,
        }
    }

    /// True for states only reachable after a publish.
    pub fn is_post_publish(self) -> bool {
        matches!(
            self,
            StoryStatus::Published | StoryStatus::Corrected | StoryStatus::Retracted
        )
    }
}

impl fmt::Display for StoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The mutable story envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    pub id: StoryId,
    pub slug: String,
    pub headline: String,
    pub summary: Option<String>,
    pub status: StoryStatus,
    pub topic_tags: Vec<String>,
    pub geo_tags: Vec<String>,
    pub author_id: ActorId,
    /// Pointer to the latest content version. Advancing it orphans any
    /// approval bound to the previous hash.
    pub current_version_hash: Option<VersionHash>,
    pub published_at: Option<DateTime<Utc>>,
    pub is_gated: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Story {
    /// Create a fresh draft story.
    pub fn new_draft(
        author_id: ActorId,
        slug: impl Into<String>,
        headline: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: StoryId::generate(),
            slug: slug.into(),
            headline: headline.into(),
            summary: None,
            status: StoryStatus::Draft,
            topic_tags: Vec::new(),
            geo_tags: Vec::new(),
            author_id,
            current_version_hash: None,
            published_at: None,
            is_gated: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// An immutable content snapshot.
///
/// Once the version's hash carries an approved ledger entry, its content
/// must never change; any edit goes through a new version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryVersion {
    pub id: VersionId,
    pub story_id: StoryId,
    pub hash: VersionHash,
    /// Monotonic per story, assigned by the store. Starts at 1.
    pub version_number: u32,
    pub content_blocks: Vec<ContentBlock>,
    pub source_log: Vec<SourceEntry>,
    pub public_sources: Vec<String>,
    pub risk_flags: Vec<RiskFlag>,
    pub created_at: DateTime<Utc>,
}

/// Draft content for a new version; the hash and number are derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionDraft {
    pub content_blocks: Vec<ContentBlock>,
    #[serde(default)]
    pub source_log: Vec<SourceEntry>,
    #[serde(default)]
    pub public_sources: Vec<String>,
    #[serde(default)]
    pub risk_flags: Vec<RiskFlag>,
}

impl VersionDraft {
    pub fn new(content_blocks: Vec<ContentBlock>) -> Self {
        Self {
            content_blocks,
            source_log: Vec::new(),
            public_sources: Vec::new(),
            risk_flags: Vec::new(),
        }
    }

    pub fn with_risk_flags(mut self, risk_flags: Vec<RiskFlag>) -> Self {
        self.risk_flags = risk_flags;
        self
    }

    pub fn with_source_log(mut self, source_log: Vec<SourceEntry>) -> Self {
        self.source_log = source_log;
        self
    }

    /// Compute the content fingerprint of this draft.
    pub fn fingerprint(&self) -> VersionHash {
        fingerprint(&self.content_blocks, &self.source_log, &self.risk_flags)
    }

    /// Materialize the draft into a version row. The version number is a
    /// placeholder until the store assigns the real one.
    pub fn into_version(self, story_id: StoryId, now: DateTime<Utc>) -> StoryVersion {
        let hash = self.fingerprint();
        StoryVersion {
            id: VersionId::generate(),
            story_id,
            hash,
            version_number: 0,
            content_blocks: self.content_blocks,
            source_log: self.source_log,
            public_sources: self.public_sources,
            risk_flags: self.risk_flags,
            created_at: now,
        }
    }
}
