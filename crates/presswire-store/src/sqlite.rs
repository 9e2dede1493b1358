//! SQLite implementation of the Store trait.
//!
//! This is the primary storage backend for Presswire. It uses rusqlite
//! with bundled SQLite, wrapped in async via tokio::spawn_blocking.
//!
//! Identifiers are stored as UUID text, version hashes as 64-char hex,
//! timestamps as Unix milliseconds, and vector-valued fields as JSON text.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use presswire_core::{
    ActorId, ApprovalDecision, ApprovalId, ApprovalRecord, AuditLogEntry, ContentBlock,
    DeliveryChannel, DeliveryLog, DeliveryResult, QuietHours, RequestMeta, RiskAcknowledgement,
    RiskFlag, SourceEntry, Story, StoryId, StoryStatus, StoryVersion, Subscription,
    SubscriptionPlan, SuppressionReason, UserPreferences, VersionHash, VersionId,
};
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{ApprovalInsert, Store, StoryFilter, VersionAppend};

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime; the connection mutex serializes
/// writers, so check-then-insert sequences inside one closure are atomic.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(&path)?;
        migration::migrate(&mut conn)?;
        tracing::debug!(path = %path.as_ref().display(), "opened sqlite store");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a closure against the connection on the blocking pool.
    async fn run<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = lock(&conn)?;
            f(&mut guard)
        })
        .await
        .map_err(|e| StoreError::Task(format!("spawn_blocking failed: {}", e)))?
    }
}

fn lock(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|e| StoreError::Task(format!("connection mutex poisoned: {}", e)))
}

// ─────────────────────────────────────────────────────────────────────────────
// Column conversion helpers
// ─────────────────────────────────────────────────────────────────────────────

fn bad_column(name: &str, detail: impl std::fmt::Display) -> StoreError {
    StoreError::InvalidData(format!("column {}: {}", name, detail))
}

fn parse_uuid(name: &str, s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| bad_column(name, e))
}

fn parse_hash(name: &str, s: &str) -> Result<VersionHash> {
    VersionHash::from_hex(s).map_err(|e| bad_column(name, e))
}

fn parse_millis(name: &str, ms: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms).ok_or_else(|| bad_column(name, "timestamp out of range"))
}

fn from_json<T: serde::de::DeserializeOwned>(name: &str, s: &str) -> Result<T> {
    serde_json::from_str(s).map_err(|e| bad_column(name, e))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

/// Raw story row as it comes out of SQLite, before decoding.
type StoryRow = (
    String,         // id
    String,         // slug
    String,         // headline
    Option<String>, // summary
    String,         // status
    String,         // topic_tags
    String,         // geo_tags
    String,         // author_id
    Option<String>, // current_version_hash
    Option<i64>,    // published_at
    bool,           // is_gated
    i64,            // created_at
    i64,            // updated_at
);

const STORY_COLUMNS: &str = "id, slug, headline, summary, status, topic_tags, geo_tags, \
     author_id, current_version_hash, published_at, is_gated, created_at, updated_at";

fn read_story_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoryRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
        row.get(10)?,
        row.get(11)?,
        row.get(12)?,
    ))
}

fn decode_story(raw: StoryRow) -> Result<Story> {
    let (
        id,
        slug,
        headline,
        summary,
        status,
        topic_tags,
        geo_tags,
        author_id,
        current_hash,
        published_at,
        is_gated,
        created_at,
        updated_at,
    ) = raw;

    Ok(Story {
        id: StoryId::from_uuid(parse_uuid("id", &id)?),
        slug,
        headline,
        summary,
        status: StoryStatus::parse(&status).ok_or_else(|| bad_column("status", &status))?,
        topic_tags: from_json("topic_tags", &topic_tags)?,
        geo_tags: from_json("geo_tags", &geo_tags)?,
        author_id: ActorId::from_uuid(parse_uuid("author_id", &author_id)?),
        current_version_hash: current_hash
            .map(|h| parse_hash("current_version_hash", &h))
            .transpose()?,
        published_at: published_at
            .map(|ms| parse_millis("published_at", ms))
            .transpose()?,
        is_gated,
        created_at: parse_millis("created_at", created_at)?,
        updated_at: parse_millis("updated_at", updated_at)?,
    })
}

type VersionRow = (String, String, String, i64, String, String, String, String, i64);

const VERSION_COLUMNS: &str = "id, story_id, version_hash, version_number, content_blocks, \
     source_log, public_sources, risk_flags, created_at";

fn read_version_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<VersionRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
    ))
}

fn decode_version(raw: VersionRow) -> Result<StoryVersion> {
    let (id, story_id, hash, number, blocks, sources, public_sources, flags, created_at) = raw;

    let content_blocks: Vec<ContentBlock> = from_json("content_blocks", &blocks)?;
    let source_log: Vec<SourceEntry> = from_json("source_log", &sources)?;
    let risk_flags: Vec<RiskFlag> = from_json("risk_flags", &flags)?;

    Ok(StoryVersion {
        id: VersionId::from_uuid(parse_uuid("id", &id)?),
        story_id: StoryId::from_uuid(parse_uuid("story_id", &story_id)?),
        hash: parse_hash("version_hash", &hash)?,
        version_number: u32::try_from(number).map_err(|e| bad_column("version_number", e))?,
        content_blocks,
        source_log,
        public_sources: from_json("public_sources", &public_sources)?,
        risk_flags,
        created_at: parse_millis("created_at", created_at)?,
    })
}

type ApprovalRow = (String, String, String, String, String, Option<String>, String, i64);

const APPROVAL_COLUMNS: &str =
    "id, story_id, version_hash, approver_id, decision, notes, acknowledgements, recorded_at";

fn read_approval_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ApprovalRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
    ))
}

fn decode_approval(raw: ApprovalRow) -> Result<ApprovalRecord> {
    let (id, story_id, hash, approver, decision, notes, acks, recorded_at) = raw;

    let acknowledgements: Vec<RiskAcknowledgement> = from_json("acknowledgements", &acks)?;

    Ok(ApprovalRecord {
        id: ApprovalId::from_uuid(parse_uuid("id", &id)?),
        story_id: StoryId::from_uuid(parse_uuid("story_id", &story_id)?),
        version_hash: parse_hash("version_hash", &hash)?,
        approver_id: ActorId::from_uuid(parse_uuid("approver_id", &approver)?),
        decision: ApprovalDecision::parse(&decision)
            .ok_or_else(|| bad_column("decision", &decision))?,
        notes,
        acknowledgements,
        recorded_at: parse_millis("recorded_at", recorded_at)?,
    })
}

type DeliveryRow = (String, String, String, String, String, String, Option<String>, i64);

const DELIVERY_COLUMNS: &str =
    "id, user_id, story_id, version_hash, channel, result, suppression_reason, recorded_at";

fn read_delivery_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DeliveryRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
    ))
}

fn decode_delivery(raw: DeliveryRow) -> Result<DeliveryLog> {
    let (id, user_id, story_id, hash, channel, result, reason, recorded_at) = raw;

    Ok(DeliveryLog {
        id: parse_uuid("id", &id)?,
        user_id: ActorId::from_uuid(parse_uuid("user_id", &user_id)?),
        story_id: StoryId::from_uuid(parse_uuid("story_id", &story_id)?),
        version_hash: parse_hash("version_hash", &hash)?,
        channel: DeliveryChannel::parse(&channel).ok_or_else(|| bad_column("channel", &channel))?,
        result: DeliveryResult::parse(&result).ok_or_else(|| bad_column("result", &result))?,
        suppression_reason: reason
            .map(|r| SuppressionReason::parse(&r).ok_or_else(|| bad_column("suppression_reason", &r)))
            .transpose()?,
        recorded_at: parse_millis("recorded_at", recorded_at)?,
    })
}

const TIME_FORMAT: &str = "%H:%M:%S";

fn encode_time(t: NaiveTime) -> String {
    t.format(TIME_FORMAT).to_string()
}

fn parse_time(name: &str, s: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(s, TIME_FORMAT).map_err(|e| bad_column(name, e))
}

#[async_trait]
impl Store for SqliteStore {
    async fn insert_story(&self, story: &Story) -> Result<()> {
        let story = story.clone();
        self.run(move |conn| {
            let taken: Option<String> = conn
                .query_row(
                    "SELECT id FROM stories WHERE slug = ?1",
                    params![&story.slug],
                    |row| row.get(0),
                )
                .optional()?;
            if taken.is_some() {
                return Err(StoreError::InvalidData(format!(
                    "slug already taken: {}",
                    story.slug
                )));
            }

            conn.execute(
                "INSERT INTO stories (
                    id, slug, headline, summary, status, topic_tags, geo_tags,
                    author_id, current_version_hash, published_at, is_gated,
                    created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    story.id.to_string(),
                    &story.slug,
                    &story.headline,
                    &story.summary,
                    story.status.as_str(),
                    to_json(&story.topic_tags)?,
                    to_json(&story.geo_tags)?,
                    story.author_id.to_string(),
                    story.current_version_hash.map(|h| h.to_hex()),
                    story.published_at.map(|t| t.timestamp_millis()),
                    story.is_gated,
                    story.created_at.timestamp_millis(),
                    story.updated_at.timestamp_millis(),
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn get_story(&self, id: &StoryId) -> Result<Option<Story>> {
        let id = id.to_string();
        self.run(move |conn| {
            let raw = conn
                .query_row(
                    &format!("SELECT {} FROM stories WHERE id = ?1", STORY_COLUMNS),
                    params![id],
                    read_story_row,
                )
                .optional()?;
            raw.map(decode_story).transpose()
        })
        .await
    }

    async fn get_story_by_slug(&self, slug: &str) -> Result<Option<Story>> {
        let slug = slug.to_string();
        self.run(move |conn| {
            let raw = conn
                .query_row(
                    &format!("SELECT {} FROM stories WHERE slug = ?1", STORY_COLUMNS),
                    params![slug],
                    read_story_row,
                )
                .optional()?;
            raw.map(decode_story).transpose()
        })
        .await
    }

    async fn list_stories(&self, filter: &StoryFilter) -> Result<Vec<Story>> {
        let filter = filter.clone();
        self.run(move |conn| {
            // Status and author filter in SQL; topic matching stays in Rust
            // because tags live in a JSON column.
            let mut sql = format!("SELECT {} FROM stories WHERE 1=1", STORY_COLUMNS);
            let mut args: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

            if let Some(status) = filter.status {
                args.push(Box::new(status.as_str().to_string()));
                sql.push_str(&format!(" AND status = ?{}", args.len()));
            }
            if let Some(author) = filter.author_id {
                args.push(Box::new(author.to_string()));
                sql.push_str(&format!(" AND author_id = ?{}", args.len()));
            }
            sql.push_str(" ORDER BY created_at DESC");

            let mut stmt = conn.prepare(&sql)?;
            let raws = stmt
                .query_map(
                    rusqlite::params_from_iter(args.iter().map(|a| a.as_ref())),
                    read_story_row,
                )?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            let mut stories = raws
                .into_iter()
                .map(decode_story)
                .collect::<Result<Vec<_>>>()?;

            if let Some(topic) = filter.topic.as_deref() {
                stories.retain(|s| s.topic_tags.iter().any(|t| t.eq_ignore_ascii_case(topic)));
            }
            if let Some(limit) = filter.limit {
                stories.truncate(limit);
            }

            Ok(stories)
        })
        .await
    }

    async fn update_story(&self, story: &Story) -> Result<()> {
        let story = story.clone();
        self.run(move |conn| {
            let updated = conn.execute(
                "UPDATE stories SET
                    slug = ?2, headline = ?3, summary = ?4, status = ?5,
                    topic_tags = ?6, geo_tags = ?7, author_id = ?8,
                    current_version_hash = ?9, published_at = ?10,
                    is_gated = ?11, updated_at = ?12
                 WHERE id = ?1",
                params![
                    story.id.to_string(),
                    &story.slug,
                    &story.headline,
                    &story.summary,
                    story.status.as_str(),
                    to_json(&story.topic_tags)?,
                    to_json(&story.geo_tags)?,
                    story.author_id.to_string(),
                    story.current_version_hash.map(|h| h.to_hex()),
                    story.published_at.map(|t| t.timestamp_millis()),
                    story.is_gated,
                    story.updated_at.timestamp_millis(),
                ],
            )?;
            if updated == 0 {
                return Err(StoreError::NotFound(format!("story {}", story.id)));
            }
            Ok(())
        })
        .await
    }

    async fn append_version(
        &self,
        version: &StoryVersion,
        now: DateTime<Utc>,
    ) -> Result<VersionAppend> {
        let version = version.clone();
        self.run(move |conn| {
            let tx = conn.transaction()?;

            let story_exists: Option<String> = tx
                .query_row(
                    "SELECT id FROM stories WHERE id = ?1",
                    params![version.story_id.to_string()],
                    |row| row.get(0),
                )
                .optional()?;
            if story_exists.is_none() {
                return Err(StoreError::NotFound(format!("story {}", version.story_id)));
            }

            // Unchanged content: return the existing row, write nothing.
            let existing = tx
                .query_row(
                    &format!(
                        "SELECT {} FROM story_versions WHERE story_id = ?1 AND version_hash = ?2",
                        VERSION_COLUMNS
                    ),
                    params![version.story_id.to_string(), version.hash.to_hex()],
                    read_version_row,
                )
                .optional()?;
            if let Some(raw) = existing {
                return Ok(VersionAppend::Unchanged(decode_version(raw)?));
            }

            let next_number: i64 = tx.query_row(
                "SELECT COALESCE(MAX(version_number), 0) + 1
                 FROM story_versions WHERE story_id = ?1",
                params![version.story_id.to_string()],
                |row| row.get(0),
            )?;

            tx.execute(
                "INSERT INTO story_versions (
                    id, story_id, version_hash, version_number, content_blocks,
                    source_log, public_sources, risk_flags, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    version.id.to_string(),
                    version.story_id.to_string(),
                    version.hash.to_hex(),
                    next_number,
                    to_json(&version.content_blocks)?,
                    to_json(&version.source_log)?,
                    to_json(&version.public_sources)?,
                    to_json(&version.risk_flags)?,
                    version.created_at.timestamp_millis(),
                ],
            )?;

            tx.execute(
                "UPDATE stories SET current_version_hash = ?2, updated_at = ?3 WHERE id = ?1",
                params![
                    version.story_id.to_string(),
                    version.hash.to_hex(),
                    now.timestamp_millis(),
                ],
            )?;

            tx.commit()?;

            let mut stored = version;
            stored.version_number = next_number as u32;
            Ok(VersionAppend::Appended(stored))
        })
        .await
    }

    async fn get_version(
        &self,
        story_id: &StoryId,
        hash: &VersionHash,
    ) -> Result<Option<StoryVersion>> {
        let story_id = story_id.to_string();
        let hash = hash.to_hex();
        self.run(move |conn| {
            let raw = conn
                .query_row(
                    &format!(
                        "SELECT {} FROM story_versions WHERE story_id = ?1 AND version_hash = ?2",
                        VERSION_COLUMNS
                    ),
                    params![story_id, hash],
                    read_version_row,
                )
                .optional()?;
            raw.map(decode_version).transpose()
        })
        .await
    }

    async fn list_versions(&self, story_id: &StoryId) -> Result<Vec<StoryVersion>> {
        let story_id = story_id.to_string();
        self.run(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM story_versions WHERE story_id = ?1 ORDER BY version_number DESC",
                VERSION_COLUMNS
            ))?;
            let raws = stmt
                .query_map(params![story_id], read_version_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            raws.into_iter().map(decode_version).collect()
        })
        .await
    }

    async fn insert_approval(&self, record: &ApprovalRecord) -> Result<ApprovalInsert> {
        let record = record.clone();
        self.run(move |conn| {
            if record.decision == ApprovalDecision::Approved {
                let existing: Option<String> = conn
                    .query_row(
                        "SELECT id FROM approval_records
                         WHERE story_id = ?1 AND version_hash = ?2 AND decision = 'approved'",
                        params![record.story_id.to_string(), record.version_hash.to_hex()],
                        |row| row.get(0),
                    )
                    .optional()?;
                if let Some(id) = existing {
                    return Ok(ApprovalInsert::AlreadyApproved {
                        existing: ApprovalId::from_uuid(parse_uuid("id", &id)?),
                    });
                }
            }

            conn.execute(
                "INSERT INTO approval_records (
                    id, story_id, version_hash, approver_id, decision, notes,
                    acknowledgements, recorded_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    record.id.to_string(),
                    record.story_id.to_string(),
                    record.version_hash.to_hex(),
                    record.approver_id.to_string(),
                    record.decision.as_str(),
                    &record.notes,
                    to_json(&record.acknowledgements)?,
                    record.recorded_at.timestamp_millis(),
                ],
            )?;
            Ok(ApprovalInsert::Inserted)
        })
        .await
    }

    async fn find_approved(
        &self,
        story_id: &StoryId,
        hash: &VersionHash,
    ) -> Result<Option<ApprovalRecord>> {
        let story_id = story_id.to_string();
        let hash = hash.to_hex();
        self.run(move |conn| {
            let raw = conn
                .query_row(
                    &format!(
                        "SELECT {} FROM approval_records
                         WHERE story_id = ?1 AND version_hash = ?2 AND decision = 'approved'",
                        APPROVAL_COLUMNS
                    ),
                    params![story_id, hash],
                    read_approval_row,
                )
                .optional()?;
            raw.map(decode_approval).transpose()
        })
        .await
    }

    async fn list_approvals(&self, story_id: &StoryId) -> Result<Vec<ApprovalRecord>> {
        let story_id = story_id.to_string();
        self.run(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM approval_records WHERE story_id = ?1 ORDER BY recorded_at DESC",
                APPROVAL_COLUMNS
            ))?;
            let raws = stmt
                .query_map(params![story_id], read_approval_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            raws.into_iter().map(decode_approval).collect()
        })
        .await
    }

    async fn append_delivery_logs(&self, logs: &[DeliveryLog]) -> Result<()> {
        let logs = logs.to_vec();
        self.run(move |conn| {
            let tx = conn.transaction()?;
            for log in &logs {
                tx.execute(
                    "INSERT INTO delivery_logs (
                        id, user_id, story_id, version_hash, channel, result,
                        suppression_reason, recorded_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    params![
                        log.id.to_string(),
                        log.user_id.to_string(),
                        log.story_id.to_string(),
                        log.version_hash.to_hex(),
                        log.channel.as_str(),
                        log.result.as_str(),
                        log.suppression_reason.map(|r| r.as_str()),
                        log.recorded_at.timestamp_millis(),
                    ],
                )?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn list_delivery_logs(&self, story_id: &StoryId) -> Result<Vec<DeliveryLog>> {
        let story_id = story_id.to_string();
        self.run(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM delivery_logs WHERE story_id = ?1 ORDER BY recorded_at DESC",
                DELIVERY_COLUMNS
            ))?;
            let raws = stmt
                .query_map(params![story_id], read_delivery_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            raws.into_iter().map(decode_delivery).collect()
        })
        .await
    }

    async fn count_delivered_since(
        &self,
        user_id: &ActorId,
        since: DateTime<Utc>,
    ) -> Result<u64> {
        let user_id = user_id.to_string();
        let since = since.timestamp_millis();
        self.run(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM delivery_logs
                 WHERE user_id = ?1 AND result = 'delivered' AND recorded_at >= ?2",
                params![user_id, since],
                |row| row.get(0),
            )?;
            Ok(count as u64)
        })
        .await
    }

    async fn upsert_subscription(&self, subscription: &Subscription) -> Result<()> {
        let sub = subscription.clone();
        self.run(move |conn| {
            conn.execute(
                "INSERT INTO subscriptions (user_id, plan, is_active, expires_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(user_id) DO UPDATE SET
                    plan = excluded.plan,
                    is_active = excluded.is_active,
                    expires_at = excluded.expires_at",
                params![
                    sub.user_id.to_string(),
                    sub.plan.as_str(),
                    sub.is_active,
                    sub.expires_at.map(|t| t.timestamp_millis()),
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn list_active_subscriptions(&self) -> Result<Vec<Subscription>> {
        self.run(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT user_id, plan, is_active, expires_at
                 FROM subscriptions WHERE is_active = 1",
            )?;
            let raws = stmt
                .query_map([], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, bool>(2)?,
                        row.get::<_, Option<i64>>(3)?,
                    ))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            raws.into_iter()
                .map(|(user_id, plan, is_active, expires_at)| {
                    Ok(Subscription {
                        user_id: ActorId::from_uuid(parse_uuid("user_id", &user_id)?),
                        plan: SubscriptionPlan::parse(&plan)
                            .ok_or_else(|| bad_column("plan", &plan))?,
                        is_active,
                        expires_at: expires_at
                            .map(|ms| parse_millis("expires_at", ms))
                            .transpose()?,
                    })
                })
                .collect()
        })
        .await
    }

    async fn upsert_preferences(&self, preferences: &UserPreferences) -> Result<()> {
        let prefs = preferences.clone();
        self.run(move |conn| {
            conn.execute(
                "INSERT INTO user_preferences (
                    user_id, followed_topics, muted_topics, quiet_start, quiet_end,
                    utc_offset_minutes, max_notifications_per_day
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(user_id) DO UPDATE SET
                    followed_topics = excluded.followed_topics,
                    muted_topics = excluded.muted_topics,
                    quiet_start = excluded.quiet_start,
                    quiet_end = excluded.quiet_end,
                    utc_offset_minutes = excluded.utc_offset_minutes,
                    max_notifications_per_day = excluded.max_notifications_per_day",
                params![
                    prefs.user_id.to_string(),
                    to_json(&prefs.followed_topics)?,
                    to_json(&prefs.muted_topics)?,
                    prefs.quiet_hours.map(|q| encode_time(q.start)),
                    prefs.quiet_hours.map(|q| encode_time(q.end)),
                    prefs.utc_offset_minutes,
                    prefs.max_notifications_per_day,
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn get_preferences(&self, user_id: &ActorId) -> Result<Option<UserPreferences>> {
        let user_id = *user_id;
        let key = user_id.to_string();
        self.run(move |conn| {
            let raw = conn
                .query_row(
                    "SELECT followed_topics, muted_topics, quiet_start, quiet_end,
                            utc_offset_minutes, max_notifications_per_day
                     FROM user_preferences WHERE user_id = ?1",
                    params![key],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, Option<String>>(2)?,
                            row.get::<_, Option<String>>(3)?,
                            row.get::<_, i32>(4)?,
                            row.get::<_, Option<u32>>(5)?,
                        ))
                    },
                )
                .optional()?;

            let Some((followed, muted, quiet_start, quiet_end, offset, cap)) = raw else {
                return Ok(None);
            };

            let quiet_hours = match (quiet_start, quiet_end) {
                (Some(start), Some(end)) => Some(QuietHours {
                    start: parse_time("quiet_start", &start)?,
                    end: parse_time("quiet_end", &end)?,
                }),
                _ => None,
            };

            Ok(Some(UserPreferences {
                user_id,
                followed_topics: from_json("followed_topics", &followed)?,
                muted_topics: from_json("muted_topics", &muted)?,
                quiet_hours,
                utc_offset_minutes: offset,
                max_notifications_per_day: cap,
            }))
        })
        .await
    }

    async fn append_audit(&self, entry: &AuditLogEntry) -> Result<()> {
        let entry = entry.clone();
        self.run(move |conn| {
            conn.execute(
                "INSERT INTO audit_log (
                    id, actor_id, action, resource_type, resource_id, changes,
                    ip_address, user_agent, recorded_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    entry.id.to_string(),
                    entry.actor_id.map(|a| a.to_string()),
                    &entry.action,
                    &entry.resource_type,
                    &entry.resource_id,
                    entry.changes.as_ref().map(to_json).transpose()?,
                    &entry.meta.ip_address,
                    &entry.meta.user_agent,
                    entry.recorded_at.timestamp_millis(),
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn list_audit(
        &self,
        resource_type: &str,
        resource_id: &str,
    ) -> Result<Vec<AuditLogEntry>> {
        let resource_type = resource_type.to_string();
        let resource_id = resource_id.to_string();
        self.run(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, actor_id, action, resource_type, resource_id, changes,
                        ip_address, user_agent, recorded_at
                 FROM audit_log WHERE resource_type = ?1 AND resource_id = ?2
                 ORDER BY recorded_at DESC, rowid DESC",
            )?;
            let raws = stmt
                .query_map(params![resource_type, resource_id], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, Option<String>>(5)?,
                        row.get::<_, Option<String>>(6)?,
                        row.get::<_, Option<String>>(7)?,
                        row.get::<_, i64>(8)?,
                    ))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            raws.into_iter()
                .map(
                    |(id, actor, action, rtype, rid, changes, ip, ua, recorded_at)| {
                        Ok(AuditLogEntry {
                            id: parse_uuid("id", &id)?,
                            actor_id: actor
                                .map(|a| parse_uuid("actor_id", &a).map(ActorId::from_uuid))
                                .transpose()?,
                            action,
                            resource_type: rtype,
                            resource_id: rid,
                            changes: changes.map(|c| from_json("changes", &c)).transpose()?,
                            meta: RequestMeta {
                                ip_address: ip,
                                user_agent: ua,
                            },
                            recorded_at: parse_millis("recorded_at", recorded_at)?,
                        })
                    },
                )
                .collect()
        })
        .await
    }
}
