//! Database schema migrations for SQLite.
//!
//! We use a simple versioned migration system. Each migration is a SQL string
//! that transforms the schema from version N to N+1.

use rusqlite::Connection;

use crate::error::{Result, StoreError};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema.
///
/// This function is idempotent - it can be called multiple times safely.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    // Create migrations table if it doesn't exist
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    // Get current version
    let current: u32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    // Apply migrations
    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, now_millis()],
            )?;
        }

        tx.commit()?;
    }

    Ok(())
}

/// Apply a specific migration version.
fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(StoreError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Story envelopes: the only mutable table
        CREATE TABLE stories (
            id TEXT PRIMARY KEY,                  -- UUID
            slug TEXT NOT NULL UNIQUE,
            headline TEXT NOT NULL,
            summary TEXT,
            status TEXT NOT NULL,                 -- StoryStatus token
            topic_tags TEXT NOT NULL,             -- JSON array of strings
            geo_tags TEXT NOT NULL,               -- JSON array of strings
            author_id TEXT NOT NULL,              -- UUID
            current_version_hash TEXT,            -- 64-char hex, nullable until first version
            published_at INTEGER,                 -- Unix ms
            is_gated INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL,          -- Unix ms
            updated_at INTEGER NOT NULL           -- Unix ms
        );

        -- Immutable content snapshots, append-only
        CREATE TABLE story_versions (
            id TEXT PRIMARY KEY,                  -- UUID
            story_id TEXT NOT NULL,
            version_hash TEXT NOT NULL,           -- 64-char hex, Blake3 of canonical bytes
            version_number INTEGER NOT NULL,      -- monotonic per story, starts at 1
            content_blocks TEXT NOT NULL,         -- JSON array
            source_log TEXT NOT NULL,             -- JSON array
            public_sources TEXT NOT NULL,         -- JSON array of strings
            risk_flags TEXT NOT NULL,             -- JSON array
            created_at INTEGER NOT NULL,

            UNIQUE(story_id, version_number),
            UNIQUE(story_id, version_hash)
        );

        -- Approval ledger, append-only
        CREATE TABLE approval_records (
            id TEXT PRIMARY KEY,                  -- UUID
            story_id TEXT NOT NULL,
            version_hash TEXT NOT NULL,           -- 64-char hex
            approver_id TEXT NOT NULL,            -- UUID
            decision TEXT NOT NULL,               -- ApprovalDecision token
            notes TEXT,
            acknowledgements TEXT NOT NULL,       -- JSON array
            recorded_at INTEGER NOT NULL
        );

        -- Backstop for the one-approved-entry-per-hash rule
        CREATE UNIQUE INDEX idx_approvals_one_approved
            ON approval_records(story_id, version_hash)
            WHERE decision = 'approved';

        -- Delivery log, append-only
        CREATE TABLE delivery_logs (
            id TEXT PRIMARY KEY,                  -- UUID
            user_id TEXT NOT NULL,
            story_id TEXT NOT NULL,
            version_hash TEXT NOT NULL,
            channel TEXT NOT NULL,                -- DeliveryChannel token
            result TEXT NOT NULL,                 -- DeliveryResult token
            suppression_reason TEXT,              -- SuppressionReason token, nullable
            recorded_at INTEGER NOT NULL
        );

        -- Subscriptions, one row per subscriber
        CREATE TABLE subscriptions (
            user_id TEXT PRIMARY KEY,
            plan TEXT NOT NULL,                   -- SubscriptionPlan token
            is_active INTEGER NOT NULL,
            expires_at INTEGER                    -- Unix ms, nullable
        );

        -- Notification preferences, one row per subscriber
        CREATE TABLE user_preferences (
            user_id TEXT PRIMARY KEY,
            followed_topics TEXT NOT NULL,        -- JSON array of strings
            muted_topics TEXT NOT NULL,           -- JSON array of strings
            quiet_start TEXT,                     -- HH:MM:SS, nullable
            quiet_end TEXT,                       -- HH:MM:SS, nullable
            utc_offset_minutes INTEGER NOT NULL,
            max_notifications_per_day INTEGER     -- nullable = uncapped
        );

        -- Audit log, append-only
        CREATE TABLE audit_log (
            id TEXT PRIMARY KEY,                  -- UUID
            actor_id TEXT,                        -- UUID, nullable for system actions
            action TEXT NOT NULL,
            resource_type TEXT NOT NULL,
            resource_id TEXT NOT NULL,
            changes TEXT,                         -- JSON object, nullable
            ip_address TEXT,
            user_agent TEXT,
            recorded_at INTEGER NOT NULL
        );

        -- Indexes for common queries
        CREATE INDEX idx_stories_status ON stories(status);
        CREATE INDEX idx_stories_author ON stories(author_id);
        CREATE INDEX idx_versions_story ON story_versions(story_id, version_number);
        CREATE INDEX idx_approvals_story_hash ON approval_records(story_id, version_hash);
        CREATE INDEX idx_delivery_user_time ON delivery_logs(user_id, recorded_at);
        CREATE INDEX idx_delivery_story ON delivery_logs(story_id);
        CREATE INDEX idx_audit_resource ON audit_log(resource_type, resource_id);
        "#,
    )?;

    Ok(())
}

/// Get current time in milliseconds.
fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_millis() as i64
}
