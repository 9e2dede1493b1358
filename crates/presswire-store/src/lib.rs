//! # Presswire Store
//!
//! Storage abstraction for the Presswire editorial pipeline. Provides a
//! trait-based interface for stories, versions, the approval ledger, the
//! delivery log, subscriber records, and the audit log, with SQLite and
//! in-memory implementations.
//!
//! ## Overview
//!
//! The store module abstracts persistence behind the [`Store`] trait,
//! allowing the newsroom facade to be storage-agnostic. The primary
//! implementation is [`SqliteStore`], with [`MemoryStore`] for testing.
//!
//! ## Key Types
//!
//! - [`Store`] - The async trait for all storage operations
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`VersionAppend`] - Result of appending a content version
//! - [`ApprovalInsert`] - Result of appending to the approval ledger
//!
//! ## Usage
//!
//! ```rust,no_run
//! use presswire_store::{SqliteStore, Store, StoryFilter};
//!
//! async fn example() {
//!     // Open a SQLite database
//!     let store = SqliteStore::open("newsroom.db").unwrap();
//!
//!     // Or use an in-memory database for testing
//!     let store = SqliteStore::open_memory().unwrap();
//!
//!     let drafts = store.list_stories(&StoryFilter::default()).await.unwrap();
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Append-only ledgers**: versions, approvals, deliveries, and audit
//!   entries are never updated or deleted
//! - **Atomic numbering**: version numbers and the story's current pointer
//!   advance in one transaction
//! - **Idempotent appends**: unchanged content returns `Unchanged`; a second
//!   approval of the same hash returns `AlreadyApproved`

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{ApprovalInsert, Store, StoryFilter, VersionAppend};
