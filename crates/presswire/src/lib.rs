//! # Presswire
//!
//! Unified API for the Presswire editorial integrity pipeline: immutable
//! content-addressed story versions, an append-only approval ledger, an
//! approval-gated publish state machine, and subscriber delivery.
//!
//! ## Overview
//!
//! The [`Newsroom`] brings together storage, the approval ledger, the
//! publish gate, and delivery into a cohesive interface. Content identity
//! is a Blake3 fingerprint over canonical CBOR; approvals bind to one
//! exact fingerprint, so any edit after sign-off invalidates the sign-off.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use presswire::{Newsroom, NewsroomConfig, StoryInput};
//! use presswire_core::{ActorId, Caller, ContentBlock, Role, VersionDraft};
//! use presswire_store::SqliteStore;
//!
//! async fn example() -> presswire::Result<()> {
//!     let store = SqliteStore::open("newsroom.db").unwrap();
//!     let newsroom = Newsroom::new(store, NewsroomConfig::default());
//!
//!     let journalist = Caller::new(ActorId::generate(), Role::Journalist);
//!     let editor = Caller::new(ActorId::generate(), Role::Editor);
//!
//!     let story = newsroom
//!         .create_story(
//!             &journalist,
//!             StoryInput {
//!                 headline: "Council passes budget".into(),
//!                 ..Default::default()
//!             },
//!         )
//!         .await?;
//!
//!     let version = newsroom
//!         .create_version(
//!             &journalist,
//!             &story.id,
//!             VersionDraft::new(vec![ContentBlock::text("The council voted 7-2...")]),
//!         )
//!         .await?;
//!
//!     // record_approval(&editor, ...) then publish(&editor, &story.id, version.hash)
//!     let _ = (editor, version);
//!     Ok(())
//! }
//! ```
//!
//! ## Invariants
//!
//! - **Version immutability**: edits append versions; rows never change
//! - **Hash binding**: approval and publish reference one exact fingerprint
//! - **Gate completeness**: publish requires an approval and a positive
//!   acknowledgement for every declared risk flag
//! - **Ledger append-only**: one `Approved` entry per `(story, hash)`, ever

pub mod audit;
pub mod error;
pub mod newsroom;
pub mod slug;

pub use audit::AuditRecorder;
pub use error::{NewsroomError, Result};
pub use newsroom::{ApprovalInput, Newsroom, NewsroomConfig, StoryInput, StoryPatch};
pub use slug::slug_from_headline;
