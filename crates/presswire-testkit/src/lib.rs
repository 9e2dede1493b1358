//! # Presswire Testkit
//!
//! Testing utilities for the Presswire pipeline.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: an in-memory newsroom with one caller per role tier
//! - **Generators**: proptest strategies for drafts, blocks, and risk flags
//!
//! ## Test Fixtures
//!
//! Quickly set up pipeline scenarios:
//!
//! ```rust,ignore
//! use presswire_testkit::{approve_fully, TestFixture};
//!
//! let fx = TestFixture::new();
//! let (story, version) = fx.story_with_version("Headline", "Body").await;
//! fx.newsroom
//!     .record_approval(&fx.editor, &story.id, approve_fully(&version))
//!     .await?;
//! ```
//!
//! ## Property Testing
//!
//! Use the generators with proptest:
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use presswire_testkit::generators::version_draft;
//!
//! proptest! {
//!     #[test]
//!     fn fingerprint_is_deterministic(draft in version_draft()) {
//!         prop_assert_eq!(draft.fingerprint(), draft.fingerprint());
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{approve_blind, approve_fully, TestFixture};
