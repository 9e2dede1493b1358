//! # Presswire Core
//!
//! Pure primitives for the Presswire editorial pipeline: the content model,
//! content fingerprinting, risk acknowledgement checking, story lifecycle
//! types, and the role hierarchy.
//!
//! This crate contains no I/O, no storage, no networking. It is pure
//! computation over editorial data structures.
//!
//! ## Key Types
//!
//! - [`Story`] / [`StoryVersion`] - the mutable envelope and its immutable snapshots
//! - [`VersionHash`] - content-addressed identifier (Blake3 over canonical CBOR)
//! - [`ApprovalRecord`] - an append-only editorial decision bound to one hash
//! - [`RiskFlag`] / [`RiskAcknowledgement`] - declared risks and their sign-offs
//! - [`Caller`] / [`Role`] - resolved identity threaded through every operation
//!
//! ## Fingerprinting
//!
//! Version identity is a Blake3 digest over deterministic CBOR. See
//! [`canonical`] and [`fingerprint`].

pub mod approval;
pub mod audit;
pub mod canonical;
pub mod content;
pub mod delivery;
pub mod error;
pub mod fingerprint;
pub mod risk;
pub mod role;
pub mod story;
pub mod subscriber;
pub mod types;
pub mod validation;

pub use approval::{ApprovalDecision, ApprovalRecord, RiskAcknowledgement};
pub use audit::{AuditLogEntry, RequestMeta};
pub use canonical::canonical_content_bytes;
pub use content::{BlockKind, ContentBlock, RiskFlag, RiskFlagType, RiskSeverity, SourceEntry};
pub use delivery::{DeliveryChannel, DeliveryLog, DeliveryResult, SuppressionReason};
pub use error::ValidationError;
pub use fingerprint::fingerprint;
pub use risk::unacknowledged_flags;
pub use role::{Caller, Role};
pub use story::{Story, StoryStatus, StoryVersion, VersionDraft};
pub use subscriber::{
    QuietHours, Subscription, SubscriptionPlan, UserPreferences, DEFAULT_UTC_OFFSET_MINUTES,
};
pub use types::{ActorId, ApprovalId, StoryId, VersionHash, VersionId};
pub use validation::{validate_acknowledgements, validate_headline, validate_version_draft};
