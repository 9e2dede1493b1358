//! Error types for the newsroom facade.

use presswire_core::{Role, StoryId, StoryStatus, ValidationError, VersionHash};
use presswire_delivery::DeliveryError;
use presswire_store::StoreError;
use thiserror::Error;

/// Errors that can occur during newsroom operations.
///
/// Business gate refusals are first-class variants with enough detail for
/// the caller to remediate; only store and serialization faults are opaque.
#[derive(Debug, Error)]
pub enum NewsroomError {
    /// Input validation error.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Delivery error.
    #[error("delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    /// Story not found.
    #[error("story not found: {0}")]
    StoryNotFound(StoryId),

    /// No version with this hash exists for the story.
    #[error("version not found: story {story_id}, hash {hash}")]
    VersionNotFound {
        story_id: StoryId,
        hash: VersionHash,
    },

    /// The requested hash is not the story's current version pointer.
    /// The caller's view is stale; refetch, don't retry.
    #[error("hash mismatch: expected {expected:?}, provided {provided}")]
    HashMismatch {
        expected: Option<VersionHash>,
        provided: VersionHash,
    },

    /// An approved ledger entry already exists for this exact pair.
    #[error("already approved: story {story_id}, hash {hash}")]
    AlreadyApproved {
        story_id: StoryId,
        hash: VersionHash,
    },

    /// No approved ledger entry exists for this exact pair.
    #[error("no approval on record: story {story_id}, hash {hash}")]
    NoApproval {
        story_id: StoryId,
        hash: VersionHash,
    },

    /// Declared risk flags lack a positive acknowledgement.
    #[error("unacknowledged risk flags: {}", format_flags(.flags))]
    UnacknowledgedRiskFlags {
        flags: Vec<presswire_core::RiskFlagType>,
    },

    /// The requested status move is not reachable through a metadata patch.
    #[error("invalid status transition: {from} -> {to}")]
    InvalidStatusTransition { from: StoryStatus, to: StoryStatus },

    /// The caller's role is below what the operation requires.
    #[error("not authorized: requires {required} or above, caller is {actual}")]
    NotAuthorized { required: Role, actual: Role },
}

fn format_flags(flags: &[presswire_core::RiskFlagType]) -> String {
    flags
        .iter()
        .map(|f| f.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl NewsroomError {
    /// HTTP status code this error maps to at a transport boundary.
    pub fn status_code(&self) -> u16 {
        match self {
            NewsroomError::Validation(_) => 400,
            NewsroomError::StoryNotFound(_) | NewsroomError::VersionNotFound { .. } => 404,
            NewsroomError::HashMismatch { .. }
            | NewsroomError::AlreadyApproved { .. }
            | NewsroomError::InvalidStatusTransition { .. } => 409,
            NewsroomError::NoApproval { .. }
            | NewsroomError::UnacknowledgedRiskFlags { .. }
            | NewsroomError::NotAuthorized { .. } => 403,
            NewsroomError::Store(_) | NewsroomError::Delivery(_) => 500,
        }
    }

    /// Machine-readable error token.
    pub fn discriminant(&self) -> &'static str {
        match self {
            NewsroomError::Validation(_) => "validation_error",
            NewsroomError::Store(_) => "store_error",
            NewsroomError::Delivery(_) => "delivery_error",
            NewsroomError::StoryNotFound(_) => "story_not_found",
            NewsroomError::VersionNotFound { .. } => "version_not_found",
            NewsroomError::HashMismatch { .. } => "hash_mismatch",
            NewsroomError::AlreadyApproved { .. } => "already_approved",
            NewsroomError::NoApproval { .. } => "no_approval",
            NewsroomError::UnacknowledgedRiskFlags { .. } => "unacknowledged_risk_flags",
            NewsroomError::InvalidStatusTransition { .. } => "invalid_status_transition",
            NewsroomError::NotAuthorized { .. } => "not_authorized",
        }
    }
}

/// Result type for newsroom operations.
pub type Result<T> = std::result::Result<T, NewsroomError>;

#[cfg(test)]
mod tests {
    use super::*;
    use presswire_core::RiskFlagType;

    #[test]
    fn test_status_codes() {
        let not_found = NewsroomError::StoryNotFound(StoryId::generate());
        assert_eq!(not_found.status_code(), 404);
        assert_eq!(not_found.discriminant(), "story_not_found");

        let mismatch = NewsroomError::HashMismatch {
            expected: None,
            provided: VersionHash::ZERO,
        };
        assert_eq!(mismatch.status_code(), 409);

        let gate = NewsroomError::UnacknowledgedRiskFlags {
            flags: vec![RiskFlagType::MinorInvolved],
        };
        assert_eq!(gate.status_code(), 403);
        assert!(gate.to_string().contains("minor_involved"));

        let transition = NewsroomError::InvalidStatusTransition {
            from: StoryStatus::Draft,
            to: StoryStatus::Published,
        };
        assert_eq!(transition.status_code(), 409);
        assert_eq!(transition.discriminant(), "invalid_status_transition");
        assert_eq!(
            transition.to_string(),
            "invalid status transition: draft -> published"
        );
    }
}
