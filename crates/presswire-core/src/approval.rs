//! The approval ledger's record types.
//!
//! Approval records are append-only: created once, never mutated, never
//! deleted. Each record binds an editorial decision to one exact
//! `(story, version hash)` pair.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::content::RiskFlagType;
use crate::types::{ActorId, ApprovalId, StoryId, VersionHash};

/// The closed set of editorial decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalDecision {
    Approved,
    Rejected,
    RevisionRequested,
}

impl ApprovalDecision {
    pub fn as_str(self) -> &'static str {
        match self {
            ApprovalDecision::Approved => "approved",
            ApprovalDecision::Rejected => "rejected",
            ApprovalDecision::RevisionRequested => "revision_requested",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "approved" => Some(ApprovalDecision::Approved),
            "rejected" => Some(ApprovalDecision::Rejected),
            "revision_requested" => Some(ApprovalDecision::RevisionRequested),
            _ => None,
        }
    }
}

/// A human's explicit confirmation that a specific declared risk has been
/// reviewed. `acknowledged == false` records that the reviewer saw the flag
/// but declined to sign off; for gating purposes it counts the same as no
/// entry at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAcknowledgement {
    pub flag_type: RiskFlagType,
    pub acknowledged: bool,
    /// Mandatory, non-empty when `acknowledged` is true.
    pub justification: String,
}

impl RiskAcknowledgement {
    pub fn accept(flag_type: RiskFlagType, justification: impl Into<String>) -> Self {
        Self {
            flag_type,
            acknowledged: true,
            justification: justification.into(),
        }
    }

    pub fn decline(flag_type: RiskFlagType, justification: impl Into<String>) -> Self {
        Self {
            flag_type,
            acknowledged: false,
            justification: justification.into(),
        }
    }
}

/// One entry in the approval ledger.
///
/// At most one `Approved` record may exist per `(story_id, version_hash)`;
/// the store refuses a second one rather than overwriting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRecord {
    pub id: ApprovalId,
    pub story_id: StoryId,
    pub version_hash: VersionHash,
    pub approver_id: ActorId,
    pub decision: ApprovalDecision,
    pub notes: Option<String>,
    pub acknowledgements: Vec<RiskAcknowledgement>,
    pub recorded_at: DateTime<Utc>,
}
