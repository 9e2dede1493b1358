//! The content model: what a story version is made of.
//!
//! Content blocks, the source log, and declared risk flags are the three
//! fields covered by the version fingerprint. Everything here is plain
//! data; the hashing lives in [`crate::fingerprint`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind discriminator for a content block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Text,
    Image,
    Video,
    Embed,
    Quote,
}

impl BlockKind {
    /// Stable numeric code used by the canonical encoding.
    pub fn to_u8(self) -> u8 {
        match self {
            BlockKind::Text => 0,
            BlockKind::Image => 1,
            BlockKind::Video => 2,
            BlockKind::Embed => 3,
            BlockKind::Quote => 4,
        }
    }

    pub fn from_u8(code: u8) -> Option<Self> {
        match code {
            0 => Some(BlockKind::Text),
            1 => Some(BlockKind::Image),
            2 => Some(BlockKind::Video),
            3 => Some(BlockKind::Embed),
            4 => Some(BlockKind::Quote),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BlockKind::Text => "text",
            BlockKind::Image => "image",
            BlockKind::Video => "video",
            BlockKind::Embed => "embed",
            BlockKind::Quote => "quote",
        }
    }
}

/// One ordered block of story content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBlock {
    pub kind: BlockKind,
    pub content: String,
    /// Free-form block metadata (alt text, credits, embed params).
    /// Keys and values participate in the fingerprint.
    #[serde(default)]
    pub metadata: Vec<(String, String)>,
}

impl ContentBlock {
    /// A plain text block with no metadata.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            kind: BlockKind::Text,
            content: content.into(),
            metadata: Vec::new(),
        }
    }
}

/// One entry in a version's source log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceEntry {
    pub source: String,
    pub verified: bool,
    pub notes: String,
}

/// The closed set of editorial/legal risk categories.
///
/// Any value outside this set must be rejected at the input boundary;
/// the publish gate only ever sees these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFlagType {
    IdentifiablePrivateIndividual,
    MinorInvolved,
    AllegationOrCrimeAccusation,
    OngoingInvestigation,
    MedicalOrPublicHealthClaim,
    HighDefamationRisk,
    GraphicContent,
    SensitiveLocation,
}

impl RiskFlagType {
    pub const ALL: [RiskFlagType; 8] = [
        RiskFlagType::IdentifiablePrivateIndividual,
        RiskFlagType::MinorInvolved,
        RiskFlagType::AllegationOrCrimeAccusation,
        RiskFlagType::OngoingInvestigation,
        RiskFlagType::MedicalOrPublicHealthClaim,
        RiskFlagType::HighDefamationRisk,
        RiskFlagType::GraphicContent,
        RiskFlagType::SensitiveLocation,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RiskFlagType::IdentifiablePrivateIndividual => "identifiable_private_individual",
            RiskFlagType::MinorInvolved => "minor_involved",
            RiskFlagType::AllegationOrCrimeAccusation => "allegation_or_crime_accusation",
            RiskFlagType::OngoingInvestigation => "ongoing_investigation",
            RiskFlagType::MedicalOrPublicHealthClaim => "medical_or_public_health_claim",
            RiskFlagType::HighDefamationRisk => "high_defamation_risk",
            RiskFlagType::GraphicContent => "graphic_content",
            RiskFlagType::SensitiveLocation => "sensitive_location",
        }
    }

    /// Parse the snake_case wire token. Case-sensitive exact match.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.as_str() == s)
    }
}

impl fmt::Display for RiskFlagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of a declared risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskSeverity {
    Low,
    Medium,
    High,
}

impl RiskSeverity {
    pub fn to_u8(self) -> u8 {
        match self {
            RiskSeverity::Low => 0,
            RiskSeverity::Medium => 1,
            RiskSeverity::High => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskSeverity::Low => "low",
            RiskSeverity::Medium => "medium",
            RiskSeverity::High => "high",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(RiskSeverity::Low),
            "medium" => Some(RiskSeverity::Medium),
            "high" => Some(RiskSeverity::High),
            _ => None,
        }
    }
}

/// A declared editorial/legal risk attached to a version.
///
/// Declaring a flag is cheap; publishing with one requires an explicit,
/// justified human acknowledgement in the approval record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskFlag {
    pub flag_type: RiskFlagType,
    pub description: String,
    pub severity: RiskSeverity,
}

impl RiskFlag {
    pub fn new(flag_type: RiskFlagType, description: impl Into<String>, severity: RiskSeverity) -> Self {
        Self {
            flag_type,
            description: description.into(),
            severity,
        }
    }
}
