//! Proptest generators for property-based testing.

use proptest::prelude::*;

use presswire_core::{
    BlockKind, ContentBlock, RiskAcknowledgement, RiskFlag, RiskFlagType, RiskSeverity,
    SourceEntry, VersionDraft,
};

/// Generate a block kind.
pub fn block_kind() -> impl Strategy<Value = BlockKind> {
    prop_oneof![
        Just(BlockKind::Text),
        Just(BlockKind::Image),
        Just(BlockKind::Video),
        Just(BlockKind::Embed),
        Just(BlockKind::Quote),
    ]
}

/// Generate a non-blank content string.
pub fn content_text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ,.]{1,80}".prop_filter("non-blank", |s| !s.trim().is_empty())
}

/// Generate a content block.
pub fn content_block() -> impl Strategy<Value = ContentBlock> {
    (
        block_kind(),
        content_text(),
        prop::collection::vec(("[a-z]{1,10}", "[a-z0-9 ]{0,20}"), 0..3),
    )
        .prop_map(|(kind, content, metadata)| {
            let metadata = metadata
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            ContentBlock {
                kind,
                content,
                metadata,
            }
        })
}

/// Generate a source log entry.
pub fn source_entry() -> impl Strategy<Value = SourceEntry> {
    (content_text(), any::<bool>(), "[a-z ]{0,40}").prop_map(|(source, verified, notes)| {
        SourceEntry {
            source,
            verified,
            notes: notes.to_string(),
        }
    })
}

/// Generate a risk flag type.
pub fn risk_flag_type() -> impl Strategy<Value = RiskFlagType> {
    prop::sample::select(RiskFlagType::ALL.to_vec())
}

/// Generate a risk severity.
pub fn risk_severity() -> impl Strategy<Value = RiskSeverity> {
    prop_oneof![
        Just(RiskSeverity::Low),
        Just(RiskSeverity::Medium),
        Just(RiskSeverity::High),
    ]
}

/// Generate a set of risk flags with distinct types.
pub fn risk_flags(max: usize) -> impl Strategy<Value = Vec<RiskFlag>> {
    (
        prop::sample::subsequence(RiskFlagType::ALL.to_vec(), 0..=max.min(RiskFlagType::ALL.len())),
        risk_severity(),
    )
        .prop_map(|(types, severity)| {
            types
                .into_iter()
                .map(|t| RiskFlag::new(t, "declared during review", severity))
                .collect()
        })
}

/// Generate a valid version draft: at least one block, non-blank content.
pub fn version_draft() -> impl Strategy<Value = VersionDraft> {
    (
        prop::collection::vec(content_block(), 1..5),
        prop::collection::vec(source_entry(), 0..4),
        prop::collection::vec("[a-z]{3,12}\\.example\\.com", 0..3),
        risk_flags(3),
    )
        .prop_map(|(content_blocks, source_log, public_sources, risk_flags)| VersionDraft {
            content_blocks,
            source_log,
            public_sources,
            risk_flags,
        })
}

/// Generate positive acknowledgements covering every flag in the slice.
pub fn full_acknowledgements(flags: &[RiskFlag]) -> Vec<RiskAcknowledgement> {
    flags
        .iter()
        .map(|f| RiskAcknowledgement::accept(f.flag_type, "reviewed"))
        .collect()
}
