//! Content fingerprinting.
//!
//! The fingerprint is a Blake3 digest over the canonical encoding of a
//! version's content blocks, source log, and risk flags. It is the sole
//! identity proof tying an approval to content: any mutation of those
//! fields changes the key, which makes tampering detectable by
//! construction.

use crate::canonical::canonical_content_bytes;
use crate::content::{ContentBlock, RiskFlag, SourceEntry};
use crate::types::VersionHash;

/// Compute the content fingerprint of a version.
///
/// Pure: no timestamps, no identifiers, no ambient state. Byte-identical
/// inputs yield the identical hash regardless of when or who created them.
pub fn fingerprint(
    content_blocks: &[ContentBlock],
    source_log: &[SourceEntry],
    risk_flags: &[RiskFlag],
) -> VersionHash {
    let bytes = canonical_content_bytes(content_blocks, source_log, risk_flags);
    VersionHash(*blake3::hash(&bytes).as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{RiskFlagType, RiskSeverity};
    use proptest::prelude::*;

    fn blocks(n: usize) -> Vec<ContentBlock> {
        (0..n).map(|i| ContentBlock::text(format!("paragraph {i}"))).collect()
    }

    fn source(name: &str) -> SourceEntry {
        SourceEntry {
            source: name.into(),
            verified: false,
            notes: String::new(),
        }
    }

    #[test]
    fn test_fingerprint_deterministic() {
        let b = blocks(3);
        let s = vec![source("wire")];
        let f = vec![RiskFlag::new(RiskFlagType::GraphicContent, "scene photos", RiskSeverity::Medium)];

        assert_eq!(fingerprint(&b, &s, &f), fingerprint(&b, &s, &f));
    }

    #[test]
    fn test_fingerprint_sensitive_to_each_field() {
        let b = blocks(2);
        let s = vec![source("wire")];
        let f = vec![RiskFlag::new(RiskFlagType::MinorInvolved, "student named", RiskSeverity::High)];
        let base = fingerprint(&b, &s, &f);

        let changed_blocks = fingerprint(&blocks(3), &s, &f);
        assert_ne!(base, changed_blocks);

        let changed_sources = fingerprint(&b, &[source("tip line")], &f);
        assert_ne!(base, changed_sources);

        let changed_flags = fingerprint(&b, &s, &[]);
        assert_ne!(base, changed_flags);
    }

    #[test]
    fn test_fingerprint_width() {
        let hash = fingerprint(&[], &[], &[]);
        assert_eq!(hash.to_hex().len(), 64);
    }

    proptest! {
        #[test]
        fn prop_fingerprint_stable(texts in proptest::collection::vec(".*", 0..8)) {
            let b: Vec<ContentBlock> = texts.iter().map(ContentBlock::text).collect();
            prop_assert_eq!(fingerprint(&b, &[], &[]), fingerprint(&b, &[], &[]));
        }

        #[test]
        fn prop_appending_block_changes_hash(
            texts in proptest::collection::vec(".+", 1..6),
            extra in ".*",
        ) {
            let b: Vec<ContentBlock> = texts.iter().map(ContentBlock::text).collect();
            let mut extended = b.clone();
            extended.push(ContentBlock::text(extra));
            prop_assert_ne!(fingerprint(&b, &[], &[]), fingerprint(&extended, &[], &[]));
        }
    }
}
