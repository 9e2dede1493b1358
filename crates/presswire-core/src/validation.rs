//! Input-boundary validation.
//!
//! Closed enumerations are enforced by the type system; these checks cover
//! the rules types alone cannot express. Everything here runs before any
//! store access.

use crate::approval::RiskAcknowledgement;
use crate::error::ValidationError;
use crate::story::VersionDraft;

/// Maximum headline length, matching the storage column width.
pub const MAX_HEADLINE_LEN: usize = 512;

/// Validate a story headline.
pub fn validate_headline(headline: &str) -> Result<(), ValidationError> {
    if headline.trim().is_empty() {
        return Err(ValidationError::EmptyHeadline);
    }
    if headline.chars().count() > MAX_HEADLINE_LEN {
        return Err(ValidationError::HeadlineTooLong {
            max: MAX_HEADLINE_LEN,
            got: headline.chars().count(),
        });
    }
    Ok(())
}

/// Validate a version draft before hashing and persistence.
pub fn validate_version_draft(draft: &VersionDraft) -> Result<(), ValidationError> {
    if draft.content_blocks.is_empty() {
        return Err(ValidationError::NoContentBlocks);
    }

    for (index, block) in draft.content_blocks.iter().enumerate() {
        if block.content.trim().is_empty() {
            return Err(ValidationError::EmptyContentBlock { index });
        }
    }

    for (index, entry) in draft.source_log.iter().enumerate() {
        if entry.source.trim().is_empty() {
            return Err(ValidationError::EmptySource { index });
        }
    }

    for flag in &draft.risk_flags {
        if flag.description.trim().is_empty() {
            return Err(ValidationError::EmptyRiskDescription {
                flag_type: flag.flag_type,
            });
        }
    }

    Ok(())
}

/// Validate an approval's acknowledgement list.
///
/// A true acknowledgement without a justification is rejected; duplicate
/// entries for the same flag type are rejected so the gate never has to
/// disambiguate conflicting answers.
pub fn validate_acknowledgements(
    acknowledgements: &[RiskAcknowledgement],
) -> Result<(), ValidationError> {
    let mut seen = std::collections::BTreeSet::new();

    for ack in acknowledgements {
        if !seen.insert(ack.flag_type) {
            return Err(ValidationError::DuplicateAcknowledgement {
                flag_type: ack.flag_type,
            });
        }
        if ack.acknowledged && ack.justification.trim().is_empty() {
            return Err(ValidationError::MissingJustification {
                flag_type: ack.flag_type,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ContentBlock, RiskFlag, RiskFlagType, RiskSeverity};

    #[test]
    fn test_empty_headline_rejected() {
        assert_eq!(validate_headline("   "), Err(ValidationError::EmptyHeadline));
        assert!(validate_headline("Council passes budget").is_ok());
    }

    #[test]
    fn test_headline_length_limit() {
        let long = "x".repeat(MAX_HEADLINE_LEN + 1);
        assert!(matches!(
            validate_headline(&long),
            Err(ValidationError::HeadlineTooLong { .. })
        ));
    }

    #[test]
    fn test_draft_requires_content() {
        let draft = VersionDraft::new(vec![]);
        assert_eq!(
            validate_version_draft(&draft),
            Err(ValidationError::NoContentBlocks)
        );
    }

    #[test]
    fn test_draft_rejects_blank_block() {
        let draft = VersionDraft::new(vec![ContentBlock::text("ok"), ContentBlock::text(" ")]);
        assert_eq!(
            validate_version_draft(&draft),
            Err(ValidationError::EmptyContentBlock { index: 1 })
        );
    }

    #[test]
    fn test_draft_rejects_blank_risk_description() {
        let draft = VersionDraft::new(vec![ContentBlock::text("ok")]).with_risk_flags(vec![
            RiskFlag::new(RiskFlagType::MinorInvolved, "  ", RiskSeverity::High),
        ]);
        assert_eq!(
            validate_version_draft(&draft),
            Err(ValidationError::EmptyRiskDescription {
                flag_type: RiskFlagType::MinorInvolved
            })
        );
    }

    #[test]
    fn test_acknowledgement_needs_justification() {
        let acks = vec![RiskAcknowledgement::accept(RiskFlagType::GraphicContent, "")];
        assert_eq!(
            validate_acknowledgements(&acks),
            Err(ValidationError::MissingJustification {
                flag_type: RiskFlagType::GraphicContent
            })
        );
    }

    #[test]
    fn test_declined_acknowledgement_may_omit_justification() {
        let acks = vec![RiskAcknowledgement::decline(RiskFlagType::GraphicContent, "")];
        assert!(validate_acknowledgements(&acks).is_ok());
    }

    #[test]
    fn test_duplicate_acknowledgements_rejected() {
        let acks = vec![
            RiskAcknowledgement::accept(RiskFlagType::MinorInvolved, "reviewed"),
            RiskAcknowledgement::decline(RiskFlagType::MinorInvolved, "second thoughts"),
        ];
        assert_eq!(
            validate_acknowledgements(&acks),
            Err(ValidationError::DuplicateAcknowledgement {
                flag_type: RiskFlagType::MinorInvolved
            })
        );
    }
}
