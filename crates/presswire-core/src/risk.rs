//! Risk acknowledgement checking.
//!
//! Pure comparison of a version's declared risk flags against an
//! approval's acknowledgement list. The publish gate refuses to publish
//! while this returns a non-empty set.

use std::collections::BTreeSet;

use crate::approval::RiskAcknowledgement;
use crate::content::{RiskFlag, RiskFlagType};

/// Return the flag types declared on a version that are not covered by an
/// acknowledgement with `acknowledged == true`.
///
/// An entry present with `acknowledged == false` and an entry entirely
/// absent both count as unacknowledged. Order-independent; duplicate
/// declarations collapse to one reported type. Matching is exact on the
/// flag type.
pub fn unacknowledged_flags(
    version_flags: &[RiskFlag],
    acknowledgements: &[RiskAcknowledgement],
) -> Vec<RiskFlagType> {
    let acknowledged: BTreeSet<RiskFlagType> = acknowledgements
        .iter()
        .filter(|a| a.acknowledged)
        .map(|a| a.flag_type)
        .collect();

    let declared: BTreeSet<RiskFlagType> =
        version_flags.iter().map(|f| f.flag_type).collect();

    declared.difference(&acknowledged).copied().collect()
}
