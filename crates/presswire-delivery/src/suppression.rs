//! Suppression rules: the pure decision core of delivery.
//!
//! Given a subscriber's preferences, a story's topics, and the current
//! time, decide whether a notification goes out. Rules are checked in a
//! fixed order: muted topics, then quiet hours, then the daily cap. The
//! first matching rule wins and its reason is recorded.

use chrono::{DateTime, FixedOffset, NaiveTime, TimeZone, Utc};

use presswire_core::{QuietHours, SuppressionReason, UserPreferences};

use crate::error::{DeliveryError, Result};

/// Outcome of evaluating the suppression rules for one subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryDecision {
    Deliver,
    Suppress(SuppressionReason),
}

/// True when any story topic appears in the muted list.
///
/// Matching is case-insensitive on both sides.
pub fn is_topic_muted(muted_topics: &[String], story_topics: &[String]) -> bool {
    story_topics
        .iter()
        .any(|topic| muted_topics.iter().any(|m| m.eq_ignore_ascii_case(topic)))
}

/// True when `local` falls inside the quiet-hours window.
///
/// The window is `[start, end)`. A window with `start > end` wraps
/// midnight; `start == end` is empty and matches nothing.
pub fn in_quiet_hours(window: &QuietHours, local: NaiveTime) -> bool {
    if window.start == window.end {
        return false;
    }
    if window.start < window.end {
        window.start <= local && local < window.end
    } else {
        local >= window.start || local < window.end
    }
}

fn fixed_offset(offset_minutes: i32) -> Result<FixedOffset> {
    FixedOffset::east_opt(offset_minutes * 60)
        .ok_or(DeliveryError::InvalidUtcOffset(offset_minutes))
}

/// The subscriber's local wall-clock time.
pub fn local_time(now: DateTime<Utc>, offset_minutes: i32) -> Result<NaiveTime> {
    let offset = fixed_offset(offset_minutes)?;
    Ok(now.with_timezone(&offset).time())
}

/// The UTC instant of the subscriber's most recent local midnight.
///
/// The daily cap counts deliveries at or after this instant.
pub fn local_midnight_utc(now: DateTime<Utc>, offset_minutes: i32) -> Result<DateTime<Utc>> {
    let offset = fixed_offset(offset_minutes)?;
    let local_date = now.with_timezone(&offset).date_naive();
    let midnight = local_date
        .and_hms_opt(0, 0, 0)
        .and_then(|naive| offset.from_local_datetime(&naive).single())
        .ok_or(DeliveryError::InvalidUtcOffset(offset_minutes))?;
    Ok(midnight.with_timezone(&Utc))
}

/// Apply the suppression rules in order.
///
/// `delivered_since_midnight` is the subscriber's delivered count since
/// their local midnight; it only matters when a daily cap is set.
pub fn evaluate(
    prefs: &UserPreferences,
    story_topics: &[String],
    delivered_since_midnight: u64,
    now: DateTime<Utc>,
) -> Result<DeliveryDecision> {
    if is_topic_muted(&prefs.muted_topics, story_topics) {
        return Ok(DeliveryDecision::Suppress(SuppressionReason::MutedTopic));
    }

    if let Some(window) = &prefs.quiet_hours {
        let local = local_time(now, prefs.utc_offset_minutes)?;
        if in_quiet_hours(window, local) {
            return Ok(DeliveryDecision::Suppress(SuppressionReason::QuietHours));
        }
    }

    if let Some(cap) = prefs.max_notifications_per_day {
        if delivered_since_midnight >= u64::from(cap) {
            return Ok(DeliveryDecision::Suppress(SuppressionReason::FrequencyCap));
        }
    }

    Ok(DeliveryDecision::Deliver)
}
