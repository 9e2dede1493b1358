//! Subscriptions and notification preferences.
//!
//! Read-only inputs to the delivery orchestrator. Subscriber management
//! lives outside this workspace; these types mirror what it persists.

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::ActorId;

/// Plan tiers. Delivery only cares about `is_active`; tiers exist for
/// entitlement decisions at the feed boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionPlan {
    Free,
    Basic,
    Premium,
    Enterprise,
}

impl SubscriptionPlan {
    pub fn as_str(self) -> &'static str {
        match self {
            SubscriptionPlan::Free => "free",
            SubscriptionPlan::Basic => "basic",
            SubscriptionPlan::Premium => "premium",
            SubscriptionPlan::Enterprise => "enterprise",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "free" => Some(SubscriptionPlan::Free),
            "basic" => Some(SubscriptionPlan::Basic),
            "premium" => Some(SubscriptionPlan::Premium),
            "enterprise" => Some(SubscriptionPlan::Enterprise),
            _ => None,
        }
    }
}

/// A subscriber's plan state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub user_id: ActorId,
    pub plan: SubscriptionPlan,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Subscription {
    pub fn active(user_id: ActorId, plan: SubscriptionPlan) -> Self {
        Self {
            user_id,
            plan,
            is_active: true,
            expires_at: None,
        }
    }
}

/// A quiet-hours window in the subscriber's local time.
///
/// The window is `[start, end)`. When `start > end` it wraps midnight.
/// `start == end` is an empty window and suppresses nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuietHours {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

/// Per-subscriber notification preferences.
///
/// A subscriber with no preferences row gets the permissive defaults:
/// nothing muted, no quiet hours, no daily cap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPreferences {
    pub user_id: ActorId,
    pub followed_topics: Vec<String>,
    pub muted_topics: Vec<String>,
    pub quiet_hours: Option<QuietHours>,
    /// Subscriber's UTC offset in minutes, used for quiet hours and the
    /// daily-cap midnight boundary. Stored as an offset because no IANA
    /// zone database is carried.
    pub utc_offset_minutes: i32,
    pub max_notifications_per_day: Option<u32>,
}

/// Default UTC offset for preferences created without one (UTC+9).
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = 540;

impl UserPreferences {
    /// Permissive defaults: used when a subscriber has no stored row.
    pub fn permissive(user_id: ActorId) -> Self {
        Self {
            user_id,
            followed_topics: Vec::new(),
            muted_topics: Vec::new(),
            quiet_hours: None,
            utc_offset_minutes: DEFAULT_UTC_OFFSET_MINUTES,
            max_notifications_per_day: None,
        }
    }

    pub fn with_muted_topics(mut self, topics: Vec<String>) -> Self {
        self.muted_topics = topics;
        self
    }

    pub fn with_quiet_hours(mut self, start: NaiveTime, end: NaiveTime) -> Self {
        self.quiet_hours = Some(QuietHours { start, end });
        self
    }

    pub fn with_daily_cap(mut self, cap: u32) -> Self {
        self.max_notifications_per_day = Some(cap);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permissive_defaults() {
        let prefs = UserPreferences::permissive(ActorId::generate());
        assert!(prefs.muted_topics.is_empty());
        assert!(prefs.quiet_hours.is_none());
        assert!(prefs.max_notifications_per_day.is_none());
    }

    #[test]
    fn test_plan_parse_roundtrip() {
        for p in [
            SubscriptionPlan::Free,
            SubscriptionPlan::Basic,
            SubscriptionPlan::Premium,
            SubscriptionPlan::Enterprise,
        ] {
            assert_eq!(SubscriptionPlan::parse(p.as_str()), Some(p));
        }
    }
}
