//! Delivery fan-out.
//!
//! Takes a published story and walks every active subscriber, applying the
//! suppression rules and writing one delivery log row per subscriber. The
//! run never partially skips a subscriber: every evaluated subscriber gets
//! a row, delivered or suppressed, so the log is a complete record of the
//! fan-out.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use presswire_core::{
    DeliveryChannel, DeliveryLog, Story, SuppressionReason, UserPreferences, VersionHash,
};
use presswire_store::Store;

use crate::error::Result;
use crate::suppression::{self, DeliveryDecision};

/// Configuration for delivery runs.
#[derive(Debug, Clone)]
pub struct DeliveryConfig {
    /// Channel recorded on every log row.
    pub channel: DeliveryChannel,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            channel: DeliveryChannel::Feed,
        }
    }
}

/// Tallies from one delivery run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub suppressed_muted_topic: usize,
    pub suppressed_quiet_hours: usize,
    pub suppressed_frequency_cap: usize,
}

impl DeliveryReport {
    /// Total subscribers evaluated.
    pub fn total(&self) -> usize {
        self.delivered
            + self.suppressed_muted_topic
            + self.suppressed_quiet_hours
            + self.suppressed_frequency_cap
    }

    fn tally(&mut self, decision: DeliveryDecision) {
        match decision {
            DeliveryDecision::Deliver => self.delivered += 1,
            DeliveryDecision::Suppress(SuppressionReason::MutedTopic) => {
                self.suppressed_muted_topic += 1
            }
            DeliveryDecision::Suppress(SuppressionReason::QuietHours) => {
                self.suppressed_quiet_hours += 1
            }
            DeliveryDecision::Suppress(SuppressionReason::FrequencyCap) => {
                self.suppressed_frequency_cap += 1
            }
        }
    }
}

/// Fans a published story version out to active subscribers.
pub struct DeliveryOrchestrator<S: Store> {
    store: Arc<S>,
    config: DeliveryConfig,
}

impl<S: Store> DeliveryOrchestrator<S> {
    pub fn new(store: Arc<S>, config: DeliveryConfig) -> Self {
        Self { store, config }
    }

    /// Run the fan-out for one published story version.
    ///
    /// Log rows for the whole run are appended in a single batch after all
    /// subscribers are evaluated. A subscription whose `expires_at` is in
    /// the past is treated as inactive and skipped entirely.
    pub async fn deliver(
        &self,
        story: &Story,
        hash: VersionHash,
        now: DateTime<Utc>,
    ) -> Result<DeliveryReport> {
        let subscriptions = self.store.list_active_subscriptions().await?;

        let mut report = DeliveryReport::default();
        let mut logs = Vec::with_capacity(subscriptions.len());

        for subscription in subscriptions {
            if matches!(subscription.expires_at, Some(expiry) if expiry <= now) {
                continue;
            }
            let user_id = subscription.user_id;

            let prefs = self
                .store
                .get_preferences(&user_id)
                .await?
                .unwrap_or_else(|| UserPreferences::permissive(user_id));

            // The delivered count is only fetched when a cap is set.
            let delivered_since_midnight = match prefs.max_notifications_per_day {
                Some(_) => {
                    let midnight =
                        suppression::local_midnight_utc(now, prefs.utc_offset_minutes)?;
                    self.store.count_delivered_since(&user_id, midnight).await?
                }
                None => 0,
            };

            let decision =
                suppression::evaluate(&prefs, &story.topic_tags, delivered_since_midnight, now)?;
            report.tally(decision);

            let log = match decision {
                DeliveryDecision::Deliver => {
                    DeliveryLog::delivered(user_id, story.id, hash, self.config.channel, now)
                }
                DeliveryDecision::Suppress(reason) => DeliveryLog::suppressed(
                    user_id,
                    story.id,
                    hash,
                    self.config.channel,
                    reason,
                    now,
                ),
            };
            logs.push(log);
        }

        self.store.append_delivery_logs(&logs).await?;

        tracing::info!(
            story_id = %story.id,
            version_hash = %hash,
            delivered = report.delivered,
            suppressed = report.total() - report.delivered,
            "delivery fan-out complete"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, TimeZone};
    use presswire_core::{ActorId, DeliveryResult, Subscription, SubscriptionPlan};
    use presswire_store::MemoryStore;

    fn noon_utc() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap()
    }

    async fn setup_story(store: &MemoryStore, topics: Vec<String>) -> Story {
        let mut story = Story::new_draft(
            ActorId::generate(),
            "fanout-test",
            "Fan-out test story",
            noon_utc(),
        );
        story.topic_tags = topics;
        store.insert_story(&story).await.unwrap();
        story
    }

    #[tokio::test]
    async fn test_fanout_logs_every_subscriber() {
        let store = Arc::new(MemoryStore::new());
        let story = setup_story(&store, vec!["politics".into()]).await;

        let plain = ActorId::generate();
        let muted = ActorId::generate();
        store
            .upsert_subscription(&Subscription::active(plain, SubscriptionPlan::Free))
            .await
            .unwrap();
        store
            .upsert_subscription(&Subscription::active(muted, SubscriptionPlan::Premium))
            .await
            .unwrap();
        store
            .upsert_preferences(
                &UserPreferences::permissive(muted).with_muted_topics(vec!["Politics".into()]),
            )
            .await
            .unwrap();

        let orchestrator = DeliveryOrchestrator::new(store.clone(), DeliveryConfig::default());
        let report = orchestrator
            .deliver(&story, VersionHash::ZERO, noon_utc())
            .await
            .unwrap();

        assert_eq!(report.delivered, 1);
        assert_eq!(report.suppressed_muted_topic, 1);
        assert_eq!(report.total(), 2);

        // Both outcomes landed in the log
        let logs = store.list_delivery_logs(&story.id).await.unwrap();
        assert_eq!(logs.len(), 2);
        assert!(logs.iter().any(|l| l.user_id == plain
            && l.result == DeliveryResult::Delivered));
        assert!(logs.iter().any(|l| l.user_id == muted
            && l.suppression_reason == Some(SuppressionReason::MutedTopic)));
    }

    #[tokio::test]
    async fn test_muted_suppression_is_stable_across_runs() {
        let store = Arc::new(MemoryStore::new());
        let story = setup_story(&store, vec!["politics".into()]).await;

        let muted = ActorId::generate();
        store
            .upsert_subscription(&Subscription::active(muted, SubscriptionPlan::Free))
            .await
            .unwrap();
        store
            .upsert_preferences(
                &UserPreferences::permissive(muted).with_muted_topics(vec!["politics".into()]),
            )
            .await
            .unwrap();

        let orchestrator = DeliveryOrchestrator::new(store.clone(), DeliveryConfig::default());
        for _ in 0..2 {
            let report = orchestrator
                .deliver(&story, VersionHash::ZERO, noon_utc())
                .await
                .unwrap();
            assert_eq!(report.delivered, 0);
            assert_eq!(report.suppressed_muted_topic, 1);
        }

        let logs = store.list_delivery_logs(&story.id).await.unwrap();
        assert_eq!(logs.len(), 2);
        assert!(logs.iter().all(|l| l.result == DeliveryResult::Suppressed));
    }

    #[tokio::test]
    async fn test_inactive_and_expired_subscribers_skipped() {
        let store = Arc::new(MemoryStore::new());
        let story = setup_story(&store, vec![]).await;

        let mut inactive = Subscription::active(ActorId::generate(), SubscriptionPlan::Free);
        inactive.is_active = false;
        store.upsert_subscription(&inactive).await.unwrap();

        let mut expired = Subscription::active(ActorId::generate(), SubscriptionPlan::Basic);
        expired.expires_at = Some(noon_utc() - chrono::Duration::days(1));
        store.upsert_subscription(&expired).await.unwrap();

        let orchestrator = DeliveryOrchestrator::new(store.clone(), DeliveryConfig::default());
        let report = orchestrator
            .deliver(&story, VersionHash::ZERO, noon_utc())
            .await
            .unwrap();

        assert_eq!(report.total(), 0);
        assert!(store.list_delivery_logs(&story.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_frequency_cap_counts_since_local_midnight() {
        let store = Arc::new(MemoryStore::new());
        let story = setup_story(&store, vec![]).await;

        let user = ActorId::generate();
        store
            .upsert_subscription(&Subscription::active(user, SubscriptionPlan::Free))
            .await
            .unwrap();
        let mut prefs = UserPreferences::permissive(user).with_daily_cap(2);
        prefs.utc_offset_minutes = 0;
        store.upsert_preferences(&prefs).await.unwrap();

        // Two deliveries already today, one yesterday.
        let today = noon_utc() - chrono::Duration::hours(2);
        let yesterday = noon_utc() - chrono::Duration::hours(20);
        let other_story = presswire_core::StoryId::generate();
        store
            .append_delivery_logs(&[
                DeliveryLog::delivered(user, other_story, VersionHash::ZERO, DeliveryChannel::Feed, today),
                DeliveryLog::delivered(user, other_story, VersionHash::ZERO, DeliveryChannel::Feed, today),
                DeliveryLog::delivered(user, other_story, VersionHash::ZERO, DeliveryChannel::Feed, yesterday),
            ])
            .await
            .unwrap();

        let orchestrator = DeliveryOrchestrator::new(store.clone(), DeliveryConfig::default());
        let report = orchestrator
            .deliver(&story, VersionHash::ZERO, noon_utc())
            .await
            .unwrap();

        assert_eq!(report.suppressed_frequency_cap, 1);
        assert_eq!(report.delivered, 0);
    }

    #[tokio::test]
    async fn test_quiet_hours_subscriber_suppressed() {
        let store = Arc::new(MemoryStore::new());
        let story = setup_story(&store, vec![]).await;

        let user = ActorId::generate();
        store
            .upsert_subscription(&Subscription::active(user, SubscriptionPlan::Free))
            .await
            .unwrap();
        let mut prefs = UserPreferences::permissive(user).with_quiet_hours(
            NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(13, 0, 0).unwrap(),
        );
        prefs.utc_offset_minutes = 0;
        store.upsert_preferences(&prefs).await.unwrap();

        let orchestrator = DeliveryOrchestrator::new(store.clone(), DeliveryConfig::default());
        let report = orchestrator
            .deliver(&story, VersionHash::ZERO, noon_utc())
            .await
            .unwrap();

        assert_eq!(report.suppressed_quiet_hours, 1);
    }
}
