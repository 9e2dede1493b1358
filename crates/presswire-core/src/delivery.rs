//! Delivery log records.
//!
//! One row per (subscriber, story, version hash, channel) outcome,
//! produced exclusively by the delivery orchestrator. Append-only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{ActorId, StoryId, VersionHash};

/// Delivery channels. Only `Feed` is wired today; the rest exist so the
/// log schema does not change when transports arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryChannel {
    Feed,
    Email,
    Push,
    Sms,
    Webhook,
}

impl DeliveryChannel {
    pub fn as_str(self) -> &'static str {
        match self {
            DeliveryChannel::Feed => "feed",
            DeliveryChannel::Email => "email",
            DeliveryChannel::Push => "push",
            DeliveryChannel::Sms => "sms",
            DeliveryChannel::Webhook => "webhook",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "feed" => Some(DeliveryChannel::Feed),
            "email" => Some(DeliveryChannel::Email),
            "push" => Some(DeliveryChannel::Push),
            "sms" => Some(DeliveryChannel::Sms),
            "webhook" => Some(DeliveryChannel::Webhook),
            _ => None,
        }
    }
}

/// Outcome of one delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryResult {
    Delivered,
    Failed,
    Bounced,
    Suppressed,
    Pending,
}

impl DeliveryResult {
    pub fn as_str(self) -> &'static str {
        match self {
            DeliveryResult::Delivered => "delivered",
            DeliveryResult::Failed => "failed",
            DeliveryResult::Bounced => "bounced",
            DeliveryResult::Suppressed => "suppressed",
            DeliveryResult::Pending => "pending",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "delivered" => Some(DeliveryResult::Delivered),
            "failed" => Some(DeliveryResult::Failed),
            "bounced" => Some(DeliveryResult::Bounced),
            "suppressed" => Some(DeliveryResult::Suppressed),
            "pending" => Some(DeliveryResult::Pending),
            _ => None,
        }
    }
}

/// Machine-readable reason for a deliberate non-delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuppressionReason {
    MutedTopic,
    QuietHours,
    FrequencyCap,
}

impl SuppressionReason {
    pub fn as_str(self) -> &'static str {
        match self {
            SuppressionReason::MutedTopic => "muted_topic",
            SuppressionReason::QuietHours => "quiet_hours",
            SuppressionReason::FrequencyCap => "frequency_cap",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "muted_topic" => Some(SuppressionReason::MutedTopic),
            "quiet_hours" => Some(SuppressionReason::QuietHours),
            "frequency_cap" => Some(SuppressionReason::FrequencyCap),
            _ => None,
        }
    }
}

/// One append-only delivery log row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryLog {
    pub id: Uuid,
    pub user_id: ActorId,
    pub story_id: StoryId,
    pub version_hash: VersionHash,
    pub channel: DeliveryChannel,
    pub result: DeliveryResult,
    pub suppression_reason: Option<SuppressionReason>,
    pub recorded_at: DateTime<Utc>,
}

impl DeliveryLog {
    pub fn delivered(
        user_id: ActorId,
        story_id: StoryId,
        version_hash: VersionHash,
        channel: DeliveryChannel,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            story_id,
            version_hash,
            channel,
            result: DeliveryResult::Delivered,
            suppression_reason: None,
            recorded_at: now,
        }
    }

    pub fn suppressed(
        user_id: ActorId,
        story_id: StoryId,
        version_hash: VersionHash,
        channel: DeliveryChannel,
        reason: SuppressionReason,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            story_id,
            version_hash,
            channel,
            result: DeliveryResult::Suppressed,
            suppression_reason: Some(reason),
            recorded_at: now,
        }
    }
}
