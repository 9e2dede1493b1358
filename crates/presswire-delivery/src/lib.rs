//! # Presswire Delivery
//!
//! Subscriber delivery for the Presswire editorial pipeline: fan-out of
//! published story versions to active subscribers, with per-subscriber
//! suppression rules.
//!
//! ## Overview
//!
//! When a story publishes, [`DeliveryOrchestrator`] walks every active
//! subscription, evaluates the suppression rules against the subscriber's
//! preferences, and appends one delivery log row per subscriber. The log
//! is a complete record of the run: suppressed subscribers get a row too,
//! tagged with the reason.
//!
//! ## Suppression Rules
//!
//! Checked in order; the first match wins:
//!
//! 1. **Muted topics** - any story topic in the muted list (case-insensitive)
//! 2. **Quiet hours** - the subscriber's local time falls in their window
//! 3. **Frequency cap** - the subscriber already hit their daily maximum,
//!    counted since their local midnight
//!
//! A subscriber with no stored preferences gets permissive defaults and
//! is always delivered to.

pub mod error;
pub mod orchestrator;
pub mod suppression;

pub use error::{DeliveryError, Result};
pub use orchestrator::{DeliveryConfig, DeliveryOrchestrator, DeliveryReport};
pub use suppression::{evaluate, in_quiet_hours, is_topic_muted, local_midnight_utc, DeliveryDecision};
