//! # Notification Rules
//!
//! Admin-configured rules mapping a business trigger to a delivery channel,
//! cadence, and recipient list. Rule EVALUATION here is pure matching;
//! actual delivery is an external concern.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Rule Vocabulary
// =============================================================================

/// The business condition that fires a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    LowStock,
    LaybyeOverdue,
    LaybyeCompleted,
    CreditOverdue,
    TillVariance,
    DeliveryStatus,
}

/// How the notification is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Email,
    Sms,
    Push,
    InApp,
}

/// When the notification is delivered relative to the trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum Cadence {
    Immediate,
    HourlyDigest,
    DailyDigest,
}

// =============================================================================
// Rule
// =============================================================================

/// A trigger → channel → cadence → recipients mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRule {
    pub id: String,
    pub name: String,
    pub trigger: TriggerKind,
    pub channel: Channel,
    pub cadence: Cadence,
    pub recipients: Vec<String>,
    /// Optional message template; `{placeholders}` are filled at delivery.
    pub template: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NotificationRule {
    /// Whether this rule should fire for a trigger.
    #[inline]
    pub fn matches(&self, trigger: TriggerKind) -> bool {
        self.is_active && self.trigger == trigger
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(trigger: TriggerKind, active: bool) -> NotificationRule {
        NotificationRule {
            id: "r".into(),
            name: "test".into(),
            trigger,
            channel: Channel::Email,
            cadence: Cadence::Immediate,
            recipients: vec!["admin@example.com".into()],
            template: None,
            is_active: active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_matches_active_rule() {
        assert!(rule(TriggerKind::TillVariance, true).matches(TriggerKind::TillVariance));
    }

    #[test]
    fn test_inactive_rule_never_matches() {
        assert!(!rule(TriggerKind::TillVariance, false).matches(TriggerKind::TillVariance));
    }

    #[test]
    fn test_different_trigger_does_not_match() {
        assert!(!rule(TriggerKind::LowStock, true).matches(TriggerKind::CreditOverdue));
    }
}
