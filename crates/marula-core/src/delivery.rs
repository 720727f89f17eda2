//! # Delivery Domain Types
//!
//! Order-fulfilment records with a small status state machine.
//!
//! ## Status Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Pending ──────► InTransit ──────► Delivered (terminal)                │
//! │      │                │                                                 │
//! │      └────────────────┴───────────► Cancelled (terminal)                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! [`DeliveryStatus::can_transition`] is the single source of transition
//! truth; the storage layer and the flows both consult it.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Status
// =============================================================================

/// Fulfilment state of a delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Pending,
    InTransit,
    Delivered,
    Cancelled,
}

impl DeliveryStatus {
    /// Whether a status change is a legal transition.
    pub const fn can_transition(from: DeliveryStatus, to: DeliveryStatus) -> bool {
        use DeliveryStatus::*;
        matches!(
            (from, to),
            (Pending, InTransit) | (Pending, Cancelled) | (InTransit, Delivered) | (InTransit, Cancelled)
        )
    }

    /// Whether this status accepts no further changes.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, DeliveryStatus::Delivered | DeliveryStatus::Cancelled)
    }
}

impl Default for DeliveryStatus {
    fn default() -> Self {
        DeliveryStatus::Pending
    }
}

// =============================================================================
// Delivery
// =============================================================================

/// An item on a delivery manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryItem {
    pub name: String,
    pub quantity: i64,
}

/// An order-fulfilment record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Delivery {
    pub id: String,
    /// Human-readable sequence number (`DEL-NNNNNN`).
    pub delivery_number: String,
    pub customer_id: String,
    pub address: String,
    pub items: Vec<DeliveryItem>,
    pub total_cents: i64,
    /// Scheduled calendar date.
    pub scheduled_date: NaiveDate,
    /// Delivery window, e.g. "08:00" - "12:00".
    pub window_start: String,
    pub window_end: String,
    pub status: DeliveryStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use DeliveryStatus::*;

    #[test]
    fn test_legal_transitions() {
        assert!(DeliveryStatus::can_transition(Pending, InTransit));
        assert!(DeliveryStatus::can_transition(Pending, Cancelled));
        assert!(DeliveryStatus::can_transition(InTransit, Delivered));
        assert!(DeliveryStatus::can_transition(InTransit, Cancelled));
    }

    #[test]
    fn test_illegal_transitions() {
        // No skipping in-transit
        assert!(!DeliveryStatus::can_transition(Pending, Delivered));
        // Terminal states are final
        assert!(!DeliveryStatus::can_transition(Delivered, Pending));
        assert!(!DeliveryStatus::can_transition(Cancelled, InTransit));
        // No going backwards
        assert!(!DeliveryStatus::can_transition(InTransit, Pending));
        // Self-transitions are not moves
        assert!(!DeliveryStatus::can_transition(Pending, Pending));
    }

    #[test]
    fn test_terminal() {
        assert!(Delivered.is_terminal());
        assert!(Cancelled.is_terminal());
        assert!(!Pending.is_terminal());
        assert!(!InTransit.is_terminal());
    }
}
