//! # Till Domain Types and Variance Math
//!
//! Till sessions, cash drops, denomination counts, and reconciliation.
//!
//! ## Session Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Till Session Lifecycle                            │
//! │                                                                         │
//! │  OPEN (opening float counted in)                                        │
//! │    │                                                                    │
//! │    ├── cash sale      → cash_sales += amount                            │
//! │    ├── refund         → refunds    += amount                            │
//! │    ├── cash drop      → payouts    += amount  (bounded by till amount)  │
//! │    └── till count     → denominations vs expected → variance            │
//! │    │                                                                    │
//! │  CLOSE                                                                  │
//! │    └── reconcile: expected = opening + sales - refunds - payouts        │
//! │                   variance = actual - expected                          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## One Variance Formula
//! The denomination-level count and the session-level reconciliation MUST
//! use the same formula (`actual - expected`) so the two displays never
//! diverge. Both call [`variance`]. Sign convention: positive = cash over,
//! negative = cash short.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Session
// =============================================================================

/// Operating state of a till session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum TillSessionStatus {
    Open,
    Closed,
}

/// A cash-drawer operating period bounded by an opening and closing count.
///
/// The running counters are maintained by the storage layer inside the same
/// transaction as the event that moves them; this type only carries them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TillSession {
    pub id: String,
    pub branch: String,
    pub operator: String,
    pub opening_cents: i64,
    pub cash_sales_cents: i64,
    pub refunds_cents: i64,
    pub payouts_cents: i64,
    pub status: TillSessionStatus,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl TillSession {
    /// Current cash that should be in the drawer.
    ///
    /// `opening + cash sales - refunds - payouts`. This is also the
    /// "expected" side of the closing reconciliation.
    pub fn current_amount(&self) -> Money {
        Money::from_cents(
            self.opening_cents + self.cash_sales_cents - self.refunds_cents - self.payouts_cents,
        )
    }

    /// Whether the session accepts events.
    #[inline]
    pub fn is_open(&self) -> bool {
        self.status == TillSessionStatus::Open
    }
}

// =============================================================================
// Cash Drop
// =============================================================================

/// Removal of cash from the till mid-session (e.g., bank deposit).
///
/// Precondition, validated before any write: amount ≤ current till amount.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CashDrop {
    pub id: String,
    pub session_id: String,
    pub amount_cents: i64,
    pub reason: String,
    pub dropped_at: DateTime<Utc>,
}

// =============================================================================
// Denomination Count
// =============================================================================

/// A physical count of one denomination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenominationCount {
    /// Face value of the note or coin, in cents (e.g., 20000 for R200).
    pub face_value_cents: i64,
    /// How many of them were counted.
    pub count: i64,
}

impl DenominationCount {
    /// Subtotal for this denomination.
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.face_value_cents).multiply_quantity(self.count)
    }
}

/// Sums a denomination breakdown into the counted cash amount.
///
/// `actual = Σ(face value × count)` — the denomination-level route to the
/// same "actual" figure the reconciliation takes as direct input.
pub fn counted_amount(denominations: &[DenominationCount]) -> Money {
    Money::from_cents(denominations.iter().map(|d| d.subtotal().cents()).sum())
}

/// The single variance formula: `actual - expected`.
///
/// Positive = cash over, negative = cash short. Every variance the system
/// displays comes through here.
#[inline]
pub fn variance(expected: Money, actual: Money) -> Money {
    actual - expected
}

/// A persisted denomination-by-denomination till count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TillCount {
    pub id: String,
    pub session_id: String,
    pub denominations: Vec<DenominationCount>,
    pub counted_cents: i64,
    pub expected_cents: i64,
    pub variance_cents: i64,
    pub counted_at: DateTime<Utc>,
}

// =============================================================================
// Reconciliation
// =============================================================================

/// The closing comparison of expected versus physically counted cash.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TillReconciliation {
    pub id: String,
    pub session_id: String,
    pub expected_cents: i64,
    pub actual_cents: i64,
    pub variance_cents: i64,
    pub notes: Option<String>,
    pub reconciled_at: DateTime<Utc>,
}

impl TillReconciliation {
    /// Whether the drawer balanced exactly.
    #[inline]
    pub fn is_balanced(&self) -> bool {
        self.variance_cents == 0
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variance_sign_convention() {
        let expected = Money::from_cents(10_000);

        // Perfect
        assert_eq!(variance(expected, Money::from_cents(10_000)).cents(), 0);
        // Over
        assert_eq!(variance(expected, Money::from_cents(12_000)).cents(), 2_000);
        // Short
        assert_eq!(variance(expected, Money::from_cents(8_000)).cents(), -2_000);
    }

    #[test]
    fn test_counted_amount() {
        let denominations = vec![
            DenominationCount {
                face_value_cents: 20_000, // R200
                count: 3,
            },
            DenominationCount {
                face_value_cents: 5_000, // R50
                count: 4,
            },
            DenominationCount {
                face_value_cents: 50, // 50c
                count: 10,
            },
        ];
        assert_eq!(counted_amount(&denominations).cents(), 80_500);
        assert_eq!(counted_amount(&[]).cents(), 0);
    }

    #[test]
    fn test_denomination_and_session_variance_agree() {
        // The two routes to "variance" must produce the same number
        let expected = Money::from_cents(80_000);
        let denominations = vec![DenominationCount {
            face_value_cents: 20_000,
            count: 4,
        }];
        let counted = counted_amount(&denominations);
        assert_eq!(
            variance(expected, counted),
            variance(expected, Money::from_cents(80_000))
        );
    }

    #[test]
    fn test_current_amount() {
        let session = TillSession {
            id: "t".into(),
            branch: "main".into(),
            operator: "thandi".into(),
            opening_cents: 50_000,
            cash_sales_cents: 120_000,
            refunds_cents: 10_000,
            payouts_cents: 40_000,
            status: TillSessionStatus::Open,
            opened_at: Utc::now(),
            closed_at: None,
        };
        assert_eq!(session.current_amount().cents(), 120_000);
        assert!(session.is_open());
    }
}
