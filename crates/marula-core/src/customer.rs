//! # Customer Domain Types
//!
//! Customers and their optional owned sub-accounts.
//!
//! ## Aggregate Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Customer Aggregate                                 │
//! │                                                                         │
//! │  ┌─────────────────┐     0..1    ┌─────────────────┐                   │
//! │  │    Customer     │────────────►│  CreditAccount  │                   │
//! │  │  ─────────────  │             │  ─────────────  │                   │
//! │  │  id (UUID)      │             │  CRED-NNNNNN    │                   │
//! │  │  CUST-NNNNNN    │     0..1    │  limit/balance  │                   │
//! │  │  status, type   │────────┐    └─────────────────┘                   │
//! │  │  totals, tags   │        │    ┌─────────────────┐                   │
//! │  └─────────────────┘        └───►│ LoyaltyAccount  │                   │
//! │                                  │  ─────────────  │                   │
//! │                                  │  LOYL-NNNNNN    │                   │
//! │                                  │  points, tier   │                   │
//! │                                  └─────────────────┘                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The 1:1 ownership of each sub-account is enforced by a UNIQUE constraint
//! on `customer_id` in the storage layer, not by an existence-check race.
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Sequence number (`CUST-000042`, `CRED-000007`) - human-readable

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Customer Status / Type
// =============================================================================

/// Lifecycle status of a customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum CustomerStatus {
    /// Normal trading customer.
    Active,
    /// No recent activity; hidden from default lists.
    Inactive,
    /// Blocked from credit and lay-bye operations.
    Suspended,
}

impl Default for CustomerStatus {
    fn default() -> Self {
        CustomerStatus::Active
    }
}

/// Commercial classification of a customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum CustomerType {
    Regular,
    Vip,
    Wholesale,
}

impl Default for CustomerType {
    fn default() -> Self {
        CustomerType::Regular
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A customer account.
///
/// The financial summary fields (`total_purchases`, `total_spent_cents`,
/// `last_purchase_at`) are maintained by sale events; this layer reads them
/// but never derives them from scratch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Human-readable sequence number (`CUST-NNNNNN`).
    pub customer_number: String,

    /// Display name.
    pub name: String,

    /// Contact email.
    pub email: Option<String>,

    /// Contact phone.
    pub phone: Option<String>,

    /// Lifecycle status.
    pub status: CustomerStatus,

    /// Commercial classification.
    pub customer_type: CustomerType,

    /// Number of completed purchases.
    pub total_purchases: i64,

    /// Lifetime spend in cents.
    pub total_spent_cents: i64,

    /// When the customer last purchased.
    pub last_purchase_at: Option<DateTime<Utc>>,

    /// Free-form tag set.
    pub tags: Vec<String>,

    /// When the customer was created.
    pub created_at: DateTime<Utc>,

    /// When the customer was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    /// Returns the lifetime spend as Money.
    #[inline]
    pub fn total_spent(&self) -> Money {
        Money::from_cents(self.total_spent_cents)
    }

    /// Whether credit/lay-bye operations are allowed for this customer.
    #[inline]
    pub fn can_trade(&self) -> bool {
        self.status != CustomerStatus::Suspended
    }
}

// =============================================================================
// Credit Account
// =============================================================================

/// Coarse creditworthiness bucket. Not a numeric score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum CreditScoreCategory {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl Default for CreditScoreCategory {
    fn default() -> Self {
        CreditScoreCategory::Fair
    }
}

/// A customer's store credit account. At most one per customer.
///
/// `available_credit_cents` is a STORED field: it is written by the payment
/// and sale flows that move the balance, and readers trust it as stored.
/// [`CreditAccount::available_credit`] recomputes `limit - balance` so
/// callers can cross-check the two, but the stored field stays authoritative.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CreditAccount {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Human-readable sequence number (`CRED-NNNNNN`).
    pub account_number: String,

    /// Owning customer. UNIQUE in storage.
    pub customer_id: String,

    /// Whether the account may be charged.
    pub is_active: bool,

    /// Credit limit in cents.
    pub credit_limit_cents: i64,

    /// Outstanding balance in cents.
    pub current_balance_cents: i64,

    /// Stored available credit in cents (trusted as stored).
    pub available_credit_cents: i64,

    /// Creditworthiness bucket.
    pub score_category: CreditScoreCategory,

    /// Payment terms in days (e.g., 30).
    pub payment_terms_days: i64,

    /// When the last payment was received.
    pub last_payment_at: Option<DateTime<Utc>>,

    /// Amount of the last payment in cents.
    pub last_payment_cents: Option<i64>,

    /// Amount past its payment terms, in cents.
    pub overdue_cents: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CreditAccount {
    /// Recomputes available credit as `limit - balance`.
    ///
    /// For cross-checking against the stored field only; decision logic
    /// reads `available_credit_cents`.
    #[inline]
    pub fn available_credit(&self) -> Money {
        Money::from_cents(self.credit_limit_cents - self.current_balance_cents)
    }

    /// Whether the stored available-credit field agrees with the recomputed
    /// value. A `false` here indicates the account was mutated outside the
    /// normal flows and should be reviewed.
    #[inline]
    pub fn is_consistent(&self) -> bool {
        self.available_credit_cents == self.credit_limit_cents - self.current_balance_cents
    }

    /// Whether the account carries an overdue amount.
    #[inline]
    pub fn is_overdue(&self) -> bool {
        self.overdue_cents > 0
    }
}

// =============================================================================
// Loyalty Account
// =============================================================================

/// Loyalty tier. Progression is one-way within a membership year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum LoyaltyTier {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl LoyaltyTier {
    /// Tier-point threshold at which this tier is reached.
    pub const fn threshold(&self) -> i64 {
        match self {
            LoyaltyTier::Bronze => 0,
            LoyaltyTier::Silver => 2_000,
            LoyaltyTier::Gold => 10_000,
            LoyaltyTier::Platinum => 50_000,
        }
    }

    /// The next tier up, if any.
    pub const fn next(&self) -> Option<LoyaltyTier> {
        match self {
            LoyaltyTier::Bronze => Some(LoyaltyTier::Silver),
            LoyaltyTier::Silver => Some(LoyaltyTier::Gold),
            LoyaltyTier::Gold => Some(LoyaltyTier::Platinum),
            LoyaltyTier::Platinum => None,
        }
    }

    /// Determines the tier earned by a tier-point total.
    pub fn for_points(tier_points: i64) -> LoyaltyTier {
        if tier_points >= LoyaltyTier::Platinum.threshold() {
            LoyaltyTier::Platinum
        } else if tier_points >= LoyaltyTier::Gold.threshold() {
            LoyaltyTier::Gold
        } else if tier_points >= LoyaltyTier::Silver.threshold() {
            LoyaltyTier::Silver
        } else {
            LoyaltyTier::Bronze
        }
    }
}

impl Default for LoyaltyTier {
    fn default() -> Self {
        LoyaltyTier::Bronze
    }
}

/// A customer's loyalty account. At most one per customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct LoyaltyAccount {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Card number (`LOYL-NNNNNN`). UNIQUE in storage.
    pub card_number: String,

    /// Owning customer. UNIQUE in storage.
    pub customer_id: String,

    /// Spendable points.
    pub points_balance: i64,

    /// All points ever earned.
    pub lifetime_points: i64,

    /// Points counting towards tier progression this membership year.
    pub tier_points: i64,

    /// Current tier.
    pub tier: LoyaltyTier,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LoyaltyAccount {
    /// Points still needed to reach the next tier, or None at Platinum.
    pub fn points_to_next_tier(&self) -> Option<i64> {
        self.tier
            .next()
            .map(|next| (next.threshold() - self.tier_points).max(0))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn credit_account(limit: i64, balance: i64, available: i64) -> CreditAccount {
        CreditAccount {
            id: "a".into(),
            account_number: "CRED-000001".into(),
            customer_id: "c".into(),
            is_active: true,
            credit_limit_cents: limit,
            current_balance_cents: balance,
            available_credit_cents: available,
            score_category: CreditScoreCategory::Good,
            payment_terms_days: 30,
            last_payment_at: None,
            last_payment_cents: None,
            overdue_cents: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_available_credit_recompute() {
        let account = credit_account(500_000, 120_000, 380_000);
        assert_eq!(account.available_credit().cents(), 380_000);
        assert!(account.is_consistent());
    }

    #[test]
    fn test_inconsistent_stored_available_is_detected() {
        // Stored field drifted; recompute disagrees but stored stays trusted
        let account = credit_account(500_000, 120_000, 400_000);
        assert!(!account.is_consistent());
        assert_eq!(account.available_credit_cents, 400_000);
    }

    #[test]
    fn test_tier_for_points() {
        assert_eq!(LoyaltyTier::for_points(0), LoyaltyTier::Bronze);
        assert_eq!(LoyaltyTier::for_points(1_999), LoyaltyTier::Bronze);
        assert_eq!(LoyaltyTier::for_points(2_000), LoyaltyTier::Silver);
        assert_eq!(LoyaltyTier::for_points(10_000), LoyaltyTier::Gold);
        assert_eq!(LoyaltyTier::for_points(999_999), LoyaltyTier::Platinum);
    }

    #[test]
    fn test_points_to_next_tier() {
        let account = LoyaltyAccount {
            id: "l".into(),
            card_number: "LOYL-000001".into(),
            customer_id: "c".into(),
            points_balance: 500,
            lifetime_points: 1_500,
            tier_points: 1_500,
            tier: LoyaltyTier::Bronze,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(account.points_to_next_tier(), Some(500));
    }

    #[test]
    fn test_suspended_customer_cannot_trade() {
        let customer = Customer {
            id: "c".into(),
            customer_number: "CUST-000001".into(),
            name: "Alice".into(),
            email: None,
            phone: None,
            status: CustomerStatus::Suspended,
            customer_type: CustomerType::Regular,
            total_purchases: 0,
            total_spent_cents: 0,
            last_purchase_at: None,
            tags: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(!customer.can_trade());
    }
}
