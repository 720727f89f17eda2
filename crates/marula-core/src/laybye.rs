//! # Lay-bye Domain Types and Balance Math
//!
//! Lay-bye contracts: goods held until the customer has paid in full.
//!
//! ## Contract Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Lay-bye Lifecycle                                   │
//! │                                                                         │
//! │  1. CREATE                                                              │
//! │     └── contract { total, deposit, items } → status: Active             │
//! │                                                                         │
//! │  2. PAY (repeats)                                                       │
//! │     └── record_payment(amount)                                          │
//! │         └── storage recomputes remaining, returns PaymentOutcome        │
//! │             ├── remaining > 0 → status stays Active                     │
//! │             └── remaining = 0 → status flips to Completed               │
//! │                                                                         │
//! │  3. (OPTIONAL) CANCEL                                                   │
//! │     └── status: Cancelled                                               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## The Trust Boundary
//! The COMPLETION decision lives in the storage layer: a payment write
//! returns a [`PaymentOutcome`] and callers key every decision off it.
//! The pure functions in this module recompute balances for DISPLAY only;
//! they must never be used to decide a status transition from possibly
//! stale local data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Status / Cadence
// =============================================================================

/// The status of a lay-bye contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum LaybyeStatus {
    /// Payments are being collected.
    Active,
    /// Fully paid; goods released.
    Completed,
    /// Abandoned or refunded.
    Cancelled,
}

impl Default for LaybyeStatus {
    fn default() -> Self {
        LaybyeStatus::Active
    }
}

impl LaybyeStatus {
    /// Storage representation, matching the TEXT column values.
    pub const fn as_str(&self) -> &'static str {
        match self {
            LaybyeStatus::Active => "active",
            LaybyeStatus::Completed => "completed",
            LaybyeStatus::Cancelled => "cancelled",
        }
    }
}

/// Agreed payment schedule cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentCadence {
    Weekly,
    Biweekly,
    Monthly,
}

impl Default for PaymentCadence {
    fn default() -> Self {
        PaymentCadence::Monthly
    }
}

// =============================================================================
// Contract / Items / Payments
// =============================================================================

/// A lay-bye contract header. Line items and payments live in their own
/// tables and are fetched alongside.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct LaybyeContract {
    pub id: String,
    /// Human-readable sequence number (`LAY-NNNNNN`).
    pub contract_number: String,
    pub customer_id: String,
    pub total_cents: i64,
    pub deposit_cents: i64,
    pub cadence: PaymentCadence,
    pub status: LaybyeStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A line item held under a lay-bye contract.
/// Name and price are frozen at contract time (snapshot pattern).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct LaybyeItem {
    pub id: String,
    pub contract_id: String,
    pub name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl LaybyeItem {
    /// Line total (unit price × quantity).
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.unit_price_cents).multiply_quantity(self.quantity)
    }
}

/// A payment towards a lay-bye contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct LaybyePayment {
    pub id: String,
    pub contract_id: String,
    pub amount_cents: i64,
    /// Free-text payment method ("cash", "card", "eft").
    pub method: String,
    pub notes: Option<String>,
    pub paid_at: DateTime<Utc>,
}

impl LaybyePayment {
    /// Returns the payment amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Payment Outcome (returned by the storage write)
// =============================================================================

/// The authoritative result of a payment write.
///
/// The storage layer inserts the payment, recomputes the remaining balance
/// inside the same transaction, decides whether the contract completed, and
/// hands the result back here. Callers branch on THIS value only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentOutcome {
    /// Status after the write.
    pub new_status: LaybyeStatus,
    /// Remaining balance after the write, in cents.
    pub remaining_cents: i64,
}

impl PaymentOutcome {
    /// Whether this payment completed the contract.
    #[inline]
    pub fn completed(&self) -> bool {
        self.new_status == LaybyeStatus::Completed
    }
}

// =============================================================================
// Derived Balance Math (pure; display and validation only)
// =============================================================================

/// Remaining balance on a contract.
///
/// `remaining = max(0, total - deposit - Σ payments)` — clamped at zero so
/// an over-paid contract reports zero, never a negative balance.
///
/// Recompute from the current payment list on every call; the result is
/// never cached or stored as a client-side source of truth.
pub fn remaining_amount(total: Money, deposit: Money, payments: &[Money]) -> Money {
    total.saturating_sub(deposit + Money::sum(payments))
}

/// Amount paid so far (deposit plus all payments).
pub fn paid_amount(deposit: Money, payments: &[Money]) -> Money {
    deposit + Money::sum(payments)
}

/// Whether to clamp the progress percentage at 100 for over-paid contracts.
///
/// Observed behavior is unclamped (an over-payment reads as 105%), so
/// `None` is the default; callers that want a bounded gauge pass
/// `AtHundred`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProgressClamp {
    /// Report the raw percentage, even past 100.
    #[default]
    None,
    /// Cap the percentage at 100.
    AtHundred,
}

/// Payment progress as a rounded integer percentage.
///
/// `progress = round((deposit + Σ payments) / total * 100)`.
///
/// A zero-total contract reports 100% (nothing left to pay). Integer math
/// throughout: `(paid * 100 + total/2) / total` rounds half up without
/// touching floating point.
pub fn progress_percent(
    total: Money,
    deposit: Money,
    payments: &[Money],
    clamp: ProgressClamp,
) -> i64 {
    if total.cents() <= 0 {
        return 100;
    }
    let paid = paid_amount(deposit, payments).cents();
    let pct = (paid * 100 + total.cents() / 2) / total.cents();
    match clamp {
        ProgressClamp::None => pct,
        ProgressClamp::AtHundred => pct.min(100),
    }
}

/// Presentation-only completion figures for the final receipt.
///
/// `days_early` measures against the standard 90-day term. These numbers
/// are derived for display and never persisted; the storage-returned
/// [`PaymentOutcome`] remains the only authoritative completion signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionSummary {
    pub days_taken: i64,
    pub days_early: i64,
}

impl CompletionSummary {
    /// Builds the summary from the contract start and completion times.
    pub fn from_dates(
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        standard_term_days: i64,
    ) -> Self {
        let days_taken = (completed_at - started_at).num_days().max(0);
        CompletionSummary {
            days_taken,
            days_early: standard_term_days - days_taken,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn cents(values: &[i64]) -> Vec<Money> {
        values.iter().map(|&c| Money::from_cents(c)).collect()
    }

    #[test]
    fn test_remaining_amount_invariant() {
        let total = Money::from_cents(100_000);
        let deposit = Money::from_cents(20_000);

        // Empty payment list
        assert_eq!(remaining_amount(total, deposit, &[]).cents(), 80_000);

        // Partial payments
        let payments = cents(&[30_000]);
        assert_eq!(remaining_amount(total, deposit, &payments).cents(), 50_000);

        // Exactly paid off
        let payments = cents(&[30_000, 50_000]);
        assert_eq!(remaining_amount(total, deposit, &payments).cents(), 0);

        // Over-paid clamps at zero
        let payments = cents(&[30_000, 50_000, 10_000]);
        assert_eq!(remaining_amount(total, deposit, &payments).cents(), 0);
    }

    #[test]
    fn test_progress_percent_unclamped() {
        let total = Money::from_cents(100_000);
        let deposit = Money::from_cents(20_000);

        assert_eq!(progress_percent(total, deposit, &[], ProgressClamp::None), 20);

        let payments = cents(&[30_000]);
        assert_eq!(
            progress_percent(total, deposit, &payments, ProgressClamp::None),
            50
        );

        // Over-payment reads past 100 when unclamped
        let payments = cents(&[30_000, 50_000, 5_000]);
        assert_eq!(
            progress_percent(total, deposit, &payments, ProgressClamp::None),
            105
        );
    }

    #[test]
    fn test_progress_percent_clamped() {
        let total = Money::from_cents(100_000);
        let deposit = Money::from_cents(20_000);
        let payments = cents(&[30_000, 50_000, 5_000]);
        assert_eq!(
            progress_percent(total, deposit, &payments, ProgressClamp::AtHundred),
            100
        );
    }

    #[test]
    fn test_progress_monotonicity() {
        // Adding a payment never decreases progress
        let total = Money::from_cents(100_000);
        let deposit = Money::from_cents(10_000);
        let mut payments: Vec<Money> = Vec::new();
        let mut last = progress_percent(total, deposit, &payments, ProgressClamp::None);

        for amount in [5_000, 12_500, 40_000, 1, 60_000] {
            payments.push(Money::from_cents(amount));
            let next = progress_percent(total, deposit, &payments, ProgressClamp::None);
            assert!(next >= last, "progress decreased: {} -> {}", last, next);
            last = next;
        }

        // Removing a payment never increases progress
        while payments.pop().is_some() {
            let next = progress_percent(total, deposit, &payments, ProgressClamp::None);
            assert!(next <= last, "progress increased on removal");
            last = next;
        }
    }

    #[test]
    fn test_progress_rounding() {
        // 333.33...% of the way through one third of a R10 contract: rounds
        let total = Money::from_cents(1000);
        let deposit = Money::zero();
        let payments = cents(&[333]);
        assert_eq!(
            progress_percent(total, deposit, &payments, ProgressClamp::None),
            33
        );
        let payments = cents(&[335]);
        assert_eq!(
            progress_percent(total, deposit, &payments, ProgressClamp::None),
            34
        );
    }

    #[test]
    fn test_zero_total_contract_is_complete() {
        assert_eq!(
            progress_percent(Money::zero(), Money::zero(), &[], ProgressClamp::None),
            100
        );
        assert_eq!(
            remaining_amount(Money::zero(), Money::zero(), &[]).cents(),
            0
        );
    }

    #[test]
    fn test_payment_outcome_completed() {
        let outcome = PaymentOutcome {
            new_status: LaybyeStatus::Completed,
            remaining_cents: 0,
        };
        assert!(outcome.completed());

        let outcome = PaymentOutcome {
            new_status: LaybyeStatus::Active,
            remaining_cents: 50_000,
        };
        assert!(!outcome.completed());
    }

    #[test]
    fn test_completion_summary() {
        let started = Utc::now();
        let completed = started + Duration::days(61);
        let summary = CompletionSummary::from_dates(started, completed, 90);
        assert_eq!(summary.days_taken, 61);
        assert_eq!(summary.days_early, 29);

        // Over the standard term reads as negative days-early
        let late = started + Duration::days(120);
        let summary = CompletionSummary::from_dates(started, late, 90);
        assert_eq!(summary.days_early, -30);
    }

    #[test]
    fn test_line_total() {
        let item = LaybyeItem {
            id: "i".into(),
            contract_id: "c".into(),
            name: "Fridge".into(),
            quantity: 2,
            unit_price_cents: 450_000,
            created_at: Utc::now(),
        };
        assert_eq!(item.line_total().cents(), 900_000);
    }
}
