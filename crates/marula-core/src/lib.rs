//! # marula-core: Pure Business Logic for Marula Retail
//!
//! This crate is the **heart** of the Marula back office. It contains all
//! business logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Marula Retail Architecture                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 marula-service (Flows)                          │   │
//! │  │   create_customer ──► record_laybye_payment ──► reconcile_till  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ marula-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────────────┐  │   │
//! │  │   │  money   │ │  laybye  │ │   till   │ │ sequence/validate│  │   │
//! │  │   │  Money   │ │ balances │ │ variance │ │ CUST-NNNNNN      │  │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                   marula-db (Storage Layer)                     │   │
//! │  │             SQLite queries, migrations, repositories            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`customer`] - Customer, credit account, loyalty account types
//! - [`laybye`] - Lay-bye contracts and derived balance math
//! - [`till`] - Till sessions, cash drops, variance math
//! - [`delivery`] - Delivery records and their status machine
//! - [`notification`] - Notification rules
//! - [`sequence`] - Human-readable sequence-number formatting
//! - [`validation`] - Business rule validation
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//! 5. **Derived, Never Cached**: balances and variances are recomputed from
//!    source rows on every call; nothing in this crate stores running totals
//!
//! ## Example Usage
//!
//! ```rust
//! use marula_core::money::Money;
//! use marula_core::laybye;
//!
//! let total = Money::from_cents(100_000);   // R1000.00
//! let deposit = Money::from_cents(20_000);  // R200.00
//! let payments = [Money::from_cents(30_000)];
//!
//! // remaining = max(0, total - deposit - sum(payments))
//! let remaining = laybye::remaining_amount(total, deposit, &payments);
//! assert_eq!(remaining.cents(), 50_000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod customer;
pub mod delivery;
pub mod error;
pub mod laybye;
pub mod money;
pub mod notification;
pub mod sequence;
pub mod till;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use marula_core::Money` instead of
// `use marula_core::money::Money`

pub use customer::{
    CreditAccount, CreditScoreCategory, Customer, CustomerStatus, CustomerType, LoyaltyAccount,
    LoyaltyTier,
};
pub use delivery::{Delivery, DeliveryItem, DeliveryStatus};
pub use error::{CoreError, ValidationError};
pub use laybye::{
    CompletionSummary, LaybyeContract, LaybyeItem, LaybyePayment, LaybyeStatus, PaymentCadence,
    PaymentOutcome, ProgressClamp,
};
pub use money::Money;
pub use notification::{Cadence, Channel, NotificationRule, TriggerKind};
pub use till::{
    CashDrop, DenominationCount, TillCount, TillReconciliation, TillSession, TillSessionStatus,
};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Standard lay-bye term in days, used ONLY for presentation figures
/// (days-early on the final receipt). The storage layer decides actual
/// completion; this constant never feeds a state transition.
pub const STANDARD_LAYBYE_TERM_DAYS: i64 = 90;

/// Maximum line items allowed on a single lay-bye contract.
///
/// ## Business Reason
/// Prevents runaway contracts and ensures reasonable agreement sizes.
pub const MAX_CONTRACT_ITEMS: usize = 50;

/// Maximum quantity of a single line item.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;
