//! # Error Types
//!
//! Domain-specific error types for marula-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  marula-core errors (this file)                                        │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  marula-db errors (separate crate)                                     │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  marula-service errors (separate crate)                                │
//! │  └── ServiceError     - What callers of the flows see                  │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ServiceError → Caller   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (contract number, amounts, etc.)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations or domain logic failures.
/// They should be caught and translated to user-friendly messages.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Customer cannot be found.
    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    /// Lay-bye contract cannot be found.
    #[error("Lay-bye contract not found: {0}")]
    ContractNotFound(String),

    /// Lay-bye contract is not active.
    ///
    /// ## When This Occurs
    /// - Recording a payment against a completed contract
    /// - Cancelling an already cancelled contract
    #[error("Lay-bye contract {contract_id} is {current_status}, cannot perform operation")]
    ContractNotActive {
        contract_id: String,
        current_status: String,
    },

    /// Payment exceeds the remaining contract balance.
    ///
    /// ## User Workflow
    /// ```text
    /// Record payment (amount: R800)
    ///      │
    ///      ▼
    /// Check remaining: R500
    ///      │
    ///      ▼
    /// PaymentExceedsBalance { remaining: 50000, requested: 80000 }
    ///      │
    ///      ▼
    /// UI shows: "Payment exceeds remaining balance of R500.00"
    /// ```
    #[error("Payment of {requested} cents exceeds remaining balance of {remaining} cents")]
    PaymentExceedsBalance { remaining: i64, requested: i64 },

    /// Cash drop exceeds the current till amount.
    ///
    /// The drop must be rejected BEFORE any write occurs; the till can
    /// never go negative.
    #[error("Cash drop of {requested} cents exceeds till amount of {available} cents")]
    CashDropExceedsTill { available: i64, requested: i64 },

    /// Till session is not in a state that allows the requested operation.
    #[error("Till session {session_id} is {current_status}, cannot perform operation")]
    InvalidSessionStatus {
        session_id: String,
        current_status: String,
    },

    /// A till session is already open for this operator.
    #[error("An open till session already exists: {0}")]
    SessionAlreadyOpen(String),

    /// Requested delivery status change is not a legal transition.
    #[error("Delivery cannot move from {from} to {to}")]
    InvalidDeliveryTransition { from: String, to: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before any write is attempted.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, invalid sequence number).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., duplicate card number).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
