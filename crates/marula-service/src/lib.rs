//! # marula-service: Flow Orchestration for Marula Retail
//!
//! The multi-step write flows sitting between the back-office UI and the
//! storage layer, plus stats aggregation and the AI content adapter.
//!
//! ## Control Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Marula Retail Flows                                │
//! │                                                                         │
//! │  UI form submit                                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 marula-service (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │  ProvisioningService  LaybyeService  TillService  StatsService  │   │
//! │  │        │                   │              │            │        │   │
//! │  │        │  validate (core) → write (db) → re-fetch (db)          │   │
//! │  │        │                                                        │   │
//! │  │  AiClient ── reqwest ──► hosted language-model endpoint         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  marula-db → SQLite                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Failure Policy (the one place it is subtle)
//!
//! - **Primary writes** (the customer row, the payment row, the session row)
//!   propagate errors to the caller; nothing else is attempted.
//! - **Secondary writes** (a requested credit or loyalty account riding on
//!   a customer creation) are best effort: a failure is logged through
//!   `tracing::warn!` and swallowed, and the flow still reports success.
//!   The customer exists; the missing sub-account is visible only in the
//!   logs. Callers that need certainty re-read the aggregate.
//!
//! ## Modules
//!
//! - [`provisioning`] - Customer + credit + loyalty provisioning flows
//! - [`laybye_flow`] - Lay-bye contract lifecycle and payment recording
//! - [`till_flow`] - Till sessions, cash drops, counts, reconciliation
//! - [`delivery_flow`] - Delivery scheduling and status moves
//! - [`stats`] - Dashboard statistics (full-scan reduction)
//! - [`ai`] - AI content-generation adapter
//! - [`receipt`] - Receipt printer seam (fire-and-forget)
//! - [`telemetry`] - tracing-subscriber initialization
//! - [`error`] - Service error type

// =============================================================================
// Module Declarations
// =============================================================================

pub mod ai;
pub mod delivery_flow;
pub mod error;
pub mod laybye_flow;
pub mod provisioning;
pub mod receipt;
pub mod stats;
pub mod telemetry;
pub mod till_flow;

// =============================================================================
// Re-exports
// =============================================================================

pub use ai::{AiClient, AiConfig, AiError, DescriptionContent, PriceSuggestion, TitleSuggestions};
pub use delivery_flow::{DeliveryService, NewDelivery};
pub use error::{ServiceError, ServiceResult};
pub use laybye_flow::{LaybyeService, NewLaybye, NewLaybyeItem, PaymentRecorded};
pub use provisioning::{
    NewCreditAccount, NewCustomer, NewLoyaltyAccount, ProvisioningService, UpdateCustomer,
};
pub use receipt::{LogPrinter, ReceiptError, ReceiptKind, ReceiptPrinter};
pub use stats::{DashboardStats, StatsService};
pub use till_flow::TillService;
