//! # marula-db: Database Layer for Marula Retail
//!
//! This crate provides database access for the Marula back office.
//! It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Marula Retail Data Flow                            │
//! │                                                                         │
//! │  Service flow (create_customer, record_payment, ...)                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     marula-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ (customer.rs)  │    │  (embedded)  │  │   │
//! │  │   │               │    │                │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ CustomerRepo   │    │ 001_init.sql │  │   │
//! │  │   │ Connection    │    │ LaybyeRepo     │    │              │  │   │
//! │  │   │ Management    │    │ TillRepo ...   │    │              │  │   │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │                        SQLite Database                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## The Authoritative Side of the Trust Boundary
//!
//! Two decisions that look like business logic deliberately live HERE and
//! not in the service layer:
//!
//! - **Lay-bye completion**: `LaybyeRepository::record_payment` recomputes
//!   the remaining balance inside the payment transaction and flips the
//!   contract to `completed` itself, returning a `PaymentOutcome`. Callers
//!   branch on the outcome, never on their own math.
//! - **Sequence allocation**: `SequenceRepository::next_number` bumps an
//!   atomic counter row in one statement, so two concurrent creations can
//!   never be handed the same `CUST-NNNNNN`.
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (customer, laybye, ...)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use marula_db::{Database, DbConfig};
//!
//! // Create database with default config
//! let config = DbConfig::new("path/to/marula.db");
//! let db = Database::new(config).await?;
//!
//! // Use repositories
//! let aggregate = db.customers().get_with_accounts("some-uuid").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::customer::{CustomerAccount, CustomerRepository};
pub use repository::delivery::DeliveryRepository;
pub use repository::laybye::{LaybyeDetail, LaybyeRepository};
pub use repository::notification::NotificationRuleRepository;
pub use repository::product::{Product, ProductRepository};
pub use repository::sequence::SequenceRepository;
pub use repository::till::TillRepository;
