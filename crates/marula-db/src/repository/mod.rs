//! # Repository Module
//!
//! Database repository implementations for Marula Retail.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  Service flow                                                           │
//! │       │                                                                 │
//! │       │  db.customers().get_with_accounts(id)                          │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  CustomerRepository                                                    │
//! │  ├── insert(&self, customer)                                           │
//! │  ├── get_with_accounts(&self, id)                                      │
//! │  ├── insert_credit(&self, account)                                     │
//! │  └── insert_loyalty(&self, account)                                    │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Benefits:                                                              │
//! │  • Clean separation of concerns                                        │
//! │  • SQL is isolated in one place                                        │
//! │  • Easy to exercise against an in-memory pool in tests                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`customer::CustomerRepository`] - Customers, credit + loyalty accounts
//! - [`laybye::LaybyeRepository`] - Contracts, items, payments, completion
//! - [`till::TillRepository`] - Sessions, cash drops, counts, reconciliation
//! - [`delivery::DeliveryRepository`] - Delivery records and status moves
//! - [`notification::NotificationRuleRepository`] - Notification rules
//! - [`product::ProductRepository`] - Product catalog rows
//! - [`sequence::SequenceRepository`] - Atomic sequence-number allocation

pub mod customer;
pub mod delivery;
pub mod laybye;
pub mod notification;
pub mod product;
pub mod sequence;
pub mod till;
