//! # Sequence Repository
//!
//! Atomic allocation of human-readable sequence numbers.
//!
//! ## Why a Counter Table
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  The naive approach reads the current maximum identifier, parses it,   │
//! │  and adds one. Two concurrent creations both read CUST-000042 and      │
//! │  both produce CUST-000043.                                             │
//! │                                                                         │
//! │  Here the bump happens INSIDE the database, in one statement:          │
//! │                                                                         │
//! │    INSERT INTO sequence_counters (prefix, value) VALUES (?, 1)         │
//! │    ON CONFLICT(prefix) DO UPDATE SET value = value + 1                 │
//! │    RETURNING value                                                     │
//! │                                                                         │
//! │  Each caller gets its own value; duplicates are impossible.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Formatting stays in `marula_core::sequence` so the `PREFIX-NNNNNN`
//! contract has exactly one definition.

use sqlx::SqlitePool;

use crate::error::DbResult;
use marula_core::sequence;

/// Repository for sequence-number allocation.
#[derive(Debug, Clone)]
pub struct SequenceRepository {
    pool: SqlitePool,
}

impl SequenceRepository {
    /// Creates a new SequenceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SequenceRepository { pool }
    }

    /// Allocates the next number for a prefix and formats it.
    ///
    /// The first call for a prefix yields `PREFIX-000001`.
    pub async fn next_number(&self, prefix: &str) -> DbResult<String> {
        let value: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO sequence_counters (prefix, value) VALUES (?1, 1)
            ON CONFLICT(prefix) DO UPDATE SET value = value + 1
            RETURNING value
            "#,
        )
        .bind(prefix)
        .fetch_one(&self.pool)
        .await?;

        Ok(sequence::format_number(prefix, value))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
