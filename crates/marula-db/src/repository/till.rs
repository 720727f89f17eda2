//! # Till Repository
//!
//! Database operations for till sessions, cash drops, counts, and
//! reconciliations.
//!
//! ## Counter Discipline
//! The session's running counters (cash sales, refunds, payouts) move in
//! the SAME transaction as the event row that explains them. The session
//! row and its event history can never disagree.

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use marula_core::till::{
    CashDrop, DenominationCount, TillCount, TillReconciliation, TillSession, TillSessionStatus,
};

/// Repository for till database operations.
#[derive(Debug, Clone)]
pub struct TillRepository {
    pool: SqlitePool,
}

impl TillRepository {
    /// Creates a new TillRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TillRepository { pool }
    }

    // =========================================================================
    // Sessions
    // =========================================================================

    /// Opens a session (inserts it as `open`).
    pub async fn insert_session(&self, session: &TillSession) -> DbResult<()> {
        debug!(id = %session.id, branch = %session.branch, "Opening till session");

        sqlx::query(
            r#"
            INSERT INTO till_sessions (
                id, branch, operator, opening_cents,
                cash_sales_cents, refunds_cents, payouts_cents,
                status, opened_at, closed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&session.id)
        .bind(&session.branch)
        .bind(&session.operator)
        .bind(session.opening_cents)
        .bind(session.cash_sales_cents)
        .bind(session.refunds_cents)
        .bind(session.payouts_cents)
        .bind(session.status)
        .bind(session.opened_at)
        .bind(session.closed_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a session by ID.
    pub async fn get_session(&self, id: &str) -> DbResult<Option<TillSession>> {
        let session =
            sqlx::query_as::<_, TillSession>("SELECT * FROM till_sessions WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(session)
    }

    /// Gets the open session for a branch, if any.
    pub async fn get_open_session(&self, branch: &str) -> DbResult<Option<TillSession>> {
        let session = sqlx::query_as::<_, TillSession>(
            "SELECT * FROM till_sessions WHERE branch = ?1 AND status = 'open'",
        )
        .bind(branch)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    /// Lists all sessions, newest first (stats full scan).
    pub async fn list_sessions(&self) -> DbResult<Vec<TillSession>> {
        let sessions = sqlx::query_as::<_, TillSession>(
            "SELECT * FROM till_sessions ORDER BY opened_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(sessions)
    }

    /// Adds a cash sale to the session's running counter.
    pub async fn record_cash_sale(&self, session_id: &str, amount_cents: i64) -> DbResult<()> {
        self.bump_counter(session_id, "cash_sales_cents", amount_cents)
            .await
    }

    /// Adds a refund to the session's running counter.
    pub async fn record_refund(&self, session_id: &str, amount_cents: i64) -> DbResult<()> {
        self.bump_counter(session_id, "refunds_cents", amount_cents)
            .await
    }

    async fn bump_counter(
        &self,
        session_id: &str,
        column: &'static str,
        amount_cents: i64,
    ) -> DbResult<()> {
        // Column name comes from the two callers above, never from input
        let sql = format!(
            "UPDATE till_sessions SET {column} = {column} + ?2 WHERE id = ?1 AND status = 'open'"
        );

        let result = sqlx::query(&sql)
            .bind(session_id)
            .bind(amount_cents)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Open till session", session_id));
        }

        Ok(())
    }

    // =========================================================================
    // Cash Drops
    // =========================================================================

    /// Records a cash drop and bumps the payout counter in one transaction.
    ///
    /// The amount bound (drop ≤ current till amount) is validated by the
    /// flow BEFORE this call; by the time we are here the write is a
    /// straight insert-plus-counter move.
    pub async fn record_cash_drop(&self, drop: &CashDrop) -> DbResult<()> {
        debug!(
            session_id = %drop.session_id,
            amount = drop.amount_cents,
            "Recording cash drop"
        );

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE till_sessions SET payouts_cents = payouts_cents + ?2
            WHERE id = ?1 AND status = 'open'
            "#,
        )
        .bind(&drop.session_id)
        .bind(drop.amount_cents)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Open till session", &drop.session_id));
        }

        sqlx::query(
            r#"
            INSERT INTO cash_drops (id, session_id, amount_cents, reason, dropped_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&drop.id)
        .bind(&drop.session_id)
        .bind(drop.amount_cents)
        .bind(&drop.reason)
        .bind(drop.dropped_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }

    /// Gets all cash drops for a session.
    pub async fn get_cash_drops(&self, session_id: &str) -> DbResult<Vec<CashDrop>> {
        let drops = sqlx::query_as::<_, CashDrop>(
            "SELECT * FROM cash_drops WHERE session_id = ?1 ORDER BY dropped_at",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(drops)
    }

    // =========================================================================
    // Till Counts
    // =========================================================================

    /// Persists a denomination-by-denomination till count.
    pub async fn insert_count(&self, count: &TillCount) -> DbResult<()> {
        let denominations = serde_json::to_string(&count.denominations)
            .map_err(|e| DbError::corrupt_column("denominations", e))?;

        sqlx::query(
            r#"
            INSERT INTO till_counts (
                id, session_id, denominations,
                counted_cents, expected_cents, variance_cents, counted_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&count.id)
        .bind(&count.session_id)
        .bind(denominations)
        .bind(count.counted_cents)
        .bind(count.expected_cents)
        .bind(count.variance_cents)
        .bind(count.counted_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets all counts for a session, oldest first.
    pub async fn get_counts(&self, session_id: &str) -> DbResult<Vec<TillCount>> {
        let rows = sqlx::query(
            "SELECT * FROM till_counts WHERE session_id = ?1 ORDER BY counted_at",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(count_from_row).collect()
    }

    // =========================================================================
    // Reconciliation
    // =========================================================================

    /// Inserts the closing reconciliation and closes the session, in one
    /// transaction. A session can only be reconciled once (UNIQUE
    /// session_id) and only while open.
    pub async fn reconcile_and_close(&self, recon: &TillReconciliation) -> DbResult<()> {
        debug!(
            session_id = %recon.session_id,
            variance = recon.variance_cents,
            "Reconciling and closing till session"
        );

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE till_sessions SET status = 'closed', closed_at = ?2
            WHERE id = ?1 AND status = 'open'
            "#,
        )
        .bind(&recon.session_id)
        .bind(recon.reconciled_at)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Open till session", &recon.session_id));
        }

        sqlx::query(
            r#"
            INSERT INTO till_reconciliations (
                id, session_id, expected_cents, actual_cents,
                variance_cents, notes, reconciled_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&recon.id)
        .bind(&recon.session_id)
        .bind(recon.expected_cents)
        .bind(recon.actual_cents)
        .bind(recon.variance_cents)
        .bind(&recon.notes)
        .bind(recon.reconciled_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }

    /// Gets the reconciliation for a session, if closed.
    pub async fn get_reconciliation(
        &self,
        session_id: &str,
    ) -> DbResult<Option<TillReconciliation>> {
        let recon = sqlx::query_as::<_, TillReconciliation>(
            "SELECT * FROM till_reconciliations WHERE session_id = ?1",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(recon)
    }

    /// Lists all reconciliations (stats full scan).
    pub async fn list_reconciliations(&self) -> DbResult<Vec<TillReconciliation>> {
        let recons = sqlx::query_as::<_, TillReconciliation>(
            "SELECT * FROM till_reconciliations ORDER BY reconciled_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(recons)
    }
}

// =============================================================================
// Row Mapping
// =============================================================================

/// Maps a till_counts row, decoding the JSON denomination column.
fn count_from_row(row: &SqliteRow) -> DbResult<TillCount> {
    let denominations_json: String = row.try_get("denominations")?;
    let denominations: Vec<DenominationCount> = serde_json::from_str(&denominations_json)
        .map_err(|e| DbError::corrupt_column("denominations", e))?;

    Ok(TillCount {
        id: row.try_get("id")?,
        session_id: row.try_get("session_id")?,
        denominations,
        counted_cents: row.try_get("counted_cents")?,
        expected_cents: row.try_get("expected_cents")?,
        variance_cents: row.try_get("variance_cents")?,
        counted_at: row.try_get("counted_at")?,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
