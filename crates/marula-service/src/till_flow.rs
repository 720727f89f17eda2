//! # Till Management Flow
//!
//! Session open, cash drops, denomination counts, and the closing
//! reconciliation.
//!
//! ## Reconciliation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    reconcile_and_close                                  │
//! │                                                                         │
//! │  expected = opening + cash sales - refunds - payouts                   │
//! │  variance = actual - expected   (+ over / - short)                     │
//! │                                                                         │
//! │  Pure computation, then ONE insert (plus the session close). No        │
//! │  dependent writes, no best-effort branch.                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::error::ServiceResult;
use marula_core::till::{
    self, CashDrop, DenominationCount, TillCount, TillReconciliation, TillSession,
    TillSessionStatus,
};
use marula_core::{validation, CoreError, Money};
use marula_db::Database;

/// Orchestrates till session management.
#[derive(Debug, Clone)]
pub struct TillService {
    db: Database,
}

impl TillService {
    /// Creates a new TillService.
    pub fn new(db: Database) -> Self {
        TillService { db }
    }

    /// Opens a session with a counted-in opening float.
    ///
    /// One open session per branch; a second open attempt is rejected.
    pub async fn open_session(
        &self,
        branch: &str,
        operator: &str,
        opening_cents: i64,
    ) -> ServiceResult<TillSession> {
        validation::validate_name(operator)?;
        validation::validate_non_negative("opening amount", Money::from_cents(opening_cents))?;

        if let Some(existing) = self.db.tills().get_open_session(branch).await? {
            return Err(CoreError::SessionAlreadyOpen(existing.id).into());
        }

        let session = TillSession {
            id: Uuid::new_v4().to_string(),
            branch: branch.to_string(),
            operator: operator.to_string(),
            opening_cents,
            cash_sales_cents: 0,
            refunds_cents: 0,
            payouts_cents: 0,
            status: TillSessionStatus::Open,
            opened_at: Utc::now(),
            closed_at: None,
        };

        self.db.tills().insert_session(&session).await?;

        info!(
            session_id = %session.id,
            branch = %branch,
            opening = opening_cents,
            "Till session opened"
        );

        Ok(session)
    }

    /// Records a cash drop, rejecting it BEFORE any write if it would take
    /// the till negative.
    pub async fn cash_drop(
        &self,
        session_id: &str,
        amount_cents: i64,
        reason: &str,
    ) -> ServiceResult<CashDrop> {
        validation::validate_payment_amount(Money::from_cents(amount_cents))?;
        validation::validate_reason(reason)?;

        let session = self.require_open_session(session_id).await?;

        let available = session.current_amount();
        if amount_cents > available.cents() {
            return Err(CoreError::CashDropExceedsTill {
                available: available.cents(),
                requested: amount_cents,
            }
            .into());
        }

        let drop = CashDrop {
            id: Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            amount_cents,
            reason: reason.trim().to_string(),
            dropped_at: Utc::now(),
        };

        self.db.tills().record_cash_drop(&drop).await?;

        info!(
            session_id = %session_id,
            amount = amount_cents,
            "Cash drop recorded"
        );

        Ok(drop)
    }

    /// Records a denomination-by-denomination count against the expected
    /// drawer amount.
    pub async fn count_till(
        &self,
        session_id: &str,
        denominations: Vec<DenominationCount>,
    ) -> ServiceResult<TillCount> {
        let session = self.require_open_session(session_id).await?;

        let counted = till::counted_amount(&denominations);
        let expected = session.current_amount();
        let variance = till::variance(expected, counted);

        let count = TillCount {
            id: Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            denominations,
            counted_cents: counted.cents(),
            expected_cents: expected.cents(),
            variance_cents: variance.cents(),
            counted_at: Utc::now(),
        };

        self.db.tills().insert_count(&count).await?;

        Ok(count)
    }

    /// Reconciles the session against an entered actual amount and closes
    /// it.
    pub async fn reconcile_and_close(
        &self,
        session_id: &str,
        actual_cents: i64,
        notes: Option<String>,
    ) -> ServiceResult<TillReconciliation> {
        validation::validate_non_negative("actual amount", Money::from_cents(actual_cents))?;

        let session = self.require_open_session(session_id).await?;

        let expected = session.current_amount();
        let variance = till::variance(expected, Money::from_cents(actual_cents));

        let recon = TillReconciliation {
            id: Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            expected_cents: expected.cents(),
            actual_cents,
            variance_cents: variance.cents(),
            notes,
            reconciled_at: Utc::now(),
        };

        self.db.tills().reconcile_and_close(&recon).await?;

        info!(
            session_id = %session_id,
            expected = recon.expected_cents,
            actual = recon.actual_cents,
            variance = recon.variance_cents,
            "Till session reconciled and closed"
        );

        Ok(recon)
    }

    /// Adds a cash sale to the session's running counter.
    pub async fn record_cash_sale(&self, session_id: &str, amount_cents: i64) -> ServiceResult<()> {
        validation::validate_payment_amount(Money::from_cents(amount_cents))?;
        self.db.tills().record_cash_sale(session_id, amount_cents).await?;
        Ok(())
    }

    /// Adds a refund to the session's running counter.
    pub async fn record_refund(&self, session_id: &str, amount_cents: i64) -> ServiceResult<()> {
        validation::validate_payment_amount(Money::from_cents(amount_cents))?;
        self.db.tills().record_refund(session_id, amount_cents).await?;
        Ok(())
    }

    async fn require_open_session(&self, session_id: &str) -> ServiceResult<TillSession> {
        let session = self
            .db
            .tills()
            .get_session(session_id)
            .await?
            .ok_or_else(|| marula_db::DbError::not_found("Till session", session_id))?;

        if !session.is_open() {
            return Err(CoreError::InvalidSessionStatus {
                session_id: session_id.to_string(),
                current_status: "closed".to_string(),
            }
            .into());
        }

        Ok(session)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ServiceError;
    use marula_db::DbConfig;

    async fn service() -> TillService {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        TillService::new(db)
    }

    #[tokio::test]
    async fn test_second_open_session_rejected() {
        let svc = service().await;
        svc.open_session("main", "thandi", 50_000).await.unwrap();

        let err = svc.open_session("main", "sipho", 10_000).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Core(CoreError::SessionAlreadyOpen(_))
        ));
    }

    #[tokio::test]
    async fn test_over_drop_rejected_before_any_write() {
        let svc = service().await;
        let session = svc.open_session("main", "thandi", 50_000).await.unwrap();

        // Till holds R500; dropping R600 must fail
        let err = svc
            .cash_drop(&session.id, 60_000, "bank deposit")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Core(CoreError::CashDropExceedsTill {
                available: 50_000,
                requested: 60_000
            })
        ));

        // No drop row landed and the payout counter never moved
        let drops = svc.db.tills().get_cash_drops(&session.id).await.unwrap();
        assert!(drops.is_empty());
        let stored = svc.db.tills().get_session(&session.id).await.unwrap().unwrap();
        assert_eq!(stored.payouts_cents, 0);
    }

    #[tokio::test]
    async fn test_drop_of_exact_till_amount_allowed() {
        let svc = service().await;
        let session = svc.open_session("main", "thandi", 50_000).await.unwrap();

        svc.cash_drop(&session.id, 50_000, "bank deposit").await.unwrap();

        let stored = svc.db.tills().get_session(&session.id).await.unwrap().unwrap();
        assert_eq!(stored.current_amount().cents(), 0);
    }

    #[tokio::test]
    async fn test_count_and_reconciliation_use_same_variance() {
        let svc = service().await;
        let session = svc.open_session("main", "thandi", 10_000).await.unwrap();

        // Count R120 in notes against an expected R100
        let count = svc
            .count_till(
                &session.id,
                vec![DenominationCount {
                    face_value_cents: 2_000,
                    count: 6,
                }],
            )
            .await
            .unwrap();
        assert_eq!(count.counted_cents, 12_000);
        assert_eq!(count.expected_cents, 10_000);
        assert_eq!(count.variance_cents, 2_000); // over

        // Reconciliation with the same actual produces the same variance
        let recon = svc
            .reconcile_and_close(&session.id, 12_000, None)
            .await
            .unwrap();
        assert_eq!(recon.variance_cents, count.variance_cents);
        assert!(!recon.is_balanced());
    }

    #[tokio::test]
    async fn test_reconcile_short_till() {
        let svc = service().await;
        let session = svc.open_session("main", "thandi", 10_000).await.unwrap();
        svc.record_cash_sale(&session.id, 5_000).await.unwrap();

        // expected = 100 + 50 = R150; counted R130 → short R20
        let recon = svc
            .reconcile_and_close(&session.id, 13_000, None)
            .await
            .unwrap();
        assert_eq!(recon.expected_cents, 15_000);
        assert_eq!(recon.variance_cents, -2_000);

        // Session no longer accepts events
        let err = svc.record_cash_sale(&session.id, 100).await.unwrap_err();
        assert!(matches!(err, ServiceError::Db(_)));
    }
}
