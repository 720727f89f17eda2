//! # Lay-bye Repository
//!
//! Database operations for lay-bye contracts, items, and payments.
//!
//! ## Payment Write = Status Decision
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    record_payment transaction                           │
//! │                                                                         │
//! │  1. SELECT contract  (must exist, must be active)                      │
//! │  2. INSERT payment                                                     │
//! │  3. SELECT SUM(amount) over all payments                               │
//! │  4. remaining = max(0, total - deposit - sum)                          │
//! │  5. remaining == 0 ?                                                   │
//! │     ├── yes → UPDATE status = 'completed', completed_at = now          │
//! │     └── no  → UPDATE updated_at = now                                  │
//! │  6. COMMIT, return PaymentOutcome { new_status, remaining_cents }      │
//! │                                                                         │
//! │  The caller branches on the returned outcome ONLY. Its own balance     │
//! │  math is for display and pre-submit validation, never for the          │
//! │  completion decision.                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use marula_core::laybye::{self, LaybyeContract, LaybyeItem, LaybyePayment, LaybyeStatus, PaymentOutcome};
use marula_core::Money;

/// A contract joined with its line items and payment history.
#[derive(Debug, Clone)]
pub struct LaybyeDetail {
    pub contract: LaybyeContract,
    pub items: Vec<LaybyeItem>,
    pub payments: Vec<LaybyePayment>,
}

impl LaybyeDetail {
    /// Remaining balance, recomputed from the payment list.
    pub fn remaining_amount(&self) -> Money {
        let payments: Vec<Money> = self.payments.iter().map(|p| p.amount()).collect();
        laybye::remaining_amount(
            Money::from_cents(self.contract.total_cents),
            Money::from_cents(self.contract.deposit_cents),
            &payments,
        )
    }
}

/// Repository for lay-bye database operations.
#[derive(Debug, Clone)]
pub struct LaybyeRepository {
    pool: SqlitePool,
}

impl LaybyeRepository {
    /// Creates a new LaybyeRepository.
    pub fn new(pool: SqlitePool) -> Self {
        LaybyeRepository { pool }
    }

    /// Creates a contract together with its line items.
    ///
    /// Header and items land in one transaction; a contract can never exist
    /// half-written.
    pub async fn create_contract(
        &self,
        contract: &LaybyeContract,
        items: &[LaybyeItem],
    ) -> DbResult<()> {
        debug!(
            id = %contract.id,
            number = %contract.contract_number,
            items = items.len(),
            "Creating lay-bye contract"
        );

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO laybye_contracts (
                id, contract_number, customer_id,
                total_cents, deposit_cents, cadence, status,
                started_at, completed_at, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&contract.id)
        .bind(&contract.contract_number)
        .bind(&contract.customer_id)
        .bind(contract.total_cents)
        .bind(contract.deposit_cents)
        .bind(contract.cadence)
        .bind(contract.status)
        .bind(contract.started_at)
        .bind(contract.completed_at)
        .bind(contract.created_at)
        .bind(contract.updated_at)
        .execute(&mut *tx)
        .await?;

        for item in items {
            sqlx::query(
                r#"
                INSERT INTO laybye_items (
                    id, contract_id, name, quantity, unit_price_cents, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(&item.id)
            .bind(&item.contract_id)
            .bind(&item.name)
            .bind(item.quantity)
            .bind(item.unit_price_cents)
            .bind(item.created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(())
    }

    /// Gets a contract header by ID.
    pub async fn get_contract(&self, id: &str) -> DbResult<Option<LaybyeContract>> {
        let contract = sqlx::query_as::<_, LaybyeContract>(
            "SELECT * FROM laybye_contracts WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(contract)
    }

    /// Gets a contract joined with items and payment history.
    pub async fn get_detail(&self, id: &str) -> DbResult<Option<LaybyeDetail>> {
        let Some(contract) = self.get_contract(id).await? else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, LaybyeItem>(
            "SELECT * FROM laybye_items WHERE contract_id = ?1 ORDER BY created_at",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let payments = self.get_payments(id).await?;

        Ok(Some(LaybyeDetail {
            contract,
            items,
            payments,
        }))
    }

    /// Gets all payments for a contract, oldest first.
    pub async fn get_payments(&self, contract_id: &str) -> DbResult<Vec<LaybyePayment>> {
        let payments = sqlx::query_as::<_, LaybyePayment>(
            "SELECT * FROM laybye_payments WHERE contract_id = ?1 ORDER BY paid_at",
        )
        .bind(contract_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    /// Lists contracts in a given status.
    pub async fn list_by_status(&self, status: LaybyeStatus) -> DbResult<Vec<LaybyeContract>> {
        let contracts = sqlx::query_as::<_, LaybyeContract>(
            "SELECT * FROM laybye_contracts WHERE status = ?1 ORDER BY contract_number",
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        Ok(contracts)
    }

    /// Lists all contracts (stats full scan).
    pub async fn list_all(&self) -> DbResult<Vec<LaybyeContract>> {
        let contracts = sqlx::query_as::<_, LaybyeContract>(
            "SELECT * FROM laybye_contracts ORDER BY contract_number",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(contracts)
    }

    /// Records a payment and decides completion in one transaction.
    ///
    /// Returns the authoritative [`PaymentOutcome`]; see the module docs.
    pub async fn record_payment(&self, payment: &LaybyePayment) -> DbResult<PaymentOutcome> {
        debug!(
            contract_id = %payment.contract_id,
            amount = payment.amount_cents,
            "Recording lay-bye payment"
        );

        let mut tx = self.pool.begin().await?;

        // Only active contracts accept payments
        let contract = sqlx::query_as::<_, LaybyeContract>(
            "SELECT * FROM laybye_contracts WHERE id = ?1 AND status = 'active'",
        )
        .bind(&payment.contract_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Active lay-bye contract", &payment.contract_id))?;

        sqlx::query(
            r#"
            INSERT INTO laybye_payments (
                id, contract_id, amount_cents, method, notes, paid_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&payment.id)
        .bind(&payment.contract_id)
        .bind(payment.amount_cents)
        .bind(&payment.method)
        .bind(&payment.notes)
        .bind(payment.paid_at)
        .execute(&mut *tx)
        .await?;

        let paid: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(amount_cents) FROM laybye_payments WHERE contract_id = ?1",
        )
        .bind(&payment.contract_id)
        .fetch_one(&mut *tx)
        .await?;

        let remaining = laybye::remaining_amount(
            Money::from_cents(contract.total_cents),
            Money::from_cents(contract.deposit_cents),
            &[Money::from_cents(paid.unwrap_or(0))],
        );

        let now = Utc::now();
        let new_status = if remaining.is_zero() {
            sqlx::query(
                r#"
                UPDATE laybye_contracts SET
                    status = 'completed',
                    completed_at = ?2,
                    updated_at = ?2
                WHERE id = ?1
                "#,
            )
            .bind(&payment.contract_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;
            LaybyeStatus::Completed
        } else {
            sqlx::query("UPDATE laybye_contracts SET updated_at = ?2 WHERE id = ?1")
                .bind(&payment.contract_id)
                .bind(now)
                .execute(&mut *tx)
                .await?;
            LaybyeStatus::Active
        };

        tx.commit().await?;

        Ok(PaymentOutcome {
            new_status,
            remaining_cents: remaining.cents(),
        })
    }

    /// Cancels an active contract.
    pub async fn cancel_contract(&self, id: &str) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE laybye_contracts SET
                status = 'cancelled',
                updated_at = ?2
            WHERE id = ?1 AND status = 'active'
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Active lay-bye contract", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use marula_core::laybye::PaymentCadence;
    use marula_core::{Customer, CustomerStatus, CustomerType};

    async fn seed_customer(db: &Database) {
        let now = Utc::now();
        db.customers()
            .insert(&Customer {
                id: "c1".to_string(),
                customer_number: "CUST-000001".to_string(),
                name: "Alice".to_string(),
                email: None,
                phone: None,
                status: CustomerStatus::Active,
                customer_type: CustomerType::Regular,
                total_purchases: 0,
                total_spent_cents: 0,
                last_purchase_at: None,
                tags: vec![],
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();
    }

    fn contract(total: i64, deposit: i64) -> LaybyeContract {
        let now = Utc::now();
        LaybyeContract {
            id: "lb1".to_string(),
            contract_number: "LAY-000001".to_string(),
            customer_id: "c1".to_string(),
            total_cents: total,
            deposit_cents: deposit,
            cadence: PaymentCadence::Monthly,
            status: LaybyeStatus::Active,
            started_at: now,
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn payment(id: &str, amount: i64) -> LaybyePayment {
        LaybyePayment {
            id: id.to_string(),
            contract_id: "lb1".to_string(),
            amount_cents: amount,
            method: "cash".to_string(),
            notes: None,
            paid_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_record_payment_returns_outcome() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        seed_customer(&db).await;
        let repo = db.laybyes();

        // total 1000.00, deposit 200.00
        repo.create_contract(&contract(100_000, 20_000), &[])
            .await
            .unwrap();

        // First payment: 300.00 → remaining 500.00, still active
        let outcome = repo.record_payment(&payment("p1", 30_000)).await.unwrap();
        assert_eq!(outcome.new_status, LaybyeStatus::Active);
        assert_eq!(outcome.remaining_cents, 50_000);

        // Second payment: 500.00 → remaining 0, storage flips to completed
        let outcome = repo.record_payment(&payment("p2", 50_000)).await.unwrap();
        assert_eq!(outcome.new_status, LaybyeStatus::Completed);
        assert_eq!(outcome.remaining_cents, 0);

        let stored = repo.get_contract("lb1").await.unwrap().unwrap();
        assert_eq!(stored.status, LaybyeStatus::Completed);
        assert!(stored.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_payment_against_completed_contract_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        seed_customer(&db).await;
        let repo = db.laybyes();

        repo.create_contract(&contract(50_000, 0), &[]).await.unwrap();
        repo.record_payment(&payment("p1", 50_000)).await.unwrap();

        let err = repo.record_payment(&payment("p2", 100)).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_detail_recomputes_remaining() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        seed_customer(&db).await;
        let repo = db.laybyes();

        repo.create_contract(&contract(100_000, 20_000), &[])
            .await
            .unwrap();
        repo.record_payment(&payment("p1", 30_000)).await.unwrap();

        let detail = repo.get_detail("lb1").await.unwrap().unwrap();
        assert_eq!(detail.payments.len(), 1);
        assert_eq!(detail.remaining_amount().cents(), 50_000);
    }
}
