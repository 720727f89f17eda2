//! # Customer Repository
//!
//! Database operations for customers and their owned sub-accounts.
//!
//! ## Aggregate Re-fetch
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  After a provisioning flow finishes its writes, the caller wants the    │
//! │  aggregate AS PERSISTED, not as assembled from insert-time values:     │
//! │                                                                         │
//! │  get_with_accounts(id)                                                 │
//! │    ├── customers         WHERE id = ?                                   │
//! │    ├── credit_accounts   WHERE customer_id = ?   (0 or 1 row)          │
//! │    └── loyalty_accounts  WHERE customer_id = ?   (0 or 1 row)          │
//! │                                                                         │
//! │  One extra round trip buys an authoritative view.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use marula_core::{CreditAccount, Customer, LoyaltyAccount};

/// A customer joined with its optional sub-accounts.
#[derive(Debug, Clone)]
pub struct CustomerAccount {
    pub customer: Customer,
    pub credit: Option<CreditAccount>,
    pub loyalty: Option<LoyaltyAccount>,
}

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    // =========================================================================
    // Customers
    // =========================================================================

    /// Inserts a customer row.
    pub async fn insert(&self, customer: &Customer) -> DbResult<()> {
        debug!(id = %customer.id, number = %customer.customer_number, "Inserting customer");

        let tags = serde_json::to_string(&customer.tags)
            .map_err(|e| DbError::corrupt_column("tags", e))?;

        sqlx::query(
            r#"
            INSERT INTO customers (
                id, customer_number, name, email, phone,
                status, customer_type,
                total_purchases, total_spent_cents, last_purchase_at,
                tags, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.customer_number)
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(customer.status)
        .bind(customer.customer_type)
        .bind(customer.total_purchases)
        .bind(customer.total_spent_cents)
        .bind(customer.last_purchase_at)
        .bind(tags)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates a customer's editable fields.
    pub async fn update(&self, customer: &Customer) -> DbResult<()> {
        let tags = serde_json::to_string(&customer.tags)
            .map_err(|e| DbError::corrupt_column("tags", e))?;
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE customers SET
                name = ?2,
                email = ?3,
                phone = ?4,
                status = ?5,
                customer_type = ?6,
                tags = ?7,
                updated_at = ?8
            WHERE id = ?1
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(customer.status)
        .bind(customer.customer_type)
        .bind(tags)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", &customer.id));
        }

        Ok(())
    }

    /// Deletes a customer (explicit hard delete; sub-accounts cascade).
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM customers WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        Ok(())
    }

    /// Gets a customer by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let row = sqlx::query("SELECT * FROM customers WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| customer_from_row(&r)).transpose()
    }

    /// Lists all customers (dashboard-scale full scan).
    pub async fn list_all(&self) -> DbResult<Vec<Customer>> {
        let rows = sqlx::query("SELECT * FROM customers ORDER BY customer_number")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(customer_from_row).collect()
    }

    /// Gets a customer joined with its optional credit and loyalty accounts.
    ///
    /// This is the authoritative re-fetch at the end of every provisioning
    /// flow: the caller sees exactly what is persisted.
    pub async fn get_with_accounts(&self, id: &str) -> DbResult<Option<CustomerAccount>> {
        let Some(customer) = self.get_by_id(id).await? else {
            return Ok(None);
        };

        let credit = self.get_credit_by_customer(id).await?;
        let loyalty = self.get_loyalty_by_customer(id).await?;

        Ok(Some(CustomerAccount {
            customer,
            credit,
            loyalty,
        }))
    }

    // =========================================================================
    // Credit Accounts
    // =========================================================================

    /// Inserts a credit account.
    ///
    /// The UNIQUE(customer_id) constraint rejects a second account for the
    /// same customer; the error surfaces as `DbError::UniqueViolation`.
    pub async fn insert_credit(&self, account: &CreditAccount) -> DbResult<()> {
        debug!(
            id = %account.id,
            number = %account.account_number,
            customer_id = %account.customer_id,
            "Inserting credit account"
        );

        sqlx::query(
            r#"
            INSERT INTO credit_accounts (
                id, account_number, customer_id, is_active,
                credit_limit_cents, current_balance_cents, available_credit_cents,
                score_category, payment_terms_days,
                last_payment_at, last_payment_cents, overdue_cents,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
        )
        .bind(&account.id)
        .bind(&account.account_number)
        .bind(&account.customer_id)
        .bind(account.is_active)
        .bind(account.credit_limit_cents)
        .bind(account.current_balance_cents)
        .bind(account.available_credit_cents)
        .bind(account.score_category)
        .bind(account.payment_terms_days)
        .bind(account.last_payment_at)
        .bind(account.last_payment_cents)
        .bind(account.overdue_cents)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates a credit account's terms and status.
    pub async fn update_credit(&self, account: &CreditAccount) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE credit_accounts SET
                is_active = ?2,
                credit_limit_cents = ?3,
                available_credit_cents = ?4,
                score_category = ?5,
                payment_terms_days = ?6,
                updated_at = ?7
            WHERE id = ?1
            "#,
        )
        .bind(&account.id)
        .bind(account.is_active)
        .bind(account.credit_limit_cents)
        .bind(account.available_credit_cents)
        .bind(account.score_category)
        .bind(account.payment_terms_days)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Credit account", &account.id));
        }

        Ok(())
    }

    /// Gets the credit account owned by a customer, if any.
    pub async fn get_credit_by_customer(
        &self,
        customer_id: &str,
    ) -> DbResult<Option<CreditAccount>> {
        let account = sqlx::query_as::<_, CreditAccount>(
            "SELECT * FROM credit_accounts WHERE customer_id = ?1",
        )
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    /// Lists all credit accounts (stats full scan).
    pub async fn list_credit_accounts(&self) -> DbResult<Vec<CreditAccount>> {
        let accounts =
            sqlx::query_as::<_, CreditAccount>("SELECT * FROM credit_accounts ORDER BY account_number")
                .fetch_all(&self.pool)
                .await?;

        Ok(accounts)
    }

    /// Records a payment against a credit account.
    ///
    /// Moves the balance and the stored available-credit field together in
    /// one statement, and stamps the last-payment fields.
    pub async fn record_credit_payment(
        &self,
        customer_id: &str,
        amount_cents: i64,
    ) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE credit_accounts SET
                current_balance_cents = current_balance_cents - ?2,
                available_credit_cents = available_credit_cents + ?2,
                last_payment_at = ?3,
                last_payment_cents = ?2,
                updated_at = ?3
            WHERE customer_id = ?1 AND is_active = 1
            "#,
        )
        .bind(customer_id)
        .bind(amount_cents)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Active credit account for customer", customer_id));
        }

        Ok(())
    }

    // =========================================================================
    // Loyalty Accounts
    // =========================================================================

    /// Inserts a loyalty account.
    pub async fn insert_loyalty(&self, account: &LoyaltyAccount) -> DbResult<()> {
        debug!(
            id = %account.id,
            card = %account.card_number,
            customer_id = %account.customer_id,
            "Inserting loyalty account"
        );

        sqlx::query(
            r#"
            INSERT INTO loyalty_accounts (
                id, card_number, customer_id,
                points_balance, lifetime_points, tier_points, tier,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&account.id)
        .bind(&account.card_number)
        .bind(&account.customer_id)
        .bind(account.points_balance)
        .bind(account.lifetime_points)
        .bind(account.tier_points)
        .bind(account.tier)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates a loyalty account's points and tier.
    pub async fn update_loyalty(&self, account: &LoyaltyAccount) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE loyalty_accounts SET
                points_balance = ?2,
                lifetime_points = ?3,
                tier_points = ?4,
                tier = ?5,
                updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(&account.id)
        .bind(account.points_balance)
        .bind(account.lifetime_points)
        .bind(account.tier_points)
        .bind(account.tier)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Loyalty account", &account.id));
        }

        Ok(())
    }

    /// Gets the loyalty account owned by a customer, if any.
    pub async fn get_loyalty_by_customer(
        &self,
        customer_id: &str,
    ) -> DbResult<Option<LoyaltyAccount>> {
        let account = sqlx::query_as::<_, LoyaltyAccount>(
            "SELECT * FROM loyalty_accounts WHERE customer_id = ?1",
        )
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    /// Lists all loyalty accounts (stats full scan).
    pub async fn list_loyalty_accounts(&self) -> DbResult<Vec<LoyaltyAccount>> {
        let accounts =
            sqlx::query_as::<_, LoyaltyAccount>("SELECT * FROM loyalty_accounts ORDER BY card_number")
                .fetch_all(&self.pool)
                .await?;

        Ok(accounts)
    }
}

// =============================================================================
// Row Mapping
// =============================================================================

/// Maps a customers row, decoding the JSON tag column.
///
/// Customers carry a JSON column so they can't use a plain FromRow derive.
fn customer_from_row(row: &SqliteRow) -> DbResult<Customer> {
    let tags_json: String = row.try_get("tags")?;
    let tags: Vec<String> =
        serde_json::from_str(&tags_json).map_err(|e| DbError::corrupt_column("tags", e))?;

    Ok(Customer {
        id: row.try_get("id")?,
        customer_number: row.try_get("customer_number")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        status: row.try_get("status")?,
        customer_type: row.try_get("customer_type")?,
        total_purchases: row.try_get("total_purchases")?,
        total_spent_cents: row.try_get("total_spent_cents")?,
        last_purchase_at: row.try_get::<Option<DateTime<Utc>>, _>("last_purchase_at")?,
        tags,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
