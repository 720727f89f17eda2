//! # Customer Provisioning Flows
//!
//! Multi-step writes creating a customer aggregate: the customer row first,
//! then zero or more requested sub-accounts.
//!
//! ## The Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    create_customer                                      │
//! │                                                                         │
//! │  1. Validate input (blocks before any write)                           │
//! │  2. Allocate CUST-NNNNNN (atomic counter)                              │
//! │  3. INSERT customer ──── failure? → abort, propagate, nothing else     │
//! │  4. Credit requested?                                                  │
//! │     └── allocate CRED-NNNNNN, INSERT credit account                    │
//! │         failure? → warn! and continue   ◄── best effort, no rollback  │
//! │  5. Loyalty requested?                                                 │
//! │     └── allocate LOYL-NNNNNN, INSERT loyalty account                   │
//! │         failure? → warn! and continue                                  │
//! │  6. Re-fetch the joined aggregate and return it                        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Step 6 costs one extra round trip and buys the caller the aggregate AS
//! PERSISTED: if step 4 failed quietly, the returned `credit` is `None`,
//! which is the truth.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ServiceResult;
use marula_core::sequence::{CREDIT_PREFIX, CUSTOMER_PREFIX, LOYALTY_PREFIX};
use marula_core::{
    validation, CoreError, CreditAccount, CreditScoreCategory, Customer, CustomerStatus,
    CustomerType, LoyaltyAccount, LoyaltyTier, Money,
};
use marula_db::{CustomerAccount, Database};

// =============================================================================
// Request Types
// =============================================================================

/// A requested credit account riding on a customer create/update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCreditAccount {
    pub is_active: bool,
    pub credit_limit_cents: i64,
    pub payment_terms_days: i64,
    #[serde(default)]
    pub score_category: CreditScoreCategory,
}

/// A requested loyalty account riding on a customer create/update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLoyaltyAccount {
    /// Opening points balance (signup promotions).
    #[serde(default)]
    pub starting_points: i64,
}

/// Input for the customer creation flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCustomer {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(default)]
    pub customer_type: CustomerType,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Requested credit account, if any.
    pub credit: Option<NewCreditAccount>,
    /// Requested loyalty account, if any.
    pub loyalty: Option<NewLoyaltyAccount>,
}

/// Input for the customer update flow. `None` fields are left unchanged;
/// a `Some` sub-account request is applied as insert-or-update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCustomer {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: Option<CustomerStatus>,
    pub customer_type: Option<CustomerType>,
    pub tags: Option<Vec<String>>,
    pub credit: Option<NewCreditAccount>,
    pub loyalty: Option<NewLoyaltyAccount>,
}

// =============================================================================
// Service
// =============================================================================

/// Orchestrates customer aggregate provisioning.
#[derive(Debug, Clone)]
pub struct ProvisioningService {
    db: Database,
}

impl ProvisioningService {
    /// Creates a new ProvisioningService.
    pub fn new(db: Database) -> Self {
        ProvisioningService { db }
    }

    /// Creates a customer, provisioning requested sub-accounts best effort.
    ///
    /// ## Failure Semantics
    /// - Validation and the customer insert propagate errors; on failure no
    ///   partial state is left behind.
    /// - Sub-account inserts are logged-and-swallowed: the flow still
    ///   reports success and the returned aggregate shows what actually
    ///   persisted.
    pub async fn create_customer(&self, req: NewCustomer) -> ServiceResult<CustomerAccount> {
        validation::validate_name(&req.name)?;
        if let Some(credit) = &req.credit {
            validation::validate_non_negative(
                "credit limit",
                Money::from_cents(credit.credit_limit_cents),
            )?;
        }

        let now = Utc::now();
        let customer_number = self.db.sequences().next_number(CUSTOMER_PREFIX).await?;
        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            customer_number,
            name: req.name.trim().to_string(),
            email: req.email,
            phone: req.phone,
            status: CustomerStatus::Active,
            customer_type: req.customer_type,
            total_purchases: 0,
            total_spent_cents: 0,
            last_purchase_at: None,
            tags: req.tags,
            created_at: now,
            updated_at: now,
        };

        // Primary write: a failure here aborts the whole flow
        self.db.customers().insert(&customer).await?;

        // Secondary writes: best effort, no rollback
        if let Some(credit_req) = &req.credit {
            if let Err(e) = self.provision_credit(&customer.id, credit_req).await {
                warn!(
                    customer_id = %customer.id,
                    error = %e,
                    "Credit account provisioning failed; customer stands without one"
                );
            }
        }

        if let Some(loyalty_req) = &req.loyalty {
            if let Err(e) = self.provision_loyalty(&customer.id, loyalty_req).await {
                warn!(
                    customer_id = %customer.id,
                    error = %e,
                    "Loyalty account provisioning failed; customer stands without one"
                );
            }
        }

        info!(
            customer_id = %customer.id,
            number = %customer.customer_number,
            "Customer created"
        );

        // Authoritative re-fetch: the caller sees exactly what persisted
        self.fetch_aggregate(&customer.id).await
    }

    /// Updates a customer and applies requested sub-account changes with
    /// check-existence-then-branch semantics. Sub-account failures follow
    /// the same logged-and-swallowed policy as creation.
    pub async fn update_customer(
        &self,
        customer_id: &str,
        req: UpdateCustomer,
    ) -> ServiceResult<CustomerAccount> {
        let mut customer = self
            .db
            .customers()
            .get_by_id(customer_id)
            .await?
            .ok_or_else(|| CoreError::CustomerNotFound(customer_id.to_string()))?;

        if let Some(name) = req.name {
            validation::validate_name(&name)?;
            customer.name = name.trim().to_string();
        }
        if let Some(email) = req.email {
            customer.email = Some(email);
        }
        if let Some(phone) = req.phone {
            customer.phone = Some(phone);
        }
        if let Some(status) = req.status {
            customer.status = status;
        }
        if let Some(customer_type) = req.customer_type {
            customer.customer_type = customer_type;
        }
        if let Some(tags) = req.tags {
            customer.tags = tags;
        }

        // Primary write
        self.db.customers().update(&customer).await?;

        // Sub-accounts: existence check, then insert or update
        if let Some(credit_req) = &req.credit {
            if let Err(e) = self.upsert_credit(customer_id, credit_req).await {
                warn!(
                    customer_id = %customer_id,
                    error = %e,
                    "Credit account update failed; customer update stands"
                );
            }
        }

        if let Some(loyalty_req) = &req.loyalty {
            if let Err(e) = self.upsert_loyalty(customer_id, loyalty_req).await {
                warn!(
                    customer_id = %customer_id,
                    error = %e,
                    "Loyalty account update failed; customer update stands"
                );
            }
        }

        self.fetch_aggregate(customer_id).await
    }

    /// Deletes a customer. Sub-accounts cascade in storage.
    pub async fn delete_customer(&self, customer_id: &str) -> ServiceResult<()> {
        self.db.customers().delete(customer_id).await?;
        info!(customer_id = %customer_id, "Customer deleted");
        Ok(())
    }

    // =========================================================================
    // Sub-account provisioning
    // =========================================================================

    async fn provision_credit(
        &self,
        customer_id: &str,
        req: &NewCreditAccount,
    ) -> ServiceResult<()> {
        let now = Utc::now();
        let account_number = self.db.sequences().next_number(CREDIT_PREFIX).await?;

        self.db
            .customers()
            .insert_credit(&CreditAccount {
                id: Uuid::new_v4().to_string(),
                account_number,
                customer_id: customer_id.to_string(),
                is_active: req.is_active,
                credit_limit_cents: req.credit_limit_cents,
                current_balance_cents: 0,
                // A fresh account has its whole limit available
                available_credit_cents: req.credit_limit_cents,
                score_category: req.score_category,
                payment_terms_days: req.payment_terms_days,
                last_payment_at: None,
                last_payment_cents: None,
                overdue_cents: 0,
                created_at: now,
                updated_at: now,
            })
            .await?;

        Ok(())
    }

    async fn provision_loyalty(
        &self,
        customer_id: &str,
        req: &NewLoyaltyAccount,
    ) -> ServiceResult<()> {
        let now = Utc::now();
        let card_number = self.db.sequences().next_number(LOYALTY_PREFIX).await?;

        self.db
            .customers()
            .insert_loyalty(&LoyaltyAccount {
                id: Uuid::new_v4().to_string(),
                card_number,
                customer_id: customer_id.to_string(),
                points_balance: req.starting_points,
                lifetime_points: req.starting_points,
                tier_points: req.starting_points,
                tier: LoyaltyTier::for_points(req.starting_points),
                created_at: now,
                updated_at: now,
            })
            .await?;

        Ok(())
    }

    async fn upsert_credit(&self, customer_id: &str, req: &NewCreditAccount) -> ServiceResult<()> {
        match self.db.customers().get_credit_by_customer(customer_id).await? {
            Some(mut existing) => {
                existing.is_active = req.is_active;
                // Limit changes move the stored available figure with them
                existing.available_credit_cents += req.credit_limit_cents - existing.credit_limit_cents;
                existing.credit_limit_cents = req.credit_limit_cents;
                existing.payment_terms_days = req.payment_terms_days;
                existing.score_category = req.score_category;
                self.db.customers().update_credit(&existing).await?;
            }
            None => self.provision_credit(customer_id, req).await?,
        }
        Ok(())
    }

    async fn upsert_loyalty(
        &self,
        customer_id: &str,
        req: &NewLoyaltyAccount,
    ) -> ServiceResult<()> {
        match self.db.customers().get_loyalty_by_customer(customer_id).await? {
            // An existing account is left untouched; points move through
            // loyalty transactions, not through provisioning
            Some(_) => Ok(()),
            None => self.provision_loyalty(customer_id, req).await,
        }
    }

    async fn fetch_aggregate(&self, customer_id: &str) -> ServiceResult<CustomerAccount> {
        Ok(self
            .db
            .customers()
            .get_with_accounts(customer_id)
            .await?
            .ok_or_else(|| CoreError::CustomerNotFound(customer_id.to_string()))?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use marula_db::DbConfig;

    async fn service() -> ProvisioningService {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        ProvisioningService::new(db)
    }

    fn alice_with_credit() -> NewCustomer {
        NewCustomer {
            name: "Alice".to_string(),
            email: Some("alice@example.com".to_string()),
            phone: None,
            customer_type: CustomerType::Regular,
            tags: vec![],
            credit: Some(NewCreditAccount {
                is_active: true,
                credit_limit_cents: 500_000, // R5000.00
                payment_terms_days: 30,
                score_category: CreditScoreCategory::Good,
            }),
            loyalty: None,
        }
    }

    #[tokio::test]
    async fn test_create_customer_with_credit_account() {
        let svc = service().await;

        let aggregate = svc.create_customer(alice_with_credit()).await.unwrap();

        assert_eq!(aggregate.customer.name, "Alice");
        assert_eq!(aggregate.customer.customer_number, "CUST-000001");

        let credit = aggregate.credit.expect("credit account requested");
        assert_eq!(credit.credit_limit_cents, 500_000);
        assert_eq!(credit.current_balance_cents, 0);
        assert_eq!(credit.available_credit_cents, 500_000);
        assert_eq!(credit.payment_terms_days, 30);
        // Generated number matches CRED-NNNNNN
        assert!(credit.account_number.starts_with("CRED-"));
        assert_eq!(credit.account_number.len(), "CRED-".len() + 6);
        assert!(credit
            .account_number
            .trim_start_matches("CRED-")
            .chars()
            .all(|c| c.is_ascii_digit()));
        assert!(aggregate.loyalty.is_none());
    }

    #[tokio::test]
    async fn test_credit_failure_is_swallowed_and_logged_only() {
        let svc = service().await;

        // Simulate the sub-account write failing: seed another customer
        // already holding the account number the counter will allocate
        // next, so Alice's credit insert hits a UNIQUE violation
        let other = svc
            .create_customer(NewCustomer {
                name: "Zodwa".to_string(),
                email: None,
                phone: None,
                customer_type: CustomerType::Regular,
                tags: vec![],
                credit: None,
                loyalty: None,
            })
            .await
            .unwrap();
        let now = Utc::now();
        svc.db
            .customers()
            .insert_credit(&CreditAccount {
                id: Uuid::new_v4().to_string(),
                account_number: "CRED-000001".to_string(),
                customer_id: other.customer.id,
                is_active: true,
                credit_limit_cents: 0,
                current_balance_cents: 0,
                available_credit_cents: 0,
                score_category: CreditScoreCategory::Fair,
                payment_terms_days: 30,
                last_payment_at: None,
                last_payment_cents: None,
                overdue_cents: 0,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();

        let result = svc.create_customer(alice_with_credit()).await;

        // The flow reports success with the customer; the failure was
        // warned about, not returned
        let aggregate = result.expect("primary write succeeded, flow must succeed");
        assert_eq!(aggregate.customer.name, "Alice");
        assert!(aggregate.credit.is_none());
    }

    #[tokio::test]
    async fn test_primary_failure_aborts_everything() {
        let svc = service().await;
        sqlx::query("DROP TABLE customers")
            .execute(svc.db.pool())
            .await
            .unwrap();

        let result = svc.create_customer(alice_with_credit()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_sequence_numbers_increment_per_prefix() {
        let svc = service().await;

        let first = svc.create_customer(alice_with_credit()).await.unwrap();
        let second = svc
            .create_customer(NewCustomer {
                name: "Bongani".to_string(),
                email: None,
                phone: None,
                customer_type: CustomerType::Vip,
                tags: vec![],
                credit: None,
                loyalty: Some(NewLoyaltyAccount { starting_points: 0 }),
            })
            .await
            .unwrap();

        assert_eq!(first.customer.customer_number, "CUST-000001");
        assert_eq!(second.customer.customer_number, "CUST-000002");
        assert_eq!(second.loyalty.unwrap().card_number, "LOYL-000001");
    }

    #[tokio::test]
    async fn test_update_customer_upserts_credit() {
        let svc = service().await;
        let created = svc
            .create_customer(NewCustomer {
                name: "Cindy".to_string(),
                email: None,
                phone: None,
                customer_type: CustomerType::Regular,
                tags: vec![],
                credit: None,
                loyalty: None,
            })
            .await
            .unwrap();
        assert!(created.credit.is_none());

        // First update inserts the account
        let updated = svc
            .update_customer(
                &created.customer.id,
                UpdateCustomer {
                    credit: Some(NewCreditAccount {
                        is_active: true,
                        credit_limit_cents: 200_000,
                        payment_terms_days: 30,
                        score_category: CreditScoreCategory::Fair,
                    }),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let credit = updated.credit.unwrap();
        assert_eq!(credit.credit_limit_cents, 200_000);

        // Second update branches to the update path and raises the limit
        let updated = svc
            .update_customer(
                &created.customer.id,
                UpdateCustomer {
                    credit: Some(NewCreditAccount {
                        is_active: true,
                        credit_limit_cents: 300_000,
                        payment_terms_days: 60,
                        score_category: CreditScoreCategory::Good,
                    }),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let credit = updated.credit.unwrap();
        assert_eq!(credit.credit_limit_cents, 300_000);
        assert_eq!(credit.available_credit_cents, 300_000);
        assert_eq!(credit.payment_terms_days, 60);
    }

    #[tokio::test]
    async fn test_validation_blocks_before_any_write() {
        let svc = service().await;
        let result = svc
            .create_customer(NewCustomer {
                name: "   ".to_string(),
                email: None,
                phone: None,
                customer_type: CustomerType::Regular,
                tags: vec![],
                credit: None,
                loyalty: None,
            })
            .await;
        assert!(result.is_err());

        // Nothing was written, not even a sequence allocation
        let customers = svc.db.customers().list_all().await.unwrap();
        assert!(customers.is_empty());
    }
}
