//! # Dashboard Statistics
//!
//! Full-collection scans fetched and reduced in memory. O(n) per refresh,
//! acceptable at back-office scale.
//!
//! ## All-or-Nothing
//! Any failed sub-query short-circuits the whole refresh: the dashboard
//! shows the zero-filled default plus an `error!` log, never a partial
//! mixture of fresh and missing numbers.

use serde::Serialize;
use tracing::error;

use crate::error::ServiceResult;
use marula_core::laybye::LaybyeStatus;
use marula_core::till::TillSessionStatus;
use marula_core::{CustomerStatus, CustomerType, Money};
use marula_db::Database;

// =============================================================================
// Stat Shapes
// =============================================================================

/// Customer and credit figures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CustomerStats {
    pub total: usize,
    pub active: usize,
    pub suspended: usize,
    pub vip: usize,
    pub total_spent_cents: i64,
    pub credit_accounts: usize,
    pub credit_overdue_cents: i64,
    /// Accounts whose stored available-credit disagrees with limit-balance.
    pub inconsistent_credit_accounts: usize,
}

/// Lay-bye book figures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LaybyeStats {
    pub active_contracts: usize,
    pub completed_contracts: usize,
    pub cancelled_contracts: usize,
    /// Outstanding balance across all active contracts.
    pub outstanding_cents: i64,
}

/// Till figures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TillStats {
    pub open_sessions: usize,
    pub reconciled_sessions: usize,
    pub sessions_over: usize,
    pub sessions_short: usize,
    /// Net variance across all reconciliations (+ over / - short).
    pub net_variance_cents: i64,
}

/// The full dashboard snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub customers: CustomerStats,
    pub laybye: LaybyeStats,
    pub till: TillStats,
}

// =============================================================================
// Service
// =============================================================================

/// Computes dashboard statistics.
#[derive(Debug, Clone)]
pub struct StatsService {
    db: Database,
}

impl StatsService {
    /// Creates a new StatsService.
    pub fn new(db: Database) -> Self {
        StatsService { db }
    }

    /// Refreshes the dashboard snapshot.
    ///
    /// Never fails: a failed sub-query logs and yields the zero-filled
    /// default.
    pub async fn dashboard(&self) -> DashboardStats {
        match self.collect().await {
            Ok(stats) => stats,
            Err(e) => {
                error!(error = %e, "Stats refresh failed; showing zeros");
                DashboardStats::default()
            }
        }
    }

    async fn collect(&self) -> ServiceResult<DashboardStats> {
        Ok(DashboardStats {
            customers: self.customer_stats().await?,
            laybye: self.laybye_stats().await?,
            till: self.till_stats().await?,
        })
    }

    async fn customer_stats(&self) -> ServiceResult<CustomerStats> {
        let customers = self.db.customers().list_all().await?;
        let credit_accounts = self.db.customers().list_credit_accounts().await?;

        Ok(CustomerStats {
            total: customers.len(),
            active: customers
                .iter()
                .filter(|c| c.status == CustomerStatus::Active)
                .count(),
            suspended: customers
                .iter()
                .filter(|c| c.status == CustomerStatus::Suspended)
                .count(),
            vip: customers
                .iter()
                .filter(|c| c.customer_type == CustomerType::Vip)
                .count(),
            total_spent_cents: customers.iter().map(|c| c.total_spent_cents).sum(),
            credit_accounts: credit_accounts.len(),
            credit_overdue_cents: credit_accounts.iter().map(|a| a.overdue_cents).sum(),
            inconsistent_credit_accounts: credit_accounts
                .iter()
                .filter(|a| !a.is_consistent())
                .count(),
        })
    }

    async fn laybye_stats(&self) -> ServiceResult<LaybyeStats> {
        let contracts = self.db.laybyes().list_all().await?;

        let mut stats = LaybyeStats::default();
        for contract in &contracts {
            match contract.status {
                LaybyeStatus::Active => stats.active_contracts += 1,
                LaybyeStatus::Completed => stats.completed_contracts += 1,
                LaybyeStatus::Cancelled => stats.cancelled_contracts += 1,
            }
        }

        // Outstanding balance: recomputed per active contract from its
        // payment rows, never read from a cached column
        for contract in contracts.iter().filter(|c| c.status == LaybyeStatus::Active) {
            let payments = self.db.laybyes().get_payments(&contract.id).await?;
            let amounts: Vec<Money> = payments.iter().map(|p| p.amount()).collect();
            let remaining = marula_core::laybye::remaining_amount(
                Money::from_cents(contract.total_cents),
                Money::from_cents(contract.deposit_cents),
                &amounts,
            );
            stats.outstanding_cents += remaining.cents();
        }

        Ok(stats)
    }

    async fn till_stats(&self) -> ServiceResult<TillStats> {
        let sessions = self.db.tills().list_sessions().await?;
        let reconciliations = self.db.tills().list_reconciliations().await?;

        Ok(TillStats {
            open_sessions: sessions
                .iter()
                .filter(|s| s.status == TillSessionStatus::Open)
                .count(),
            reconciled_sessions: reconciliations.len(),
            sessions_over: reconciliations
                .iter()
                .filter(|r| r.variance_cents > 0)
                .count(),
            sessions_short: reconciliations
                .iter()
                .filter(|r| r.variance_cents < 0)
                .count(),
            net_variance_cents: reconciliations.iter().map(|r| r.variance_cents).sum(),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provisioning::{NewCustomer, ProvisioningService};
    use crate::till_flow::TillService;
    use marula_db::DbConfig;

    async fn database() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn customer(name: &str) -> NewCustomer {
        NewCustomer {
            name: name.to_string(),
            email: None,
            phone: None,
            customer_type: CustomerType::Regular,
            tags: vec![],
            credit: None,
            loyalty: None,
        }
    }

    #[tokio::test]
    async fn test_dashboard_reduces_scans() {
        let db = database().await;
        let provisioning = ProvisioningService::new(db.clone());
        let tills = TillService::new(db.clone());
        let stats = StatsService::new(db.clone());

        provisioning.create_customer(customer("Alice")).await.unwrap();
        provisioning.create_customer(customer("Bongani")).await.unwrap();

        let session = tills.open_session("main", "thandi", 10_000).await.unwrap();
        tills.reconcile_and_close(&session.id, 12_000, None).await.unwrap();

        let snapshot = stats.dashboard().await;
        assert_eq!(snapshot.customers.total, 2);
        assert_eq!(snapshot.customers.active, 2);
        assert_eq!(snapshot.till.reconciled_sessions, 1);
        assert_eq!(snapshot.till.sessions_over, 1);
        assert_eq!(snapshot.till.net_variance_cents, 2_000);
    }

    #[tokio::test]
    async fn test_failed_subquery_zero_fills_everything() {
        let db = database().await;
        let provisioning = ProvisioningService::new(db.clone());
        provisioning.create_customer(customer("Alice")).await.unwrap();

        // Break one sub-query: the WHOLE snapshot zero-fills
        sqlx::query("DROP TABLE till_sessions")
            .execute(db.pool())
            .await
            .unwrap();

        let stats = StatsService::new(db.clone());
        let snapshot = stats.dashboard().await;
        assert_eq!(snapshot, DashboardStats::default());
        assert_eq!(snapshot.customers.total, 0);
    }
}
