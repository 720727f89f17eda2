//! # Delivery Flow
//!
//! Delivery creation and status moves. The status machine lives in
//! `marula_core::delivery`; this flow consults it before any write, and the
//! repository's optimistic guard keeps concurrent moves from landing twice.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::ServiceResult;
use marula_core::delivery::{Delivery, DeliveryItem, DeliveryStatus};
use marula_core::sequence::DELIVERY_PREFIX;
use marula_core::{validation, CoreError, Money};
use marula_db::Database;

// =============================================================================
// Request Types
// =============================================================================

/// Input for delivery creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDelivery {
    pub customer_id: String,
    pub address: String,
    pub items: Vec<DeliveryItem>,
    pub total_cents: i64,
    pub scheduled_date: NaiveDate,
    pub window_start: String,
    pub window_end: String,
}

// =============================================================================
// Service
// =============================================================================

/// Orchestrates delivery records.
#[derive(Debug, Clone)]
pub struct DeliveryService {
    db: Database,
}

impl DeliveryService {
    /// Creates a new DeliveryService.
    pub fn new(db: Database) -> Self {
        DeliveryService { db }
    }

    /// Schedules a delivery.
    pub async fn schedule(&self, req: NewDelivery) -> ServiceResult<Delivery> {
        validation::validate_name(&req.address)?;
        validation::validate_non_negative("total", Money::from_cents(req.total_cents))?;
        for item in &req.items {
            validation::validate_name(&item.name)?;
            validation::validate_quantity(item.quantity)?;
        }

        let now = Utc::now();
        let delivery_number = self.db.sequences().next_number(DELIVERY_PREFIX).await?;
        let delivery = Delivery {
            id: Uuid::new_v4().to_string(),
            delivery_number,
            customer_id: req.customer_id,
            address: req.address,
            items: req.items,
            total_cents: req.total_cents,
            scheduled_date: req.scheduled_date,
            window_start: req.window_start,
            window_end: req.window_end,
            status: DeliveryStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        self.db.deliveries().insert(&delivery).await?;

        info!(
            delivery_id = %delivery.id,
            number = %delivery.delivery_number,
            "Delivery scheduled"
        );

        Ok(delivery)
    }

    /// Moves a delivery to a new status, enforcing the transition table.
    pub async fn update_status(
        &self,
        delivery_id: &str,
        to: DeliveryStatus,
    ) -> ServiceResult<Delivery> {
        let delivery = self
            .db
            .deliveries()
            .get_by_id(delivery_id)
            .await?
            .ok_or_else(|| marula_db::DbError::not_found("Delivery", delivery_id))?;

        if !DeliveryStatus::can_transition(delivery.status, to) {
            return Err(CoreError::InvalidDeliveryTransition {
                from: format!("{:?}", delivery.status),
                to: format!("{:?}", to),
            }
            .into());
        }

        self.db
            .deliveries()
            .update_status(delivery_id, delivery.status, to)
            .await?;

        info!(delivery_id = %delivery_id, to = ?to, "Delivery status updated");

        Ok(self
            .db
            .deliveries()
            .get_by_id(delivery_id)
            .await?
            .ok_or_else(|| marula_db::DbError::not_found("Delivery", delivery_id))?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ServiceError;
    use marula_core::{Customer, CustomerStatus, CustomerType};
    use marula_db::DbConfig;

    async fn service() -> DeliveryService {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
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
        DeliveryService::new(db)
    }

    fn request() -> NewDelivery {
        NewDelivery {
            customer_id: "c1".to_string(),
            address: "12 Vilakazi St".to_string(),
            items: vec![DeliveryItem {
                name: "Fridge".to_string(),
                quantity: 1,
            }],
            total_cents: 450_000,
            scheduled_date: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
            window_start: "08:00".to_string(),
            window_end: "12:00".to_string(),
        }
    }

    #[tokio::test]
    async fn test_full_lifecycle() {
        let svc = service().await;
        let delivery = svc.schedule(request()).await.unwrap();
        assert_eq!(delivery.delivery_number, "DEL-000001");
        assert_eq!(delivery.status, DeliveryStatus::Pending);

        let delivery = svc
            .update_status(&delivery.id, DeliveryStatus::InTransit)
            .await
            .unwrap();
        assert_eq!(delivery.status, DeliveryStatus::InTransit);

        let delivery = svc
            .update_status(&delivery.id, DeliveryStatus::Delivered)
            .await
            .unwrap();
        assert_eq!(delivery.status, DeliveryStatus::Delivered);
    }

    #[tokio::test]
    async fn test_illegal_transition_rejected_before_write() {
        let svc = service().await;
        let delivery = svc.schedule(request()).await.unwrap();

        // Pending cannot jump straight to Delivered
        let err = svc
            .update_status(&delivery.id, DeliveryStatus::Delivered)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Core(CoreError::InvalidDeliveryTransition { .. })
        ));

        let stored = svc.db.deliveries().get_by_id(&delivery.id).await.unwrap().unwrap();
        assert_eq!(stored.status, DeliveryStatus::Pending);
    }

    #[tokio::test]
    async fn test_terminal_status_is_final() {
        let svc = service().await;
        let delivery = svc.schedule(request()).await.unwrap();
        svc.update_status(&delivery.id, DeliveryStatus::Cancelled)
            .await
            .unwrap();

        let err = svc
            .update_status(&delivery.id, DeliveryStatus::InTransit)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Core(_)));
    }
}
