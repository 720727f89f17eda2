//! # Delivery Repository
//!
//! Database operations for delivery records. Status moves are written with
//! an optimistic `WHERE status = ?from` guard so two concurrent updates
//! cannot both land.

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use marula_core::delivery::{Delivery, DeliveryItem, DeliveryStatus};

/// Repository for delivery database operations.
#[derive(Debug, Clone)]
pub struct DeliveryRepository {
    pool: SqlitePool,
}

impl DeliveryRepository {
    /// Creates a new DeliveryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        DeliveryRepository { pool }
    }

    /// Inserts a delivery record.
    pub async fn insert(&self, delivery: &Delivery) -> DbResult<()> {
        debug!(id = %delivery.id, number = %delivery.delivery_number, "Inserting delivery");

        let items = serde_json::to_string(&delivery.items)
            .map_err(|e| DbError::corrupt_column("items", e))?;

        sqlx::query(
            r#"
            INSERT INTO deliveries (
                id, delivery_number, customer_id, address, items, total_cents,
                scheduled_date, window_start, window_end, status,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&delivery.id)
        .bind(&delivery.delivery_number)
        .bind(&delivery.customer_id)
        .bind(&delivery.address)
        .bind(items)
        .bind(delivery.total_cents)
        .bind(delivery.scheduled_date)
        .bind(&delivery.window_start)
        .bind(&delivery.window_end)
        .bind(delivery.status)
        .bind(delivery.created_at)
        .bind(delivery.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a delivery by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Delivery>> {
        let row = sqlx::query("SELECT * FROM deliveries WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| delivery_from_row(&r)).transpose()
    }

    /// Lists deliveries in a given status, soonest first.
    pub async fn list_by_status(&self, status: DeliveryStatus) -> DbResult<Vec<Delivery>> {
        let rows = sqlx::query(
            "SELECT * FROM deliveries WHERE status = ?1 ORDER BY scheduled_date",
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(delivery_from_row).collect()
    }

    /// Moves a delivery from one status to another.
    ///
    /// The transition is validated by the flow against the core status
    /// machine before this call; the `WHERE status = ?from` guard keeps a
    /// concurrent move from landing twice.
    pub async fn update_status(
        &self,
        id: &str,
        from: DeliveryStatus,
        to: DeliveryStatus,
    ) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE deliveries SET status = ?3, updated_at = ?4 WHERE id = ?1 AND status = ?2",
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Delivery in expected status", id));
        }

        Ok(())
    }
}

// =============================================================================
// Row Mapping
// =============================================================================

/// Maps a deliveries row, decoding the JSON item manifest.
fn delivery_from_row(row: &SqliteRow) -> DbResult<Delivery> {
    let items_json: String = row.try_get("items")?;
    let items: Vec<DeliveryItem> =
        serde_json::from_str(&items_json).map_err(|e| DbError::corrupt_column("items", e))?;

    Ok(Delivery {
        id: row.try_get("id")?,
        delivery_number: row.try_get("delivery_number")?,
        customer_id: row.try_get("customer_id")?,
        address: row.try_get("address")?,
        items,
        total_cents: row.try_get("total_cents")?,
        scheduled_date: row.try_get("scheduled_date")?,
        window_start: row.try_get("window_start")?,
        window_end: row.try_get("window_end")?,
        status: row.try_get("status")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::NaiveDate;
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

    fn delivery() -> Delivery {
        let now = Utc::now();
        Delivery {
            id: "d1".to_string(),
            delivery_number: "DEL-000001".to_string(),
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
            status: DeliveryStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_fetch_round_trips_items() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        seed_customer(&db).await;
        let repo = db.deliveries();

        repo.insert(&delivery()).await.unwrap();

        let fetched = repo.get_by_id("d1").await.unwrap().unwrap();
        assert_eq!(fetched.items.len(), 1);
        assert_eq!(fetched.items[0].name, "Fridge");
        assert_eq!(fetched.status, DeliveryStatus::Pending);
    }

    #[tokio::test]
    async fn test_status_guard_rejects_stale_move() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        seed_customer(&db).await;
        let repo = db.deliveries();
        repo.insert(&delivery()).await.unwrap();

        repo.update_status("d1", DeliveryStatus::Pending, DeliveryStatus::InTransit)
            .await
            .unwrap();

        // Second move from Pending no longer matches
        let err = repo
            .update_status("d1", DeliveryStatus::Pending, DeliveryStatus::Cancelled)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
