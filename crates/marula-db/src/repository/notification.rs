//! # Notification Rule Repository
//!
//! CRUD for admin-configured notification rules.

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::error::{DbError, DbResult};
use marula_core::notification::NotificationRule;

/// Repository for notification rule operations.
#[derive(Debug, Clone)]
pub struct NotificationRuleRepository {
    pool: SqlitePool,
}

impl NotificationRuleRepository {
    /// Creates a new NotificationRuleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        NotificationRuleRepository { pool }
    }

    /// Inserts a rule.
    pub async fn insert(&self, rule: &NotificationRule) -> DbResult<()> {
        let recipients = serde_json::to_string(&rule.recipients)
            .map_err(|e| DbError::corrupt_column("recipients", e))?;

        sqlx::query(
            r#"
            INSERT INTO notification_rules (
                id, name, trigger_kind, channel, cadence,
                recipients, template, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&rule.id)
        .bind(&rule.name)
        .bind(rule.trigger)
        .bind(rule.channel)
        .bind(rule.cadence)
        .bind(recipients)
        .bind(&rule.template)
        .bind(rule.is_active)
        .bind(rule.created_at)
        .bind(rule.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates a rule.
    pub async fn update(&self, rule: &NotificationRule) -> DbResult<()> {
        let recipients = serde_json::to_string(&rule.recipients)
            .map_err(|e| DbError::corrupt_column("recipients", e))?;
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE notification_rules SET
                name = ?2,
                trigger_kind = ?3,
                channel = ?4,
                cadence = ?5,
                recipients = ?6,
                template = ?7,
                is_active = ?8,
                updated_at = ?9
            WHERE id = ?1
            "#,
        )
        .bind(&rule.id)
        .bind(&rule.name)
        .bind(rule.trigger)
        .bind(rule.channel)
        .bind(rule.cadence)
        .bind(recipients)
        .bind(&rule.template)
        .bind(rule.is_active)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Notification rule", &rule.id));
        }

        Ok(())
    }

    /// Deletes a rule.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM notification_rules WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Notification rule", id));
        }

        Ok(())
    }

    /// Gets a rule by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<NotificationRule>> {
        let row = sqlx::query("SELECT * FROM notification_rules WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| rule_from_row(&r)).transpose()
    }

    /// Lists all rules.
    pub async fn list_all(&self) -> DbResult<Vec<NotificationRule>> {
        let rows = sqlx::query("SELECT * FROM notification_rules ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(rule_from_row).collect()
    }

    /// Lists active rules only (the set the dispatcher evaluates).
    pub async fn list_active(&self) -> DbResult<Vec<NotificationRule>> {
        let rows = sqlx::query("SELECT * FROM notification_rules WHERE is_active = 1 ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(rule_from_row).collect()
    }
}

// =============================================================================
// Row Mapping
// =============================================================================

/// Maps a notification_rules row, decoding the JSON recipient list.
fn rule_from_row(row: &SqliteRow) -> DbResult<NotificationRule> {
    let recipients_json: String = row.try_get("recipients")?;
    let recipients: Vec<String> = serde_json::from_str(&recipients_json)
        .map_err(|e| DbError::corrupt_column("recipients", e))?;

    Ok(NotificationRule {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        trigger: row.try_get("trigger_kind")?,
        channel: row.try_get("channel")?,
        cadence: row.try_get("cadence")?,
        recipients,
        template: row.try_get("template")?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
