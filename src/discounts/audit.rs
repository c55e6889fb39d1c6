// Adjustment Audit Logger
//
// Records quote and commit events to the audit trail. Failures are logged
// and swallowed so an audit outage never blocks a checkout.

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

/// Audit Logger for the discount engine
#[derive(Clone)]
pub struct AuditLogger {
    pool: PgPool,
}

impl AuditLogger {
    /// Create a new AuditLogger
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Log a quote evaluation
    pub async fn log_quote(&self, discount_id: Option<Uuid>, detail: JsonValue, effect: &str) {
        if let Err(e) = self
            .insert_record("quote", None, discount_id, detail, effect)
            .await
        {
            tracing::warn!("Failed to log quote audit record: {}", e);
        }
    }

    /// Log a ledger commit
    pub async fn log_commit(&self, transaction_id: &str, detail: JsonValue, effect: &str) {
        if let Err(e) = self
            .insert_record("commit", Some(transaction_id), None, detail, effect)
            .await
        {
            tracing::warn!("Failed to log commit audit record: {}", e);
        }
    }

    async fn insert_record(
        &self,
        event: &str,
        transaction_id: Option<&str>,
        discount_id: Option<Uuid>,
        detail: JsonValue,
        effect: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO adjustment_audit_log (id, event, transaction_id, discount_id, detail, effect)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(event)
        .bind(transaction_id)
        .bind(discount_id)
        .bind(detail)
        .bind(effect)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Audit records for a payment transaction, oldest first
    pub async fn records_for_transaction(
        &self,
        transaction_id: &str,
    ) -> Result<Vec<AuditRecord>, sqlx::Error> {
        let records = sqlx::query_as::<_, AuditRecord>(
            r#"
            SELECT id, event, transaction_id, discount_id, detail, effect, created_at
            FROM adjustment_audit_log
            WHERE transaction_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(transaction_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}

/// Audit record from the database
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AuditRecord {
    pub id: Uuid,
    pub event: String,
    pub transaction_id: Option<String>,
    pub discount_id: Option<Uuid>,
    pub detail: JsonValue,
    pub effect: String,
    pub created_at: DateTime<Utc>,
}
