//! Database operations for the `followup_alerts` audit table.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;

use vivenda_core::AlertType;

use crate::DbError;

/// A row from the `followup_alerts` table.
///
/// `stage` records the lead's `followup_stage` counter after the attempt
/// for lead follow-up and nurturing alerts, and the 1-based reminder rung
/// for broker alerts.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FollowupAlertRow {
    pub id: i64,
    pub lead_id: i64,
    pub alert_type: String,
    pub stage: i32,
    pub message: String,
    pub channel: String,
    pub status: String,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
}

/// Record one follow-up attempt, sent or failed, and return its id.
///
/// `metadata` is stored as JSONB; callers put the provider message id or the
/// send error there.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_followup_alert(
    pool: &PgPool,
    lead_id: i64,
    alert_type: AlertType,
    stage: i32,
    message: &str,
    status: &str,
    metadata: Value,
) -> Result<i64, DbError> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO followup_alerts (lead_id, alert_type, stage, message, channel, status, metadata) \
         VALUES ($1, $2, $3, $4, 'whatsapp', $5, $6) \
         RETURNING id",
    )
    .bind(lead_id)
    .bind(alert_type.as_str())
    .bind(stage)
    .bind(message)
    .bind(status)
    .bind(metadata)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// List a lead's follow-up history, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_followup_alerts(
    pool: &PgPool,
    lead_id: i64,
    limit: i64,
) -> Result<Vec<FollowupAlertRow>, DbError> {
    let rows = sqlx::query_as::<_, FollowupAlertRow>(
        "SELECT id, lead_id, alert_type, stage, message, channel, status, metadata, created_at \
         FROM followup_alerts \
         WHERE lead_id = $1 \
         ORDER BY created_at DESC, id DESC \
         LIMIT $2",
    )
    .bind(lead_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
