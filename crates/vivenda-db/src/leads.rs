//! Database operations for the `leads` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use vivenda_core::LeadStatus;

use crate::DbError;

const LEAD_COLUMNS: &str = "id, name, phone, email, intent, property_type, qualification, \
     status, origin, followup_stage, last_followup_at, last_interaction_at, \
     nurturing_flow_status, broker_id, broker_phone, broker_assigned_at, \
     last_agent_notification, created_at, updated_at";

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `leads` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LeadRow {
    pub id: i64,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub intent: Option<String>,
    pub property_type: Option<String>,
    pub qualification: String,
    pub status: String,
    pub origin: String,
    pub followup_stage: i32,
    pub last_followup_at: Option<DateTime<Utc>>,
    pub last_interaction_at: DateTime<Utc>,
    pub nurturing_flow_status: Option<String>,
    pub broker_id: Option<i64>,
    pub broker_phone: Option<String>,
    pub broker_assigned_at: Option<DateTime<Utc>>,
    pub last_agent_notification: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields captured by the chat widget for a silent save.
#[derive(Debug, Clone)]
pub struct NewLead {
    pub name: Option<String>,
    pub phone: String,
    pub origin: String,
    pub property_type: Option<String>,
    pub intent: Option<String>,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Fetch a lead by its dedup key.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_lead_by_phone(pool: &PgPool, phone: &str) -> Result<Option<LeadRow>, DbError> {
    let row = sqlx::query_as::<_, LeadRow>(&format!(
        "SELECT {LEAD_COLUMNS} FROM leads WHERE phone = $1"
    ))
    .bind(phone)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Insert a lead keyed by phone, or refresh the existing one.
///
/// On conflict the existing record wins: captured fields are only filled in
/// where they are still `NULL`, and `last_interaction_at` is bumped. Repeated
/// widget saves for the same visitor therefore converge to one row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_lead_by_phone(pool: &PgPool, lead: &NewLead) -> Result<LeadRow, DbError> {
    let row = sqlx::query_as::<_, LeadRow>(&format!(
        "INSERT INTO leads (name, phone, origin, property_type, intent) \
         VALUES ($1, $2, $3, $4, $5) \
         ON CONFLICT (phone) WHERE phone IS NOT NULL DO UPDATE SET \
             name = COALESCE(leads.name, EXCLUDED.name), \
             property_type = COALESCE(leads.property_type, EXCLUDED.property_type), \
             intent = COALESCE(leads.intent, EXCLUDED.intent), \
             last_interaction_at = now(), \
             updated_at = now() \
         RETURNING {LEAD_COLUMNS}"
    ))
    .bind(&lead.name)
    .bind(&lead.phone)
    .bind(&lead.origin)
    .bind(&lead.property_type)
    .bind(&lead.intent)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Leads still inside the re-engagement window (stages 0..=3).
///
/// Terminal leads and leads without a phone never re-engage.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_reengagement_candidates(pool: &PgPool) -> Result<Vec<LeadRow>, DbError> {
    let rows = sqlx::query_as::<_, LeadRow>(&format!(
        "SELECT {LEAD_COLUMNS} FROM leads \
         WHERE phone IS NOT NULL \
           AND status NOT IN ($1, $2) \
           AND followup_stage < 4 \
         ORDER BY last_interaction_at ASC"
    ))
    .bind(LeadStatus::Convertido.as_str())
    .bind(LeadStatus::Perdido.as_str())
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Leads assigned to a broker that the broker has not picked up yet.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_broker_reminder_candidates(pool: &PgPool) -> Result<Vec<LeadRow>, DbError> {
    let rows = sqlx::query_as::<_, LeadRow>(&format!(
        "SELECT {LEAD_COLUMNS} FROM leads \
         WHERE status = $1 \
           AND broker_id IS NOT NULL \
           AND broker_phone IS NOT NULL \
           AND broker_assigned_at IS NOT NULL \
         ORDER BY broker_assigned_at ASC"
    ))
    .bind(LeadStatus::Novo.as_str())
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Cold and warm leads that exhausted re-engagement and entered nurturing.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_nurturing_candidates(pool: &PgPool) -> Result<Vec<LeadRow>, DbError> {
    let rows = sqlx::query_as::<_, LeadRow>(&format!(
        "SELECT {LEAD_COLUMNS} FROM leads \
         WHERE phone IS NOT NULL \
           AND followup_stage >= 4 \
           AND qualification IN ('frio', 'morno') \
           AND status NOT IN ($1, $2) \
           AND (nurturing_flow_status IS NULL OR nurturing_flow_status <> 'completed') \
         ORDER BY last_followup_at ASC NULLS FIRST"
    ))
    .bind(LeadStatus::Convertido.as_str())
    .bind(LeadStatus::Perdido.as_str())
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Atomically advance a lead's follow-up stage.
///
/// The `expected` guard makes the claim optimistic: if another scheduler run
/// advanced the stage first, zero rows match and the caller must skip the
/// send. Returns `true` when this caller won the claim.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn claim_followup_stage(
    pool: &PgPool,
    lead_id: i64,
    expected: i32,
    new_stage: i32,
    now: DateTime<Utc>,
) -> Result<bool, DbError> {
    let result = sqlx::query(
        "UPDATE leads \
         SET followup_stage = $3, last_followup_at = $4, updated_at = now() \
         WHERE id = $1 AND followup_stage = $2",
    )
    .bind(lead_id)
    .bind(expected)
    .bind(new_stage)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Flag a lead the assigned broker never picked up.
///
/// Only transitions out of `novo`; later statuses are left alone.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn mark_lead_unattended(pool: &PgPool, lead_id: i64) -> Result<bool, DbError> {
    let result = sqlx::query(
        "UPDATE leads SET status = $2, updated_at = now() WHERE id = $1 AND status = $3",
    )
    .bind(lead_id)
    .bind(LeadStatus::SemAtendimento.as_str())
    .bind(LeadStatus::Novo.as_str())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Record that the broker was just notified, re-arming the reminder window.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn touch_agent_notification(
    pool: &PgPool,
    lead_id: i64,
    now: DateTime<Utc>,
) -> Result<(), DbError> {
    sqlx::query("UPDATE leads SET last_agent_notification = $2, updated_at = now() WHERE id = $1")
        .bind(lead_id)
        .bind(now)
        .execute(pool)
        .await?;

    Ok(())
}

/// Mark a lead's nurturing flow as finished; no further sends for it.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn complete_nurturing_flow(pool: &PgPool, lead_id: i64) -> Result<(), DbError> {
    sqlx::query(
        "UPDATE leads SET nurturing_flow_status = 'completed', updated_at = now() WHERE id = $1",
    )
    .bind(lead_id)
    .execute(pool)
    .await?;

    Ok(())
}
