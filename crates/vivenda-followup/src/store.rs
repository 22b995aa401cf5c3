//! Persistence seam for the batch runner.
//!
//! [`FollowupStore`] is the slice of the database the runner touches.
//! `PgPool` is the production implementation, delegating to the query
//! functions in `vivenda-db`; tests drive the runner against an in-memory
//! store so claim ordering and audit rows can be asserted without Postgres.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;

use vivenda_core::AlertType;
use vivenda_db::{DbError, LeadRow};

#[allow(async_fn_in_trait)]
pub trait FollowupStore: Sync {
    async fn reengagement_candidates(&self) -> Result<Vec<LeadRow>, DbError>;
    async fn broker_reminder_candidates(&self) -> Result<Vec<LeadRow>, DbError>;
    async fn nurturing_candidates(&self) -> Result<Vec<LeadRow>, DbError>;

    /// Optimistic stage advance; `false` means another run claimed it first.
    async fn claim_stage(
        &self,
        lead_id: i64,
        expected: i32,
        new_stage: i32,
        now: DateTime<Utc>,
    ) -> Result<bool, DbError>;

    async fn record_alert(
        &self,
        lead_id: i64,
        alert_type: AlertType,
        stage: i32,
        message: &str,
        status: &str,
        metadata: Value,
    ) -> Result<i64, DbError>;

    async fn touch_agent_notification(
        &self,
        lead_id: i64,
        now: DateTime<Utc>,
    ) -> Result<(), DbError>;

    async fn mark_unattended(&self, lead_id: i64) -> Result<bool, DbError>;

    async fn complete_nurturing(&self, lead_id: i64) -> Result<(), DbError>;
}

impl FollowupStore for PgPool {
    async fn reengagement_candidates(&self) -> Result<Vec<LeadRow>, DbError> {
        vivenda_db::list_reengagement_candidates(self).await
    }

    async fn broker_reminder_candidates(&self) -> Result<Vec<LeadRow>, DbError> {
        vivenda_db::list_broker_reminder_candidates(self).await
    }

    async fn nurturing_candidates(&self) -> Result<Vec<LeadRow>, DbError> {
        vivenda_db::list_nurturing_candidates(self).await
    }

    async fn claim_stage(
        &self,
        lead_id: i64,
        expected: i32,
        new_stage: i32,
        now: DateTime<Utc>,
    ) -> Result<bool, DbError> {
        vivenda_db::claim_followup_stage(self, lead_id, expected, new_stage, now).await
    }

    async fn record_alert(
        &self,
        lead_id: i64,
        alert_type: AlertType,
        stage: i32,
        message: &str,
        status: &str,
        metadata: Value,
    ) -> Result<i64, DbError> {
        vivenda_db::insert_followup_alert(self, lead_id, alert_type, stage, message, status, metadata)
            .await
    }

    async fn touch_agent_notification(
        &self,
        lead_id: i64,
        now: DateTime<Utc>,
    ) -> Result<(), DbError> {
        vivenda_db::touch_agent_notification(self, lead_id, now).await
    }

    async fn mark_unattended(&self, lead_id: i64) -> Result<bool, DbError> {
        vivenda_db::mark_lead_unattended(self, lead_id).await
    }

    async fn complete_nurturing(&self, lead_id: i64) -> Result<(), DbError> {
        vivenda_db::complete_nurturing_flow(self, lead_id).await
    }
}
