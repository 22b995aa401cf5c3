//! One stateless batch over the three follow-up tracks.
//!
//! Per-lead failures are collected into the summary's error list; nothing
//! aborts the batch. Tracks A and C claim the stage advance with an
//! optimistic `UPDATE` before sending, so two overlapping runs can never
//! send the same stage twice, and a failed send still uses up its stage.

use chrono::{DateTime, Utc};
use serde::Serialize;

use vivenda_ai::ProviderClient;
use vivenda_core::AlertType;
use vivenda_db::LeadRow;
use vivenda_whatsapp::WhatsappClient;

use crate::broker;
use crate::error::FollowupError;
use crate::messages;
use crate::nurturing::{self, NurturingAction};
use crate::reengagement;
use crate::store::FollowupStore;

/// Outcome counts for one scheduler run.
#[derive(Debug, Default, Serialize)]
pub struct RunSummary {
    pub reengagement_sent: u32,
    pub broker_reminders_sent: u32,
    pub nurturing_sent: u32,
    pub nurturing_completed: u32,
    pub errors: Vec<String>,
}

/// Runs all three tracks once against the current table state.
///
/// # Errors
///
/// Returns [`FollowupError::Db`] only when a candidate listing itself
/// fails; per-lead errors land in the summary instead.
pub async fn run_followups<S: FollowupStore>(
    store: &S,
    ai: &ProviderClient,
    whatsapp: &WhatsappClient,
    now: DateTime<Utc>,
) -> Result<RunSummary, FollowupError> {
    let mut summary = RunSummary::default();

    for lead in store.reengagement_candidates().await? {
        match reengage_lead(store, ai, whatsapp, &lead, now).await {
            Ok(true) => summary.reengagement_sent += 1,
            Ok(false) => {}
            Err(e) => summary.errors.push(format!("reengagement lead {}: {e}", lead.id)),
        }
    }

    for lead in store.broker_reminder_candidates().await? {
        match remind_broker(store, whatsapp, &lead, now).await {
            Ok(true) => summary.broker_reminders_sent += 1,
            Ok(false) => {}
            Err(e) => summary.errors.push(format!("broker reminder lead {}: {e}", lead.id)),
        }
    }

    for lead in store.nurturing_candidates().await? {
        match nurture_lead(store, ai, whatsapp, &lead, now).await {
            Ok(NurtureOutcome::Sent) => summary.nurturing_sent += 1,
            Ok(NurtureOutcome::Completed) => summary.nurturing_completed += 1,
            Ok(NurtureOutcome::Skipped) => {}
            Err(e) => summary.errors.push(format!("nurturing lead {}: {e}", lead.id)),
        }
    }

    tracing::info!(
        reengagement_sent = summary.reengagement_sent,
        broker_reminders_sent = summary.broker_reminders_sent,
        nurturing_sent = summary.nurturing_sent,
        nurturing_completed = summary.nurturing_completed,
        errors = summary.errors.len(),
        "scheduler: follow-up batch finished"
    );

    Ok(summary)
}

/// Track A for one lead. Returns `true` when a message went out.
async fn reengage_lead<S: FollowupStore>(
    store: &S,
    ai: &ProviderClient,
    whatsapp: &WhatsappClient,
    lead: &LeadRow,
    now: DateTime<Utc>,
) -> Result<bool, FollowupError> {
    let elapsed_hours = (now - reengagement::reference_time(lead)).num_hours();
    let Some(stage) = reengagement::next_due_stage(lead.followup_stage, elapsed_hours) else {
        return Ok(false);
    };
    let phone = lead
        .phone
        .as_deref()
        .ok_or(FollowupError::MissingPhone { lead_id: lead.id })?;

    // Claim first. Losing the claim means a concurrent run owns this stage.
    if !store.claim_stage(lead.id, stage, stage + 1, now).await? {
        tracing::debug!(lead_id = lead.id, stage, "scheduler: stage already claimed, skipping");
        return Ok(false);
    }

    let message = messages::reengagement_message(ai, lead, stage).await;
    // The audit row carries the counter value after the claim, matching
    // what `followup_stage` reads once this send is accounted for.
    deliver_and_audit(
        store,
        whatsapp,
        lead.id,
        AlertType::LeadFollowup,
        stage + 1,
        phone,
        &message,
    )
    .await?;
    Ok(true)
}

/// Track B for one lead. Returns `true` when a reminder went out.
async fn remind_broker<S: FollowupStore>(
    store: &S,
    whatsapp: &WhatsappClient,
    lead: &LeadRow,
    now: DateTime<Utc>,
) -> Result<bool, FollowupError> {
    let Some(assigned_at) = lead.broker_assigned_at else {
        return Ok(false);
    };
    let Some((index, stage)) = broker::due_stage(assigned_at, lead.last_agent_notification, now)
    else {
        return Ok(false);
    };
    let broker_phone = lead
        .broker_phone
        .as_deref()
        .ok_or(FollowupError::MissingPhone { lead_id: lead.id })?;

    let lead_phone = lead.phone.as_deref().unwrap_or("sem telefone");
    let message = broker::reminder_message(stage, lead.name.as_deref(), lead_phone);

    // Rung number, 1-based like the counter values the other tracks record.
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    let rung = index as i32 + 1;
    deliver_and_audit(
        store,
        whatsapp,
        lead.id,
        AlertType::BrokerReminder,
        rung,
        broker_phone,
        &message,
    )
    .await?;

    // Re-arm only after a delivered reminder; a failed send retries next run.
    store.touch_agent_notification(lead.id, now).await?;
    if broker::is_final_stage(index) {
        store.mark_unattended(lead.id).await?;
        tracing::info!(lead_id = lead.id, "scheduler: lead marked unattended after final reminder");
    }
    Ok(true)
}

enum NurtureOutcome {
    Sent,
    Completed,
    Skipped,
}

/// Track C for one lead.
async fn nurture_lead<S: FollowupStore>(
    store: &S,
    ai: &ProviderClient,
    whatsapp: &WhatsappClient,
    lead: &LeadRow,
    now: DateTime<Utc>,
) -> Result<NurtureOutcome, FollowupError> {
    match nurturing::next_action(lead, now) {
        NurturingAction::NotDue => Ok(NurtureOutcome::Skipped),
        NurturingAction::Complete => {
            store.complete_nurturing(lead.id).await?;
            tracing::info!(lead_id = lead.id, "scheduler: nurturing flow completed");
            Ok(NurtureOutcome::Completed)
        }
        NurturingAction::Send(topic_index) => {
            let phone = lead
                .phone
                .as_deref()
                .ok_or(FollowupError::MissingPhone { lead_id: lead.id })?;
            let expected = nurturing::stage_for_topic(topic_index);
            if !store.claim_stage(lead.id, expected, expected + 1, now).await? {
                tracing::debug!(
                    lead_id = lead.id,
                    expected,
                    "scheduler: nurturing stage already claimed, skipping"
                );
                return Ok(NurtureOutcome::Skipped);
            }

            let message = messages::nurturing_message(ai, lead, topic_index).await;
            deliver_and_audit(
                store,
                whatsapp,
                lead.id,
                AlertType::Nurturing,
                expected + 1,
                phone,
                &message,
            )
            .await?;
            Ok(NurtureOutcome::Sent)
        }
    }
}

/// Sends one message and appends the audit row, sent or failed.
async fn deliver_and_audit<S: FollowupStore>(
    store: &S,
    whatsapp: &WhatsappClient,
    lead_id: i64,
    alert_type: AlertType,
    stage: i32,
    to: &str,
    message: &str,
) -> Result<(), FollowupError> {
    match whatsapp.send_text(to, message).await {
        Ok(message_id) => {
            store
                .record_alert(
                    lead_id,
                    alert_type,
                    stage,
                    message,
                    "sent",
                    serde_json::json!({ "provider_message_id": message_id }),
                )
                .await?;
            Ok(())
        }
        Err(e) => {
            store
                .record_alert(
                    lead_id,
                    alert_type,
                    stage,
                    message,
                    "failed",
                    serde_json::json!({ "error": e.to_string() }),
                )
                .await?;
            Err(FollowupError::Whatsapp(e))
        }
    }
}
