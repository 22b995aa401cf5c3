//! Track B: SLA reminders to the broker assigned to a fresh lead.
//!
//! Three escalating reminders at 15, 60 and 240 minutes after assignment,
//! while the lead is still `novo`. Each stage carries its own re-arm window
//! measured against `last_agent_notification`, so a reminder that already
//! went out is not repeated every scheduler run. The final stage also flags
//! the lead as unattended.

use chrono::{DateTime, Utc};

/// One rung of the reminder ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrokerStage {
    /// Minutes since assignment before this stage applies.
    pub threshold_min: i64,
    /// Minutes since the previous notification before it may fire again.
    pub rearm_min: i64,
    /// Label recorded in the audit trail.
    pub label: &'static str,
}

/// Reminder ladder, ascending. The last entry marks the lead unattended.
pub const STAGES: [BrokerStage; 3] = [
    BrokerStage {
        threshold_min: 15,
        rearm_min: 15,
        label: "atraso_15min",
    },
    BrokerStage {
        threshold_min: 60,
        rearm_min: 45,
        label: "atraso_1h",
    },
    BrokerStage {
        threshold_min: 240,
        rearm_min: 180,
        label: "sem_atendimento",
    },
];

/// The most advanced stage that is both past its threshold and re-armed.
///
/// Walking the whole ladder and keeping the last satisfied entry means a
/// lead assigned four hours ago gets the strongest reminder, not a replay
/// of the earlier ones.
#[must_use]
pub fn due_stage(
    assigned_at: DateTime<Utc>,
    last_notification: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<(usize, BrokerStage)> {
    let elapsed_assignment = (now - assigned_at).num_minutes();
    let elapsed_notification = last_notification.map(|t| (now - t).num_minutes());

    let mut due = None;
    for (index, stage) in STAGES.iter().enumerate() {
        if elapsed_assignment < stage.threshold_min {
            break;
        }
        let rearmed = match elapsed_notification {
            None => true,
            Some(mins) => mins >= stage.rearm_min,
        };
        if rearmed {
            due = Some((index, *stage));
        }
    }
    due
}

/// Whether this stage index is the ladder's end, flipping the lead status.
#[must_use]
pub fn is_final_stage(index: usize) -> bool {
    index == STAGES.len() - 1
}

/// Reminder text sent to the broker over `WhatsApp`.
#[must_use]
pub fn reminder_message(stage: BrokerStage, lead_name: Option<&str>, lead_phone: &str) -> String {
    let who = lead_name.unwrap_or("Novo lead");
    match stage.label {
        "atraso_15min" => format!(
            "⏰ Lembrete: o lead {who} ({lead_phone}) aguarda seu contato há 15 minutos."
        ),
        "atraso_1h" => format!(
            "⚠️ Atenção: o lead {who} ({lead_phone}) está sem atendimento há 1 hora."
        ),
        _ => format!(
            "🚨 Urgente: o lead {who} ({lead_phone}) ficou 4 horas sem atendimento e foi marcado como não atendido."
        ),
    }
}
