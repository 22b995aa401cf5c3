//! Track C: long-cycle nurturing for cold and warm leads.
//!
//! After re-engagement is exhausted, a fixed sequence of educational topics
//! goes out every five days. Strictly sequential, no wraparound: once the
//! last topic is sent the flow is marked completed and the lead never hears
//! from this track again.

use chrono::{DateTime, Utc};

use vivenda_db::LeadRow;

use crate::phase::{FollowupPhase, REENGAGEMENT_STAGE_COUNT};

/// Hours between nurturing sends (5 days).
pub const INTERVAL_HOURS: i64 = 120;

/// Ordered topic sequence. Index comes from `followup_stage - 4`.
pub const TOPICS: [(&str, &str); 6] = [
    (
        "financiamento",
        "Você sabia que dá para simular o financiamento de um imóvel em poucos minutos? Posso te mostrar como funciona, sem compromisso.",
    ),
    (
        "documentacao",
        "Preparei um resumo dos documentos necessários para comprar um imóvel. Quer que eu te envie?",
    ),
    (
        "valorizacao",
        "Algumas regiões que acompanhamos valorizaram bastante nos últimos meses. Posso te contar quais são as mais promissoras.",
    ),
    (
        "lancamentos",
        "Temos lançamentos com condições especiais de entrada facilitada. Se quiser, te mando os destaques.",
    ),
    (
        "dicas_visita",
        "Montei uma lista do que observar ao visitar um imóvel: estrutura, documentação do condomínio e vizinhança. Quer receber?",
    ),
    (
        "mercado",
        "O momento do mercado está favorável para negociar. Se a compra de um imóvel ainda estiver nos seus planos, posso te ajudar a retomar a busca.",
    ),
];

#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
pub const TOPIC_COUNT: i32 = TOPICS.len() as i32;

/// What the runner should do with a nurturing candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NurturingAction {
    /// Send the topic at this index in [`TOPICS`].
    Send(usize),
    /// All topics sent; mark the flow completed.
    Complete,
    /// The five-day interval has not elapsed yet.
    NotDue,
}

/// Decides the action for one candidate at `now`.
///
/// Completion is checked before the interval: a lead past the last topic is
/// closed out immediately rather than waiting another five days.
#[must_use]
pub fn next_action(lead: &LeadRow, now: DateTime<Utc>) -> NurturingAction {
    match FollowupPhase::from_stage(lead.followup_stage, TOPIC_COUNT) {
        FollowupPhase::Completed => NurturingAction::Complete,
        FollowupPhase::Reengagement(_) => NurturingAction::NotDue,
        FollowupPhase::Nurturing(index) => {
            let reference = lead.last_followup_at.unwrap_or(lead.last_interaction_at);
            if (now - reference).num_hours() >= INTERVAL_HOURS {
                #[allow(clippy::cast_sign_loss)]
                NurturingAction::Send(index as usize)
            } else {
                NurturingAction::NotDue
            }
        }
    }
}

/// Stage value to claim when sending topic `index`.
#[must_use]
pub fn stage_for_topic(index: usize) -> i32 {
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    {
        REENGAGEMENT_STAGE_COUNT + index as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn candidate(stage: i32, last_followup_hours_ago: i64, now: DateTime<Utc>) -> LeadRow {
        LeadRow {
            id: 1,
            name: Some("Ana".to_owned()),
            phone: Some("62999991234".to_owned()),
            email: None,
            intent: None,
            property_type: None,
            qualification: "frio".to_owned(),
            status: "novo".to_owned(),
            origin: "site".to_owned(),
            followup_stage: stage,
            last_followup_at: Some(now - Duration::hours(last_followup_hours_ago)),
            last_interaction_at: now - Duration::hours(last_followup_hours_ago),
            nurturing_flow_status: None,
            broker_id: None,
            broker_phone: None,
            broker_assigned_at: None,
            last_agent_notification: None,
            created_at: now - Duration::days(30),
            updated_at: now,
        }
    }

    #[test]
    fn first_topic_after_five_days() {
        let now = Utc::now();
        assert_eq!(
            next_action(&candidate(4, 119, now), now),
            NurturingAction::NotDue
        );
        assert_eq!(
            next_action(&candidate(4, 120, now), now),
            NurturingAction::Send(0)
        );
    }

    #[test]
    fn topics_advance_sequentially_without_wraparound() {
        let now = Utc::now();
        assert_eq!(
            next_action(&candidate(9, 500, now), now),
            NurturingAction::Send(5)
        );
        assert_eq!(
            next_action(&candidate(10, 500, now), now),
            NurturingAction::Complete
        );
    }

    #[test]
    fn completion_does_not_wait_for_the_interval() {
        let now = Utc::now();
        assert_eq!(
            next_action(&candidate(10, 1, now), now),
            NurturingAction::Complete
        );
    }

    #[test]
    fn reengagement_stages_are_not_nurtured() {
        let now = Utc::now();
        assert_eq!(
            next_action(&candidate(2, 500, now), now),
            NurturingAction::NotDue
        );
    }

    #[test]
    fn stage_for_topic_offsets_past_reengagement() {
        assert_eq!(stage_for_topic(0), 4);
        assert_eq!(stage_for_topic(5), 9);
    }
}
