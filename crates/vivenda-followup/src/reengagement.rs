//! Track A: timed re-engagement of leads that went quiet.
//!
//! Four stages at 1 h, 24 h, 72 h and 168 h of silence, one stage per run
//! per lead. The clock starts from `last_followup_at` when present, else
//! `last_interaction_at`, else `created_at`.

use chrono::{DateTime, Utc};

use vivenda_db::LeadRow;

use crate::phase::REENGAGEMENT_STAGE_COUNT;

/// Hours of silence required before each stage fires.
pub const THRESHOLD_HOURS: [i64; 4] = [1, 24, 72, 168];

/// Escalating fallback copy, one entry per stage.
const FALLBACK_TEMPLATES: [&str; 4] = [
    "Oi{name}! Vi que você demonstrou interesse em um imóvel. Posso te ajudar com mais informações?",
    "Olá{name}! Separei algumas opções que combinam com o que você procura. Quer dar uma olhada?",
    "Oi{name}! Os imóveis que você viu estão com boa procura. Se quiser garantir uma visita, me avisa!",
    "Olá{name}! Vou encerrar nosso atendimento por aqui, mas se precisar de algo sobre imóveis é só chamar. Até mais!",
];

/// The single stage due for this lead, if any.
///
/// `current` counts stages already sent. The next stage fires once the
/// elapsed silence crosses its threshold; earlier missed stages are not
/// replayed and later ones wait for their own run.
#[must_use]
pub fn next_due_stage(current: i32, elapsed_hours: i64) -> Option<i32> {
    if !(0..REENGAGEMENT_STAGE_COUNT).contains(&current) {
        return None;
    }
    #[allow(clippy::cast_sign_loss)]
    let threshold = THRESHOLD_HOURS[current as usize];
    (elapsed_hours >= threshold).then_some(current)
}

/// The instant the silence clock starts from.
#[must_use]
pub fn reference_time(lead: &LeadRow) -> DateTime<Utc> {
    lead.last_followup_at.unwrap_or(lead.last_interaction_at)
}

/// Deterministic Portuguese copy for a stage, used when generation fails.
#[must_use]
pub fn fallback_message(stage: i32, name: Option<&str>) -> String {
    #[allow(clippy::cast_sign_loss)]
    let template = FALLBACK_TEMPLATES
        [(stage.clamp(0, REENGAGEMENT_STAGE_COUNT - 1)) as usize];
    let name = name.map_or_else(String::new, |n| format!(", {n}"));
    template.replace("{name}", &name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_stage_fires_after_one_hour() {
        assert_eq!(next_due_stage(0, 0), None);
        assert_eq!(next_due_stage(0, 1), Some(0));
        assert_eq!(next_due_stage(0, 500), Some(0));
    }

    #[test]
    fn one_stage_per_run_even_after_long_silence() {
        // A lead silent for a week still only gets the stage it is on.
        assert_eq!(next_due_stage(1, 200), Some(1));
        assert_eq!(next_due_stage(2, 200), Some(2));
    }

    #[test]
    fn each_stage_waits_for_its_own_threshold() {
        assert_eq!(next_due_stage(1, 23), None);
        assert_eq!(next_due_stage(1, 24), Some(1));
        assert_eq!(next_due_stage(2, 71), None);
        assert_eq!(next_due_stage(2, 72), Some(2));
        assert_eq!(next_due_stage(3, 167), None);
        assert_eq!(next_due_stage(3, 168), Some(3));
    }

    #[test]
    fn exhausted_leads_never_fire() {
        assert_eq!(next_due_stage(4, 10_000), None);
        assert_eq!(next_due_stage(9, 10_000), None);
    }

    #[test]
    fn fallback_copy_includes_name_when_known() {
        let msg = fallback_message(0, Some("Ana"));
        assert!(msg.contains("Oi, Ana!"), "got: {msg}");
        let anon = fallback_message(0, None);
        assert!(anon.starts_with("Oi!"), "got: {anon}");
    }

    #[test]
    fn final_stage_is_a_farewell() {
        assert!(fallback_message(3, None).contains("encerrar"));
    }
}
