//! Keyword sentiment classifier for visitor messages.
//!
//! Classification is membership in four ordered keyword lists; the strong
//! lists are checked before the mild ones, so a message carrying both a mild
//! positive phrase and a strong commitment phrase scores as strongly
//! positive. Ordering is the tie-break rule, not magnitude comparison.

use crate::normalize::normalize_text;

/// Strong buying commitment. Checked first, +15.
const VERY_POSITIVE: &[&str] = &[
    "quero fechar",
    "fechar negocio",
    "vamos fechar",
    "quero comprar agora",
    "onde assino",
    "pode mandar o contrato",
    "fechado, pode marcar",
];

/// Hostility or fraud accusations. Checked second, -20.
const VERY_NEGATIVE: &[&str] = &[
    "golpe",
    "denunciar",
    "procon",
    "nunca mais",
    "me tira dessa lista",
    "parem de me mandar mensagem",
];

/// Mild interest, +10.
const POSITIVE: &[&str] = &[
    "gostei",
    "interessante",
    "otimo",
    "otima",
    "legal",
    "bacana",
    "quero saber mais",
    "me interessa",
];

/// Mild pushback, -10.
const NEGATIVE: &[&str] = &[
    "muito caro",
    "caro demais",
    "nao gostei",
    "ruim",
    "sem interesse",
    "desisti",
    "nao quero",
    "deixa pra depois",
];

/// Sentiment bucket with its fixed score delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentiment {
    VeryPositive,
    Positive,
    Neutral,
    Negative,
    VeryNegative,
}

impl Sentiment {
    /// The signed score delta applied for this bucket.
    #[must_use]
    pub fn delta(self) -> i32 {
        match self {
            Sentiment::VeryPositive => 15,
            Sentiment::Positive => 10,
            Sentiment::Neutral => 0,
            Sentiment::Negative => -10,
            Sentiment::VeryNegative => -20,
        }
    }
}

/// Classifies a raw message into a [`Sentiment`] bucket.
///
/// The text is normalized (lowercase, diacritics folded) and the four lists
/// are checked in strict priority order: very-positive, very-negative,
/// positive, negative. No keyword match means neutral.
#[must_use]
pub fn classify(text: &str) -> Sentiment {
    let normalized = normalize_text(text);
    let contains_any = |list: &[&str]| list.iter().any(|k| normalized.contains(k));

    if contains_any(VERY_POSITIVE) {
        Sentiment::VeryPositive
    } else if contains_any(VERY_NEGATIVE) {
        Sentiment::VeryNegative
    } else if contains_any(POSITIVE) {
        Sentiment::Positive
    } else if contains_any(NEGATIVE) {
        Sentiment::Negative
    } else {
        Sentiment::Neutral
    }
}

/// Applies a delta to a lead score, clamped to `[0, 100]`.
#[must_use]
pub fn apply_delta(score: i32, delta: i32) -> i32 {
    (score + delta).clamp(0, 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strong_commitment_scores_plus_fifteen() {
        assert_eq!(classify("quero fechar negócio agora").delta(), 15);
    }

    #[test]
    fn fraud_accusation_scores_minus_twenty() {
        assert_eq!(classify("isso é um golpe, vou denunciar").delta(), -20);
    }

    #[test]
    fn mild_interest_scores_plus_ten() {
        assert_eq!(classify("achei bem interessante"), Sentiment::Positive);
    }

    #[test]
    fn mild_pushback_scores_minus_ten() {
        assert_eq!(classify("tá muito caro pra mim"), Sentiment::Negative);
    }

    #[test]
    fn no_keyword_is_neutral() {
        assert_eq!(classify("qual o horário de atendimento?"), Sentiment::Neutral);
    }

    #[test]
    fn strong_positive_beats_mild_positive() {
        // Contains both "gostei" (mild) and "quero fechar" (strong); the
        // strong list is checked first.
        assert_eq!(
            classify("gostei muito, quero fechar ainda essa semana"),
            Sentiment::VeryPositive
        );
    }

    #[test]
    fn strong_negative_beats_mild_positive() {
        assert_eq!(
            classify("parecia interessante mas é golpe"),
            Sentiment::VeryNegative
        );
    }

    #[test]
    fn diacritics_do_not_hide_keywords() {
        assert_eq!(classify("ÓTIMO atendimento"), Sentiment::Positive);
    }

    #[test]
    fn score_clamps_at_upper_bound() {
        let mut score = 95;
        score = apply_delta(score, 15);
        assert_eq!(score, 100);
        score = apply_delta(score, 15);
        assert_eq!(score, 100);
    }

    #[test]
    fn score_clamps_at_lower_bound() {
        let mut score = 10;
        score = apply_delta(score, -20);
        assert_eq!(score, 0);
        score = apply_delta(score, -20);
        assert_eq!(score, 0);
    }

    #[test]
    fn score_stays_bounded_for_any_delta_sequence() {
        let deltas = [15, -20, 10, -10, 15, 15, -20, -20, -20, 10, 15, 0];
        let mut score = 50;
        for d in deltas {
            score = apply_delta(score, d);
            assert!((0..=100).contains(&score), "score {score} out of bounds");
        }
    }
}
