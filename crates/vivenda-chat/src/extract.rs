//! Entity extractors: pure functions that scan free-text chat input for a
//! name, a phone number, a property-type category, and a visit/financing
//! interest.
//!
//! Every extractor walks an ordered pattern list with first-match-wins
//! semantics. Ordering is load-bearing and tested: specific multi-word
//! entries come before the general single-word ones.

use std::sync::LazyLock;

use regex::Regex;

use crate::normalize::normalize_text;

/// Self-introduction patterns, most explicit first. Each has exactly one
/// capture group holding the candidate name (up to three words).
static NAME_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)meu nome (?:é|e)\s+(\p{L}+(?:\s+\p{L}+){0,2})",
        r"(?i)me chamo\s+(\p{L}+(?:\s+\p{L}+){0,2})",
        r"(?i)pode me chamar de\s+(\p{L}+(?:\s+\p{L}+){0,2})",
        r"(?i)\bsou [oa]\s+(\p{L}+(?:\s+\p{L}+){0,2})",
        r"(?i)aqui (?:é|e) [oa]?\s*(\p{L}+(?:\s+\p{L}+){0,2})",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid name regex"))
    .collect()
});

/// Formatted Brazilian phone: optional `(DD)` area code, optional mobile 9,
/// 4+4 digit grouping with optional separators.
static PHONE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\(?\d{2}\)?\s*9?\s*\d{4}[-.\s]?\d{4}").expect("valid phone regex")
});

/// Ordered (keywords, canonical label) table for property types.
///
/// Keywords are written in folded form (lowercase, no diacritics) because
/// the input is normalized before matching. "casa em condominio" must stay
/// ahead of plain "casa" or the general entry would win first.
const PROPERTY_TYPES: &[(&[&str], &str)] = &[
    (
        &[
            "casa em condominio",
            "casa de condominio",
            "casa no condominio",
            "condominio fechado",
        ],
        "casa_condominio",
    ),
    (&["cobertura"], "cobertura"),
    (&["apartamento", "apto", "ap."], "apartamento"),
    (&["casa"], "casa"),
    (&["terreno", "lote"], "terreno"),
    (
        &["sala comercial", "ponto comercial", "loja", "galpao"],
        "comercial",
    ),
    (&["chacara", "sitio", "fazenda"], "rural"),
];

/// Ordered (keywords, label) table for conversation interests.
const INTERESTS: &[(&[&str], &str)] = &[
    (
        &[
            "agendar visita",
            "agendar uma visita",
            "marcar uma visita",
            "quero visitar",
            "fazer uma visita",
            "conhecer o imovel",
        ],
        "visita",
    ),
    (
        &["financiamento", "financiar", "parcelar", "valor da entrada"],
        "financiamento",
    ),
    (&["lancamento", "na planta"], "lancamento"),
];

/// Extracts a visitor name from self-introduction phrasing.
///
/// Applies [`NAME_PATTERNS`] in order and stops at the first match; the
/// capture is accepted only if its trimmed length is at least 2 characters.
/// Patterns are never aggregated — the first matching pattern decides.
#[must_use]
pub fn extract_name(text: &str) -> Option<String> {
    for pattern in NAME_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(text) {
            let candidate = caps.get(1).map_or("", |m| m.as_str()).trim();
            if candidate.chars().count() >= 2 {
                return Some(candidate.to_string());
            }
            return None;
        }
    }
    None
}

/// Extracts a phone number as a bare digit string (10 or 11 digits).
///
/// Tries the formatted pattern first. If nothing matches, falls back to
/// stripping every non-digit from the whole input and accepting the result
/// iff it has exactly 10 or 11 digits. The fallback is intentionally
/// permissive and can misread unrelated numeric text (an ID, an address)
/// as a phone — preserved, documented behavior rather than a bug.
#[must_use]
pub fn extract_phone(text: &str) -> Option<String> {
    if let Some(m) = PHONE_PATTERN.find(text) {
        let digits: String = m.as_str().chars().filter(char::is_ascii_digit).collect();
        if digits.len() == 10 || digits.len() == 11 {
            return Some(digits);
        }
    }

    let all_digits: String = text.chars().filter(char::is_ascii_digit).collect();
    if all_digits.len() == 10 || all_digits.len() == 11 {
        return Some(all_digits);
    }
    None
}

/// Extracts a canonical property-type label from the message.
///
/// The text is normalized, then the ordered table is scanned; the first
/// label whose any keyword is a substring wins.
#[must_use]
pub fn extract_property_type(text: &str) -> Option<&'static str> {
    let normalized = normalize_text(text);
    first_keyword_match(PROPERTY_TYPES, &normalized)
}

/// Detects a conversation interest (visit scheduling, financing, launch).
#[must_use]
pub fn extract_interest(text: &str) -> Option<&'static str> {
    let normalized = normalize_text(text);
    first_keyword_match(INTERESTS, &normalized)
}

fn first_keyword_match(
    table: &[(&[&str], &'static str)],
    normalized: &str,
) -> Option<&'static str> {
    table
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| normalized.contains(k)))
        .map(|(_, label)| *label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_from_meu_nome_e() {
        assert_eq!(
            extract_name("Oi, meu nome é João Pedro"),
            Some("João Pedro".to_string())
        );
    }

    #[test]
    fn name_from_me_chamo() {
        assert_eq!(extract_name("me chamo Ana"), Some("Ana".to_string()));
    }

    #[test]
    fn name_requires_two_characters() {
        assert_eq!(extract_name("meu nome é J"), None);
    }

    #[test]
    fn name_pattern_order_wins_over_text_order() {
        // "me chamo" appears first in the text, but "meu nome é" is the
        // higher-priority pattern and decides.
        assert_eq!(
            extract_name("me chamo Ana mas meu nome é Beatriz"),
            Some("Beatriz".to_string())
        );
    }

    #[test]
    fn no_name_in_plain_text() {
        assert_eq!(extract_name("quero ver apartamentos"), None);
    }

    #[test]
    fn phone_formatted_with_area_code() {
        // Spec example: 11 digits after stripping.
        assert_eq!(
            extract_phone("meu telefone é (62) 99999-1234"),
            Some("62999991234".to_string())
        );
    }

    #[test]
    fn phone_bare_digit_run() {
        assert_eq!(
            extract_phone("pode ser 11999998888 mesmo"),
            Some("11999998888".to_string())
        );
    }

    #[test]
    fn phone_ten_digits_landline() {
        assert_eq!(
            extract_phone("liga no (62) 3222-1234"),
            Some("6232221234".to_string())
        );
    }

    #[test]
    fn phone_rejects_short_runs() {
        assert_eq!(extract_phone("tenho 3 filhos e 2 carros"), None);
    }

    #[test]
    fn phone_fallback_over_matches_by_design() {
        // A CPF-less numeric message with 11 scattered digits is misread as a
        // phone. Known over-match; the test pins the behavior down.
        assert_eq!(
            extract_phone("apto 23 bloco 4, CEP 74810-100"),
            Some("23474810100".to_string())
        );
    }

    #[test]
    fn property_specific_beats_general() {
        assert_eq!(
            extract_property_type("procuro casa em condomínio fechado"),
            Some("casa_condominio")
        );
    }

    #[test]
    fn property_general_casa() {
        assert_eq!(extract_property_type("quero uma casa grande"), Some("casa"));
    }

    #[test]
    fn property_apartment_abbreviation() {
        assert_eq!(extract_property_type("um apto de 2 quartos"), Some("apartamento"));
    }

    #[test]
    fn property_none_when_absent() {
        assert_eq!(extract_property_type("bom dia"), None);
    }

    #[test]
    fn interest_visit() {
        assert_eq!(extract_interest("dá pra agendar visita amanhã?"), Some("visita"));
    }

    #[test]
    fn interest_financing() {
        assert_eq!(extract_interest("aceita financiamento?"), Some("financiamento"));
    }

    #[test]
    fn extractors_are_pure() {
        let text = "meu nome é Bruno, (62) 99999-1234, quero apartamento";
        for _ in 0..3 {
            assert_eq!(extract_name(text), Some("Bruno".to_string()));
            assert_eq!(extract_phone(text), Some("62999991234".to_string()));
            assert_eq!(extract_property_type(text), Some("apartamento"));
        }
    }
}
