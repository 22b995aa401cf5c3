//! Text normalization shared by the extractors and the sentiment scorer.

/// Lowercases and strips the diacritics that occur in Brazilian Portuguese.
///
/// Keyword tables are written in folded form, so "condomínio", "Condominio"
/// and "CONDOMÍNIO" all match the same entry.
#[must_use]
pub fn normalize_text(text: &str) -> String {
    text.chars()
        .flat_map(char::to_lowercase)
        .map(fold_diacritic)
        .collect()
}

fn fold_diacritic(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_portuguese_diacritics() {
        assert_eq!(normalize_text("Condomínio"), "condominio");
        assert_eq!(normalize_text("NEGÓCIO"), "negocio");
        assert_eq!(normalize_text("coração"), "coracao");
    }

    #[test]
    fn leaves_plain_ascii_untouched() {
        assert_eq!(normalize_text("apartamento 101"), "apartamento 101");
    }
}
