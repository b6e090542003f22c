//! Transaction label normalization and string similarity
//!
//! Bank statement labels are noisy ("NETFLIX.COM/BILL  *0423", "Café de la
//! Gare PARIS"), so every pattern comparison runs against a normalized form:
//! lowercased, diacritics folded, punctuation collapsed to spaces.

use std::sync::OnceLock;

use regex::Regex;

fn non_word_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-z0-9]+").unwrap())
}

/// Normalize a label for matching: lowercase, fold diacritics, replace
/// punctuation with spaces, collapse whitespace.
pub fn normalize_label(raw: &str) -> String {
    let folded: String = raw
        .to_lowercase()
        .chars()
        .map(fold_diacritic)
        .collect();

    non_word_re()
        .replace_all(&folded, " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Map common accented Latin characters to their ASCII base
fn fold_diacritic(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'ç' => 'c',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ñ' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ý' | 'ÿ' => 'y',
        'æ' => 'a',
        'œ' => 'o',
        'ß' => 's',
        _ => c,
    }
}

/// Word-boundary containment check over two already-normalized strings.
///
/// "gas" matches "shell gas station" but not "las vegas show".
pub fn contains_word(normalized_label: &str, normalized_pattern: &str) -> bool {
    if normalized_label.is_empty() || normalized_pattern.is_empty() {
        return false;
    }
    let padded_label = format!(" {} ", normalized_label);
    let padded_pattern = format!(" {} ", normalized_pattern);
    padded_label.contains(&padded_pattern)
}

/// Classic Levenshtein edit distance
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Normalized similarity in [0, 1]: `1 - distance / max_len`
pub fn similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - levenshtein(a, b) as f64 / max_len as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_lowercases_and_strips_punctuation() {
        assert_eq!(normalize_label("NETFLIX.COM/BILL"), "netflix com bill");
        assert_eq!(normalize_label("  UBER *TRIP  "), "uber trip");
        assert_eq!(normalize_label("AMZN Mktp US*2B4LO1"), "amzn mktp us 2b4lo1");
    }

    #[test]
    fn test_normalize_folds_diacritics() {
        assert_eq!(normalize_label("Café de la Gare"), "cafe de la gare");
        assert_eq!(normalize_label("Crédit Agricole"), "credit agricole");
        assert_eq!(normalize_label("MÜNCHEN BÄCKEREI"), "munchen backerei");
    }

    #[test]
    fn test_normalize_empty_and_symbols() {
        assert_eq!(normalize_label(""), "");
        assert_eq!(normalize_label("   "), "");
        assert_eq!(normalize_label("***"), "");
    }

    #[test]
    fn test_contains_word_boundaries() {
        assert!(contains_word("shell gas station", "gas"));
        assert!(contains_word("shell gas station", "gas station"));
        assert!(contains_word("netflix com bill", "netflix"));
        assert!(!contains_word("las vegas show", "gas"));
        assert!(!contains_word("subscription", "sub"));
        assert!(!contains_word("", "gas"));
        assert!(!contains_word("shell", ""));
    }

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein("", ""), 0);
        assert_eq!(levenshtein("abc", ""), 3);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("netflix", "netflix"), 0);
        assert_eq!(levenshtein("netflix", "netflx"), 1);
    }

    #[test]
    fn test_similarity_range() {
        assert!((similarity("netflix", "netflix") - 1.0).abs() < 1e-9);
        assert!((similarity("", "") - 1.0).abs() < 1e-9);
        let sim = similarity("netflix com bill", "netflix com");
        assert!(sim > 0.6 && sim < 1.0);
        assert!(similarity("abc", "xyz") < 0.01);
    }
}
