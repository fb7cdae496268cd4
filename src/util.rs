use std::collections::HashSet;

use crate::thresholds;

/// Truncate a string to `max` characters, appending "…" if truncated.
/// Handles multi-byte correctly via char boundary.
pub fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{truncated}…")
    }
}

/// Word-overlap Jaccard similarity between two token slices.
/// Returns intersection / union, or 0.0 if both are empty.
pub fn word_jaccard(a: &[String], b: &[String]) -> f64 {
    let set_a: HashSet<&str> = a.iter().map(|s| s.as_str()).collect();
    let set_b: HashSet<&str> = b.iter().map(|s| s.as_str()).collect();
    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.union(&set_b).count();
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

/// Close-variant check: misspellings and plural forms score above the
/// variant ratio even when their embeddings drift apart.
pub fn is_close_variant(a: &str, b: &str) -> bool {
    strsim::normalized_levenshtein(a, b) > thresholds::CLOSE_VARIANT_RATIO
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_no_truncate() {
        assert_eq!(truncate_chars("hello", 10), "hello");
    }

    #[test]
    fn ascii_truncate() {
        assert_eq!(truncate_chars("hello world", 5), "hello…");
    }

    #[test]
    fn jaccard_disjoint() {
        let a = vec!["netflix".to_string()];
        let b = vec!["hulu".to_string()];
        assert!((word_jaccard(&a, &b) - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn jaccard_partial() {
        let a = vec!["netflix".to_string(), "login".to_string()];
        let b = vec!["netflix".to_string(), "account".to_string()];
        // intersection={netflix}, union has 3 entries
        assert!((word_jaccard(&a, &b) - 1.0 / 3.0).abs() < 0.001);
    }

    #[test]
    fn plural_is_close_variant() {
        assert!(is_close_variant("netflix login", "netflix logins"));
        assert!(!is_close_variant("netflix login", "hulu pricing"));
    }
}
