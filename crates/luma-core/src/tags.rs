//! Hashtag extraction.

use std::sync::LazyLock;

use regex::Regex;

/// `#` followed by a run of ASCII letters, digits or underscores.
static HASHTAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#([A-Za-z0-9_]+)").expect("Invalid hashtag regex"));

/// Extracts hashtags (without the `#`) in order of appearance.
///
/// Case is preserved and duplicates are kept, so `"#world #World"` yields
/// both spellings.
pub fn extract_tags(content: &str) -> Vec<String> {
    HASHTAG_REGEX
        .captures_iter(content)
        .filter_map(|cap| cap.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_preserved_without_dedup() {
        assert_eq!(extract_tags("Hello #world and #World"), vec!["world", "World"]);
    }

    #[test]
    fn test_repeated_tag_kept() {
        assert_eq!(extract_tags("#rust #rust"), vec!["rust", "rust"]);
    }

    #[test]
    fn test_tag_stops_at_punctuation() {
        assert_eq!(extract_tags("go #team_2024! and #fun."), vec!["team_2024", "fun"]);
    }

    #[test]
    fn test_lone_hash_ignored() {
        assert!(extract_tags("price # 5 and ## nothing").is_empty());
    }

    #[test]
    fn test_no_tags() {
        assert!(extract_tags("plain text").is_empty());
    }
}
