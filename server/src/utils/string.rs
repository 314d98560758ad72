//! String utility functions

/// Upper-case the first character, leaving the rest untouched
pub fn capitalize_first(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Parse an id list in either `(a,b,c)` or `a, b, c` form into trimmed, non-empty items.
pub fn parse_id_list(value: &str) -> Vec<String> {
    value
        .trim()
        .trim_start_matches('(')
        .trim_end_matches(')')
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Make a value safe to use as a single path segment.
///
/// Separators and parent references are replaced so that user-supplied
/// values (application names, levels) cannot escape the log root.
pub fn sanitize_path_segment(value: &str) -> String {
    let cleaned: String = value
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '\0' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    match cleaned.as_str() {
        "" | "." | ".." => "_".to_string(),
        _ => cleaned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capitalize_first() {
        assert_eq!(capitalize_first("project"), "Project");
        assert_eq!(capitalize_first("Project"), "Project");
        assert_eq!(capitalize_first("resolveStatus"), "ResolveStatus");
        assert_eq!(capitalize_first("x"), "X");
        assert_eq!(capitalize_first(""), "");
    }

    #[test]
    fn test_parse_id_list_parenthesized() {
        assert_eq!(parse_id_list("(a,b,c)"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_parse_id_list_plain_with_spaces() {
        assert_eq!(parse_id_list(" a , b,, c "), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_parse_id_list_empty() {
        assert!(parse_id_list("()").is_empty());
        assert!(parse_id_list("").is_empty());
    }

    #[test]
    fn test_sanitize_path_segment() {
        assert_eq!(sanitize_path_segment("WebApp"), "WebApp");
        assert_eq!(sanitize_path_segment("../etc"), ".._etc");
        assert_eq!(sanitize_path_segment(".."), "_");
        assert_eq!(sanitize_path_segment("a/b\\c"), "a_b_c");
        assert_eq!(sanitize_path_segment("  "), "_");
    }
}
