//! Path helpers

use std::path::PathBuf;

/// Expand `~` and make relative paths absolute against the working directory.
pub fn expand_path(path: &str) -> PathBuf {
    let path = path.trim();

    if path.is_empty() {
        return std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    }

    let expanded = if path == "~" {
        dirs::home_dir().unwrap_or_else(|| PathBuf::from(path))
    } else if let Some(rest) = path.strip_prefix("~/") {
        match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => PathBuf::from(path),
        }
    } else {
        PathBuf::from(path)
    };

    if expanded.is_relative() {
        std::env::current_dir()
            .map(|cwd| cwd.join(&expanded))
            .unwrap_or(expanded)
    } else {
        expanded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_absolute_unchanged() {
        assert_eq!(expand_path("/tmp/safari.json"), PathBuf::from("/tmp/safari.json"));
    }

    #[test]
    fn test_expand_relative_is_absolute() {
        assert!(expand_path("safari.json").is_absolute());
    }

    #[test]
    fn test_expand_tilde() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_path("~/x.json"), home.join("x.json"));
        }
    }
}
