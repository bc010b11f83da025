//! Command-name rules.
//!
//! Names are case-insensitive. After lowercasing they may only contain ASCII
//! letters, digits, underscores and hyphens.

/// Lowercase a command name for lookup and storage.
#[inline]
pub fn normalize_name(name: &str) -> String {
    name.to_ascii_lowercase()
}

/// Check a name against `[a-z0-9_-]+` (case-insensitively).
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Split a space-delimited alias list, skipping empty entries.
pub fn split_names(names: &str) -> impl Iterator<Item = &str> {
    names.split(' ').filter(|n| !n.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        assert!(is_valid_name("help"));
        assert!(is_valid_name("Roll-D20"));
        assert!(is_valid_name("set_prefix"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("two words"));
        assert!(!is_valid_name("café"));
        assert!(!is_valid_name("!bang"));
    }

    #[test]
    fn test_split_names() {
        let names: Vec<_> = split_names("  r  dice ").collect();
        assert_eq!(names, vec!["r", "dice"]);
        assert_eq!(normalize_name("HeLp"), "help");
    }
}
