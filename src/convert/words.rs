//! The word table behind the `bool` converter.

use parking_lot::RwLock;
use std::collections::HashMap;

const STANDARD_FALSE: [&str; 7] = ["0", "f", "false", "n", "no", "off", "close"];
const STANDARD_TRUE: [&str; 7] = ["1", "t", "true", "y", "yes", "on", "open"];

/// Case-insensitive mapping from words to boolean values.
#[derive(Debug)]
pub struct BoolWords {
    words: RwLock<HashMap<String, bool>>,
}

impl BoolWords {
    /// The standard pairs: 0/1, f/t, false/true, n/y, no/yes, off/on,
    /// close/open.
    pub fn standard() -> Self {
        let words = STANDARD_FALSE
            .iter()
            .map(|w| (w.to_string(), false))
            .chain(STANDARD_TRUE.iter().map(|w| (w.to_string(), true)))
            .collect();
        Self {
            words: RwLock::new(words),
        }
    }

    pub fn empty() -> Self {
        Self {
            words: RwLock::new(HashMap::new()),
        }
    }

    pub fn lookup(&self, word: &str) -> Option<bool> {
        self.words.read().get(&word.to_lowercase()).copied()
    }

    /// Map `word` to `value`, returning the previous mapping.
    pub fn add(&self, word: &str, value: bool) -> Option<bool> {
        self.words.write().insert(word.to_lowercase(), value)
    }

    pub fn remove(&self, word: &str) -> Option<bool> {
        self.words.write().remove(&word.to_lowercase())
    }

    /// Add many mappings. Words containing whitespace can never match a
    /// single token and are skipped. Returns how many were added.
    pub fn add_all<'a>(&self, words: impl IntoIterator<Item = (&'a str, bool)>) -> usize {
        let mut table = self.words.write();
        let mut added = 0;
        for (word, value) in words {
            if word.is_empty() || word.chars().any(char::is_whitespace) {
                continue;
            }
            table.insert(word.to_lowercase(), value);
            added += 1;
        }
        added
    }

    /// Replace the whole table.
    pub fn replace<'a>(&self, words: impl IntoIterator<Item = (&'a str, bool)>) -> usize {
        self.clear();
        self.add_all(words)
    }

    pub fn clear(&self) {
        self.words.write().clear();
    }

    pub fn len(&self) -> usize {
        self.words.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.read().is_empty()
    }
}

impl Default for BoolWords {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_words() {
        let words = BoolWords::standard();
        assert_eq!(words.lookup("YES"), Some(true));
        assert_eq!(words.lookup("Close"), Some(false));
        assert_eq!(words.lookup("maybe"), None);
        assert_eq!(words.len(), 14);
    }

    #[test]
    fn test_add_all_skips_spaced_words() {
        let words = BoolWords::empty();
        let added = words.add_all([("aye", true), ("no way", false), ("nay", false)]);
        assert_eq!(added, 2);
        assert_eq!(words.lookup("no way"), None);
        assert_eq!(words.lookup("nay"), Some(false));
    }

    #[test]
    fn test_remove_and_replace() {
        let words = BoolWords::standard();
        assert_eq!(words.remove("open"), Some(true));
        assert_eq!(words.lookup("open"), None);

        words.replace([("si", true)]);
        assert_eq!(words.len(), 1);
        assert_eq!(words.lookup("yes"), None);

        words.clear();
        assert!(words.is_empty());
    }
}
