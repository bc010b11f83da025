//! Tokenization and the token cursor.
//!
//! Converters never remove tokens from a shared list. They look at
//! [`TokenCursor::remaining`] and report how many tokens they used; the
//! dispatcher then calls [`TokenCursor::advance`].

/// Split a line on whitespace. Runs of whitespace count as one separator.
pub fn tokenize(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_owned).collect()
}

/// A read position over an immutable token sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenCursor {
    tokens: Vec<String>,
    pos: usize,
}

impl TokenCursor {
    /// Create a cursor at the start of `tokens`.
    pub fn new(tokens: Vec<String>) -> Self {
        Self { tokens, pos: 0 }
    }

    /// Tokens not yet consumed.
    #[inline]
    pub fn remaining(&self) -> &[String] {
        &self.tokens[self.pos..]
    }

    /// Number of tokens not yet consumed.
    #[inline]
    pub fn len(&self) -> usize {
        self.tokens.len() - self.pos
    }

    /// Whether every token has been consumed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index of the next unconsumed token within the current sequence.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Look at the next token without consuming it.
    pub fn peek(&self) -> Option<&str> {
        self.tokens.get(self.pos).map(String::as_str)
    }

    /// Consume and return the next token.
    pub fn next_token(&mut self) -> Option<&str> {
        let token = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(token.as_str())
    }

    /// Consume `n` tokens.
    ///
    /// Returns `false` and leaves the cursor untouched if fewer than `n`
    /// tokens remain.
    pub fn advance(&mut self, n: usize) -> bool {
        if n > self.len() {
            return false;
        }
        self.pos += n;
        true
    }

    /// Replace the underlying sequence and rewind to its start.
    ///
    /// Used when an optional parameter falls back to its default tokens.
    pub fn reset(&mut self, tokens: Vec<String>) {
        self.tokens = tokens;
        self.pos = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_collapses_whitespace() {
        assert_eq!(tokenize("  a \t b\n c  "), vec!["a", "b", "c"]);
        assert!(tokenize("   ").is_empty());
    }

    #[test]
    fn test_cursor_advance() {
        let mut cursor = TokenCursor::new(tokenize("one two three"));
        assert_eq!(cursor.len(), 3);
        assert!(cursor.advance(2));
        assert_eq!(cursor.remaining(), ["three"]);
        assert!(!cursor.advance(2));
        assert_eq!(cursor.position(), 2);
        assert_eq!(cursor.next_token(), Some("three"));
        assert!(cursor.is_empty());
        assert_eq!(cursor.next_token(), None);
    }

    #[test]
    fn test_cursor_reset() {
        let mut cursor = TokenCursor::new(tokenize("x"));
        cursor.advance(1);
        cursor.reset(tokenize("1 2"));
        assert_eq!(cursor.peek(), Some("1"));
        assert_eq!(cursor.len(), 2);
    }
}
