//! # Character Cursor
//!
//! Peekable character cursor for the lexer. Tracks byte offset plus
//! 1-based line and column as it advances.
//!
//! ```rust
//! use openscad_parser::lexer::Cursor;
//!
//! let mut cursor = Cursor::new("hello");
//! assert_eq!(cursor.peek(), Some('h'));
//! cursor.advance();
//! assert_eq!(cursor.position().column, 2);
//! ```

use openscad_ast::Position;

// =============================================================================
// CURSOR
// =============================================================================

/// Character cursor with position tracking.
pub struct Cursor<'a> {
    /// Source text.
    source: &'a str,
    /// Current byte offset.
    byte: usize,
    /// Current line (1-based).
    line: usize,
    /// Current column (1-based).
    column: usize,
}

impl<'a> Cursor<'a> {
    /// Create a new cursor at the start of `source`.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            byte: 0,
            line: 1,
            column: 1,
        }
    }

    /// Current position.
    pub fn position(&self) -> Position {
        Position::new(self.byte, self.line, self.column)
    }

    /// True once every character has been consumed.
    pub fn is_eof(&self) -> bool {
        self.byte >= self.source.len()
    }

    /// Current character without consuming it.
    pub fn peek(&self) -> Option<char> {
        self.source[self.byte..].chars().next()
    }

    /// Character after the current one.
    pub fn peek_next(&self) -> Option<char> {
        let mut chars = self.source[self.byte..].chars();
        chars.next();
        chars.next()
    }

    /// Character two ahead of the current one.
    pub fn peek_third(&self) -> Option<char> {
        self.source[self.byte..].chars().nth(2)
    }

    /// Consume and return the current character.
    ///
    /// ```rust
    /// use openscad_parser::lexer::Cursor;
    ///
    /// let mut cursor = Cursor::new("a\nb");
    /// cursor.advance();
    /// cursor.advance();
    /// assert_eq!(cursor.position().line, 2);
    /// assert_eq!(cursor.position().column, 1);
    /// ```
    pub fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.byte += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    /// Consume the current character if it equals `expected`.
    pub fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Advance while `predicate` holds.
    pub fn advance_while(&mut self, predicate: impl Fn(char) -> bool) {
        while let Some(c) = self.peek() {
            if !predicate(c) {
                break;
            }
            self.advance();
        }
    }

    /// Source text between `start` and the current position.
    pub fn slice_from(&self, start: Position) -> &'a str {
        &self.source[start.byte..self.byte]
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_starts_at_line_one() {
        let cursor = Cursor::new("cube");
        assert_eq!(cursor.position(), Position::new(0, 1, 1));
    }

    #[test]
    fn test_cursor_empty() {
        let cursor = Cursor::new("");
        assert!(cursor.is_eof());
        assert_eq!(cursor.peek(), None);
    }

    #[test]
    fn test_cursor_lookahead() {
        let cursor = Cursor::new("abc");
        assert_eq!(cursor.peek(), Some('a'));
        assert_eq!(cursor.peek_next(), Some('b'));
        assert_eq!(cursor.peek_third(), Some('c'));
    }

    #[test]
    fn test_cursor_eat() {
        let mut cursor = Cursor::new("==");
        assert!(cursor.eat('='));
        assert!(!cursor.eat('!'));
        assert_eq!(cursor.position().byte, 1);
    }

    #[test]
    fn test_cursor_utf8_column() {
        let mut cursor = Cursor::new("éx");
        cursor.advance();
        assert_eq!(cursor.position().byte, 2);
        assert_eq!(cursor.position().column, 2);
    }

    #[test]
    fn test_cursor_slice_from() {
        let mut cursor = Cursor::new("abc123");
        let start = cursor.position();
        cursor.advance_while(|c| c.is_alphabetic());
        assert_eq!(cursor.slice_from(start), "abc");
    }
}
