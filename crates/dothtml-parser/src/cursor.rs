use dothtml_core::Span;

/// A cursor over source text that tracks position.
///
/// Shared by the markup tokenizer and the binding lexer. Columns count
/// characters, so a report points at the same place an editor would.
#[derive(Clone)]
pub struct Cursor<'src> {
    source: &'src str,
    rest: &'src str,
    offset: u32,
    line: u32,
    column: u32,
}

impl<'src> Cursor<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            rest: source,
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    /// Current byte offset from start of source.
    #[inline]
    pub fn offset(&self) -> u32 {
        self.offset
    }

    #[inline]
    pub fn line(&self) -> u32 {
        self.line
    }

    #[inline]
    pub fn column(&self) -> u32 {
        self.column
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        self.rest.is_empty()
    }

    #[inline]
    pub fn peek(&self) -> Option<char> {
        self.rest.chars().next()
    }

    /// Peek at the nth character ahead (0 = current).
    #[inline]
    pub fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest.chars().nth(n)
    }

    #[inline]
    pub fn check(&self, f: impl Fn(char) -> bool) -> bool {
        self.peek().is_some_and(f)
    }

    #[inline]
    pub fn check_str(&self, s: &str) -> bool {
        self.rest.starts_with(s)
    }

    /// Consume the current character, updating line/column tracking.
    pub fn advance(&mut self) -> Option<char> {
        let ch = self.rest.chars().next()?;
        let len = ch.len_utf8();
        self.rest = &self.rest[len..];
        self.offset += len as u32;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    #[inline]
    pub fn eat(&mut self, ch: char) -> bool {
        if self.peek() == Some(ch) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume `s` if the upcoming text matches it.
    pub fn eat_str(&mut self, s: &str) -> bool {
        if !self.check_str(s) {
            return false;
        }
        for _ in s.chars() {
            self.advance();
        }
        true
    }

    /// Consume characters while the predicate matches, returning the slice.
    pub fn eat_while(&mut self, f: impl Fn(char) -> bool) -> &'src str {
        let start = self.offset;
        while self.check(&f) {
            self.advance();
        }
        self.slice_from(start)
    }

    #[inline]
    pub fn slice_from(&self, start: u32) -> &'src str {
        &self.source[start as usize..self.offset as usize]
    }

    /// Zero-length span at the current position.
    #[inline]
    pub fn position(&self) -> Span {
        Span::point(self.line, self.column)
    }

    /// Span from a recorded start position to the current one.
    pub fn span_from(&self, start: Span, start_offset: u32) -> Span {
        let len = self.slice_from(start_offset).chars().count() as u32;
        Span::new(start.line, start.col, len)
    }
}

#[inline]
pub fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

#[inline]
pub fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_line_and_column() {
        let mut cursor = Cursor::new("ab\ncd");
        cursor.advance();
        cursor.advance();
        assert_eq!((cursor.line(), cursor.column()), (1, 3));
        cursor.advance();
        assert_eq!((cursor.line(), cursor.column()), (2, 1));
    }

    #[test]
    fn columns_count_characters() {
        let mut cursor = Cursor::new("héllo");
        cursor.advance();
        cursor.advance();
        assert_eq!(cursor.offset(), 3);
        assert_eq!(cursor.column(), 3);
    }

    #[test]
    fn eat_str_and_slice() {
        let mut cursor = Cursor::new("<!-- x -->");
        let start = cursor.offset();
        assert!(cursor.eat_str("<!--"));
        assert!(!cursor.eat_str("-->"));
        assert_eq!(cursor.slice_from(start), "<!--");
    }

    #[test]
    fn span_from_measures_characters() {
        let mut cursor = Cursor::new("ééé rest");
        let start = cursor.position();
        let offset = cursor.offset();
        cursor.eat_while(|c| c == 'é');
        assert_eq!(cursor.span_from(start, offset), Span::new(1, 1, 3));
    }
}
