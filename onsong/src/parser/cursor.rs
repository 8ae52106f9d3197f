use std::ops::Range;

/// One physical line of the source. `text` excludes the line terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLine<'a> {
    pub text: &'a str,
    /// Byte offset of the first character.
    pub start: usize,
    /// Byte offset where the following line starts (or the source length).
    pub next: usize,
}

impl<'a> SourceLine<'a> {
    pub fn span(&self) -> Range<usize> {
        self.start..self.start + self.text.len()
    }

    /// Span of `text[range]`, where `range` is a byte range within the line.
    pub fn sub_span(&self, range: Range<usize>) -> Range<usize> {
        self.start + range.start..self.start + range.end
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Position in the line list. Obtained from [`Cursor::checkpoint`] and handed
/// back to [`Cursor::rewind`] when an alternative does not match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint(usize);

/// Line-granular cursor over the source with explicit backtracking.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    lines: Vec<SourceLine<'a>>,
    pos: usize,
    len: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut lines = Vec::new();
        let mut start = 0;
        for raw in source.split('\n') {
            let next = (start + raw.len() + 1).min(source.len());
            let text = raw.strip_suffix('\r').unwrap_or(raw);
            lines.push(SourceLine { text, start, next });
            start += raw.len() + 1;
        }
        // A trailing newline does not open another line.
        if source.ends_with('\n') {
            lines.pop();
        }
        Cursor {
            lines,
            pos: 0,
            len: source.len(),
        }
    }

    pub fn peek(&self) -> Option<SourceLine<'a>> {
        self.lines.get(self.pos).copied()
    }

    /// The line after the current one.
    pub fn peek_next(&self) -> Option<SourceLine<'a>> {
        self.lines.get(self.pos + 1).copied()
    }

    pub fn advance(&mut self) -> Option<SourceLine<'a>> {
        let line = self.peek()?;
        self.pos += 1;
        Some(line)
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.lines.len()
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.pos)
    }

    pub fn rewind(&mut self, checkpoint: Checkpoint) {
        self.pos = checkpoint.0;
    }

    /// Skip blank lines; returns how many were skipped.
    pub fn skip_blank(&mut self) -> usize {
        let mut skipped = 0;
        while self.peek().is_some_and(|line| line.is_blank()) {
            self.pos += 1;
            skipped += 1;
        }
        skipped
    }

    /// Byte offset of the current line, or the end of input.
    pub fn offset(&self) -> usize {
        self.peek().map(|line| line.start).unwrap_or(self.len)
    }

    /// Zero-width span at the end of input.
    pub fn end_span(&self) -> Range<usize> {
        self.len..self.len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_lines_with_offsets() {
        let mut cursor = Cursor::new("ab\r\ncd\n\nef");
        let first = cursor.advance().unwrap();
        assert_eq!(first.text, "ab");
        assert_eq!(first.start, 0);
        assert_eq!(first.next, 4);
        let second = cursor.advance().unwrap();
        assert_eq!(second.text, "cd");
        assert_eq!(second.start, 4);
        assert!(cursor.advance().unwrap().is_blank());
        assert_eq!(cursor.advance().unwrap().text, "ef");
        assert!(cursor.at_end());
        assert_eq!(cursor.offset(), 10);
    }

    #[test]
    fn trailing_newline_adds_no_line() {
        let mut cursor = Cursor::new("Verse 1:\n");
        assert_eq!(cursor.advance().unwrap().text, "Verse 1:");
        assert!(cursor.at_end());
    }

    #[test]
    fn rewind_restores_position() {
        let mut cursor = Cursor::new("a\n\n\nb");
        let checkpoint = cursor.checkpoint();
        cursor.advance();
        assert_eq!(cursor.skip_blank(), 2);
        assert_eq!(cursor.peek().unwrap().text, "b");
        cursor.rewind(checkpoint);
        assert_eq!(cursor.peek().unwrap().text, "a");
    }
}
