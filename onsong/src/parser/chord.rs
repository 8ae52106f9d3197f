//! Chord symbol recognition.
//!
//! A chord is a root note (`A`-`G`) with an optional accidental, an optional
//! quality, any number of extensions or alterations (bare, or grouped in
//! parentheses), and an optional `/bass` note. Whitespace is only allowed
//! around the slash. Tokens are validated, never decomposed: the accepted
//! text is stored as-is.

use std::ops::Range;

use crate::ast::Chord;
use crate::parser::error::{ParseError, ParseErrorKind};

const ACCIDENTALS: [char; 4] = ['#', '♯', 'b', '♭'];
const ALTERATIONS: [char; 6] = ['#', '♯', 'b', '♭', '+', '-'];

/// Recognize a complete chord token.
pub fn recognize(token: &str) -> Option<Chord> {
    let mut scanner = Scanner::new(token);
    if scanner.chord() && scanner.at_end() {
        Some(Chord::new(token))
    } else {
        None
    }
}

/// Recognize a chord token in a position where one is required.
pub fn parse_chord(token: &str, span: Range<usize>, file_id: usize) -> Result<Chord, ParseError> {
    recognize(token).ok_or_else(|| {
        ParseError::new(
            ParseErrorKind::InvalidChord,
            format!("`{}` is not a valid chord", token),
            span,
            file_id,
        )
    })
}

/// Recognize a bracketed chord such as `[D/F#]`.
///
/// An escaped bracket (`\[...]`) is accepted only when it holds a valid
/// chord; anything that is not a well-formed bracket around a chord fails
/// with `BracketedChord`.
pub fn parse_bracketed_chord(
    text: &str,
    span: Range<usize>,
    file_id: usize,
) -> Result<Chord, ParseError> {
    let unescaped = text.strip_prefix('\\').unwrap_or(text);
    let inner = unescaped
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or_else(|| {
            ParseError::new(
                ParseErrorKind::BracketedChord,
                format!("expected `[chord]`, found `{}`", text),
                span.clone(),
                file_id,
            )
        })?;

    recognize(inner).ok_or_else(|| {
        ParseError::new(
            ParseErrorKind::BracketedChord,
            format!("`{}` does not contain a valid chord", text),
            span,
            file_id,
        )
    })
}

// ---------------------------------------------------------------------------
// Scanner
// ---------------------------------------------------------------------------

struct Scanner {
    chars: Vec<char>,
    pos: usize,
}

impl Scanner {
    fn new(token: &str) -> Self {
        Scanner {
            chars: token.chars().collect(),
            pos: 0,
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_any(&mut self, set: &[char]) -> bool {
        match self.peek() {
            Some(c) if set.contains(&c) => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    fn eat_word(&mut self, word: &str) -> bool {
        let len = word.chars().count();
        let matches = word
            .chars()
            .enumerate()
            .all(|(i, c)| self.peek_at(i) == Some(c));
        if matches {
            self.pos += len;
        }
        matches
    }

    /// A word that only counts when an extension number follows it.
    fn eat_word_with_number(&mut self, word: &str) -> bool {
        let start = self.pos;
        if self.eat_word(word) && self.number() {
            return true;
        }
        self.pos = start;
        false
    }

    fn number(&mut self) -> bool {
        let start = self.pos;
        while self.pos - start < 2 && self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn skip_spaces(&mut self) {
        while self.peek().is_some_and(|c| c == ' ' || c == '\t') {
            self.pos += 1;
        }
    }

    fn chord(&mut self) -> bool {
        if !self.note() {
            return false;
        }
        self.quality();
        while self.extension() {}
        self.bass()
    }

    fn note(&mut self) -> bool {
        if !self.peek().is_some_and(|c| ('A'..='G').contains(&c)) {
            return false;
        }
        self.pos += 1;
        self.eat_any(&ACCIDENTALS);
        true
    }

    fn quality(&mut self) -> bool {
        self.eat_word("maj")
            || self.eat_word_with_number("Maj")
            || self.eat_word("min")
            || self.eat_word("dim")
            || self.eat_word("aug")
            || self.eat_any(&['m', 'M', '+', '°', 'ø'])
    }

    fn extension(&mut self) -> bool {
        if self.peek() == Some('(') {
            return self.group();
        }
        self.element()
    }

    fn element(&mut self) -> bool {
        let start = self.pos;
        if self.number()
            || self.eat_word_with_number("maj")
            || self.eat_word_with_number("Maj")
            || self.eat_word_with_number("M")
            || self.eat_word_with_number("add")
            || self.eat_word_with_number("no")
            || self.eat_word("dim")
            || self.eat_word("aug")
        {
            return true;
        }
        if self.eat_word("sus") {
            self.number();
            return true;
        }
        if self.eat_any(&ALTERATIONS) {
            if self.number() {
                return true;
            }
            self.pos = start;
        }
        false
    }

    /// `(b5)`, `(11)`, `(add4)`, `(b9,#11)`
    fn group(&mut self) -> bool {
        let start = self.pos;
        self.pos += 1;
        if !self.element() {
            self.pos = start;
            return false;
        }
        loop {
            self.eat(',');
            if !self.element() {
                break;
            }
        }
        if self.eat(')') {
            true
        } else {
            self.pos = start;
            false
        }
    }

    fn bass(&mut self) -> bool {
        let start = self.pos;
        self.skip_spaces();
        if !self.eat('/') {
            self.pos = start;
            return true;
        }
        self.skip_spaces();
        self.note()
    }
}
