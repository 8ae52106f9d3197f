use std::fmt;
use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic, Label, Severity};
use thiserror::Error;

/// What went wrong. Every kind is fatal; recoverable problems are
/// [`Warning`](crate::ast::Warning)s instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("syntax error")]
    Syntax,
    #[error("invalid chord")]
    InvalidChord,
    #[error("invalid bracketed chord")]
    BracketedChord,
    #[error("missing metatag value")]
    MissingMetatagValue,
    #[error("mismatched tab delimiter")]
    MismatchedTabDelimiter,
    #[error("unterminated tab")]
    UnterminatedTab,
    #[error("mismatched section delimiter")]
    MismatchedSectionDelimiter,
    #[error("unresolved flow reference")]
    UnresolvedFlowReference,
}

/// One production attempt recorded while parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceStep {
    pub production: &'static str,
    /// Byte offset of the line the attempt started on.
    pub offset: usize,
    pub matched: bool,
}

impl fmt::Display for TraceStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = if self.matched { "matched" } else { "failed" };
        write!(f, "{} at {}: {}", self.production, self.offset, outcome)
    }
}

/// Parse error with source location information.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    pub span: Range<usize>,
    pub file_id: usize,
    pub notes: Vec<String>,
    /// Productions attempted up to the failure, oldest first.
    pub trace: Vec<TraceStep>,
}

impl ParseError {
    pub fn new(
        kind: ParseErrorKind,
        message: impl Into<String>,
        span: Range<usize>,
        file_id: usize,
    ) -> Self {
        ParseError {
            kind,
            message: message.into(),
            span,
            file_id,
            notes: Vec::new(),
            trace: Vec::new(),
        }
    }

    pub fn syntax(message: impl Into<String>, span: Range<usize>, file_id: usize) -> Self {
        Self::new(ParseErrorKind::Syntax, message, span, file_id)
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_trace(mut self, trace: Vec<TraceStep>) -> Self {
        self.trace = trace;
        self
    }

    /// Convert to a codespan-reporting Diagnostic for display.
    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        Diagnostic::new(Severity::Error)
            .with_message(&self.message)
            .with_code(self.kind.to_string())
            .with_labels(vec![Label::primary(self.file_id, self.span.clone())])
            .with_notes(self.notes.clone())
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_carries_kind_span_and_notes() {
        let error = ParseError::new(
            ParseErrorKind::UnresolvedFlowReference,
            "flow references unknown section `X`",
            6..13,
            3,
        )
        .with_note("declared sections: Verse");

        let diagnostic = error.to_diagnostic();
        assert_eq!(diagnostic.severity, Severity::Error);
        assert_eq!(diagnostic.code.as_deref(), Some("unresolved flow reference"));
        assert_eq!(diagnostic.labels[0].file_id, 3);
        assert_eq!(diagnostic.labels[0].range, 6..13);
        assert_eq!(diagnostic.notes, vec!["declared sections: Verse".to_string()]);
    }

    #[test]
    fn display_prefixes_kind() {
        let error = ParseError::syntax("unexpected line", 0..1, 0);
        assert_eq!(error.to_string(), "syntax error: unexpected line");

        let step = TraceStep {
            production: "Tab",
            offset: 12,
            matched: false,
        };
        assert_eq!(step.to_string(), "Tab at 12: failed");
    }
}
