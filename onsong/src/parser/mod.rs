pub mod align;
pub mod blocks;
pub mod chord;
pub mod classify;
pub mod cursor;
pub mod error;
pub mod flow;
pub mod metadata;

pub use error::{ParseError, ParseErrorKind, TraceStep};

use std::ops::Range;

use crate::ast::{Document, Line, Metatag, Section, SectionItem, Tab, Warning};
use crate::parser::cursor::Cursor;

/// Parser entry point.
pub struct Parser {
    source: String,
    file_id: usize,
}

/// A production's result together with the warnings raised producing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed<T> {
    pub value: T,
    pub warnings: Vec<Warning>,
}

impl Parser {
    pub fn new(source: String, file_id: usize) -> Self {
        Parser { source, file_id }
    }

    /// Parse the source into a complete Document.
    pub fn parse(&self) -> Result<Document, ParseError> {
        let mut state = ParseState::new(&self.source, self.file_id);
        document(&mut state)
    }

    /// Parse the whole input as the metadata head of a song.
    pub fn parse_metadata(&self) -> Result<Parsed<Vec<Metatag>>, ParseError> {
        self.run("Metadata", |state| {
            let tags = metadata::metadata(state)?;
            metadata::expect_no_leftover_tag(state)?;
            Ok(tags)
        })
    }

    /// Parse a single `Name:` header line and return the name.
    pub fn parse_section_header(&self) -> Result<Parsed<String>, ParseError> {
        self.run("SectionHeader", |state| {
            let line = state.cursor.peek();
            match line.and_then(|line| classify::section_header(line.text)) {
                Some(name) => {
                    state.cursor.advance();
                    Ok(name.to_string())
                }
                None => Err(state.fail(
                    ParseErrorKind::Syntax,
                    "expected a section header such as `Verse 1:`",
                    state.current_span(),
                )),
            }
        })
    }

    /// Parse one section (named, directive-delimited, or anonymous).
    pub fn parse_section(&self) -> Result<Parsed<Section>, ParseError> {
        self.run("Section", |state| {
            if let Some(section) = blocks::section(state)? {
                return Ok(section);
            }
            match blocks::loose_section(state)? {
                Some(section) => Ok(section),
                None => Err(state.fail(
                    ParseErrorKind::Syntax,
                    "expected a section",
                    state.current_span(),
                )),
            }
        })
    }

    /// Parse the stanzas and tabs of a section body.
    pub fn parse_section_body(&self) -> Result<Parsed<Vec<SectionItem>>, ParseError> {
        self.run("SectionBody", |state| blocks::section_body(state, None))
    }

    /// Parse one rendered line: an inline-chord line, or a chord line with
    /// the lyric line under it.
    pub fn parse_line(&self) -> Result<Parsed<Line>, ParseError> {
        self.run("Line", |state| match blocks::stanza_line(state)? {
            Some(line) => Ok(line),
            None => Err(state.fail(
                ParseErrorKind::Syntax,
                "expected a lyric or chord line",
                state.current_span(),
            )),
        })
    }

    /// Parse a `{sot}`/`{eot}` block.
    pub fn parse_tab(&self) -> Result<Parsed<Tab>, ParseError> {
        self.run("Tab", |state| match blocks::tab(state)? {
            Some(tab) => Ok(tab),
            None => Err(state.fail(
                ParseErrorKind::Syntax,
                "expected `{sot}` or `{start_of_tab}`",
                state.current_span(),
            )),
        })
    }

    /// Run a start rule that must consume the whole input.
    fn run<T>(
        &self,
        rule: &'static str,
        production: impl FnOnce(&mut ParseState<'_>) -> Result<T, ParseError>,
    ) -> Result<Parsed<T>, ParseError> {
        let mut state = ParseState::new(&self.source, self.file_id);
        let value = production(&mut state)?;
        state.expect_end(rule)?;
        Ok(Parsed {
            value,
            warnings: state.warnings,
        })
    }
}

/// Top-level production: metadata, then sections, then flow resolution.
fn document(state: &mut ParseState<'_>) -> Result<Document, ParseError> {
    let metadata = metadata::metadata(state)?;

    let mut declared = Vec::new();
    loop {
        state.cursor.skip_blank();
        if state.cursor.at_end() {
            break;
        }
        if let Some(section) = blocks::section(state)? {
            declared.push(section);
            continue;
        }
        // Lyrics outside any header; a body holding only skipped lines adds nothing.
        let before = state.cursor.checkpoint();
        let items = blocks::loose_body(state)?;
        if !items.is_empty() {
            declared.push(Section { name: None, items });
        } else if state.cursor.checkpoint() == before {
            return Err(state.fail(
                ParseErrorKind::Syntax,
                "unexpected line",
                state.current_span(),
            ));
        }
    }

    let sections = flow::resolve(state, &metadata, &declared)?;
    log::debug!(
        "parsed {} metatags, {} sections, {} warnings",
        metadata.len(),
        declared.len(),
        state.warnings.len()
    );

    Ok(Document {
        metadata,
        declared,
        sections,
        warnings: std::mem::take(&mut state.warnings),
    })
}

// ---------------------------------------------------------------------------
// Parse state
// ---------------------------------------------------------------------------

/// Everything one parse owns: the cursor, the warning accumulator and the
/// trace of attempted productions.
pub(crate) struct ParseState<'a> {
    pub(crate) source: &'a str,
    pub(crate) file_id: usize,
    pub(crate) cursor: Cursor<'a>,
    pub(crate) warnings: Vec<Warning>,
    trace: Vec<TraceStep>,
}

impl<'a> ParseState<'a> {
    pub(crate) fn new(source: &'a str, file_id: usize) -> Self {
        ParseState {
            source,
            file_id,
            cursor: Cursor::new(source),
            warnings: Vec::new(),
            trace: Vec::new(),
        }
    }

    /// Try one alternative. `Ok(None)` means it did not match: the cursor
    /// and any warnings it raised are rolled back.
    pub(crate) fn attempt<T>(
        &mut self,
        production: &'static str,
        alternative: impl FnOnce(&mut Self) -> Result<Option<T>, ParseError>,
    ) -> Result<Option<T>, ParseError> {
        let checkpoint = self.cursor.checkpoint();
        let warnings = self.warnings.len();
        let offset = self.cursor.offset();
        let step = self.trace.len();
        self.trace.push(TraceStep {
            production,
            offset,
            matched: false,
        });
        log::debug!("trying {} at {}", production, offset);

        let result = alternative(self)?;
        match result {
            Some(_) => self.trace[step].matched = true,
            None => {
                self.cursor.rewind(checkpoint);
                self.warnings.truncate(warnings);
            }
        }
        Ok(result)
    }

    pub(crate) fn warn(&mut self, message: impl Into<String>, span: Range<usize>) {
        let warning = Warning::new(message, span);
        log::warn!("{} at {:?}", warning.message, warning.span);
        self.warnings.push(warning);
    }

    pub(crate) fn fail(
        &self,
        kind: ParseErrorKind,
        message: impl Into<String>,
        span: Range<usize>,
    ) -> ParseError {
        ParseError::new(kind, message, span, self.file_id).with_trace(self.trace.clone())
    }

    /// Attach the current trace to an error raised outside the state.
    pub(crate) fn traced(&self, error: ParseError) -> ParseError {
        error.with_trace(self.trace.clone())
    }

    /// Span of the current line, or the end of input.
    pub(crate) fn current_span(&self) -> Range<usize> {
        self.cursor
            .peek()
            .map(|line| line.span())
            .unwrap_or_else(|| self.cursor.end_span())
    }

    /// Only blank lines may remain.
    pub(crate) fn expect_end(&mut self, rule: &str) -> Result<(), ParseError> {
        self.cursor.skip_blank();
        match self.cursor.peek() {
            None => Ok(()),
            Some(line) => Err(self.fail(
                ParseErrorKind::Syntax,
                format!("unexpected `{}` after {}", line.text.trim(), rule),
                line.span(),
            )),
        }
    }
}
