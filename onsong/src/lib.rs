//! Parser for OnSong chord charts.
//!
//! A chart is a metadata head (`Title:`, `Key: G`, ...) followed by
//! sections of lyrics with chords, either inline (`[G]Amazing grace`) or on
//! a chord line above the lyric. [`parse`] turns a chart into a
//! [`Document`](ast::Document).

pub mod ast;
pub mod parser;

pub use ast::Document;
pub use parser::{ParseError, ParseErrorKind, Parser};

/// Parse a complete chart. Uses file id 0 for diagnostics.
pub fn parse(source: &str) -> Result<Document, ParseError> {
    Parser::new(source.to_string(), 0).parse()
}
