pub mod metadata;
pub mod section;

pub use metadata::Metadata;
pub use section::{SongEntry, SongSection};

use onsong::ast::{Document, ResolvedEntry, Warning};
use onsong::{ParseError, Parser};

/// A parsed song with convenience accessors over its [`Document`].
#[derive(Debug, Clone)]
pub struct Song {
    document: Document,
}

impl Song {
    pub fn parse(source: &str) -> Result<Self, ParseError> {
        Self::parse_with_id(source, 0)
    }

    /// Parse with a codespan file id, for callers that render diagnostics.
    pub fn parse_with_id(source: &str, file_id: usize) -> Result<Self, ParseError> {
        let document = Parser::new(source.to_string(), file_id).parse()?;
        Ok(Self::from_document(document))
    }

    pub fn from_document(document: Document) -> Self {
        Song { document }
    }

    pub fn metadata(&self) -> Metadata<'_> {
        Metadata::new(&self.document.metadata)
    }

    /// Sections and flow instructions in play order.
    pub fn sections(&self) -> impl Iterator<Item = SongEntry<'_>> + '_ {
        self.document.resolved().map(|entry| match entry {
            ResolvedEntry::Section(section) => SongEntry::Section(SongSection::new(section)),
            ResolvedEntry::Instruction(instruction) => SongEntry::Instruction(instruction),
        })
    }

    /// Every section once, in source order, regardless of flow.
    pub fn declared_sections(&self) -> impl Iterator<Item = SongSection<'_>> + '_ {
        self.document.declared.iter().map(SongSection::new)
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.document.warnings
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }
}
