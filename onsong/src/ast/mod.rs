use std::fmt;
use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic, Label, Severity};
use serde::Serialize;

/// A parsed song.
///
/// Declared sections live in `declared` in source order. `sections` is the
/// play order: either every declared section once, or whatever the `flow`
/// metatag asks for. Entries refer back into `declared` by index, so a
/// section played twice is the same node both times.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub metadata: Vec<Metatag>,
    pub declared: Vec<Section>,
    pub sections: Vec<SectionEntry>,
    pub warnings: Vec<Warning>,
}

impl Document {
    pub fn section(&self, id: SectionId) -> Option<&Section> {
        self.declared.get(id.0)
    }

    /// The play sequence with section references resolved to the arena nodes.
    pub fn resolved(&self) -> impl Iterator<Item = ResolvedEntry<'_>> + '_ {
        self.sections.iter().filter_map(|entry| match entry {
            SectionEntry::Section(id) => self.section(*id).map(ResolvedEntry::Section),
            SectionEntry::Instruction(instruction) => Some(ResolvedEntry::Instruction(instruction)),
        })
    }

    /// First metatag with the given (already normalized) name.
    pub fn metatag(&self, name: &str) -> Option<&Metatag> {
        self.metadata.iter().find(|tag| tag.name == name)
    }
}

/// Index of a section in [`Document::declared`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SectionId(pub usize);

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionEntry {
    Section(SectionId),
    Instruction(Instruction),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResolvedEntry<'a> {
    Section(&'a Section),
    Instruction(&'a Instruction),
}

/// A single `name: value` declaration from the head of the song.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metatag {
    /// Lowercased, with aliases collapsed (`st` -> `artist`).
    pub name: String,
    pub value: MetatagValue,
    /// Byte span of the declaring line.
    pub span: Range<usize>,
}

impl Metatag {
    pub fn text(&self) -> Option<&str> {
        match &self.value {
            MetatagValue::Text(text) => Some(text),
            MetatagValue::Flow(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetatagValue {
    Text(String),
    /// Only produced for the `flow` tag.
    Flow(Vec<FlowItem>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowItem {
    Reference(String),
    Instruction(Instruction),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    /// `None` for lyrics that appear outside any header or directive.
    pub name: Option<String>,
    pub items: Vec<SectionItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionItem {
    Stanza(Stanza),
    Tab(Tab),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stanza {
    pub lines: Vec<Line>,
}

/// One rendered line. `parts` is never empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Line {
    pub parts: Vec<Annotation>,
}

impl Line {
    pub fn plain(lyrics: impl Into<String>) -> Self {
        Line {
            parts: vec![Annotation::plain(lyrics)],
        }
    }
}

/// A span of lyrics, optionally led by a chord or instruction anchored at
/// its first character.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Annotation {
    pub annotation: Option<Marker>,
    pub lyrics: String,
}

impl Annotation {
    pub fn plain(lyrics: impl Into<String>) -> Self {
        Annotation {
            annotation: None,
            lyrics: lyrics.into(),
        }
    }

    pub fn chord(value: impl Into<String>, lyrics: impl Into<String>) -> Self {
        Annotation {
            annotation: Some(Marker::Chord(Chord::new(value))),
            lyrics: lyrics.into(),
        }
    }

    pub fn instruction(content: impl Into<String>, lyrics: impl Into<String>) -> Self {
        Annotation {
            annotation: Some(Marker::Instruction(Instruction::new(content))),
            lyrics: lyrics.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Marker {
    Chord(Chord),
    Instruction(Instruction),
}

/// A chord symbol, kept exactly as written (`F / A` stays `F / A`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Chord {
    pub value: String,
}

impl Chord {
    pub fn new(value: impl Into<String>) -> Self {
        Chord {
            value: value.into(),
        }
    }
}

/// Free-form performance note, written in parentheses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Instruction {
    pub content: String,
}

impl Instruction {
    pub fn new(content: impl Into<String>) -> Self {
        Instruction {
            content: content.into(),
        }
    }
}

/// Verbatim tablature between `{sot}`/`{eot}` (or the long spellings).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tab {
    pub content: String,
}

/// Recoverable problem found while parsing. Never aborts the parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub message: String,
    pub span: Range<usize>,
}

impl Warning {
    pub fn new(message: impl Into<String>, span: Range<usize>) -> Self {
        Warning {
            message: message.into(),
            span,
        }
    }

    /// Convert to a codespan-reporting Diagnostic for display.
    pub fn to_diagnostic(&self, file_id: usize) -> Diagnostic<usize> {
        Diagnostic::new(Severity::Warning)
            .with_message(&self.message)
            .with_labels(vec![Label::primary(file_id, self.span.clone())])
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

// ---------------------------------------------------------------------------
// Re-serialization to notation
// ---------------------------------------------------------------------------

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.content)
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Marker::Chord(chord) => write!(f, "[{}]", chord),
            Marker::Instruction(instruction) => write!(f, "{}", instruction),
        }
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(marker) = &self.annotation {
            write!(f, "{}", marker)?;
        }
        write!(f, "{}", self.lyrics)
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for part in &self.parts {
            write!(f, "{}", part)?;
        }
        Ok(())
    }
}

impl fmt::Display for Stanza {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{{sot}}")?;
        write!(f, "{}", self.content)?;
        writeln!(f, "{{eot}}")
    }
}

impl fmt::Display for SectionItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionItem::Stanza(stanza) => write!(f, "{}", stanza),
            SectionItem::Tab(tab) => write!(f, "{}", tab),
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.name {
            writeln!(f, "{}:", name)?;
        }
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", item)?;
        }
        Ok(())
    }
}

impl fmt::Display for FlowItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowItem::Reference(name) => write!(f, "{}", name),
            FlowItem::Instruction(instruction) => write!(f, "{}", instruction),
        }
    }
}

impl fmt::Display for MetatagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetatagValue::Text(text) => write!(f, "{}", text),
            MetatagValue::Flow(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for Metatag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.value)
    }
}
