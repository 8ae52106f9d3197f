use onsong::ast::{Chord, Instruction, Line, Marker, Section, SectionItem, Stanza, Tab};

/// One step of the play order.
#[derive(Debug, Clone, Copy)]
pub enum SongEntry<'a> {
    Section(SongSection<'a>),
    Instruction(&'a Instruction),
}

impl<'a> SongEntry<'a> {
    pub fn section(self) -> Option<SongSection<'a>> {
        match self {
            SongEntry::Section(section) => Some(section),
            SongEntry::Instruction(_) => None,
        }
    }
}

/// Read-only view of a declared section.
#[derive(Debug, Clone, Copy)]
pub struct SongSection<'a> {
    section: &'a Section,
}

impl<'a> SongSection<'a> {
    pub fn new(section: &'a Section) -> Self {
        SongSection { section }
    }

    /// `None` for lyrics outside any header.
    pub fn name(self) -> Option<&'a str> {
        self.section.name.as_deref()
    }

    pub fn stanzas(self) -> impl Iterator<Item = &'a Stanza> + 'a {
        self.section.items.iter().filter_map(|item| match item {
            SectionItem::Stanza(stanza) => Some(stanza),
            SectionItem::Tab(_) => None,
        })
    }

    pub fn tabs(self) -> impl Iterator<Item = &'a Tab> + 'a {
        self.section.items.iter().filter_map(|item| match item {
            SectionItem::Tab(tab) => Some(tab),
            SectionItem::Stanza(_) => None,
        })
    }

    pub fn lines(self) -> impl Iterator<Item = &'a Line> + 'a {
        self.stanzas().flat_map(|stanza| stanza.lines.iter())
    }

    /// Every chord in the section, in reading order.
    pub fn chords(self) -> impl Iterator<Item = &'a Chord> + 'a {
        self.lines()
            .flat_map(|line| line.parts.iter())
            .filter_map(|part| match &part.annotation {
                Some(Marker::Chord(chord)) => Some(chord),
                _ => None,
            })
    }

    pub fn section(self) -> &'a Section {
        self.section
    }
}
