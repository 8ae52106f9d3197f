//! Line classification.
//!
//! Alternatives are tried in a fixed priority order: blank, directive,
//! section header, chord-only, lyric. Whether a line is metadata depends on
//! where it sits in the document and is decided by the metadata extractor.

use crate::ast::{Chord, Instruction};
use crate::parser::chord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Start,
    End,
}

/// Tab delimiters come in two spellings; a block must open and close with
/// the same one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabFamily {
    /// `{start_of_tab}` / `{end_of_tab}`
    Long,
    /// `{sot}` / `{eot}`
    Short,
}

impl TabFamily {
    pub fn delimiter(self, edge: Edge) -> &'static str {
        match (self, edge) {
            (TabFamily::Long, Edge::Start) => "{start_of_tab}",
            (TabFamily::Long, Edge::End) => "{end_of_tab}",
            (TabFamily::Short, Edge::Start) => "{sot}",
            (TabFamily::Short, Edge::End) => "{eot}",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    Blank,
    TabDelimiter {
        edge: Edge,
        family: TabFamily,
    },
    /// `{start_of_verse}`, `{sov: Verse 2}`, ...; `kind` is lowercase (`verse`).
    SectionOpen {
        kind: &'a str,
        name: Option<&'a str>,
    },
    SectionClose {
        kind: &'a str,
    },
    /// Any other `{key}` or `{key: value}` line.
    Directive {
        key: &'a str,
        value: Option<&'a str>,
    },
    SectionHeader(&'a str),
    ChordOnly,
    Lyric,
}

/// Short section aliases: `sov`/`eov` and friends.
const SECTION_ALIASES: [(&str, &str); 5] = [
    ("v", "verse"),
    ("c", "chorus"),
    ("b", "bridge"),
    ("i", "intro"),
    ("p", "part"),
];

const COMMENT_KEYS: [&str; 8] = [
    "comment",
    "c",
    "comment_italic",
    "ci",
    "comment_bold",
    "cb",
    "guitar_comment",
    "gc",
];

pub fn classify(text: &str) -> LineKind<'_> {
    let kind = if text.trim().is_empty() {
        LineKind::Blank
    } else if let Some(kind) = directive(text) {
        kind
    } else if let Some(name) = section_header(text) {
        LineKind::SectionHeader(name)
    } else if chord_line(text).is_some() {
        LineKind::ChordOnly
    } else {
        LineKind::Lyric
    };
    log::trace!("classified {:?} as {:?}", text, kind);
    kind
}

/// Split `{key: value}` into its trimmed parts.
pub fn split_directive(text: &str) -> Option<(&str, Option<&str>)> {
    let inner = text.trim().strip_prefix('{')?.strip_suffix('}')?;
    let (key, value) = match inner.split_once(':') {
        Some((key, value)) => (key.trim(), Some(value.trim())),
        None => (inner.trim(), None),
    };
    let is_identifier = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-');
    if !is_identifier {
        return None;
    }
    Some((key, value.filter(|v| !v.is_empty())))
}

fn directive(text: &str) -> Option<LineKind<'_>> {
    let (key, value) = split_directive(text)?;
    let lower = key.to_ascii_lowercase();

    let kind = match lower.as_str() {
        "start_of_tab" => LineKind::TabDelimiter {
            edge: Edge::Start,
            family: TabFamily::Long,
        },
        "end_of_tab" => LineKind::TabDelimiter {
            edge: Edge::End,
            family: TabFamily::Long,
        },
        "sot" => LineKind::TabDelimiter {
            edge: Edge::Start,
            family: TabFamily::Short,
        },
        "eot" => LineKind::TabDelimiter {
            edge: Edge::End,
            family: TabFamily::Short,
        },
        _ => {
            if let Some(kind) = section_kind(key, "start_of_", "so") {
                LineKind::SectionOpen { kind, name: value }
            } else if let Some(kind) = section_kind(key, "end_of_", "eo") {
                LineKind::SectionClose { kind }
            } else {
                LineKind::Directive { key, value }
            }
        }
    };
    Some(kind)
}

/// Resolve `start_of_<x>` / `so<alias>` (or the `end_of_` pair) to a kind.
fn section_kind<'a>(key: &'a str, long_prefix: &str, short_prefix: &str) -> Option<&'a str> {
    let len = long_prefix.len();
    if key.len() > len && key.is_char_boundary(len) && key[..len].eq_ignore_ascii_case(long_prefix) {
        return Some(&key[len..]);
    }
    let len = short_prefix.len();
    if key.len() == len + 1 && key.is_char_boundary(len) && key[..len].eq_ignore_ascii_case(short_prefix) {
        let alias = key[len..].to_ascii_lowercase();
        return SECTION_ALIASES
            .iter()
            .find(|(short, _)| *short == alias)
            .map(|(_, kind)| *kind);
    }
    None
}

/// Display name for a directive section without an explicit name:
/// `verse` -> `Verse`, `pre_chorus` -> `Pre Chorus`.
pub fn section_display_name(kind: &str) -> String {
    kind.split(['_', '-'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

pub fn is_comment_directive(key: &str) -> bool {
    let lower = key.to_ascii_lowercase();
    COMMENT_KEYS.contains(&lower.as_str())
}

/// `Name:` or `Name :` with nothing after the colon.
pub fn section_header(text: &str) -> Option<&str> {
    let name = text.trim().strip_suffix(':')?.trim();
    let valid = !name.is_empty()
        && !name.contains(':')
        && !name.starts_with(['[', '{', '(']);
    valid.then_some(name)
}

// ---------------------------------------------------------------------------
// Chord lines
// ---------------------------------------------------------------------------

/// Something anchored at a column of a chord line.
#[derive(Debug, Clone, PartialEq)]
pub enum ChordLineItem {
    Chord(Chord),
    Instruction(Instruction),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChordLineToken {
    /// Character column of the token's first character.
    pub column: usize,
    pub item: ChordLineItem,
}

/// Tokenize a line made only of chords and parenthesized instructions.
/// Returns `None` when any token is neither, or when no chord is present.
pub fn chord_line(text: &str) -> Option<Vec<ChordLineToken>> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        if chars[i].is_whitespace() {
            i += 1;
            continue;
        }

        let column = i;
        if chars[i] == '(' {
            let close = chars[i..].iter().position(|&c| c == ')')? + i;
            let content: String = chars[i + 1..close].iter().collect();
            if content.trim().is_empty() {
                return None;
            }
            tokens.push(ChordLineToken {
                column,
                item: ChordLineItem::Instruction(Instruction::new(content.trim())),
            });
            i = close + 1;
            continue;
        }

        let end = chord_token_end(&chars, i);
        let token: String = chars[i..end].iter().collect();
        let chord = chord::recognize(&token)?;
        tokens.push(ChordLineToken {
            column,
            item: ChordLineItem::Chord(chord),
        });
        i = end;
    }

    let has_chord = tokens
        .iter()
        .any(|token| matches!(token.item, ChordLineItem::Chord(_)));
    has_chord.then_some(tokens)
}

/// End of the chord candidate starting at `start`. A slash joins the words
/// on either side even when spaces surround it (`F / A`).
fn chord_token_end(chars: &[char], start: usize) -> usize {
    let word_end = |mut i: usize| {
        while i < chars.len() && !chars[i].is_whitespace() {
            i += 1;
        }
        i
    };
    let skip_spaces = |mut i: usize| {
        while i < chars.len() && chars[i].is_whitespace() {
            i += 1;
        }
        i
    };

    let end = word_end(start);
    let slash = if chars[end - 1] == '/' {
        end
    } else {
        let after = skip_spaces(end);
        if after == end || after >= chars.len() || chars[after] != '/' {
            return end;
        }
        let slash_end = word_end(after);
        if slash_end > after + 1 {
            // `C /G`
            return slash_end;
        }
        slash_end
    };

    // `C/ G` or `C / G`
    let next = skip_spaces(slash);
    if next < chars.len() { word_end(next) } else { slash }
}
