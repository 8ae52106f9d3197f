//! Turning source lines into annotated [`Line`]s.
//!
//! Two layouts produce the same shape. Inline lines carry `[chord]` markers
//! inside the lyrics. Chord-over-lyric pairs anchor each chord at its
//! column in the line below.

use crate::ast::{Annotation, Instruction, Line, Marker};
use crate::parser::ParseState;
use crate::parser::chord;
use crate::parser::classify::{ChordLineItem, ChordLineToken};
use crate::parser::cursor::SourceLine;
use crate::parser::error::{ParseError, ParseErrorKind};

/// Parse a line with inline `[chord]` and `(instruction)` markers.
///
/// An escaped `\[...]` must hold a valid chord. An ordinary bracket that
/// does not is kept as lyrics with a warning, as is an unclosed `[`.
pub(crate) fn inline_line(
    state: &mut ParseState<'_>,
    line: SourceLine<'_>,
) -> Result<Line, ParseError> {
    let text = line.text;
    let mut builder = LineBuilder::default();
    let mut i = 0;

    while i < text.len() {
        let rest = &text[i..];

        if rest.starts_with("\\[") {
            let Some(close) = rest.find(']') else {
                return Err(state.fail(
                    ParseErrorKind::BracketedChord,
                    "escaped `\\[` is never closed",
                    line.sub_span(i..text.len()),
                ));
            };
            let span = line.sub_span(i..i + close + 1);
            let chord = chord::parse_bracketed_chord(&rest[..=close], span, state.file_id)
                .map_err(|error| state.traced(error))?;
            builder.anchor(Marker::Chord(chord));
            i += close + 1;
            continue;
        }

        if rest.starts_with('[') {
            // A second `[` before the `]` leaves the first one unmatched.
            let close = rest.find(']').filter(|close| !rest[1..*close].contains('['));
            match close {
                Some(close) => {
                    let raw = &rest[..=close];
                    match chord::recognize(&rest[1..close]) {
                        Some(chord) => builder.anchor(Marker::Chord(chord)),
                        None => {
                            state.warn(
                                format!("`{}` is not a chord; kept as lyrics", raw),
                                line.sub_span(i..i + close + 1),
                            );
                            builder.lyrics(raw);
                        }
                    }
                    i += close + 1;
                }
                None => {
                    state.warn("unclosed `[`; kept as lyrics", line.sub_span(i..i + 1));
                    builder.lyrics("[");
                    i += 1;
                }
            }
            continue;
        }

        if rest.starts_with('(') {
            if let Some(close) = rest.find(')') {
                let content = rest[1..close].trim();
                if !content.is_empty() {
                    builder.anchor(Marker::Instruction(Instruction::new(content)));
                    i += close + 1;
                    continue;
                }
            }
        }

        let Some(c) = rest.chars().next() else {
            break;
        };
        builder.push(c);
        i += c.len_utf8();
    }

    Ok(builder.finish())
}

/// Merge a chord line with the lyric line under it.
///
/// The lyric is padded with spaces out to the last anchor's column. Each
/// anchor owns the characters from its column up to the next anchor; the
/// last one runs to the end. Lyric text ahead of the first anchor, including
/// indentation, becomes an unannotated part. Parenthesized groups in the
/// lyric line become instruction anchors of their own, and their text is
/// left out of the lyrics.
pub fn merge(tokens: &[ChordLineToken], lyric: Option<&str>) -> Line {
    let has_lyric = lyric.is_some();
    let lyric: Vec<char> = lyric.unwrap_or("").chars().collect();
    let (groups, masked) = lyric_instructions(&lyric);

    let mut anchors: Vec<(usize, Marker)> = tokens
        .iter()
        .map(|token| {
            let marker = match &token.item {
                ChordLineItem::Chord(chord) => Marker::Chord(chord.clone()),
                ChordLineItem::Instruction(instruction) => {
                    Marker::Instruction(instruction.clone())
                }
            };
            (token.column, marker)
        })
        .collect();
    // Stable: on a shared column the chord-line anchor stays first.
    anchors.extend(groups);
    anchors.sort_by_key(|(column, _)| *column);

    let width = anchors
        .last()
        .map(|(column, _)| *column)
        .unwrap_or(0)
        .max(lyric.len());
    let slice = |from: usize, to: usize| -> String {
        (from..to)
            .filter(|i| !masked.get(*i).copied().unwrap_or(false))
            .map(|i| lyric.get(i).copied().unwrap_or(' '))
            .collect()
    };

    let mut parts = Vec::new();
    if let Some((first, _)) = anchors.first() {
        let lead = slice(0, *first);
        if !lead.is_empty() && (has_lyric || !lead.trim().is_empty()) {
            parts.push(Annotation::plain(lead));
        }
    }
    for (i, (column, marker)) in anchors.iter().enumerate() {
        let end = anchors.get(i + 1).map(|(next, _)| *next).unwrap_or(width);
        parts.push(Annotation {
            annotation: Some(marker.clone()),
            lyrics: slice(*column, end),
        });
    }
    if parts.is_empty() {
        parts.push(Annotation::plain(slice(0, width)));
    }
    Line { parts }
}

/// `(...)` groups in a lyric line: their anchors, and which character
/// positions they cover.
fn lyric_instructions(lyric: &[char]) -> (Vec<(usize, Marker)>, Vec<bool>) {
    let mut anchors = Vec::new();
    let mut masked = vec![false; lyric.len()];
    let mut i = 0;
    while i < lyric.len() {
        if lyric[i] == '(' {
            if let Some(offset) = lyric[i..].iter().position(|&c| c == ')') {
                let close = i + offset;
                let content: String = lyric[i + 1..close].iter().collect();
                if !content.trim().is_empty() {
                    anchors.push((i, Marker::Instruction(Instruction::new(content.trim()))));
                    masked[i..=close].iter_mut().for_each(|m| *m = true);
                    i = close + 1;
                    continue;
                }
            }
        }
        i += 1;
    }
    (anchors, masked)
}

#[derive(Default)]
struct LineBuilder {
    parts: Vec<Annotation>,
    current: Option<Annotation>,
}

impl LineBuilder {
    fn anchor(&mut self, marker: Marker) {
        if let Some(current) = self.current.take() {
            self.parts.push(current);
        }
        self.current = Some(Annotation {
            annotation: Some(marker),
            lyrics: String::new(),
        });
    }

    fn current(&mut self) -> &mut Annotation {
        self.current.get_or_insert_with(|| Annotation::plain(""))
    }

    fn push(&mut self, c: char) {
        self.current().lyrics.push(c);
    }

    fn lyrics(&mut self, text: &str) {
        self.current().lyrics.push_str(text);
    }

    fn finish(mut self) -> Line {
        if let Some(current) = self.current.take() {
            self.parts.push(current);
        }
        if self.parts.is_empty() {
            self.parts.push(Annotation::plain(""));
        }
        Line { parts: self.parts }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::classify::chord_line;

    fn merged(chords: &str, lyric: Option<&str>) -> Line {
        merge(&chord_line(chords).expect("chord line"), lyric)
    }

    fn inline(text: &str) -> (Line, usize) {
        let mut state = ParseState::new(text, 0);
        let line = state.cursor.peek().expect("one line");
        let parsed = inline_line(&mut state, line).expect("inline line");
        (parsed, state.warnings.len())
    }

    #[test]
    fn aligns_chords_over_lyrics() {
        let line = merged(
            "        D           G        D",
            Some("Amazing Grace, how sweet the sound"),
        );
        assert_eq!(
            line.parts,
            vec![
                Annotation::plain("Amazing "),
                Annotation::chord("D", "Grace, how s"),
                Annotation::chord("G", "weet the "),
                Annotation::chord("D", "sound"),
            ]
        );
    }

    #[test]
    fn pads_short_lyrics() {
        let line = merged("G      D", Some("Lyric"));
        assert_eq!(
            line.parts,
            vec![Annotation::chord("G", "Lyric  "), Annotation::chord("D", "")]
        );
    }

    #[test]
    fn keeps_lyric_indentation() {
        let line = merged("    G", Some("    Hey"));
        assert_eq!(
            line.parts,
            vec![Annotation::plain("    "), Annotation::chord("G", "Hey")]
        );

        let line = merged("    G", None);
        assert_eq!(line.parts, vec![Annotation::chord("G", "")]);
    }

    #[test]
    fn chords_without_lyrics_keep_spacing() {
        let line = merged("Am    F", None);
        assert_eq!(
            line.parts,
            vec![Annotation::chord("Am", "      "), Annotation::chord("F", "")]
        );
    }

    #[test]
    fn instruction_on_chord_line_anchors_at_column() {
        let line = merged("G (strum once)", Some("Lyrics"));
        assert_eq!(
            line.parts,
            vec![
                Annotation::chord("G", "Ly"),
                Annotation::instruction("strum once", "rics"),
            ]
        );
    }

    #[test]
    fn lyric_groups_become_instructions() {
        let line = merged("G", Some("Sing it (2x)"));
        assert_eq!(
            line.parts,
            vec![
                Annotation::chord("G", "Sing it "),
                Annotation::instruction("2x", ""),
            ]
        );
    }

    #[test]
    fn merged_lyrics_account_for_every_character() {
        let lyric = "That saved a wretch like me.";
        let line = merged("                        A7", Some(lyric));
        let total: String = line.parts.iter().map(|part| part.lyrics.as_str()).collect();
        assert_eq!(total, lyric);
    }

    #[test]
    fn inline_chords_split_lyrics() {
        let (line, warnings) = inline("This [D]is a s[G]ong,");
        assert_eq!(line.to_string(), "This [D]is a s[G]ong,");
        assert_eq!(line.parts.len(), 3);
        assert_eq!(warnings, 0);
    }

    #[test]
    fn inline_lines_reprint_as_written() {
        for text in [
            "This [D]is a s[G]ong,",
            "[G]Line (2x)",
            "Ends with a chord [D]",
            "[F / A]Slash [Dm7(b5)]chords",
            "Just lyrics",
        ] {
            let (line, _) = inline(text);
            assert_eq!(line.to_string(), text);
        }
    }

    #[test]
    fn inline_instruction_after_chord() {
        let (line, _) = inline("[G] (strum once) Lyrics");
        assert_eq!(
            line.parts,
            vec![
                Annotation::chord("G", " "),
                Annotation::instruction("strum once", " Lyrics"),
            ]
        );
    }

    #[test]
    fn stray_brackets_are_lyrics() {
        let (line, warnings) = inline("Rogue C] square bracket");
        assert_eq!(line.parts, vec![Annotation::plain("Rogue C] square bracket")]);
        assert_eq!(warnings, 0);

        let (line, warnings) = inline("Empty []chord");
        assert_eq!(line.parts, vec![Annotation::plain("Empty []chord")]);
        assert_eq!(warnings, 1);
    }

    #[test]
    fn unmatched_bracket_before_a_chord() {
        let (line, warnings) = inline("Hey [ab [G]there");
        assert_eq!(
            line.parts,
            vec![Annotation::plain("Hey [ab "), Annotation::chord("G", "there")]
        );
        assert_eq!(warnings, 1);
    }

    #[test]
    fn escaped_bracket_must_hold_a_chord() {
        let (line, _) = inline("\\[G]Hey");
        assert_eq!(line.parts, vec![Annotation::chord("G", "Hey")]);

        let mut state = ParseState::new("\\[nope]", 0);
        let source_line = state.cursor.peek().expect("one line");
        let err = inline_line(&mut state, source_line).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::BracketedChord);
    }
}
