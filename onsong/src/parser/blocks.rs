//! Sections and what they contain.
//!
//! A section is introduced by a `Name:` header or a `{start_of_x}`
//! directive. Its body is a run of stanzas (lines separated by blank lines)
//! and tab blocks.

use crate::ast::{Annotation, Line, Section, SectionItem, Stanza, Tab};
use crate::parser::ParseState;
use crate::parser::align;
use crate::parser::classify::{self, Edge, LineKind};
use crate::parser::error::{ParseError, ParseErrorKind};

/// `{sot}` ... `{eot}`. The content between the delimiter lines is kept
/// byte for byte.
pub(crate) fn tab(state: &mut ParseState<'_>) -> Result<Option<Tab>, ParseError> {
    state.attempt("Tab", |state| {
        let Some(open) = state.cursor.peek() else {
            return Ok(None);
        };
        let LineKind::TabDelimiter {
            edge: Edge::Start,
            family,
        } = classify::classify(open.text)
        else {
            return Ok(None);
        };
        state.cursor.advance();

        while let Some(line) = state.cursor.advance() {
            if let LineKind::TabDelimiter {
                edge: Edge::End,
                family: closing,
            } = classify::classify(line.text)
            {
                if closing != family {
                    return Err(state
                        .fail(
                            ParseErrorKind::MismatchedTabDelimiter,
                            format!(
                                "`{}` opened here is closed with `{}`",
                                family.delimiter(Edge::Start),
                                closing.delimiter(Edge::End)
                            ),
                            line.span(),
                        )
                        .with_note(format!("expected `{}`", family.delimiter(Edge::End))));
                }
                let content = state.source[open.next..line.start].to_string();
                return Ok(Some(Tab { content }));
            }
        }

        Err(state
            .fail(
                ParseErrorKind::UnterminatedTab,
                format!("`{}` is never closed", family.delimiter(Edge::Start)),
                open.span(),
            )
            .with_note(format!(
                "add `{}` after the tablature",
                family.delimiter(Edge::End)
            )))
    })
}

/// One rendered line: a chord line (merged with the lyric under it) or a
/// lyric line with optional inline chords.
pub(crate) fn stanza_line(state: &mut ParseState<'_>) -> Result<Option<Line>, ParseError> {
    state.attempt("Line", |state| {
        let Some(line) = state.cursor.peek() else {
            return Ok(None);
        };
        match classify::classify(line.text) {
            LineKind::ChordOnly => {
                let Some(tokens) = classify::chord_line(line.text) else {
                    return Ok(None);
                };
                state.cursor.advance();
                let lyric = state.cursor.peek().filter(|next| {
                    classify::classify(next.text) == LineKind::Lyric && !next.text.contains('[')
                });
                if lyric.is_some() {
                    state.cursor.advance();
                }
                Ok(Some(align::merge(&tokens, lyric.map(|next| next.text))))
            }
            LineKind::Lyric => {
                state.cursor.advance();
                align::inline_line(state, line).map(Some)
            }
            _ => Ok(None),
        }
    })
}

/// Consecutive lines up to a blank line or anything that is not a line.
/// Comment directives render as instruction lines.
fn stanza(state: &mut ParseState<'_>) -> Result<Option<Stanza>, ParseError> {
    state.attempt("Stanza", |state| {
        let mut lines = Vec::new();
        while let Some(line) = state.cursor.peek() {
            if let LineKind::Directive { key, value } = classify::classify(line.text) {
                if !classify::is_comment_directive(key) {
                    break;
                }
                state.cursor.advance();
                match value {
                    Some(text) => lines.push(Line {
                        parts: vec![Annotation::instruction(text, "")],
                    }),
                    None => state.warn(format!("`{{{}}}` has no text", key), line.span()),
                }
                continue;
            }
            match stanza_line(state)? {
                Some(line) => lines.push(line),
                None => break,
            }
        }
        Ok((!lines.is_empty()).then_some(Stanza { lines }))
    })
}

/// Stanzas and tabs up to the next section.
///
/// With `closing` set, the body belongs to a `{start_of_<kind>}` section
/// and ends at its close directive. A close of another kind is an error. A
/// body that runs into the next section or the end of input is closed
/// implicitly with a warning.
pub(crate) fn section_body(
    state: &mut ParseState<'_>,
    closing: Option<&str>,
) -> Result<Vec<SectionItem>, ParseError> {
    let mut items = Vec::new();
    loop {
        state.cursor.skip_blank();
        let Some(line) = state.cursor.peek() else {
            break;
        };

        match classify::classify(line.text) {
            LineKind::TabDelimiter {
                edge: Edge::Start, ..
            } => {
                if let Some(tab) = tab(state)? {
                    items.push(SectionItem::Tab(tab));
                }
            }
            LineKind::TabDelimiter {
                edge: Edge::End,
                family,
            } => {
                return Err(state
                    .fail(
                        ParseErrorKind::Syntax,
                        format!("`{}` without an open tab", family.delimiter(Edge::End)),
                        line.span(),
                    )
                    .with_note(format!("tabs start with `{}`", family.delimiter(Edge::Start))));
            }
            LineKind::SectionClose { kind } => match closing {
                Some(open) if open.eq_ignore_ascii_case(kind) => {
                    state.cursor.advance();
                    return Ok(items);
                }
                Some(open) => {
                    return Err(state
                        .fail(
                            ParseErrorKind::MismatchedSectionDelimiter,
                            format!("`{}` section closed as `{}`", open, kind),
                            line.span(),
                        )
                        .with_note(format!("expected `{{end_of_{}}}`", open)));
                }
                None => {
                    state.warn(
                        format!("`{}` closes a section that was never opened", line.text.trim()),
                        line.span(),
                    );
                    state.cursor.advance();
                }
            },
            LineKind::SectionOpen { .. } | LineKind::SectionHeader(_) => break,
            LineKind::Directive { key, .. } if !classify::is_comment_directive(key) => {
                state.warn(format!("unsupported directive `{}` skipped", key), line.span());
                state.cursor.advance();
            }
            LineKind::Directive { key, value: None } => {
                state.warn(format!("`{{{}}}` has no text", key), line.span());
                state.cursor.advance();
            }
            _ => match stanza(state)? {
                Some(stanza) => items.push(SectionItem::Stanza(stanza)),
                None => break,
            },
        }
    }

    if let Some(kind) = closing {
        let span = state.current_span();
        state.warn(format!("`{}` section is never closed", kind), span);
    }
    Ok(items)
}

/// A section with a header line or an opening directive.
pub(crate) fn section(state: &mut ParseState<'_>) -> Result<Option<Section>, ParseError> {
    state.attempt("Section", |state| {
        let Some(line) = state.cursor.peek() else {
            return Ok(None);
        };
        match classify::classify(line.text) {
            LineKind::SectionHeader(name) => {
                state.cursor.advance();
                let items = section_body(state, None)?;
                Ok(Some(Section {
                    name: Some(name.to_string()),
                    items,
                }))
            }
            LineKind::SectionOpen { kind, name } => {
                state.cursor.advance();
                let items = section_body(state, Some(kind))?;
                let name = match name {
                    Some(name) => name.to_string(),
                    None => classify::section_display_name(kind),
                };
                Ok(Some(Section {
                    name: Some(name),
                    items,
                }))
            }
            _ => Ok(None),
        }
    })
}

/// Body content that sits outside any section header.
pub(crate) fn loose_body(state: &mut ParseState<'_>) -> Result<Vec<SectionItem>, ParseError> {
    section_body(state, None)
}

/// An anonymous section: a non-empty loose body.
pub(crate) fn loose_section(state: &mut ParseState<'_>) -> Result<Option<Section>, ParseError> {
    state.attempt("AnonymousSection", |state| {
        let items = loose_body(state)?;
        Ok((!items.is_empty()).then_some(Section { name: None, items }))
    })
}
