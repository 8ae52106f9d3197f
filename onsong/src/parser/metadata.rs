//! Metadata head of a song.
//!
//! Metatags are read from the top until a line no longer parses as one.
//! Blank lines between metatags are allowed. When the song opens with plain
//! lines instead, the first is the title and the one right after it the
//! artist.

use crate::ast::{FlowItem, Instruction, Metatag, MetatagValue};
use crate::parser::ParseState;
use crate::parser::classify::{self, LineKind};
use crate::parser::cursor::SourceLine;
use crate::parser::error::{ParseError, ParseErrorKind};

/// Names that announce a metatag even without a value, so `Key:` on its own
/// is a mistake rather than a section header.
const KNOWN_TAGS: [&str; 19] = [
    "title",
    "artist",
    "author",
    "key",
    "tempo",
    "time",
    "capo",
    "flow",
    "copyright",
    "ccli",
    "album",
    "year",
    "book",
    "number",
    "topic",
    "keywords",
    "duration",
    "transpose",
    "tags",
];

pub(crate) fn metadata(state: &mut ParseState<'_>) -> Result<Vec<Metatag>, ParseError> {
    let tags = state.attempt("Metadata", |state| {
        state.cursor.skip_blank();
        let mut tags = Vec::new();

        if let Some(title) = state.attempt("ImplicitTitle", |state| implicit(state, "title"))? {
            tags.push(title);
            if let Some(artist) =
                state.attempt("ImplicitArtist", |state| implicit(state, "artist"))?
            {
                tags.push(artist);
            }
        }

        loop {
            let checkpoint = state.cursor.checkpoint();
            state.cursor.skip_blank();
            match state.attempt("Metatag", metatag)? {
                Some(HeadLine::Tag(tag)) => tags.push(tag),
                Some(HeadLine::Skipped) => {}
                None => {
                    state.cursor.rewind(checkpoint);
                    break;
                }
            }
        }
        Ok(Some(tags))
    })?;
    Ok(tags.unwrap_or_default())
}

/// When metadata is parsed on its own, a leftover `Name:` line was meant
/// as a tag with a missing value.
pub(crate) fn expect_no_leftover_tag(state: &mut ParseState<'_>) -> Result<(), ParseError> {
    let checkpoint = state.cursor.checkpoint();
    state.cursor.skip_blank();
    if let Some(line) = state.cursor.peek() {
        if let Some((key, None)) = candidate(line.text) {
            return Err(missing_value(state, key, line));
        }
    }
    state.cursor.rewind(checkpoint);
    Ok(())
}

/// A plain line standing in for `name`.
fn implicit(state: &mut ParseState<'_>, name: &str) -> Result<Option<Metatag>, ParseError> {
    let Some(line) = state.cursor.peek() else {
        return Ok(None);
    };
    // Lines with inline chords are already lyrics.
    let plain = classify::classify(line.text) == LineKind::Lyric && !line.text.contains('[');
    if !plain || candidate(line.text).is_some() {
        return Ok(None);
    }
    state.cursor.advance();
    Ok(Some(Metatag {
        name: name.to_string(),
        value: MetatagValue::Text(line.text.trim().to_string()),
        span: line.span(),
    }))
}

/// A line consumed from the metadata head.
enum HeadLine {
    Tag(Metatag),
    /// A valueless directive such as `{new_page}`.
    Skipped,
}

fn metatag(state: &mut ParseState<'_>) -> Result<Option<HeadLine>, ParseError> {
    let Some(line) = state.cursor.peek() else {
        return Ok(None);
    };
    let Some((key, value)) = candidate(line.text) else {
        return Ok(None);
    };
    let name = normalize_name(key);

    let Some(value) = value else {
        if KNOWN_TAGS.contains(&name.as_str()) {
            return Err(missing_value(state, key, line));
        }
        if let LineKind::Directive { .. } = classify::classify(line.text) {
            state.cursor.advance();
            state.warn(format!("directive `{}` has no value and was skipped", key), line.span());
            return Ok(Some(HeadLine::Skipped));
        }
        // Probably a section header.
        return Ok(None);
    };

    state.cursor.advance();
    let value = if name == "flow" {
        MetatagValue::Flow(parse_flow(value))
    } else {
        MetatagValue::Text(value.to_string())
    };
    Ok(Some(HeadLine::Tag(Metatag {
        name,
        value,
        span: line.span(),
    })))
}

fn missing_value(state: &ParseState<'_>, key: &str, line: SourceLine<'_>) -> ParseError {
    state
        .fail(
            ParseErrorKind::MissingMetatagValue,
            format!("metatag `{}` has no value", key),
            line.span(),
        )
        .with_note("a colon after a name declares a metatag; add a value after it")
}

/// A line that could declare a metatag: `Key: value`, `{key: value}`, or a
/// valueless `Key:`. Returns the raw key and the value, if any.
fn candidate(text: &str) -> Option<(&str, Option<&str>)> {
    match classify::classify(text) {
        LineKind::Directive { key, value } if !classify::is_comment_directive(key) => {
            Some((key, value))
        }
        LineKind::SectionHeader(name) => Some((name, None)),
        LineKind::Lyric => colon_pair(text).map(|(key, value)| (key, Some(value))),
        _ => None,
    }
}

/// `Key: value`, split at the first colon.
fn colon_pair(text: &str) -> Option<(&str, &str)> {
    let (key, value) = text.split_once(':')?;
    let key = key.trim();
    let value = value.trim();
    let valid = !key.is_empty() && !value.is_empty() && !key.starts_with(['[', '{', '(']);
    valid.then_some((key, value))
}

/// Lowercase and collapse aliases.
pub fn normalize_name(name: &str) -> String {
    let lower = name.trim().to_lowercase();
    match lower.as_str() {
        "t" => "title".to_string(),
        "st" | "subtitle" => "artist".to_string(),
        _ => lower,
    }
}

// ---------------------------------------------------------------------------
// Flow values
// ---------------------------------------------------------------------------

/// Split a `flow` value into section references and instructions.
///
/// A value with a comma outside parentheses is split on commas, anything
/// else on whitespace. Short abbreviations (`v1`, `pc`) are upper-cased.
pub fn parse_flow(value: &str) -> Vec<FlowItem> {
    let comma_separated = has_comma_outside_parens(value);
    let chars: Vec<char> = value.chars().collect();
    let mut items = Vec::new();
    let mut current = String::new();

    let flush = |current: &mut String, items: &mut Vec<FlowItem>| {
        let token = current.trim();
        if !token.is_empty() {
            items.push(FlowItem::Reference(normalize_reference(token)));
        }
        current.clear();
    };

    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '(' {
            if let Some(offset) = chars[i..].iter().position(|&c| c == ')') {
                let close = i + offset;
                let content: String = chars[i + 1..close].iter().collect();
                if !content.trim().is_empty() {
                    flush(&mut current, &mut items);
                    items.push(FlowItem::Instruction(Instruction::new(content.trim())));
                    i = close + 1;
                    continue;
                }
            }
        }
        let separator = if comma_separated {
            c == ','
        } else {
            c.is_whitespace()
        };
        if separator {
            flush(&mut current, &mut items);
        } else {
            current.push(c);
        }
        i += 1;
    }
    flush(&mut current, &mut items);
    items
}

fn has_comma_outside_parens(value: &str) -> bool {
    let mut depth = 0usize;
    for c in value.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => return true,
            _ => {}
        }
    }
    false
}

fn normalize_reference(token: &str) -> String {
    if is_abbreviation(token) {
        token.to_uppercase()
    } else {
        token.to_string()
    }
}

/// One or two letters and an optional number: `V1`, `C`, `PC2`.
fn is_abbreviation(token: &str) -> bool {
    let letters = token.chars().take_while(|c| c.is_alphabetic()).count();
    (1..=2).contains(&letters) && token.chars().skip(letters).all(|c| c.is_ascii_digit())
}
