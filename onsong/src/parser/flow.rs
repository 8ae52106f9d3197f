//! Play order.
//!
//! Without a `flow` metatag every declared section plays once, in order.
//! With one, each reference is looked up among the declared sections: an
//! exact (case-insensitive) name match first, then an abbreviation such as
//! `V1` for `Verse 1` or `PC` for `Pre-Chorus`.

use crate::ast::{FlowItem, Metatag, MetatagValue, Section, SectionEntry, SectionId};
use crate::parser::ParseState;
use crate::parser::error::{ParseError, ParseErrorKind};

pub(crate) fn resolve(
    state: &ParseState<'_>,
    metadata: &[Metatag],
    declared: &[Section],
) -> Result<Vec<SectionEntry>, ParseError> {
    let flow = metadata.iter().find_map(|tag| match &tag.value {
        MetatagValue::Flow(items) if tag.name == "flow" => Some((tag, items)),
        _ => None,
    });
    let Some((tag, items)) = flow else {
        return Ok((0..declared.len())
            .map(|i| SectionEntry::Section(SectionId(i)))
            .collect());
    };

    let mut entries = Vec::with_capacity(items.len());
    for item in items {
        match item {
            FlowItem::Reference(name) => match find_section(name, declared) {
                Some(id) => {
                    log::debug!("flow `{}` resolved to section {}", name, id.0);
                    entries.push(SectionEntry::Section(id));
                }
                None => {
                    return Err(state
                        .fail(
                            ParseErrorKind::UnresolvedFlowReference,
                            format!("flow refers to `{}`, which is not a section", name),
                            tag.span.clone(),
                        )
                        .with_note(declared_note(declared)));
                }
            },
            FlowItem::Instruction(instruction) => {
                entries.push(SectionEntry::Instruction(instruction.clone()))
            }
        }
    }
    Ok(entries)
}

/// The first declared section a flow reference names.
pub fn find_section(reference: &str, declared: &[Section]) -> Option<SectionId> {
    let reference = reference.trim();
    let lowered = reference.to_lowercase();
    let named = || {
        declared
            .iter()
            .enumerate()
            .filter_map(|(i, section)| section.name.as_deref().map(|name| (i, name)))
    };

    named()
        .find(|(_, name)| name.trim().to_lowercase() == lowered)
        .or_else(|| {
            if !is_shorthand(reference) {
                return None;
            }
            named().find(|(_, name)| abbreviates(reference, name))
        })
        .map(|(i, _)| SectionId(i))
}

/// Letters followed by an optional number: `V1`, `Chor`, `Verse1`.
fn is_shorthand(token: &str) -> bool {
    let digits = token.trim_start_matches(char::is_alphabetic);
    digits.len() < token.len() && digits.chars().all(|c| c.is_ascii_digit())
}

/// `V1` abbreviates `Verse 1`, `C` abbreviates `Chorus`, `PC2` abbreviates
/// `Pre-Chorus 2`, `Chor` abbreviates `Chorus`. Numbers must agree exactly:
/// `V` is not `Verse 1`.
fn abbreviates(abbreviation: &str, name: &str) -> bool {
    let letters: String = abbreviation
        .chars()
        .take_while(|c| c.is_alphabetic())
        .collect::<String>()
        .to_lowercase();
    let digits = abbreviation.trim_start_matches(char::is_alphabetic);

    let name = name.trim();
    let words = name.trim_end_matches(|c: char| c.is_ascii_digit());
    let number = &name[words.len()..];
    let words = words.trim().to_lowercase();

    if digits != number || words.is_empty() {
        return false;
    }

    let first_word = words.split([' ', '\t', '-']).next().unwrap_or("");
    let initials: String = words
        .split(|c: char| c.is_whitespace() || c == '-')
        .filter_map(|word| word.chars().next())
        .collect();
    first_word.starts_with(&letters) || initials == letters
}

fn declared_note(declared: &[Section]) -> String {
    let names: Vec<&str> = declared
        .iter()
        .filter_map(|section| section.name.as_deref())
        .collect();
    if names.is_empty() {
        "no named sections are declared".to_string()
    } else {
        format!("declared sections: {}", names.join(", "))
    }
}
