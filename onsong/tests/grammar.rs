use onsong::ast::{
    Annotation, FlowItem, Instruction, Line, MetatagValue, ResolvedEntry, SectionEntry, SectionId,
    SectionItem, Stanza,
};
use onsong::{ParseErrorKind, Parser};

fn parser(source: &str) -> Parser {
    Parser::new(source.to_string(), 0)
}

fn text(value: &str) -> MetatagValue {
    MetatagValue::Text(value.to_string())
}

fn stanza(lines: &[&str]) -> SectionItem {
    SectionItem::Stanza(Stanza {
        lines: lines.iter().map(|line| Line::plain(*line)).collect(),
    })
}

fn names(document: &onsong::Document) -> Vec<String> {
    document
        .resolved()
        .map(|entry| match entry {
            ResolvedEntry::Section(section) => section.name.clone().unwrap_or_default(),
            ResolvedEntry::Instruction(instruction) => instruction.to_string(),
        })
        .collect()
}

#[test]
fn implicit_title_and_artist() {
    let parsed = parser("Song Title\nArtist Name").parse_metadata().unwrap();
    let tags: Vec<_> = parsed
        .value
        .iter()
        .map(|tag| (tag.name.as_str(), tag.value.clone()))
        .collect();
    assert_eq!(
        tags,
        vec![("title", text("Song Title")), ("artist", text("Artist Name"))]
    );
    assert!(parsed.warnings.is_empty());
}

#[test]
fn implicit_title_then_explicit_tags() {
    let tags = parser("Song Title\nArtist:Artist Name").parse_metadata().unwrap().value;
    assert_eq!(tags[1].name, "artist");
    assert_eq!(tags[1].value, text("Artist Name"));

    let tags = parser("Song Title\nTime:3/4").parse_metadata().unwrap().value;
    assert_eq!(tags[1].name, "time");
    assert_eq!(tags[1].value, text("3/4"));
}

#[test]
fn metadata_continues_across_blank_lines() {
    let tags = parser("A: 1\n\nB:2\n\n").parse_metadata().unwrap().value;
    assert_eq!(tags.len(), 2);
    assert_eq!(tags[0].name, "a");
    assert_eq!(tags[1].value, text("2"));
}

#[test]
fn valueless_directive_does_not_end_metadata() {
    let source = "{title: X}\n{new_page}\n{key: G}\n\nVerse:\nWords";
    let document = onsong::parse(source).unwrap();
    let names: Vec<&str> = document.metadata.iter().map(|tag| tag.name.as_str()).collect();
    assert_eq!(names, ["title", "key"]);
    assert_eq!(document.metadata[1].value, text("G"));
    assert_eq!(document.warnings.len(), 1);
    assert!(document.warnings[0].message.contains("new_page"));
    assert_eq!(&source[document.warnings[0].span.clone()], "{new_page}");
}

#[test]
fn directive_metadata() {
    let tags = parser("{title: ChordPro}").parse_metadata().unwrap().value;
    assert_eq!(tags[0].name, "title");
    assert_eq!(tags[0].value, text("ChordPro"));
}

#[test]
fn valueless_tag_is_fatal() {
    let err = parser("Unknown Tag:").parse_metadata().unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::MissingMetatagValue);

    let err = onsong::parse("Key:\n\nVerse:\nWords").unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::MissingMetatagValue);
    assert_eq!(err.span, 0..4);
}

#[test]
fn section_headers() {
    for (source, name) in [
        ("Chorus:", "Chorus"),
        ("Verse 1:\n", "Verse 1"),
        ("Intro :", "Intro"),
        ("Intro: ", "Intro"),
    ] {
        assert_eq!(parser(source).parse_section_header().unwrap().value, name);
    }
}

#[test]
fn section_with_two_stanzas() {
    let section = parser("Chorus:\nThis is a stanza\n\nThis is another stanza")
        .parse_section()
        .unwrap()
        .value;
    assert_eq!(section.name.as_deref(), Some("Chorus"));
    assert_eq!(
        section.items,
        vec![stanza(&["This is a stanza"]), stanza(&["This is another stanza"])]
    );
}

#[test]
fn empty_sections() {
    let section = parser("Intro:\n\n").parse_section().unwrap().value;
    assert!(section.items.is_empty());

    let section = parser("{start_of_verse: Verse 1}\n{end_of_verse}")
        .parse_section()
        .unwrap()
        .value;
    assert_eq!(section.name.as_deref(), Some("Verse 1"));
    assert!(section.items.is_empty());

    let section = parser("{sov}\n{eov}").parse_section().unwrap().value;
    assert_eq!(section.name.as_deref(), Some("Verse"));
}

#[test]
fn section_after_blank_lines_and_tab() {
    let section = parser("Intro:\n\n\n[G]").parse_section().unwrap().value;
    assert_eq!(
        section.items,
        vec![SectionItem::Stanza(Stanza {
            lines: vec![Line {
                parts: vec![Annotation::chord("G", "")]
            }]
        })]
    );

    let section = parser("Intro:\n{sot}\ntab\n{eot}").parse_section().unwrap().value;
    assert_eq!(section.items.len(), 1);
    assert!(matches!(&section.items[0], SectionItem::Tab(tab) if tab.content == "tab\n"));
}

#[test]
fn anonymous_section() {
    let section = parser("Chord and lyrics").parse_section().unwrap().value;
    assert_eq!(section.name, None);
    assert_eq!(section.items, vec![stanza(&["Chord and lyrics"])]);
}

#[test]
fn chords_without_lyrics() {
    let items = parser("Am    F").parse_section_body().unwrap().value;
    assert_eq!(
        items,
        vec![SectionItem::Stanza(Stanza {
            lines: vec![Line {
                parts: vec![Annotation::chord("Am", "      "), Annotation::chord("F", "")]
            }]
        })]
    );
}

#[test]
fn amazing_grace() {
    let source = [
        "        D           G        D",
        "Amazing Grace, how sweet the sound",
        "                         A7",
        "That saved a wretch like me.",
    ]
    .join("\n");
    let items = parser(&source).parse_section_body().unwrap().value;
    let SectionItem::Stanza(stanza) = &items[0] else {
        panic!("expected a stanza");
    };
    assert_eq!(stanza.lines.len(), 2);
    assert_eq!(
        stanza.lines[1].parts,
        vec![
            Annotation::plain("That saved a wretch like "),
            Annotation::chord("A7", "me."),
        ]
    );
}

#[test]
fn inline_lines() {
    let line = parser("Ends with a chord [D]").parse_line().unwrap().value;
    assert_eq!(
        line.parts,
        vec![Annotation::plain("Ends with a chord "), Annotation::chord("D", "")]
    );

    let line = parser("[D]Starts with a chord").parse_line().unwrap().value;
    assert_eq!(line.parts, vec![Annotation::chord("D", "Starts with a chord")]);

    let line = parser("[G]Line (2x)").parse_line().unwrap().value;
    assert_eq!(
        line.parts,
        vec![Annotation::chord("G", "Line "), Annotation::instruction("2x", "")]
    );
}

#[test]
fn rogue_brackets_warn_but_parse() {
    let parsed = parser("Rogue [C#m]#pound sign").parse_line().unwrap();
    assert_eq!(parsed.value.parts[1], Annotation::chord("C#m", "#pound sign"));
    assert!(parsed.warnings.is_empty());

    let parsed = parser("Empty []chord").parse_line().unwrap();
    assert_eq!(parsed.value, Line::plain("Empty []chord"));
    assert_eq!(parsed.warnings.len(), 1);
    assert_eq!(parsed.warnings[0].span, 6..8);
}

#[test]
fn tabs() {
    let tab = parser("{sot}\nthe tab\nis here\n{eot}").parse_tab().unwrap().value;
    assert_eq!(tab.content, "the tab\nis here\n");

    let tab = parser("{sot}\npart1\n\npart2\n{eot}").parse_tab().unwrap().value;
    assert_eq!(tab.content, "part1\n\npart2\n");

    let err = parser("{sot}\ntab\n{end_of_tab}").parse_tab().unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::MismatchedTabDelimiter);

    let err = parser("{start_of_tab}\ntab\n{eot}").parse_tab().unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::MismatchedTabDelimiter);
}

#[test]
fn song_with_anonymous_section() {
    let document = onsong::parse("Title\n\nChord and lyrics").unwrap();
    assert_eq!(document.metadata.len(), 1);
    assert_eq!(document.metadata[0].value, text("Title"));
    assert_eq!(document.declared.len(), 1);
    assert_eq!(document.declared[0].name, None);
    assert!(document.warnings.is_empty());
}

#[test]
fn song_with_unknown_tags_and_empty_section() {
    let document =
        onsong::parse("Tempo: 73\nUnknown(s): Value:with@various:characters1-5\n\nChorus:").unwrap();
    assert_eq!(document.metadata[0].name, "tempo");
    assert_eq!(document.metadata[1].name, "unknown(s)");
    assert_eq!(
        document.metadata[1].value,
        text("Value:with@various:characters1-5")
    );
    assert_eq!(names(&document), vec!["Chorus"]);
}

#[test]
fn flow_by_abbreviation() {
    let document =
        onsong::parse("Title\nFlow: V1 C v1\n\nVerse 1:\nVerse\n\nChorus:\nChorus").unwrap();
    let flow = document.metatag("flow").unwrap();
    assert_eq!(
        flow.value,
        MetatagValue::Flow(vec![
            FlowItem::Reference("V1".to_string()),
            FlowItem::Reference("C".to_string()),
            FlowItem::Reference("V1".to_string()),
        ])
    );
    assert_eq!(names(&document), vec!["Verse 1", "Chorus", "Verse 1"]);
    assert_eq!(document.sections[0], document.sections[2]);
    assert_eq!(document.sections[0], SectionEntry::Section(SectionId(0)));

    let resolved: Vec<_> = document.resolved().collect();
    match (resolved[0], resolved[2]) {
        (ResolvedEntry::Section(a), ResolvedEntry::Section(b)) => assert!(std::ptr::eq(a, b)),
        other => panic!("expected sections, got {:?}", other),
    }
}

#[test]
fn flow_by_full_name() {
    let document = onsong::parse(
        "Title\nFlow: Verse 1, Chorus, Verse 1\n\nVerse 1:\nVerse\n\nChorus:\nChorus",
    )
    .unwrap();
    assert_eq!(names(&document), vec!["Verse 1", "Chorus", "Verse 1"]);
}

#[test]
fn flow_by_longer_prefix() {
    let document = onsong::parse(
        "Title\nFlow: Chor Verse1 Bri\n\nVerse 1:\nOne\n\nChorus:\nLa\n\nBridge:\nOver",
    )
    .unwrap();
    assert_eq!(names(&document), vec!["Chorus", "Verse 1", "Bridge"]);
}

#[test]
fn flow_with_instruction() {
    let document = onsong::parse("Title\nFlow: Chorus, (Repeat 2x)\n\nChorus:\nLyrics").unwrap();
    assert_eq!(
        document.sections,
        vec![
            SectionEntry::Section(SectionId(0)),
            SectionEntry::Instruction(Instruction::new("Repeat 2x")),
        ]
    );
}

#[test]
fn unresolved_flow_reference() {
    let source = "Title\nFlow: V1 Bridge\n\nVerse 1:\nVerse";
    let err = onsong::parse(source).unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::UnresolvedFlowReference);
    assert_eq!(&source[err.span.clone()], "Flow: V1 Bridge");
    assert!(err.notes.iter().any(|note| note.contains("Verse 1")));
}

#[test]
fn errors_carry_a_trace() {
    let err = onsong::parse("Title\n\nVerse:\n{sot}\ntab").unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::UnterminatedTab);
    assert!(err.trace.iter().any(|step| step.production == "Tab"));
}

#[test]
fn parses_crlf_sources() {
    let document = onsong::parse("Title\r\n\r\nVerse 1:\r\n[G]Hello\r\n").unwrap();
    assert_eq!(names(&document), vec!["Verse 1"]);
    let SectionItem::Stanza(stanza) = &document.declared[0].items[0] else {
        panic!("expected a stanza");
    };
    assert_eq!(stanza.lines[0].parts, vec![Annotation::chord("G", "Hello")]);
}

#[test]
fn concurrent_parses_keep_their_own_warnings() {
    let handles: Vec<_> = (0..4)
        .map(|i| {
            std::thread::spawn(move || {
                let source = format!("Title\n\nVerse:\n{}Words", "[] ".repeat(i));
                onsong::parse(&source).unwrap().warnings.len()
            })
        })
        .collect();
    let counts: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(counts, vec![0, 1, 2, 3]);
}
