use refscan_core::{Page, PositionedChar};
use refscan_parsing::{ParsingConfig, ParsingConfigBuilder};

/// One page laid out as lines of 5pt glyphs, with `text` joined by newlines.
fn page(number: u32, lines: &[(&str, f32)]) -> Page {
    let mut chars = Vec::new();
    let mut text = String::new();
    for (row, (line, x)) in lines.iter().enumerate() {
        let y = 72.0 + 14.0 * row as f32;
        for (i, c) in line.chars().enumerate() {
            chars.push(PositionedChar {
                text: c.to_string(),
                x: x + 5.0 * i as f32,
                y,
                page: number,
            });
        }
        text.push_str(line);
        text.push('\n');
    }
    Page {
        number,
        text,
        chars,
    }
}

fn manuscript() -> Vec<Page> {
    vec![
        page(
            26,
            &[
                ("As Bauckham shows, Rev 5:6 echoes Isa 53:7.", 72.0),
                ("The slain Lamb of 5:9, 12 is worshipped.", 72.0),
            ],
        ),
        page(27, &[("Aune reads 13:8 differently.", 72.0)]),
        page(
            28,
            &[
                ("BIBLIOGRAPHY START", 72.0),
                ("Aune, David E. Revelation 6-16.", 108.05),
                ("WBC 52B. Nashville: Nelson, 1998.", 144.05),
                ("Bauckham, Richard. The Climax of Prophecy.", 108.05),
                ("Edinburgh: T&T Clark, 1993.", 144.05),
            ],
        ),
    ]
}

#[test]
fn test_bibliography_and_author_pages() {
    let pages = manuscript();
    let config = ParsingConfig::default();

    let entries = refscan_parsing::bibliography_entries(&pages, &config);
    assert_eq!(entries.len(), 2);
    assert_eq!(
        entries[0].raw_text,
        "Aune, David E. Revelation 6-16. WBC 52B. Nashville: Nelson, 1998."
    );

    let index = refscan_parsing::author_pages(&pages, &config);
    assert_eq!(index.pages("Aune"), Some(&[27, 28][..]));
    assert_eq!(index.pages("Bauckham"), Some(&[26, 28][..]));
}

#[test]
fn test_scripture_references_carry_book_across_pages() {
    let pages = manuscript();
    let config = ParsingConfigBuilder::new().page_offset(-25).build().unwrap();

    let refs = refscan_parsing::scripture_references(&pages, &config);
    let summary: Vec<String> = refs.iter().map(|r| r.to_string()).collect();
    assert_eq!(
        summary,
        vec![
            "Revelation 5:6 (p. 0)",
            "Isaiah 53:7 (p. 0)",
            "Isaiah 5:9 (p. 0)",
            "Isaiah 5:12 (p. 0)",
            "Isaiah 13:8 (p. 1)",
        ]
    );
}
