use refscan_core::{Footnote, FootnoteNode};

use crate::marking;

/// Assemble raw footnote nodes into marked-text footnotes, in document order.
///
/// Separator pseudo-footnotes are skipped. An empty input (a document without
/// a footnotes part) gives an empty result.
pub fn assemble(nodes: &[FootnoteNode]) -> Vec<Footnote> {
    let footnotes: Vec<Footnote> = nodes
        .iter()
        .filter(|node| !node.kind.is_separator())
        .enumerate()
        .map(|(index, node)| Footnote {
            index,
            text: node
                .paragraphs
                .iter()
                .map(|p| marking::mark_runs(&p.runs))
                .collect(),
        })
        .collect();

    tracing::debug!(
        nodes = nodes.len(),
        footnotes = footnotes.len(),
        "assembled footnotes"
    );
    footnotes
}

/// Plain text of all footnotes joined by single spaces.
pub fn joined_plain_text(footnotes: &[Footnote]) -> String {
    footnotes
        .iter()
        .map(|f| marking::strip(&f.text))
        .collect::<Vec<_>>()
        .join(" ")
}
