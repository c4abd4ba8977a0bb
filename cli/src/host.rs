//! Plain-text host adapter: a file stands in for the editable surface.
//!
//! Empty lines separate blocks; every other line is one text unit. Each
//! block becomes a `div[role=textbox]` under `html > body`, each unit a
//! `p`, so structural addresses look exactly like they would against a
//! live editor tree.

use notation::document::{Document, Element};

use engine::eval;
use engine::scope::{Scope, ScopeChain};
use engine::sum;

/// Parse a document file into a snapshot tree.
pub fn parse_document(source: &str) -> Document {
    let mut blocks: Vec<Element> = Vec::new();
    let mut units: Vec<Element> = Vec::new();

    for line in source.lines() {
        if line.is_empty() {
            if !units.is_empty() {
                blocks.push(Element::block(std::mem::take(&mut units)));
            }
        } else {
            units.push(Element::unit(line));
        }
    }
    if !units.is_empty() {
        blocks.push(Element::block(units));
    }

    Document::page(blocks)
}

/// Like [`parse_document`], but yields raw unit texts with their byte
/// offsets in the source, grouped by block — the shape the check pipeline
/// wants for spanned diagnostics.
pub fn parse_blocks_with_offsets(source: &str) -> Vec<Vec<(&str, usize)>> {
    let mut blocks = Vec::new();
    let mut units: Vec<(&str, usize)> = Vec::new();
    let mut offset = 0;

    for raw_line in source.split('\n') {
        let line = raw_line.strip_suffix('\r').unwrap_or(raw_line);
        if line.is_empty() {
            if !units.is_empty() {
                blocks.push(std::mem::take(&mut units));
            }
        } else {
            units.push((line, offset));
        }
        offset += raw_line.len() + 1;
    }
    if !units.is_empty() {
        blocks.push(units);
    }

    blocks
}

/// Mark blocks as being edited, by 0-based index. Out-of-range indices are
/// ignored.
pub fn mark_focused(document: &mut Document, indices: &[usize]) {
    for (i, block) in document.blocks_mut().into_iter().enumerate() {
        if indices.contains(&i) {
            block.focused = true;
        }
    }
}

/// Render the document the way a reader would see it through the overlay:
/// substituted text per unit, verbatim text for edited blocks, blank lines
/// between blocks.
pub fn render_text(document: &Document, global: &Scope) -> String {
    let mut out = String::new();

    for (i, block) in document.blocks().iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let texts = block.unit_texts();
        let local = Scope::from_units(texts.iter().copied());
        let scopes = ScopeChain::new(&local, global);
        let sum = sum::block_sum(texts.iter().copied(), scopes);

        for text in texts {
            if block.focused {
                out.push_str(text);
            } else {
                let trimmed = text.trim();
                match eval::render_unit(trimmed, sum, scopes) {
                    Some(rendered) => out.push_str(&rendered),
                    None => out.push_str(text),
                }
            }
            out.push('\n');
        }
    }

    out
}
