use log::trace;

use notation::document::{Document, Element};

use crate::address::{Address, AddressBuilder};
use crate::eval;
use crate::overlay::{self, OverlayRule, Theme};
use crate::scope::{Scope, ScopeChain};
use crate::sum;

/// Everything one full recomputation pass produced.
#[derive(Debug, Clone)]
pub struct PassOutcome {
    /// One rule per directive-bearing unit of every block not being edited.
    pub rules: Vec<OverlayRule>,
    /// Addresses of every block container seen, edited or not.
    pub blocks: Vec<Address>,
}

/// Run one full pass over a snapshot.
///
/// The pass is side-effect-free and idempotent: an unchanged snapshot and
/// global scope produce byte-identical output. Blocks whose snapshot reports
/// edit focus contribute no rules, so their underlying text stays verbatim.
pub fn run(document: &Document, global: &Scope) -> PassOutcome {
    let mut outcome = PassOutcome {
        rules: Vec::new(),
        blocks: Vec::new(),
    };
    let mut path = AddressBuilder::new();
    path.push_root(&document.root.tag);
    walk(&document.root, &mut path, global, &mut outcome);
    trace!(
        "pass: {} blocks, {} rules",
        outcome.blocks.len(),
        outcome.rules.len()
    );
    outcome
}

/// Convenience wrapper: run a pass and compile the stylesheet.
pub fn render_document(document: &Document, global: &Scope, theme: &Theme) -> String {
    overlay::compile(&run(document, global).rules, theme)
}

fn walk(element: &Element, path: &mut AddressBuilder, global: &Scope, outcome: &mut PassOutcome) {
    for (i, child) in element.children.iter().enumerate() {
        path.push_child(&child.tag, i + 1);
        if child.is_block() {
            outcome.blocks.push(path.address());
            if child.focused {
                trace!("skipping block in edit focus: {}", path.address());
            } else {
                render_block(child, path, global, &mut outcome.rules);
            }
        } else {
            walk(child, path, global, outcome);
        }
        path.pop();
    }
}

/// Resolve one block: local scope from its assignments, then the block sum
/// over every unit, then per-unit substitution. Blocks are scoping
/// boundaries; nothing leaks between them except the global scope.
fn render_block(block: &Element, path: &mut AddressBuilder, global: &Scope, rules: &mut Vec<OverlayRule>) {
    let texts = block.unit_texts();
    let local = Scope::from_units(texts.iter().copied());
    let scopes = ScopeChain::new(&local, global);
    let sum = sum::block_sum(texts.iter().copied(), scopes);
    trace!("block {}: sum = {}", path.address(), sum);
    collect_unit_rules(block, path, sum, scopes, rules);
}

fn collect_unit_rules(
    element: &Element,
    path: &mut AddressBuilder,
    sum: f64,
    scopes: ScopeChain<'_>,
    rules: &mut Vec<OverlayRule>,
) {
    for (i, child) in element.children.iter().enumerate() {
        path.push_child(&child.tag, i + 1);
        if child.is_unit() {
            let trimmed = child.text.trim();
            if !trimmed.is_empty() && !overlay::is_separator(trimmed) {
                if let Some(text) = eval::render_unit(trimmed, sum, scopes) {
                    rules.push(OverlayRule {
                        address: path.address(),
                        text,
                    });
                }
            }
        } else {
            collect_unit_rules(child, path, sum, scopes, rules);
        }
        path.pop();
    }
}
