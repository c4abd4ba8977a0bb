use std::collections::HashMap;

use log::debug;

use notation::document::Document;

use crate::address::Address;
use crate::error::EngineError;
use crate::overlay::{self, Theme};
use crate::pass;
use crate::scope::Scope;

/// Notifications delivered by the host, processed in delivery order.
/// Handlers run to completion; nothing suspends mid-computation.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    /// The document became available; run the first pass.
    Ready,
    /// Content, structure or text changed somewhere in the observed subtree.
    Mutated,
    /// A block gained edit focus.
    FocusGained(Address),
    /// A block lost edit focus.
    FocusLost(Address),
}

/// Per-block scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockState {
    /// Overlay rules for the block are live (or it has none to show).
    Idle,
    /// The block holds edit focus; its text must stay verbatim.
    Editing,
    /// Another block holds focus; this block's rules went away with the
    /// global clear and return on the next recomputation.
    Suspended,
}

/// Read side of the host: a fresh snapshot per pass, carrying each unit's
/// current text and each block's live focus state.
pub trait DocumentSource {
    fn snapshot(&self) -> Document;
}

/// Write side of the host: receives the full replacement stylesheet on
/// every pass. Applying the empty string restores full visibility and
/// editability of the original text.
pub trait OverlaySink {
    fn apply(&mut self, stylesheet: &str) -> Result<(), EngineError>;
}

/// Drives recomputation from host notifications.
///
/// Owns the process-wide global scope: created empty at construction, read
/// by every block through the local-then-global chain, written only through
/// [`Scheduler::global_scope_mut`] — no pass ever writes it. All state is
/// confined to the thread the handlers run on.
pub struct Scheduler<S, K> {
    source: S,
    sink: K,
    theme: Theme,
    global: Scope,
    states: HashMap<Address, BlockState>,
}

impl<S: DocumentSource, K: OverlaySink> Scheduler<S, K> {
    pub fn new(source: S, sink: K) -> Self {
        Scheduler::with_theme(source, sink, Theme::default())
    }

    pub fn with_theme(source: S, sink: K, theme: Theme) -> Self {
        Scheduler {
            source,
            sink,
            theme,
            global: Scope::new(),
            states: HashMap::new(),
        }
    }

    pub fn global_scope(&self) -> &Scope {
        &self.global
    }

    pub fn global_scope_mut(&mut self) -> &mut Scope {
        &mut self.global
    }

    /// Current state of a block; blocks never seen are Idle.
    pub fn block_state(&self, address: &Address) -> BlockState {
        self.states
            .get(address)
            .copied()
            .unwrap_or(BlockState::Idle)
    }

    /// Process one host notification to completion.
    pub fn handle(&mut self, event: HostEvent) -> Result<(), EngineError> {
        match event {
            HostEvent::Ready => {
                debug!("document ready, running initial pass");
                self.recompute()
            }
            HostEvent::Mutated => {
                debug!("document mutated, recomputing");
                self.recompute()
            }
            HostEvent::FocusGained(address) => {
                debug!("focus gained: {}", address);
                for state in self.states.values_mut() {
                    *state = BlockState::Suspended;
                }
                self.states.insert(address, BlockState::Editing);
                // Cleared synchronously: no queued mutation can repopulate
                // the overlay before the original text is editable again.
                self.sink.apply("")
            }
            HostEvent::FocusLost(address) => {
                debug!("focus lost: {}", address);
                self.recompute()
            }
        }
    }

    /// Full recomputation: every tracked block returns to Idle, a fresh
    /// snapshot is walked, and the sink's contents are fully replaced.
    fn recompute(&mut self) -> Result<(), EngineError> {
        let snapshot = self.source.snapshot();
        let outcome = pass::run(&snapshot, &self.global);
        self.states = outcome
            .blocks
            .iter()
            .map(|address| (address.clone(), BlockState::Idle))
            .collect();
        debug!(
            "pass complete: {} blocks, {} rules",
            outcome.blocks.len(),
            outcome.rules.len()
        );
        self.sink.apply(&overlay::compile(&outcome.rules, &self.theme))
    }
}
