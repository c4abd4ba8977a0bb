use std::collections::HashMap;

use notation::annotation::{self, Annotation};

/// A flat variable scope: name → numeric value.
///
/// Two instances participate in every resolution: a local scope rebuilt from
/// a block's assignments each pass, and the process-wide global scope that
/// outlives passes. Same type, different lifetimes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scope {
    values: HashMap<String, f64>,
}

impl Scope {
    pub fn new() -> Self {
        Scope {
            values: HashMap::new(),
        }
    }

    /// Build a block's local scope: apply every assignment found in any of
    /// the block's units, in document order. Later assignments to the same
    /// name overwrite earlier ones.
    pub fn from_units<'a>(units: impl IntoIterator<Item = &'a str>) -> Self {
        let mut scope = Scope::new();
        for text in units {
            for annotation in annotation::scan(text) {
                if let Annotation::Assignment { name, value } = annotation {
                    scope.set(&name, value);
                }
            }
        }
        scope
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn set(&mut self, name: &str, value: f64) {
        self.values.insert(name.to_string(), value);
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}

/// Where a name resolved, if anywhere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lookup {
    /// Bound in the block's local scope (shadows any global binding).
    Local(f64),
    /// Bound only in the global scope.
    Global(f64),
    /// Bound nowhere. Worth 0, never an error.
    Unbound,
}

/// Local-then-global resolution chain for one block within one pass.
#[derive(Debug, Clone, Copy)]
pub struct ScopeChain<'a> {
    pub local: &'a Scope,
    pub global: &'a Scope,
}

impl<'a> ScopeChain<'a> {
    pub fn new(local: &'a Scope, global: &'a Scope) -> Self {
        ScopeChain { local, global }
    }

    pub fn lookup(&self, name: &str) -> Lookup {
        if let Some(value) = self.local.get(name) {
            return Lookup::Local(value);
        }
        if let Some(value) = self.global.get(name) {
            return Lookup::Global(value);
        }
        Lookup::Unbound
    }

    pub fn resolve_or_zero(&self, name: &str) -> f64 {
        match self.lookup(name) {
            Lookup::Local(value) | Lookup::Global(value) => value,
            Lookup::Unbound => 0.0,
        }
    }
}
