use std::fmt;

/// A deterministic structural path to an element, e.g.
/// `html > body > div:nth-child(3) > p:nth-child(2)`.
///
/// Stable as long as the ancestor chain's element composition is unchanged;
/// recomputed fresh every pass, never cached across structural changes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address(String);

impl Address {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Accumulates path segments while a pass walks the snapshot tree.
///
/// The root element contributes its bare tag; every descendant contributes
/// `tag:nth-child(i)` with its 1-based position among element siblings.
#[derive(Debug, Default)]
pub struct AddressBuilder {
    segments: Vec<String>,
}

impl AddressBuilder {
    pub fn new() -> Self {
        AddressBuilder::default()
    }

    pub fn push_root(&mut self, tag: &str) {
        self.segments.push(tag.to_string());
    }

    pub fn push_child(&mut self, tag: &str, position: usize) {
        self.segments.push(format!("{}:nth-child({})", tag, position));
    }

    pub fn pop(&mut self) {
        self.segments.pop();
    }

    /// The address of the element the builder currently points at.
    pub fn address(&self) -> Address {
        Address(self.segments.join(" > "))
    }
}
