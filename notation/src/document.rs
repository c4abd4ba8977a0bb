/// Role marking an element as an independently editable block container.
pub const BLOCK_ROLE: &str = "textbox";

/// Tag of elements treated as text units inside a block.
pub const UNIT_TAG: &str = "p";

/// Snapshot of the host surface, captured fresh at the start of every pass.
/// Nothing in the tree persists across passes; identity is carried only by
/// the structural address scheme.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub root: Element,
}

/// One element in the snapshot tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Lowercase tag name ("html", "body", "div", "p", ...).
    pub tag: String,
    /// Host role attribute. `textbox` marks an editable block container.
    pub role: Option<String>,
    /// True while the element holds edit focus. Meaningful on blocks only.
    pub focused: bool,
    /// Rendered text content. Meaningful on text units only.
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    /// A plain container element.
    pub fn container(tag: impl Into<String>, children: Vec<Element>) -> Self {
        Element {
            tag: tag.into(),
            role: None,
            focused: false,
            text: String::new(),
            children,
        }
    }

    /// An editable block containing the given units.
    pub fn block(units: Vec<Element>) -> Self {
        Element {
            tag: "div".to_string(),
            role: Some(BLOCK_ROLE.to_string()),
            focused: false,
            text: String::new(),
            children: units,
        }
    }

    /// A text unit (one line/paragraph of a block).
    pub fn unit(text: impl Into<String>) -> Self {
        Element {
            tag: UNIT_TAG.to_string(),
            role: None,
            focused: false,
            text: text.into(),
            children: Vec::new(),
        }
    }

    pub fn with_focus(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    pub fn is_block(&self) -> bool {
        self.role.as_deref() == Some(BLOCK_ROLE)
    }

    pub fn is_unit(&self) -> bool {
        self.tag == UNIT_TAG
    }

    /// Raw texts of every unit under this element, in document order.
    pub fn unit_texts(&self) -> Vec<&str> {
        let mut texts = Vec::new();
        collect_unit_texts(self, &mut texts);
        texts
    }
}

fn collect_unit_texts<'a>(element: &'a Element, texts: &mut Vec<&'a str>) {
    for child in &element.children {
        if child.is_unit() {
            texts.push(child.text.as_str());
        } else {
            collect_unit_texts(child, texts);
        }
    }
}

impl Document {
    pub fn new(root: Element) -> Self {
        Document { root }
    }

    /// A minimal page: `html > body` wrapping the given children.
    pub fn page(children: Vec<Element>) -> Self {
        Document::new(Element::container(
            "html",
            vec![Element::container("body", children)],
        ))
    }

    /// Every block container in document order. Blocks are scoping
    /// boundaries: a block nested inside another is not descended into.
    pub fn blocks(&self) -> Vec<&Element> {
        let mut blocks = Vec::new();
        collect_blocks(&self.root, &mut blocks);
        blocks
    }

    /// Mutable variant of [`Document::blocks`], for hosts that flip focus
    /// flags after building the snapshot.
    pub fn blocks_mut(&mut self) -> Vec<&mut Element> {
        let mut blocks = Vec::new();
        collect_blocks_mut(&mut self.root, &mut blocks);
        blocks
    }
}

fn collect_blocks<'a>(element: &'a Element, blocks: &mut Vec<&'a Element>) {
    for child in &element.children {
        if child.is_block() {
            blocks.push(child);
        } else {
            collect_blocks(child, blocks);
        }
    }
}

fn collect_blocks_mut<'a>(element: &'a mut Element, blocks: &mut Vec<&'a mut Element>) {
    for child in &mut element.children {
        if child.is_block() {
            blocks.push(child);
        } else {
            collect_blocks_mut(child, blocks);
        }
    }
}
