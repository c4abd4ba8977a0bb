use serde::Deserialize;

use crate::address::Address;

/// One unit's computed replacement, keyed by structural address.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayRule {
    pub address: Address,
    /// Fully substituted display text, unescaped.
    pub text: String,
}

/// Presentation of the substituted text drawn by the overlay. The rule
/// shape itself (suppress the original, draw after it) is fixed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Theme {
    /// Font size in pixels of the substituted text.
    pub font_size: u32,
    /// CSS color of the substituted text.
    pub color: String,
    /// CSS font-weight of the substituted text.
    pub font_weight: String,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            font_size: 14,
            color: "hsla(0,0%,100%,.9)".to_string(),
            font_weight: "700".to_string(),
        }
    }
}

/// Separator units (a line of two or more dashes and nothing else) never
/// receive overlay rules.
pub fn is_separator(trimmed: &str) -> bool {
    trimmed.len() >= 2 && trimmed.chars().all(|c| c == '-')
}

/// Escape display text for a double-quoted CSS `content` string.
///
/// Order matters and is fixed: backslashes first, then quotes, then line
/// breaks to the CSS `\A ` sequence. Any other order double-escapes.
pub fn escape_content(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace("\r\n", "\\A ")
        .replace('\n', "\\A ")
}

/// Compile one rule pair: suppress the unit's native rendering, then draw
/// the substituted text after it. The underlying editable content is never
/// touched.
pub fn compile_rule(rule: &OverlayRule, theme: &Theme) -> String {
    let selector = rule.address.as_str();
    let content = escape_content(&rule.text);
    format!(
        "{selector} {{\n    font-size: 0 !important;\n    position: relative;\n}}\n{selector}::after {{\n    content: \"{content}\";\n    font-size: {size}px !important;\n    color: {color};\n    font-weight: {weight};\n    display: inline-block;\n}}\n",
        selector = selector,
        content = content,
        size = theme.font_size,
        color = theme.color,
        weight = theme.font_weight,
    )
}

/// Compile the full replacement stylesheet for one pass. An empty rule set
/// compiles to the empty string, which is how the overlay is cleared.
pub fn compile(rules: &[OverlayRule], theme: &Theme) -> String {
    rules
        .iter()
        .map(|rule| compile_rule(rule, theme))
        .collect::<Vec<_>>()
        .join("\n")
}
