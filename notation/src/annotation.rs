/// A `{}`-delimited inline annotation. Every variant contributes to its
/// block's running sum; assignments additionally bind a local variable.
#[derive(Debug, Clone, PartialEq)]
pub enum Annotation {
    /// `{123}` — contributes the literal value.
    Number(f64),
    /// `{name=5}` — contributes the value and binds `name` in the block's
    /// local scope. The name may be any word-char run, digits included.
    Assignment { name: String, value: f64 },
    /// `{name}` — contributes the name's resolved value (0 when unbound).
    Reference(String),
}

/// Word characters as the annotation grammar counts them.
pub fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Characters that may start an identifier (references and `$name` tokens).
pub fn is_ident_head(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

/// Scan a unit's raw text for annotations, in document order.
///
/// Unrecognized brace groups are left as literal text and scanning resumes
/// one char past the opening brace, so an inner group like `{a{5}` still
/// yields `{5}`. Classification precedence for a matched group: assignment,
/// then numeric literal, then name reference.
pub fn scan(text: &str) -> Vec<Annotation> {
    let chars: Vec<char> = text.chars().collect();
    let mut annotations = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        if chars[i] != '{' {
            i += 1;
            continue;
        }
        match match_annotation(&chars[i + 1..]) {
            Some((annotation, consumed)) => {
                annotations.push(annotation);
                i += consumed + 1;
            }
            None => i += 1,
        }
    }

    annotations
}

/// Try to match one annotation immediately after an opening brace.
/// Returns the annotation and the number of chars consumed, closing brace
/// included. Padding is only tolerated around the `=` of an assignment.
fn match_annotation(rest: &[char]) -> Option<(Annotation, usize)> {
    let mut i = 0;
    while i < rest.len() && is_word_char(rest[i]) {
        i += 1;
    }
    if i == 0 {
        return None;
    }
    let head: String = rest[..i].iter().collect();

    // `{digits}` or `{identifier}`
    if rest.get(i) == Some(&'}') {
        let annotation = if head.chars().all(|c| c.is_ascii_digit()) {
            Annotation::Number(head.parse().ok()?)
        } else if is_ident_head(rest[0]) {
            Annotation::Reference(head)
        } else {
            return None;
        };
        return Some((annotation, i + 1));
    }

    // `{name = digits}`
    while rest.get(i).is_some_and(|c| c.is_whitespace()) {
        i += 1;
    }
    if rest.get(i) != Some(&'=') {
        return None;
    }
    i += 1;
    while rest.get(i).is_some_and(|c| c.is_whitespace()) {
        i += 1;
    }
    let value_start = i;
    while rest.get(i).is_some_and(|c| c.is_ascii_digit()) {
        i += 1;
    }
    if i == value_start || rest.get(i) != Some(&'}') {
        return None;
    }
    let value: f64 = rest[value_start..i].iter().collect::<String>().parse().ok()?;

    Some((Annotation::Assignment { name: head, value }, i + 1))
}
