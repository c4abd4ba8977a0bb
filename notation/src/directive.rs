/// A `[[...]]` directive found in a unit's text, replaced by a computed
/// value in the overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    /// Byte offset of the opening `[[` within the scanned text.
    pub start: usize,
    /// Byte offset one past the closing `]]`.
    pub end: usize,
    /// Raw body between the delimiters, untrimmed.
    pub body: String,
}

impl Directive {
    /// A body that is exactly `sum` (any case, padding allowed) asks for the
    /// block sum directly; no substitution or arithmetic happens.
    pub fn is_sum(&self) -> bool {
        self.body.trim().eq_ignore_ascii_case("sum")
    }
}

/// Scan text for directives, in order.
///
/// A directive is `[[` followed by the shortest non-empty body terminated by
/// `]]`. The body must be at least one char, so `[[]]` is not a directive —
/// though a later `]]` can still close it, making `[[]]x]]` a directive with
/// body `]]x`. Scanning resumes after each closing delimiter.
pub fn scan(text: &str) -> Vec<Directive> {
    let mut directives = Vec::new();
    let mut from = 0;

    while let Some(open_rel) = text[from..].find("[[") {
        let start = from + open_rel;
        let body_start = start + 2;
        let rest = &text[body_start..];
        let close_rel = match rest.find("]]") {
            // Empty body: the opener can only close at the next `]]`.
            Some(0) => match rest[1..].find("]]") {
                Some(r) => r + 1,
                None => break,
            },
            Some(r) => r,
            None => break,
        };
        let close = body_start + close_rel;
        directives.push(Directive {
            start,
            end: close + 2,
            body: text[body_start..close].to_string(),
        });
        from = close + 2;
    }

    directives
}
