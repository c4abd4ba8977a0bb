use notation::annotation::{is_ident_head, is_word_char};
use notation::directive::{self, Directive};
use notation::expr::{self, BinaryOp, Expr, UnaryOp};

use crate::error::EvalError;
use crate::scope::ScopeChain;

/// Rendered in place of a directive that cannot be computed.
pub const WARNING_GLYPH: &str = "⚠️";

/// Render one directive against a block's sum and scopes. Failures never
/// escape: anything that cannot compute becomes the warning glyph.
pub fn render_directive(directive: &Directive, sum: f64, scopes: ScopeChain<'_>) -> String {
    if directive.is_sum() {
        return display_number(sum);
    }
    match compute(&directive.body, sum, scopes) {
        Ok(value) => display_number(value),
        Err(_) => WARNING_GLYPH.to_string(),
    }
}

/// Substitute, gate, parse and evaluate an expression body.
///
/// Substitution order is fixed: whole-word `sum` first, `$name` tokens
/// second. Both insert full-precision numeric text; rounding happens only at
/// display time.
pub fn compute(body: &str, sum: f64, scopes: ScopeChain<'_>) -> Result<f64, EvalError> {
    let substituted = substitute_names(&substitute_sum(body, sum), scopes);
    let parsed = expr::parse(&substituted)?;
    let value = eval(&parsed);
    if !value.is_finite() {
        return Err(EvalError::NonFinite);
    }
    Ok(value)
}

/// Substitute every directive in a unit's trimmed text. `None` when the
/// unit carries no directives at all.
pub fn render_unit(trimmed: &str, sum: f64, scopes: ScopeChain<'_>) -> Option<String> {
    let directives = directive::scan(trimmed);
    if directives.is_empty() {
        return None;
    }
    let mut rendered = String::with_capacity(trimmed.len());
    let mut cursor = 0;
    for directive in &directives {
        rendered.push_str(&trimmed[cursor..directive.start]);
        rendered.push_str(&render_directive(directive, sum, scopes));
        cursor = directive.end;
    }
    rendered.push_str(&trimmed[cursor..]);
    Some(rendered)
}

// ---------------------------------------------------------------------------
// Substitution
// ---------------------------------------------------------------------------

/// Replace every standalone occurrence of the word `sum` (any case) with the
/// block sum's numeric text.
fn substitute_sum(body: &str, sum: f64) -> String {
    let chars: Vec<char> = body.chars().collect();
    let mut out = String::with_capacity(body.len());
    let mut i = 0;

    while i < chars.len() {
        let is_match = i + 3 <= chars.len()
            && chars[i..i + 3]
                .iter()
                .collect::<String>()
                .eq_ignore_ascii_case("sum")
            && (i == 0 || !is_word_char(chars[i - 1]))
            && (i + 3 == chars.len() || !is_word_char(chars[i + 3]));
        if is_match {
            out.push_str(&number_text(sum));
            i += 3;
        } else {
            out.push(chars[i]);
            i += 1;
        }
    }

    out
}

/// Replace every `$name` token with its resolved value, `0` when unbound.
fn substitute_names(body: &str, scopes: ScopeChain<'_>) -> String {
    let chars: Vec<char> = body.chars().collect();
    let mut out = String::with_capacity(body.len());
    let mut i = 0;

    while i < chars.len() {
        if chars[i] == '$' && i + 1 < chars.len() && is_ident_head(chars[i + 1]) {
            let start = i + 1;
            let mut end = start + 1;
            while end < chars.len() && is_word_char(chars[end]) {
                end += 1;
            }
            let name: String = chars[start..end].iter().collect();
            out.push_str(&number_text(scopes.resolve_or_zero(&name)));
            i = end;
        } else {
            out.push(chars[i]);
            i += 1;
        }
    }

    out
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Tree-walk a parsed expression. Non-finite intermediate values (division
/// by zero and friends) propagate as ordinary IEEE values and are rejected
/// by `compute` at the end.
fn eval(expr: &Expr) -> f64 {
    match expr {
        Expr::Number(n) => *n,
        Expr::Unary { op, operand } => match op {
            UnaryOp::Plus => eval(operand),
            UnaryOp::Minus => -eval(operand),
        },
        Expr::Binary { op, left, right } => {
            let l = eval(left);
            let r = eval(right);
            match op {
                BinaryOp::Addition => l + r,
                BinaryOp::Subtraction => l - r,
                BinaryOp::Multiplication => l * r,
                BinaryOp::Division => l / r,
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// Shortest plain-decimal rendering; integral values render without a
/// fraction.
pub fn number_text(n: f64) -> String {
    if n.is_finite() && n == n.floor() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Display rule for overlay output: round half-away-from-zero to 2 decimal
/// places, then shortest rendering.
pub fn display_number(n: f64) -> String {
    number_text(round2(n))
}

fn round2(n: f64) -> f64 {
    (n * 100.0).round() / 100.0
}
