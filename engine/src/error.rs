use std::fmt;

use notation::error::ExprError;

/// Why a directive failed to compute. Contained at the directive level:
/// callers render the warning glyph and carry on.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    /// The substituted body failed the charset gate or did not parse.
    Parse(ExprError),
    /// Evaluation produced a non-finite value (division by zero included).
    NonFinite,
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::Parse(err) => err.fmt(f),
            EvalError::NonFinite => write!(f, "expression does not evaluate to a finite number"),
        }
    }
}

impl std::error::Error for EvalError {}

impl From<ExprError> for EvalError {
    fn from(err: ExprError) -> Self {
        EvalError::Parse(err)
    }
}

/// Errors crossing the engine's public API. Nothing here ever halts the
/// reactive loop; the scheduler reports and keeps going on the next event.
#[derive(Debug)]
pub enum EngineError {
    /// The overlay sink rejected a stylesheet.
    Sink(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Sink(msg) => write!(f, "overlay sink error: {}", msg),
        }
    }
}

impl std::error::Error for EngineError {}
