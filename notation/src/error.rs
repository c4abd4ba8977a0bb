use std::fmt;
use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic, Label, Severity};

/// Failure to parse a directive body as a safe arithmetic expression.
/// Spans are byte ranges into the substituted expression text.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprError {
    /// A character outside the permitted arithmetic set.
    UnsafeCharacter { ch: char, span: Range<usize> },
    /// A digit/dot run that is not a valid decimal number.
    InvalidNumber { span: Range<usize> },
    UnexpectedToken { span: Range<usize> },
    UnexpectedEnd,
    TrailingInput { span: Range<usize> },
}

impl fmt::Display for ExprError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExprError::UnsafeCharacter { ch, .. } => {
                write!(f, "character '{}' is not allowed in expressions", ch)
            }
            ExprError::InvalidNumber { .. } => write!(f, "malformed number"),
            ExprError::UnexpectedToken { .. } => write!(f, "unexpected token"),
            ExprError::UnexpectedEnd => write!(f, "unexpected end of expression"),
            ExprError::TrailingInput { .. } => {
                write!(f, "unexpected trailing input after expression")
            }
        }
    }
}

impl std::error::Error for ExprError {}

/// A scan-time warning tied to a source span, produced by the check
/// pipeline. Never part of runtime rendering, which stays glyph-only.
#[derive(Debug, Clone)]
pub struct ScanWarning {
    pub message: String,
    pub span: Range<usize>,
    pub file_id: usize,
    pub severity: Severity,
    pub notes: Vec<String>,
}

impl ScanWarning {
    pub fn warning(message: impl Into<String>, span: Range<usize>, file_id: usize) -> Self {
        ScanWarning {
            message: message.into(),
            span,
            file_id,
            severity: Severity::Warning,
            notes: Vec::new(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Convert to a codespan-reporting Diagnostic for display.
    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        Diagnostic::new(self.severity)
            .with_message(&self.message)
            .with_labels(vec![Label::primary(self.file_id, self.span.clone())])
            .with_notes(self.notes.clone())
    }
}
