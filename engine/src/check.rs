use notation::directive;
use notation::error::ScanWarning;

use crate::eval;
use crate::scope::{Scope, ScopeChain};
use crate::sum;

/// Dry-run every directive of one block and report each one that would
/// render the warning glyph, with spans into the original source.
///
/// `units` pairs each unit's raw text with its byte offset in the checked
/// file. Purely advisory: runtime rendering stays glyph-only regardless.
pub fn check_block(units: &[(&str, usize)], global: &Scope, file_id: usize) -> Vec<ScanWarning> {
    let texts: Vec<&str> = units.iter().map(|(text, _)| *text).collect();
    let local = Scope::from_units(texts.iter().copied());
    let scopes = ScopeChain::new(&local, global);
    let sum = sum::block_sum(texts.iter().copied(), scopes);

    let mut warnings = Vec::new();
    for (text, offset) in units {
        let trimmed = text.trim();
        let leading = text.len() - text.trim_start().len();
        for directive in directive::scan(trimmed) {
            if directive.is_sum() {
                continue;
            }
            if let Err(err) = eval::compute(&directive.body, sum, scopes) {
                let start = offset + leading + directive.start;
                let end = offset + leading + directive.end;
                warnings.push(ScanWarning::warning(
                    format!("directive never computes: {}", err),
                    start..end,
                    file_id,
                ));
            }
        }
    }
    warnings
}
