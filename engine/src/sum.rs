use notation::annotation::{self, Annotation};

use crate::scope::ScopeChain;

/// Sum a block's annotations: literals and assignments contribute their
/// value, references contribute whatever the chain resolves (0 when
/// unbound). Addition is commutative, so annotation order never matters.
///
/// The whole block is folded before any directive in it evaluates; no
/// rounding happens here.
pub fn block_sum<'a>(units: impl IntoIterator<Item = &'a str>, scopes: ScopeChain<'_>) -> f64 {
    let mut sum = 0.0;
    for text in units {
        for annotation in annotation::scan(text) {
            sum += match annotation {
                Annotation::Number(value) => value,
                Annotation::Assignment { value, .. } => value,
                Annotation::Reference(name) => scopes.resolve_or_zero(&name),
            };
        }
    }
    sum
}
