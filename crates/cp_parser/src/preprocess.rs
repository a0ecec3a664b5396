//! Text-level preprocessor that rewrites comprehension syntax into marker
//! calls the standard SWC parser accepts.
//!
//! See [`cp_ast`] for the marker encoding.

use std::ops::Range;

use cp_ast::CpSyntax;

mod comprehension_pass;
mod util;

/// Where a top-level comprehension sat before and after preprocessing.
///
/// Both ranges are byte offsets: `original` into the input text and
/// `rewritten` into [`Preprocessed::source`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComprehensionSite {
    pub original: Range<usize>,
    pub rewritten: Range<usize>,
}

/// Output of [`preprocess`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preprocessed {
    pub source: String,
    /// Top-level comprehensions in source order.
    pub sites: Vec<ComprehensionSite>,
}

/// Preprocess a source string, rewriting comprehension syntax to marker calls.
pub fn preprocess(source: &str, syntax: &CpSyntax) -> Preprocessed {
    if !syntax.comprehensions {
        return Preprocessed {
            source: source.to_string(),
            sites: Vec::new(),
        };
    }

    comprehension_pass::rewrite_comprehensions(source)
}
