//! ECMAScript/TypeScript parser with array comprehension syntax.
//!
//! Wraps the standard SWC parser. Comprehensions (`[for (x of xs) x]`) are
//! rewritten at the text level into marker calls before the source reaches
//! SWC, so the resulting tree is an ordinary SWC module in which every
//! comprehension appears as a `__comprehension__(...)` call.

pub mod parse;
pub mod preprocess;

pub use parse::{parse_comprehensions, ParseError, ParseResult};
pub use preprocess::{ComprehensionSite, Preprocessed};
