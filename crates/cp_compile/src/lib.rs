//! Source-to-source compiler for array comprehensions.
//!
//! [`compile`] parses the input, desugars every comprehension and prints the
//! result. By default only the comprehensions are reprinted; all other text,
//! comments and formatting included, is copied from the input unchanged.

mod compile;
mod emit;
mod error;
mod indent;
mod options;

pub use compile::{compile, CompileOutput};
pub use error::CompileError;
pub use indent::{guess_width, Indent};
pub use options::{CompileOptions, PrintMode};
