//! Desugaring pass that rewrites array comprehensions into standard
//! ECMAScript.
//!
//! `[for (x of xs) if (p(x)) f(x)]` becomes an immediately invoked function
//! that fills an accumulator array with counting `for` loops, one per
//! block. Temporaries never clash with names already used in the module,
//! and `this`, `arguments`, `super` and `new.target` keep their meaning.

pub mod desugar;
pub mod error;
pub mod locate;
pub mod names;
pub mod receiver;
pub mod rename;
pub mod rewrite;

pub use desugar::{desugar_module, transform, DesugarOptions, DesugarReport, ReceiverForwarding, Rewritten};
pub use error::DesugarError;
pub use names::NameAllocator;
