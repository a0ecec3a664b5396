//! Top-level desugaring entry point.
//!
//! Finds every comprehension marker left in a parsed module by the
//! preprocessor and replaces it with an invoked function that builds the
//! array with plain `for` loops.

use serde::{Deserialize, Serialize};
use swc_common::Span;
use swc_ecma_ast::{Expr, Module};

use crate::error::DesugarError;
use crate::locate::for_each_comprehension;
use crate::names::NameAllocator;
use crate::rewrite::rewrite_comprehension;

/// When the generated function is called with the enclosing `this`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiverForwarding {
    /// Only when the comprehension mentions `this` or `arguments`.
    #[default]
    Auto,
    /// Always, as `.call(this)`.
    Always,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DesugarOptions {
    pub forward_receiver: ReceiverForwarding,
}

/// A comprehension that was replaced in ordinary code, as opposed to one
/// nested inside another comprehension.
#[derive(Debug, Clone, PartialEq)]
pub struct Rewritten {
    /// Span of the marker call that was replaced.
    pub span: Span,
    pub replacement: Expr,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DesugarReport {
    /// Total number of comprehensions rewritten, nested ones included.
    pub rewritten: usize,
    /// Outermost replacements in source order.
    pub top_level: Vec<Rewritten>,
}

/// Desugar every comprehension in `module` in place.
///
/// On error the module is left partially rewritten and should be
/// discarded.
pub fn desugar_module(
    module: &mut Module,
    options: &DesugarOptions,
) -> Result<DesugarReport, DesugarError> {
    let mut names = NameAllocator::for_module(module);
    let mut top_level = Vec::new();

    let rewritten = for_each_comprehension(module, |mut occurrence| {
        let node = occurrence.take()?;
        let span = node.span;
        let blocks = node.blocks.len();
        let replacement = rewrite_comprehension(node, &mut names, options)?;
        tracing::debug!(?span, blocks, depth = occurrence.depth(), "desugared comprehension");

        if occurrence.depth() == 0 {
            top_level.push(Rewritten {
                span,
                replacement: replacement.clone(),
            });
        }
        occurrence.replace(replacement);
        Ok(())
    })?;

    Ok(DesugarReport {
        rewritten,
        top_level,
    })
}

/// Desugar every comprehension in `module`, returning the rewritten tree.
pub fn transform(mut module: Module, options: &DesugarOptions) -> Result<Module, DesugarError> {
    desugar_module(&mut module, options)?;
    Ok(module)
}
