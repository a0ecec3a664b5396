//! ECMAScript AST for comprehend.
//!
//! Re-exports the standard SWC AST and adds the array comprehension node:
//!
//! ```text
//! [for (x of xs) for (y of ys) if (x < y) x * y]
//! ```
//!
//! SWC has no syntax for comprehensions, so inside a parsed tree a
//! comprehension is carried as a call to the reserved marker function
//! [`COMPREHENSION_MARKER`]. Arguments follow source order so that line
//! numbers survive the round trip through the preprocessor:
//!
//! ```text
//! __comprehension__([[x, (xs)], [y, (ys)]], (x < y), (x * y))
//! ```
//!
//! The filter argument is omitted when the comprehension has none.

pub use swc_ecma_ast::*;

use serde::{Deserialize, Serialize};
use swc_common::{Span, DUMMY_SP};

/// Name of the marker call that stands in for a comprehension in the tree.
pub const COMPREHENSION_MARKER: &str = "__comprehension__";

/// One `for (binding of source)` clause.
#[derive(Debug, Clone, PartialEq)]
pub struct ComprehensionBlock {
    pub span: Span,
    pub binding: Ident,
    pub source: Box<Expr>,
}

/// An array comprehension: body, one or more blocks, optional filter.
///
/// Blocks are ordered outermost first. The filter is evaluated once per
/// innermost iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct ComprehensionExpr {
    pub span: Span,
    pub body: Box<Expr>,
    pub blocks: Vec<ComprehensionBlock>,
    pub filter: Option<Box<Expr>>,
}

/// A marker call whose arguments do not have the comprehension shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed comprehension: {reason}")]
pub struct MarkerError {
    pub span: Span,
    pub reason: String,
}

impl MarkerError {
    fn new(span: Span, reason: impl Into<String>) -> Self {
        Self {
            span,
            reason: reason.into(),
        }
    }
}

/// Returns `true` if `expr` is a call to the comprehension marker.
pub fn is_comprehension_marker(expr: &Expr) -> bool {
    let Expr::Call(call) = expr else {
        return false;
    };
    matches!(
        &call.callee,
        Callee::Expr(callee) if matches!(&**callee, Expr::Ident(id) if &*id.sym == COMPREHENSION_MARKER)
    )
}

impl ComprehensionExpr {
    /// Lift a marker call back into a comprehension node.
    ///
    /// The caller is expected to have checked [`is_comprehension_marker`].
    /// An empty block list is accepted here; rejecting it is the rewriter's
    /// job.
    pub fn from_marker(call: CallExpr) -> Result<Self, MarkerError> {
        let span = call.span;
        if call.args.iter().any(|arg| arg.spread.is_some()) {
            return Err(MarkerError::new(span, "spread argument in marker call"));
        }

        let mut args = call.args.into_iter().map(|arg| arg.expr);
        let (blocks, filter, body) = match (args.next(), args.next(), args.next(), args.next()) {
            (Some(blocks), Some(body), None, None) => (blocks, None, body),
            (Some(blocks), Some(filter), Some(body), None) => (blocks, Some(filter), body),
            _ => {
                return Err(MarkerError::new(
                    span,
                    "expected a block list, an optional filter and a body",
                ))
            }
        };

        let Expr::Array(list) = *blocks else {
            return Err(MarkerError::new(span, "block list is not an array literal"));
        };

        let blocks = list
            .elems
            .into_iter()
            .map(|elem| lift_block(span, elem))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            span,
            body: unwrap_paren(body),
            blocks,
            filter: filter.map(unwrap_paren),
        })
    }

    /// Encode this comprehension as a marker call.
    pub fn to_marker(&self) -> Expr {
        let blocks = self
            .blocks
            .iter()
            .map(|block| {
                Some(plain_arg(Expr::Array(ArrayLit {
                    span: block.span,
                    elems: vec![
                        Some(plain_arg(Expr::Ident(block.binding.clone()))),
                        Some(plain_arg(paren(block.source.clone()))),
                    ],
                })))
            })
            .collect();

        let mut args = vec![plain_arg(Expr::Array(ArrayLit {
            span: DUMMY_SP,
            elems: blocks,
        }))];
        if let Some(filter) = &self.filter {
            args.push(plain_arg(paren(filter.clone())));
        }
        args.push(plain_arg(paren(self.body.clone())));

        Expr::Call(CallExpr {
            span: self.span,
            callee: Callee::Expr(Box::new(Expr::Ident(Ident::new_no_ctxt(
                COMPREHENSION_MARKER.into(),
                DUMMY_SP,
            )))),
            args,
            type_args: None,
            ..Default::default()
        })
    }
}

fn lift_block(span: Span, elem: Option<ExprOrSpread>) -> Result<ComprehensionBlock, MarkerError> {
    let Some(ExprOrSpread { spread: None, expr }) = elem else {
        return Err(MarkerError::new(span, "hole or spread in block list"));
    };
    let Expr::Array(pair) = *expr else {
        return Err(MarkerError::new(span, "block is not a [binding, source] pair"));
    };
    let block_span = pair.span;

    let mut parts = pair.elems.into_iter();
    match (parts.next(), parts.next(), parts.next()) {
        (
            Some(Some(ExprOrSpread {
                spread: None,
                expr: binding,
            })),
            Some(Some(ExprOrSpread {
                spread: None,
                expr: source,
            })),
            None,
        ) => {
            let Expr::Ident(binding) = *binding else {
                return Err(MarkerError::new(block_span, "block binding is not an identifier"));
            };
            Ok(ComprehensionBlock {
                span: block_span,
                binding,
                source: unwrap_paren(source),
            })
        }
        _ => Err(MarkerError::new(block_span, "block is not a [binding, source] pair")),
    }
}

/// Strip the single layer of parentheses the marker encoding adds.
///
/// A sequence keeps its parentheses; it would change meaning as a call
/// argument or declarator initialiser.
fn unwrap_paren(expr: Box<Expr>) -> Box<Expr> {
    match *expr {
        Expr::Paren(paren) if !matches!(&*paren.expr, Expr::Seq(_)) => paren.expr,
        other => Box::new(other),
    }
}

fn paren(expr: Box<Expr>) -> Expr {
    Expr::Paren(ParenExpr {
        span: DUMMY_SP,
        expr,
    })
}

fn plain_arg(expr: Expr) -> ExprOrSpread {
    ExprOrSpread {
        spread: None,
        expr: Box::new(expr),
    }
}

/// Syntax options controlling how source text is read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CpSyntax {
    /// Recognise `[for (x of xs) ...]` comprehension syntax.
    pub comprehensions: bool,
    /// Parse as TypeScript instead of ECMAScript.
    pub typescript: bool,
    pub jsx: bool,
}

impl Default for CpSyntax {
    fn default() -> Self {
        Self {
            comprehensions: true,
            typescript: false,
            jsx: false,
        }
    }
}

impl CpSyntax {
    /// Pick the dialect from a file name's extension.
    pub fn for_file(filename: &str) -> Self {
        let typescript = [".ts", ".tsx", ".mts", ".cts"]
            .iter()
            .any(|ext| filename.ends_with(ext));
        let jsx = filename.ends_with(".tsx") || filename.ends_with(".jsx");
        Self {
            comprehensions: true,
            typescript,
            jsx,
        }
    }
}
