//! Finds comprehension markers in a module, innermost first.

use cp_ast::{is_comprehension_marker, ComprehensionExpr, Expr, Invalid, Module};
use swc_common::{Span, Spanned};
use swc_ecma_visit::{VisitMut, VisitMutWith};

use crate::error::DesugarError;

/// A comprehension marker found in the tree, with mutable access to the
/// expression slot that holds it.
pub struct Occurrence<'a> {
    slot: &'a mut Expr,
    depth: usize,
}

impl Occurrence<'_> {
    pub fn span(&self) -> Span {
        self.slot.span()
    }

    /// Number of comprehensions enclosing this one. Zero for a comprehension
    /// that appears directly in ordinary code.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Lift the marker out of the tree, leaving an invalid placeholder until
    /// [`Occurrence::replace`] is called.
    pub fn take(&mut self) -> Result<ComprehensionExpr, DesugarError> {
        let span = self.span();
        match std::mem::replace(self.slot, Expr::Invalid(Invalid { span })) {
            Expr::Call(call) => Ok(ComprehensionExpr::from_marker(call)?),
            other => {
                *self.slot = other;
                Err(DesugarError::invalid(span, "marker is not a call"))
            }
        }
    }

    pub fn replace(self, expr: Expr) {
        *self.slot = expr;
    }
}

/// Call `visit` for every comprehension in `module`.
///
/// A comprehension nested in another one's body, filter or sources is
/// visited before the enclosing one, so by the time the outer comprehension
/// is seen its children have already been replaced. The walk stops at the
/// first error.
///
/// Returns how many comprehensions were visited.
pub fn for_each_comprehension<F>(module: &mut Module, visit: F) -> Result<usize, DesugarError>
where
    F: FnMut(Occurrence<'_>) -> Result<(), DesugarError>,
{
    let mut locator = Locator {
        visit,
        depth: 0,
        count: 0,
        error: None,
    };
    module.visit_mut_with(&mut locator);

    match locator.error {
        Some(err) => Err(err),
        None => Ok(locator.count),
    }
}

struct Locator<F> {
    visit: F,
    depth: usize,
    count: usize,
    error: Option<DesugarError>,
}

impl<F> VisitMut for Locator<F>
where
    F: FnMut(Occurrence<'_>) -> Result<(), DesugarError>,
{
    fn visit_mut_expr(&mut self, expr: &mut Expr) {
        if self.error.is_some() {
            return;
        }
        if !is_comprehension_marker(expr) {
            expr.visit_mut_children_with(self);
            return;
        }

        self.depth += 1;
        expr.visit_mut_children_with(self);
        self.depth -= 1;
        if self.error.is_some() {
            return;
        }

        self.count += 1;
        let occurrence = Occurrence {
            slot: expr,
            depth: self.depth,
        };
        if let Err(err) = (self.visit)(occurrence) {
            self.error = Some(err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cp_ast::CpSyntax;
    use cp_parser::parse_comprehensions;
    use pretty_assertions::assert_eq;

    fn module(source: &str) -> Module {
        parse_comprehensions(source, "input.js", &CpSyntax::default())
            .unwrap()
            .module
    }

    #[test]
    fn visits_innermost_first() {
        let mut module = module("[for (x of [for (y of ys) y]) [for (z of x) z]];");
        let mut seen = Vec::new();
        let count = for_each_comprehension(&mut module, |mut occurrence| {
            let node = occurrence.take()?;
            seen.push((node.blocks[0].binding.sym.to_string(), occurrence.depth()));
            occurrence.replace(node.to_marker());
            Ok(())
        })
        .unwrap();

        assert_eq!(count, 3);
        assert_eq!(
            seen,
            vec![("y".into(), 1), ("z".into(), 1), ("x".into(), 0)]
        );
    }

    #[test]
    fn finds_comprehensions_anywhere() {
        let mut module = module(
            "function f() { return g([for (a of b) a]); }\nclass C { m() { return [for (c of d) c]; } }\nconst t = `${[for (e of f) e]}`;",
        );
        let count = for_each_comprehension(&mut module, |_| Ok(())).unwrap();
        assert_eq!(count, 3);
    }

    #[test]
    fn first_error_stops_the_walk() {
        let mut module = module("[for (a of b) a];\n[for (c of d) c];");
        let mut calls = 0;
        let err = for_each_comprehension(&mut module, |occurrence| {
            calls += 1;
            Err(DesugarError::invalid(occurrence.span(), "rejected"))
        })
        .unwrap_err();

        assert_eq!(calls, 1);
        assert!(matches!(err, DesugarError::InvalidComprehension { .. }));
    }

    #[test]
    fn plain_calls_to_other_functions_are_ignored() {
        let mut module = module("f([1, 2]); __other__([[x, xs]], x);");
        assert_eq!(for_each_comprehension(&mut module, |_| Ok(())).unwrap(), 0);
    }
}
