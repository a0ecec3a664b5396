//! Which enclosing-function bindings a comprehension refers to.
//!
//! The rewrite moves body, filter and sources into a wrapper function, so
//! anything bound by the enclosing function (`this`, `arguments`, `super`,
//! `new.target`) has to be forwarded, and anything that suspends it
//! (`await`, `yield`) cannot be moved at all.

use cp_ast::ComprehensionExpr;
use swc_ecma_ast::{
    ArrowExpr, AwaitExpr, Class, ClassMember, Function, GetterProp, Ident, MetaPropExpr,
    MetaPropKind, SetterProp, Super, ThisExpr, YieldExpr,
};
use swc_ecma_visit::{Visit, VisitWith};

use crate::desugar::ReceiverForwarding;

/// References to the enclosing function's context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContextRefs {
    pub this: bool,
    pub arguments: bool,
    /// `super` or `new.target`, which only an arrow function can see.
    pub lexical_only: bool,
    /// `await` or `yield` of the enclosing function.
    pub suspends: bool,
}

/// How the generated function is invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wrapper {
    /// `(function () { ... })()`
    Plain,
    /// `(function () { ... }).call(this)`
    Call,
    /// `(function () { ... }).apply(this, arguments)`
    Apply,
    /// `(() => { ... })()`
    Arrow,
}

impl ContextRefs {
    pub fn analyze(node: &ComprehensionExpr) -> Self {
        let mut finder = ContextRefFinder::default();
        for block in &node.blocks {
            block.source.visit_with(&mut finder);
        }
        node.filter.visit_with(&mut finder);
        node.body.visit_with(&mut finder);
        finder.refs
    }

    pub fn wrapper(&self, forwarding: ReceiverForwarding) -> Wrapper {
        if self.lexical_only {
            Wrapper::Arrow
        } else if self.arguments {
            Wrapper::Apply
        } else if self.this || forwarding == ReceiverForwarding::Always {
            Wrapper::Call
        } else {
            Wrapper::Plain
        }
    }
}

#[derive(Default)]
struct ContextRefFinder {
    refs: ContextRefs,
    arrow_depth: usize,
}

impl Visit for ContextRefFinder {
    fn visit_this_expr(&mut self, _: &ThisExpr) {
        self.refs.this = true;
    }

    fn visit_ident(&mut self, ident: &Ident) {
        if &*ident.sym == "arguments" {
            self.refs.arguments = true;
        }
    }

    fn visit_super(&mut self, _: &Super) {
        self.refs.lexical_only = true;
    }

    fn visit_meta_prop_expr(&mut self, expr: &MetaPropExpr) {
        if expr.kind == MetaPropKind::NewTarget {
            self.refs.lexical_only = true;
        }
    }

    fn visit_await_expr(&mut self, expr: &AwaitExpr) {
        if self.arrow_depth == 0 {
            self.refs.suspends = true;
        }
        expr.visit_children_with(self);
    }

    fn visit_yield_expr(&mut self, expr: &YieldExpr) {
        if self.arrow_depth == 0 {
            self.refs.suspends = true;
        }
        expr.visit_children_with(self);
    }

    fn visit_arrow_expr(&mut self, arrow: &ArrowExpr) {
        self.arrow_depth += 1;
        arrow.visit_children_with(self);
        self.arrow_depth -= 1;
    }

    // Non-arrow functions bind their own context.
    fn visit_function(&mut self, _: &Function) {}

    fn visit_getter_prop(&mut self, prop: &GetterProp) {
        prop.key.visit_with(self);
    }

    fn visit_setter_prop(&mut self, prop: &SetterProp) {
        prop.key.visit_with(self);
    }

    fn visit_class(&mut self, class: &Class) {
        class.super_class.visit_with(self);
        for member in &class.body {
            match member {
                ClassMember::Method(method) => method.key.visit_with(self),
                ClassMember::ClassProp(prop) => prop.key.visit_with(self),
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cp_ast::{is_comprehension_marker, CpSyntax, Expr};
    use cp_parser::parse_comprehensions;

    #[derive(Default)]
    struct FirstMarker(Option<ComprehensionExpr>);

    impl Visit for FirstMarker {
        fn visit_expr(&mut self, expr: &Expr) {
            if self.0.is_none() && is_comprehension_marker(expr) {
                if let Expr::Call(call) = expr {
                    self.0 = Some(ComprehensionExpr::from_marker(call.clone()).unwrap());
                }
                return;
            }
            expr.visit_children_with(self);
        }
    }

    fn refs(source: &str) -> ContextRefs {
        let parsed = parse_comprehensions(source, "input.js", &CpSyntax::default()).unwrap();
        let mut finder = FirstMarker::default();
        parsed.module.visit_with(&mut finder);
        ContextRefs::analyze(&finder.0.expect("no comprehension in source"))
    }

    #[test]
    fn plain_comprehension_needs_no_forwarding() {
        let found = refs("[for (x of xs) x + 1];");
        assert_eq!(found, ContextRefs::default());
        assert_eq!(found.wrapper(ReceiverForwarding::Auto), Wrapper::Plain);
        assert_eq!(found.wrapper(ReceiverForwarding::Always), Wrapper::Call);
    }

    #[test]
    fn this_in_source_or_body_is_forwarded() {
        let found = refs("[for (x of this.arr1) for (y of this.arr2) this.add(x, y)];");
        assert!(found.this);
        assert_eq!(found.wrapper(ReceiverForwarding::Auto), Wrapper::Call);

        let arrow = refs("[for (x of xs) () => this];");
        assert!(arrow.this);
    }

    #[test]
    fn nested_functions_bind_their_own_this() {
        let found = refs(
            "[for (x of xs) [function () { return this; }, { get y() { return this; } }, class { m() { return this; } }]];",
        );
        assert_eq!(found, ContextRefs::default());
    }

    #[test]
    fn arguments_selects_apply() {
        let found = refs("function f() { return [for (x of arguments) x]; }");
        assert_eq!(found.wrapper(ReceiverForwarding::Auto), Wrapper::Apply);
    }

    #[test]
    fn super_selects_an_arrow() {
        let found =
            refs("class A extends B { m() { return [for (x of xs) super.f(x)]; } }");
        assert!(found.lexical_only);
        assert_eq!(found.wrapper(ReceiverForwarding::Auto), Wrapper::Arrow);
    }

    #[test]
    fn await_suspends_unless_inside_an_arrow() {
        assert!(refs("async function f() { return [for (x of xs) await x]; }").suspends);
        assert!(!refs("[for (x of xs) async () => await x];").suspends);
    }
}
