//! Renaming of comprehension bindings that would be read before assignment.
//!
//! Every binding becomes a `var` of the wrapper function, hoisted over all
//! sources evaluated in that function. A source that names its own block's
//! binding (or a later one) means the outer variable, so such a binding gets
//! a fresh name and its uses inside the comprehension follow it.

use cp_ast::ComprehensionExpr;
use swc_ecma_ast::{
    ArrowExpr, BindingIdent, BlockStmt, BlockStmtOrExpr, CatchClause, Class, ClassDecl, Expr,
    FnDecl, FnExpr, Function, IdentName, KeyValueProp, Pat, Prop, PropName, SimpleAssignTarget,
    VarDeclarator,
};
use swc_ecma_visit::{Visit, VisitMut, VisitMutWith, VisitWith};

use crate::error::DesugarError;
use crate::names::NameAllocator;

/// Give a fresh name to each binding that a source in the same wrapper
/// refers to.
///
/// Uses are renamed in later sources up to the next block that binds the
/// same name, and in the filter and body when no later block does.
pub fn rename_hoisted_bindings(
    node: &mut ComprehensionExpr,
    names: &mut NameAllocator,
) -> Result<(), DesugarError> {
    for k in 0..node.blocks.len() {
        let name = node.blocks[k].binding.sym.to_string();
        if !node.blocks[..=k].iter().any(|block| mentions(&block.source, &name)) {
            continue;
        }

        let fresh = names.fresh(&name)?;
        tracing::debug!(binding = %name, renamed = %fresh, "renamed hoisted binding");
        node.blocks[k].binding.sym = fresh.as_str().into();

        let mut rename = Rename {
            from: &name,
            to: &fresh,
        };
        let rebound = node.blocks[k + 1..]
            .iter()
            .position(|block| &*block.binding.sym == name);
        let last = rebound.map_or(node.blocks.len() - 1, |offset| k + 1 + offset);
        for block in &mut node.blocks[k + 1..=last] {
            block.source.visit_mut_with(&mut rename);
        }
        if rebound.is_none() {
            node.filter.visit_mut_with(&mut rename);
            node.body.visit_mut_with(&mut rename);
        }
    }
    Ok(())
}

/// Whether `name` occurs free in `expr`.
pub fn mentions(expr: &Expr, name: &str) -> bool {
    let mut finder = Mentions { name, found: false };
    expr.visit_with(&mut finder);
    finder.found
}

struct Mentions<'a> {
    name: &'a str,
    found: bool,
}

impl Visit for Mentions<'_> {
    fn visit_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Ident(ident) => self.found |= &*ident.sym == self.name,
            _ => expr.visit_children_with(self),
        }
    }

    fn visit_simple_assign_target(&mut self, target: &SimpleAssignTarget) {
        match target {
            SimpleAssignTarget::Ident(ident) => self.found |= &*ident.id.sym == self.name,
            _ => target.visit_children_with(self),
        }
    }

    fn visit_prop(&mut self, prop: &Prop) {
        match prop {
            Prop::Shorthand(ident) => self.found |= &*ident.sym == self.name,
            _ => prop.visit_children_with(self),
        }
    }

    fn visit_fn_expr(&mut self, function: &FnExpr) {
        if !function.ident.as_ref().is_some_and(|id| &*id.sym == self.name) {
            function.function.visit_with(self);
        }
    }

    fn visit_function(&mut self, function: &Function) {
        if !function_rebinds(function, self.name) {
            function.visit_children_with(self);
        }
    }

    fn visit_arrow_expr(&mut self, arrow: &ArrowExpr) {
        if !arrow_rebinds(arrow, self.name) {
            arrow.visit_children_with(self);
        }
    }
}

struct Rename<'a> {
    from: &'a str,
    to: &'a str,
}

impl VisitMut for Rename<'_> {
    fn visit_mut_expr(&mut self, expr: &mut Expr) {
        match expr {
            Expr::Ident(ident) if &*ident.sym == self.from => ident.sym = self.to.into(),
            Expr::Ident(_) => {}
            _ => expr.visit_mut_children_with(self),
        }
    }

    fn visit_mut_simple_assign_target(&mut self, target: &mut SimpleAssignTarget) {
        match target {
            SimpleAssignTarget::Ident(ident) if &*ident.id.sym == self.from => {
                ident.id.sym = self.to.into();
            }
            SimpleAssignTarget::Ident(_) => {}
            _ => target.visit_mut_children_with(self),
        }
    }

    fn visit_mut_prop(&mut self, prop: &mut Prop) {
        match prop {
            // `{ x }` keeps its key.
            Prop::Shorthand(ident) if &*ident.sym == self.from => {
                let key = PropName::Ident(IdentName::new(ident.sym.clone(), ident.span));
                let mut value = ident.clone();
                value.sym = self.to.into();
                *prop = Prop::KeyValue(KeyValueProp {
                    key,
                    value: Box::new(Expr::Ident(value)),
                });
            }
            Prop::Shorthand(_) => {}
            _ => prop.visit_mut_children_with(self),
        }
    }

    fn visit_mut_fn_expr(&mut self, function: &mut FnExpr) {
        if !function.ident.as_ref().is_some_and(|id| &*id.sym == self.from) {
            function.function.visit_mut_with(self);
        }
    }

    fn visit_mut_function(&mut self, function: &mut Function) {
        if !function_rebinds(function, self.from) {
            function.visit_mut_children_with(self);
        }
    }

    fn visit_mut_arrow_expr(&mut self, arrow: &mut ArrowExpr) {
        if !arrow_rebinds(arrow, self.from) {
            arrow.visit_mut_children_with(self);
        }
    }
}

fn function_rebinds(function: &Function, name: &str) -> bool {
    function.params.iter().any(|param| pat_binds(&param.pat, name))
        || function
            .body
            .as_ref()
            .is_some_and(|body| declares(body, name))
}

fn arrow_rebinds(arrow: &ArrowExpr, name: &str) -> bool {
    arrow.params.iter().any(|pat| pat_binds(pat, name))
        || match &*arrow.body {
            BlockStmtOrExpr::BlockStmt(body) => declares(body, name),
            BlockStmtOrExpr::Expr(_) => false,
        }
}

/// Whether a pattern binds `name`. Default values are not searched.
fn pat_binds(pat: &Pat, name: &str) -> bool {
    let mut finder = PatBinds { name, found: false };
    pat.visit_with(&mut finder);
    finder.found
}

struct PatBinds<'a> {
    name: &'a str,
    found: bool,
}

impl Visit for PatBinds<'_> {
    fn visit_binding_ident(&mut self, ident: &BindingIdent) {
        self.found |= &*ident.id.sym == self.name;
    }

    fn visit_expr(&mut self, _: &Expr) {}
}

/// Whether a function body declares `name` anywhere outside nested
/// functions.
fn declares(body: &BlockStmt, name: &str) -> bool {
    let mut finder = Declares { name, found: false };
    body.visit_with(&mut finder);
    finder.found
}

struct Declares<'a> {
    name: &'a str,
    found: bool,
}

impl Visit for Declares<'_> {
    fn visit_var_declarator(&mut self, declarator: &VarDeclarator) {
        self.found |= pat_binds(&declarator.name, self.name);
        declarator.init.visit_with(self);
    }

    fn visit_fn_decl(&mut self, decl: &FnDecl) {
        self.found |= &*decl.ident.sym == self.name;
    }

    fn visit_class_decl(&mut self, decl: &ClassDecl) {
        self.found |= &*decl.ident.sym == self.name;
    }

    fn visit_catch_clause(&mut self, clause: &CatchClause) {
        if let Some(param) = &clause.param {
            self.found |= pat_binds(param, self.name);
        }
        clause.body.visit_with(self);
    }

    fn visit_function(&mut self, _: &Function) {}

    fn visit_arrow_expr(&mut self, _: &ArrowExpr) {}

    fn visit_class(&mut self, _: &Class) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use cp_ast::{ComprehensionExpr, CpSyntax, ModuleItem, Stmt};
    use cp_parser::parse_comprehensions;

    fn comprehension(source: &str) -> ComprehensionExpr {
        let parsed = parse_comprehensions(source, "input.js", &CpSyntax::default()).unwrap();
        let ModuleItem::Stmt(Stmt::Expr(stmt)) = &parsed.module.body[0] else {
            panic!("expected an expression statement");
        };
        let Expr::Call(call) = &*stmt.expr else {
            panic!("expected a marker call");
        };
        ComprehensionExpr::from_marker(call.clone()).unwrap()
    }

    fn bindings(node: &ComprehensionExpr) -> Vec<String> {
        node.blocks
            .iter()
            .map(|block| block.binding.sym.to_string())
            .collect()
    }

    #[test]
    fn unrelated_bindings_keep_their_names() {
        let mut node = comprehension("[for (x of xs) for (y of x) x + y];");
        rename_hoisted_bindings(&mut node, &mut NameAllocator::new()).unwrap();
        assert_eq!(bindings(&node), ["x", "y"]);
    }

    #[test]
    fn binding_named_in_its_own_source_is_renamed() {
        let mut node = comprehension("[for (x of [x, x * 10]) x + 1];");
        rename_hoisted_bindings(&mut node, &mut NameAllocator::new()).unwrap();
        assert_eq!(bindings(&node), ["_x"]);
        assert!(mentions(&node.blocks[0].source, "x"));
        assert!(mentions(&node.body, "_x"));
        assert!(!mentions(&node.body, "x"));
    }

    #[test]
    fn rebinding_block_takes_over_later_uses() {
        let mut node = comprehension("[for (x of x) for (y of [x]) for (x of [y, x]) x];");
        rename_hoisted_bindings(&mut node, &mut NameAllocator::new()).unwrap();
        assert_eq!(bindings(&node), ["_x", "y", "_x2"]);
        assert!(mentions(&node.blocks[1].source, "_x"));
        assert!(mentions(&node.blocks[2].source, "_x"));
        assert!(mentions(&node.body, "_x2"));
        assert!(!mentions(&node.body, "_x"));
    }

    #[test]
    fn functions_that_rebind_the_name_are_left_alone() {
        let mut node = comprehension("[for (x of x) [x => x, function () { var x; return x; }, () => x]];");
        rename_hoisted_bindings(&mut node, &mut NameAllocator::new()).unwrap();

        let Expr::Array(array) = &*node.body else {
            panic!("expected an array body");
        };
        let elems: Vec<&Expr> = array.elems.iter().map(|e| &*e.as_ref().unwrap().expr).collect();
        assert!(!mentions(elems[0], "_x"));
        assert!(!mentions(elems[1], "_x"));
        assert!(mentions(elems[2], "_x"));
    }

    #[test]
    fn shorthand_property_keeps_its_key() {
        let mut node = comprehension("[for (x of x) ({ x })];");
        rename_hoisted_bindings(&mut node, &mut NameAllocator::new()).unwrap();

        let Expr::Paren(paren) = &*node.body else {
            panic!("expected a parenthesised body, got {:?}", node.body);
        };
        let Expr::Object(object) = &*paren.expr else {
            panic!("expected an object");
        };
        let prop = object.props[0].as_prop().unwrap();
        let Prop::KeyValue(kv) = &**prop else {
            panic!("expected a key-value property, got {prop:?}");
        };
        assert_eq!(&*kv.key.as_ident().unwrap().sym, "x");
        assert_eq!(&*kv.value.as_ident().unwrap().sym, "_x");
    }
}
