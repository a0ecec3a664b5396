//! Rewrites one comprehension into an invoked function with nested loops.
//!
//! ```text
//! [for (x of xs) for (y of ys) if (x < y) x * y]
//! ```
//!
//! becomes
//!
//! ```text
//! (function () {
//!     var _result = [];
//!     for (var _i = 0, _arr = xs, _len = _arr.length, x; _i < _len; _i++) {
//!         x = _arr[_i];
//!         for (var _i2 = 0, _arr2 = ys, _len2 = _arr2.length, y; _i2 < _len2; _i2++) {
//!             y = _arr2[_i2];
//!             if (x < y) {
//!                 _result.push(x * y);
//!             }
//!         }
//!     }
//!     return _result;
//! })()
//! ```

use cp_ast::{ComprehensionBlock, ComprehensionExpr};
use swc_common::{Span, SyntaxContext, DUMMY_SP};
use swc_ecma_ast::*;

use crate::desugar::DesugarOptions;
use crate::error::DesugarError;
use crate::names::NameAllocator;
use crate::receiver::{ContextRefs, Wrapper};
use crate::rename::rename_hoisted_bindings;

/// Identifiers used by the loop generated for one block.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopDescriptor {
    pub index: Ident,
    pub array: Ident,
    pub length: Ident,
    /// The block's own binding, declared by the loop.
    pub binding: Ident,
}

impl LoopDescriptor {
    pub fn allocate(
        block: &ComprehensionBlock,
        names: &mut NameAllocator,
    ) -> Result<Self, DesugarError> {
        Ok(Self {
            index: ident(&names.fresh("i")?),
            array: ident(&names.fresh("arr")?),
            length: ident(&names.fresh("len")?),
            binding: block.binding.clone(),
        })
    }

    /// `for (var i = 0, arr = source, len = arr.length, x; i < len; i++) { x = arr[i]; inner }`
    fn into_loop(self, source: Box<Expr>, inner: Stmt) -> Stmt {
        let init = VarDecl {
            span: DUMMY_SP,
            ctxt: SyntaxContext::empty(),
            kind: VarDeclKind::Var,
            declare: false,
            decls: vec![
                declarator(self.index.clone(), Some(Box::new(num(0.0)))),
                declarator(self.array.clone(), Some(source)),
                declarator(
                    self.length.clone(),
                    Some(Box::new(member(Expr::Ident(self.array.clone()), "length"))),
                ),
                declarator(self.binding.clone(), None),
            ],
        };

        let test = Expr::Bin(BinExpr {
            span: DUMMY_SP,
            op: BinaryOp::Lt,
            left: Box::new(Expr::Ident(self.index.clone())),
            right: Box::new(Expr::Ident(self.length)),
        });

        let update = Expr::Update(UpdateExpr {
            span: DUMMY_SP,
            op: UpdateOp::PlusPlus,
            prefix: false,
            arg: Box::new(Expr::Ident(self.index.clone())),
        });

        let element = Expr::Member(MemberExpr {
            span: DUMMY_SP,
            obj: Box::new(Expr::Ident(self.array)),
            prop: MemberProp::Computed(ComputedPropName {
                span: DUMMY_SP,
                expr: Box::new(Expr::Ident(self.index)),
            }),
        });
        let assign = Expr::Assign(AssignExpr {
            span: DUMMY_SP,
            op: AssignOp::Assign,
            left: AssignTarget::Simple(SimpleAssignTarget::Ident(self.binding.into())),
            right: Box::new(element),
        });

        Stmt::For(ForStmt {
            span: DUMMY_SP,
            init: Some(VarDeclOrExpr::VarDecl(Box::new(init))),
            test: Some(Box::new(test)),
            update: Some(Box::new(update)),
            body: Box::new(block(vec![expr_stmt(assign), inner])),
        })
    }
}

/// Build the replacement for `node`.
///
/// Temporaries are allocated from `names`: renamed bindings first, then the
/// accumulator, then index, array and length for each block, outermost
/// block first.
pub fn rewrite_comprehension(
    mut node: ComprehensionExpr,
    names: &mut NameAllocator,
    options: &DesugarOptions,
) -> Result<Expr, DesugarError> {
    if node.blocks.is_empty() {
        return Err(DesugarError::invalid(
            node.span,
            "a comprehension needs at least one `for` block",
        ));
    }

    let refs = ContextRefs::analyze(&node);
    if refs.suspends {
        return Err(DesugarError::invalid(
            node.span,
            "`await` and `yield` cannot be used inside a comprehension",
        ));
    }
    let wrapper = refs.wrapper(options.forward_receiver);
    rename_hoisted_bindings(&mut node, names)?;

    let result = ident(&names.fresh("result")?);
    let loops = node
        .blocks
        .iter()
        .map(|block| LoopDescriptor::allocate(block, names))
        .collect::<Result<Vec<_>, _>>()?;

    let push = expr_stmt(call(
        member(Expr::Ident(result.clone()), "push"),
        vec![node.body],
    ));
    let mut body = match node.filter {
        Some(test) => Stmt::If(IfStmt {
            span: DUMMY_SP,
            test,
            cons: Box::new(block(vec![push])),
            alt: None,
        }),
        None => push,
    };

    for (block, descriptor) in node.blocks.into_iter().zip(loops).rev() {
        body = descriptor.into_loop(block.source, body);
    }

    let stmts = vec![
        Stmt::Decl(Decl::Var(Box::new(VarDecl {
            span: DUMMY_SP,
            ctxt: SyntaxContext::empty(),
            kind: VarDeclKind::Var,
            declare: false,
            decls: vec![declarator(
                result.clone(),
                Some(Box::new(Expr::Array(ArrayLit {
                    span: DUMMY_SP,
                    elems: vec![],
                }))),
            )],
        }))),
        body,
        Stmt::Return(ReturnStmt {
            span: DUMMY_SP,
            arg: Some(Box::new(Expr::Ident(result))),
        }),
    ];

    Ok(invoke(node.span, stmts, wrapper))
}

/// Wrap `stmts` in a parameterless function and call it in place.
fn invoke(span: Span, stmts: Vec<Stmt>, wrapper: Wrapper) -> Expr {
    let body = BlockStmt {
        span: DUMMY_SP,
        ctxt: SyntaxContext::empty(),
        stmts,
    };

    let function = match wrapper {
        Wrapper::Arrow => Expr::Arrow(ArrowExpr {
            span: DUMMY_SP,
            ctxt: SyntaxContext::empty(),
            params: vec![],
            body: Box::new(BlockStmtOrExpr::BlockStmt(body)),
            is_async: false,
            is_generator: false,
            type_params: None,
            return_type: None,
        }),
        Wrapper::Plain | Wrapper::Call | Wrapper::Apply => Expr::Fn(FnExpr {
            ident: None,
            function: Box::new(Function {
                params: vec![],
                decorators: vec![],
                span: DUMMY_SP,
                ctxt: SyntaxContext::empty(),
                body: Some(body),
                is_generator: false,
                is_async: false,
                type_params: None,
                return_type: None,
            }),
        }),
    };
    let function = Expr::Paren(ParenExpr {
        span: DUMMY_SP,
        expr: Box::new(function),
    });

    let this = || Expr::This(ThisExpr { span: DUMMY_SP });
    let (callee, args) = match wrapper {
        Wrapper::Plain | Wrapper::Arrow => (function, vec![]),
        Wrapper::Call => (member(function, "call"), vec![this()]),
        Wrapper::Apply => (
            member(function, "apply"),
            vec![this(), Expr::Ident(ident("arguments"))],
        ),
    };

    let mut invocation = call(callee, args.into_iter().map(Box::new).collect());
    if let Expr::Call(call) = &mut invocation {
        call.span = span;
    }
    invocation
}

fn ident(name: &str) -> Ident {
    Ident::new_no_ctxt(name.into(), DUMMY_SP)
}

fn num(value: f64) -> Expr {
    Expr::Lit(Lit::Num(Number {
        span: DUMMY_SP,
        value,
        raw: None,
    }))
}

fn member(obj: Expr, prop: &str) -> Expr {
    Expr::Member(MemberExpr {
        span: DUMMY_SP,
        obj: Box::new(obj),
        prop: MemberProp::Ident(IdentName::new(prop.into(), DUMMY_SP)),
    })
}

fn call(callee: Expr, args: Vec<Box<Expr>>) -> Expr {
    Expr::Call(CallExpr {
        span: DUMMY_SP,
        callee: Callee::Expr(Box::new(callee)),
        args: args
            .into_iter()
            .map(|expr| ExprOrSpread { spread: None, expr })
            .collect(),
        type_args: None,
        ..Default::default()
    })
}

fn declarator(name: Ident, init: Option<Box<Expr>>) -> VarDeclarator {
    VarDeclarator {
        span: DUMMY_SP,
        name: Pat::Ident(name.into()),
        init,
        definite: false,
    }
}

fn expr_stmt(expr: Expr) -> Stmt {
    Stmt::Expr(ExprStmt {
        span: DUMMY_SP,
        expr: Box::new(expr),
    })
}

fn block(stmts: Vec<Stmt>) -> Stmt {
    Stmt::Block(BlockStmt {
        span: DUMMY_SP,
        ctxt: SyntaxContext::empty(),
        stmts,
    })
}
