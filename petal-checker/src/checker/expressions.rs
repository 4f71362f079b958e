//! Expression checking
//!
//! `check_expr` types an expression bottom-up, records the type on the node
//! and converts it to the wanted type when one is given. Missing types
//! (`None`) stand for "already reported" and constrain nothing further.

use super::Checker;
use crate::error::ErrorKind;
use crate::program::{Builtin, DefRef, TypeBody};
use crate::scope::{Binding, Scope};
use petal_ast::{sel_arity, Block, Call, Ctor, Expr, ExprKind, Msg, Span, Stmt, TypeId};

impl Checker {
    /// Types `expr`, converting it to `want` if given. Returns the type the
    /// expression ends up with.
    pub(crate) fn check_expr(&mut self, scope: &Scope, expr: &mut Expr, want: Option<TypeId>) -> Option<TypeId> {
        let ty = self.expr_type(scope, expr, want);
        expr.ty = ty;
        if let (Some(want), Some(_)) = (want, ty) {
            self.convert_expr(scope, expr, want);
        }
        expr.ty
    }

    pub(crate) fn infer_expr(&mut self, scope: &Scope, expr: &mut Expr) -> Option<TypeId> {
        self.check_expr(scope, expr, None)
    }

    fn expr_type(&mut self, scope: &Scope, expr: &mut Expr, want: Option<TypeId>) -> Option<TypeId> {
        let span = expr.span.clone();
        match &mut expr.kind {
            ExprKind::Int(text) => {
                let text = text.clone();
                self.check_int_literal(scope, &text, &span, want)
            }
            ExprKind::Float(text) => {
                let text = text.clone();
                self.check_float_literal(scope, &text, &span, want)
            }
            ExprKind::Rune(c) => {
                let c = *c;
                self.check_rune_literal(scope, c, &span, want)
            }
            ExprKind::String(_) => Some(self.builtins.string),
            ExprKind::Ident(_) => self.ident_type(scope, expr, want),
            ExprKind::Call(call) => self.check_call(scope, call),
            ExprKind::Ctor(ctor) => self.check_ctor(scope, ctor, &span),
            ExprKind::Block(block) => self.check_block(scope, block, want, &span),
            ExprKind::Convert(_) => expr.ty,
        }
    }

    /// A local, a module variable, or a call of a function taking no
    /// arguments (the identifier is rewritten into the call)
    fn ident_type(&mut self, scope: &Scope, expr: &mut Expr, want: Option<TypeId>) -> Option<TypeId> {
        let ExprKind::Ident(ident) = &mut expr.kind else {
            unreachable!("ident_type on a non-identifier");
        };
        if let Some((ty, _)) = scope.find_local(&ident.name) {
            return ty;
        }

        let span = expr.span.clone();
        match self.lookup(scope, None, &ident.name, &span)? {
            DefRef::Var(v) => {
                ident.var = Some(v);
                self.var_type(v, Some((scope.module, &span)))
            }
            DefRef::Fun(_) if sel_arity(&ident.name) == 0 => {
                expr.kind = ExprKind::Call(Call {
                    recv: None,
                    msgs: vec![Msg {
                        span: span.clone(),
                        module: None,
                        sel: ident.name.clone(),
                        args: Vec::new(),
                        fun: None,
                    }],
                });
                self.expr_type(scope, expr, want)
            }
            other => {
                self.error(
                    ErrorKind::NotAValue {
                        kind: other.kind_name(),
                        name: ident.name.clone(),
                    },
                    scope.module,
                    &span,
                );
                None
            }
        }
    }

    /// Constructors: the accepted selector and arguments depend on the
    /// shape of the constructed type
    fn check_ctor(&mut self, scope: &Scope, ctor: &mut Ctor, span: &Span) -> Option<TypeId> {
        let Some(t) = self.resolve_type_name(scope, &mut ctor.ty) else {
            self.infer_ctor_args(scope, ctor);
            return None;
        };

        let body = self.program.ty(t).body.clone();
        let accepted = match &body {
            TypeBody::And(fields) => {
                let sel: String = fields.iter().map(|f| format!("{}:", f.name)).collect();
                ctor.sel == sel && {
                    let types: Vec<Option<TypeId>> = fields
                        .iter()
                        .map(|f| f.ty.as_ref().and_then(|t| t.resolved))
                        .collect();
                    self.check_ctor_args(scope, ctor, &types);
                    true
                }
            }
            TypeBody::Or(cases) => {
                let case = cases.iter().find(|c| match c.ty {
                    Some(_) => ctor.sel == format!("{}:", c.name),
                    None => ctor.sel == c.name,
                });
                match case {
                    Some(case) => {
                        let types: Vec<Option<TypeId>> = case
                            .ty
                            .as_ref()
                            .map(|t| t.resolved)
                            .into_iter()
                            .collect();
                        self.check_ctor_args(scope, ctor, &types);
                        true
                    }
                    None => false,
                }
            }
            TypeBody::Virt(_) => {
                ctor.sel.is_empty() && {
                    self.check_ctor_args(scope, ctor, &[Some(t)]);
                    true
                }
            }
            TypeBody::Builtin(builtin) => ctor.sel.is_empty() && self.check_builtin_ctor(scope, ctor, t, *builtin, span),
            _ => false,
        };

        if !accepted {
            self.error(
                ErrorKind::BadCtor {
                    ty: self.program.display(t),
                    sel: ctor.sel.clone(),
                },
                scope.module,
                span,
            );
            self.infer_ctor_args(scope, ctor);
        }
        Some(t)
    }

    fn check_builtin_ctor(
        &mut self,
        scope: &Scope,
        ctor: &mut Ctor,
        t: TypeId,
        builtin: Builtin,
        span: &Span,
    ) -> bool {
        match builtin {
            Builtin::Ref => {
                let target = self.program.ty(t).args.first().copied();
                self.check_ctor_args(scope, ctor, &[target]);
            }
            Builtin::Array => {
                let elem = self.program.ty(t).args.first().copied();
                for arg in ctor.args.iter_mut() {
                    self.check_expr(scope, arg, elem);
                }
            }
            Builtin::String => self.check_ctor_args(scope, ctor, &[Some(t)]),
            Builtin::Int { .. } | Builtin::Float { .. } => {
                if ctor.args.len() != 1 {
                    self.error(
                        ErrorKind::ArgCountMismatch {
                            got: ctor.args.len(),
                            expected: 1,
                        },
                        scope.module,
                        span,
                    );
                    self.infer_ctor_args(scope, ctor);
                    return true;
                }
                // numeric conversion: literals are range checked, other
                // values need only be numeric
                let arg = &mut ctor.args[0];
                if matches!(arg.kind, ExprKind::Int(_) | ExprKind::Float(_) | ExprKind::Rune(_)) {
                    self.check_expr(scope, arg, Some(t));
                } else if let Some(got) = self.infer_expr(scope, arg) {
                    if !self.program.is_numeric(got) && !self.program.has_vars(got) {
                        self.error(
                            ErrorKind::Mismatch {
                                got: self.program.display(got),
                                want: self.program.display(t),
                            },
                            scope.module,
                            &arg.span,
                        );
                    }
                }
            }
            Builtin::Fun => return false,
        }
        true
    }

    fn check_ctor_args(&mut self, scope: &Scope, ctor: &mut Ctor, types: &[Option<TypeId>]) {
        if ctor.args.len() != types.len() {
            self.error(
                ErrorKind::ArgCountMismatch {
                    got: ctor.args.len(),
                    expected: types.len(),
                },
                scope.module,
                &ctor.ty.span,
            );
            self.infer_ctor_args(scope, ctor);
            return;
        }
        for (arg, &ty) in ctor.args.iter_mut().zip(types) {
            self.check_expr(scope, arg, ty);
        }
    }

    fn infer_ctor_args(&mut self, scope: &Scope, ctor: &mut Ctor) {
        self.discarding(|c| {
            for arg in ctor.args.iter_mut() {
                c.infer_expr(scope, arg);
            }
        });
    }

    /// A block takes its parameter and result types from a wanted
    /// function type when it does not declare them
    fn check_block(
        &mut self,
        scope: &Scope,
        block: &mut Block,
        want: Option<TypeId>,
        span: &Span,
    ) -> Option<TypeId> {
        let (hints, result) = match want {
            Some(w) if self.program.builtin(w) == Some(Builtin::Fun) => {
                match self.program.ty(w).args.split_last() {
                    Some((&ret, parms)) => (parms.iter().copied().map(Some).collect(), Some(ret)),
                    None => (Vec::new(), None),
                }
            }
            _ => (Vec::new(), None),
        };
        self.check_block_with(scope, block, &hints, result, span)
    }

    pub(crate) fn check_block_with(
        &mut self,
        scope: &Scope,
        block: &mut Block,
        hints: &[Option<TypeId>],
        result: Option<TypeId>,
        span: &Span,
    ) -> Option<TypeId> {
        let mut inner = scope.clone();
        let mut parm_types = Vec::with_capacity(block.parms.len());
        let mut complete = true;
        for (i, parm) in block.parms.iter_mut().enumerate() {
            let ty = match parm.ty.as_mut() {
                Some(tn) => self.resolve_type_name(scope, tn),
                None => match hints.get(i).copied().flatten() {
                    Some(hint) => {
                        parm.ty = Some(self.resolved_name(hint, &parm.span));
                        Some(hint)
                    }
                    None => {
                        self.error(
                            ErrorKind::BlockParmType {
                                name: parm.name.clone(),
                            },
                            scope.module,
                            &parm.span,
                        );
                        None
                    }
                },
            };
            match ty {
                Some(t) => parm_types.push(t),
                None => complete = false,
            }
            inner = inner.push(
                &parm.name,
                Binding::Local {
                    ty,
                    span: parm.span.clone(),
                },
            );
        }

        // a block wanted to yield Nil drops the value of its last expression
        let nil = self.builtins.nil;
        let last = self.check_stmts(&inner, &mut block.stmts, result.filter(|&r| r != nil));
        let result = if result == Some(nil) || !matches!(block.stmts.last(), Some(Stmt::Expr(_))) {
            Some(nil)
        } else {
            last
        };

        if !complete {
            return None;
        }
        self.fun_type(scope, parm_types, result?, span)
    }
}
