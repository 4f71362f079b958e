//! Statement checking

use super::Checker;
use crate::error::ErrorKind;
use crate::program::DefRef;
use crate::scope::{Binding, Scope};
use petal_ast::{Assign, Call, Expr, ExprKind, Ident, Return, Stmt, TypeId};

impl Checker {
    /// Checks a statement list, threading local variables through it.
    /// Returns the type of a trailing expression statement; `last_want` is
    /// the type that expression should convert to.
    pub(crate) fn check_stmts(
        &mut self,
        scope: &Scope,
        stmts: &mut Vec<Stmt>,
        last_want: Option<TypeId>,
    ) -> Option<TypeId> {
        let mut scope = scope.clone();
        let count = stmts.len();
        let mut out = Vec::with_capacity(count);
        let mut last = None;
        for (i, stmt) in std::mem::take(stmts).into_iter().enumerate() {
            last = None;
            match stmt {
                Stmt::Assign(assign) => out.extend(self.check_assign(&mut scope, assign)),
                Stmt::Return(mut ret) => {
                    self.check_return(&scope, &mut ret);
                    out.push(Stmt::Return(ret));
                }
                Stmt::Expr(mut expr) => {
                    let want = if i + 1 == count { last_want } else { None };
                    last = self.check_expr(&scope, &mut expr, want);
                    out.push(Stmt::Expr(expr));
                }
            }
        }
        *stmts = out;
        last
    }

    /// Checks an assignment, splitting `a, b := r x; y.` into one assignment
    /// per message against a shared receiver temporary
    fn check_assign(&mut self, scope: &mut Scope, mut assign: Assign) -> Vec<Stmt> {
        if assign.vars.len() == 1 {
            self.check_single_assign(scope, &mut assign);
            return vec![Stmt::Assign(assign)];
        }

        let messages = match &assign.expr.kind {
            ExprKind::Call(Call { recv: Some(_), msgs }) => msgs.len(),
            _ => 1,
        };
        if messages != assign.vars.len() {
            self.error(
                ErrorKind::AssignCountMismatch {
                    got: messages,
                    expected: assign.vars.len(),
                },
                scope.module,
                &assign.span,
            );
            self.infer_expr(scope, &mut assign.expr);
            for var in assign.vars.iter_mut() {
                let ty = var.ty.as_mut().and_then(|tn| self.resolve_type_name(scope, tn));
                *scope = scope.push(
                    &var.name,
                    Binding::Local {
                        ty,
                        span: var.span.clone(),
                    },
                );
            }
            return vec![Stmt::Assign(assign)];
        }

        let ExprKind::Call(Call { recv: Some(recv), msgs }) = assign.expr.kind else {
            unreachable!("split assignment without a cascade");
        };
        let temp = self.ctx.temp_name();
        let recv_span = recv.span.clone();
        let mut out = self.check_assign(
            scope,
            Assign {
                span: assign.span.clone(),
                vars: vec![petal_ast::Parm {
                    span: recv_span.clone(),
                    name: temp.clone(),
                    ty: None,
                }],
                expr: *recv,
            },
        );
        for (var, msg) in assign.vars.into_iter().zip(msgs) {
            let target = Expr {
                span: recv_span.clone(),
                kind: ExprKind::Ident(Ident {
                    name: temp.clone(),
                    var: None,
                }),
                ty: None,
            };
            let part = Assign {
                span: msg.span.clone(),
                vars: vec![var],
                expr: Expr {
                    span: msg.span.clone(),
                    kind: ExprKind::Call(Call {
                        recv: Some(Box::new(target)),
                        msgs: vec![msg],
                    }),
                    ty: None,
                },
            };
            out.extend(self.check_assign(scope, part));
        }
        out
    }

    fn check_single_assign(&mut self, scope: &mut Scope, assign: &mut Assign) {
        let var = &mut assign.vars[0];
        if var.ty.is_none() {
            // assignment to an existing variable
            if let Some((ty, _)) = scope.find_local(&var.name) {
                self.check_expr(scope, &mut assign.expr, ty);
                return;
            }
            if let Some(DefRef::Var(v)) = self.lookup_quiet(scope, &var.name) {
                let ty = self.var_type(v, Some((scope.module, &assign.span)));
                self.check_expr(scope, &mut assign.expr, ty);
                return;
            }
        }

        let declared = var.ty.as_mut().map(|tn| self.resolve_type_name(scope, tn));
        let got = self.check_expr(scope, &mut assign.expr, declared.flatten());
        let var = &mut assign.vars[0];
        let ty = match declared {
            Some(declared) => declared,
            None => {
                if let Some(t) = got {
                    var.ty = Some(self.resolved_name(t, &var.span));
                }
                got
            }
        };
        *scope = scope.push(
            &var.name,
            Binding::Local {
                ty,
                span: var.span.clone(),
            },
        );
    }

    fn check_return(&mut self, scope: &Scope, ret: &mut Return) {
        let Some(f) = scope.fun() else {
            self.error(ErrorKind::ReturnOutsideMethod, scope.module, &ret.span);
            if let Some(expr) = ret.expr.as_mut() {
                self.infer_expr(scope, expr);
            }
            return;
        };
        let fun = self.program.fun(f);
        // an unresolvable declared result constrains nothing
        let want = match &fun.ret {
            Some(tn) => tn.resolved,
            None => Some(self.builtins.nil),
        };
        match ret.expr.as_mut() {
            Some(expr) => {
                self.check_expr(scope, expr, want);
            }
            None => {
                if let Some(want) = want.filter(|&w| w != self.builtins.nil) {
                    self.error(
                        ErrorKind::Mismatch {
                            got: "Nil".to_string(),
                            want: self.program.display(want),
                        },
                        scope.module,
                        &ret.span,
                    );
                }
            }
        }
    }
}
