//! Implicit conversions
//!
//! When an expression's type differs from the type its context wants, the
//! checker may wrap it: reference or dereference wrappers equalize reference
//! depth over the same base type, and a virtual-type wrapper converts a value
//! whose methods match every virtual method. Anything else is a mismatch,
//! unless a type variable is involved: generic bodies are checked over their
//! variables and leave such conversions to their instances.

use crate::checker::{placeholder, Checker};
use crate::error::{CheckError, ErrorKind};
use crate::program::{DefRef, TypeBody};
use crate::scope::Scope;
use petal_ast::{Convert, ConvertKind, Expr, ExprKind, FunId, MethSig, Span, TypeId};

impl Checker {
    /// Converts a typed expression to `want`, wrapping it in place
    pub(crate) fn convert_expr(&mut self, scope: &Scope, expr: &mut Expr, want: TypeId) {
        let Some(got) = expr.ty else { return };
        if got == want {
            return;
        }

        let (got_base, got_depth) = self.program.ref_base(got);
        let (want_base, want_depth) = self.program.ref_base(want);
        if got_base == want_base {
            let mut depth = got_depth;
            let mut current = got;
            while depth > want_depth {
                current = self.program.ty(current).args[0];
                wrap(expr, ConvertKind::Deref, current);
                depth -= 1;
            }
            while depth < want_depth {
                let Some(next) = self.ref_type(scope, current, &expr.span.clone()) else { return };
                current = next;
                wrap(expr, ConvertKind::Ref, current);
                depth += 1;
            }
            return;
        }
        // a type variable may stand for either side; its instances decide
        if self.program.has_vars(got) || self.program.has_vars(want) {
            return;
        }

        if self.program.is_virt(want) {
            let span = expr.span.clone();
            match self.implements(scope, got, want, &span) {
                Ok(funs) => wrap(expr, ConvertKind::Virt(funs), want),
                Err(err) => self.report(err),
            }
            return;
        }

        self.error(
            ErrorKind::Mismatch {
                got: self.program.display(got),
                want: self.program.display(want),
            },
            scope.module,
            &expr.span,
        );
    }

    /// Matches every virtual method of `iface` against the methods of `ty`.
    /// Returns the implementing function per virtual method; `None` entries
    /// mean `ty` is itself virtual and dispatches dynamically.
    pub(crate) fn implements(
        &mut self,
        scope: &Scope,
        ty: TypeId,
        iface: TypeId,
        span: &Span,
    ) -> Result<Vec<Option<FunId>>, CheckError> {
        let TypeBody::Virt(sigs) = self.program.ty(iface).body.clone() else {
            unreachable!("implements called with a non-virtual type");
        };
        let iface_ty = self.program.ty(iface);
        let iface_module = iface_ty.module;

        let mut funs = Vec::with_capacity(sigs.len());
        let mut causes = Vec::new();
        for sig in &sigs {
            let want_parms: Vec<Option<TypeId>> = sig.parms.iter().map(|p| p.resolved).collect();
            let want_ret = Some(self.or_nil(sig.ret.as_ref().and_then(|r| r.resolved)));

            if let TypeBody::Virt(own) = self.program.ty(ty).body.clone() {
                match own.iter().find(|s| s.sel == sig.sel) {
                    Some(s) => {
                        let got_parms: Vec<Option<TypeId>> = s.parms.iter().map(|p| p.resolved).collect();
                        let got_ret = Some(self.or_nil(s.ret.as_ref().and_then(|r| r.resolved)));
                        if got_parms != want_parms || got_ret != want_ret {
                            let ty_module = self.program.ty(ty).module;
                            causes.push(self.wrong_method_type(
                                scope,
                                span,
                                (iface_module, sig),
                                self.loc(ty_module, &s.span),
                                s.to_string(),
                            ));
                        }
                        funs.push(None);
                    }
                    None => causes.push(self.method_missing(scope, span, &sig.sel)),
                }
                continue;
            }

            let found = match self.find_methods(scope, ty, &sig.sel).as_slice() {
                [] => {
                    causes.push(self.method_missing(scope, span, &sig.sel));
                    continue;
                }
                &[found] => found,
                candidates => {
                    causes.push(self.method_ambiguous(scope, span, &sig.sel, candidates));
                    continue;
                }
            };
            let Some(f) = self.method_for(scope, found, ty, span) else {
                causes.push(self.method_missing(scope, span, &sig.sel));
                continue;
            };
            let fun = self.program.fun(f);
            let got_parms = fun.parm_types();
            let got_ret = Some(self.or_nil(fun.ret_type()));
            if got_parms != want_parms || got_ret != want_ret {
                let actual = self.program.display_fun_sig(f);
                let at = self.def_loc(DefRef::Fun(f));
                causes.push(self.wrong_method_type(scope, span, (iface_module, sig), at, actual));
            }
            funs.push(Some(f));
        }

        if causes.is_empty() {
            return Ok(funs);
        }
        Err(CheckError::new(
            ErrorKind::DoesNotImplement {
                ty: self.program.display(ty),
                iface: self.program.display(iface),
            },
            self.loc(scope.module, span),
        )
        .with_causes(causes))
    }

    fn method_missing(&self, scope: &Scope, span: &Span, sel: &str) -> CheckError {
        CheckError::new(
            ErrorKind::Undefined {
                name: sel.to_string(),
            },
            self.loc(scope.module, span),
        )
    }

    fn method_ambiguous(&self, scope: &Scope, span: &Span, sel: &str, candidates: &[FunId]) -> CheckError {
        candidates.iter().fold(
            CheckError::new(
                ErrorKind::Ambiguous {
                    name: sel.to_string(),
                },
                self.loc(scope.module, span),
            ),
            |err, &f| err.with_note(self.def_loc(DefRef::Fun(f)), format!("{sel} is defined here")),
        )
    }

    fn wrong_method_type(
        &self,
        scope: &Scope,
        span: &Span,
        (iface_module, sig): (petal_ast::ModId, &MethSig),
        actual_at: crate::error::Loc,
        actual: String,
    ) -> CheckError {
        CheckError::new(
            ErrorKind::WrongMethodType {
                sel: sig.sel.clone(),
            },
            self.loc(scope.module, span),
        )
        .with_note(self.loc(iface_module, &sig.span), format!("expected {}", self.render_meth_sig(sig)))
        .with_note(actual_at, format!("got {actual}"))
    }

    /// A virtual method signature with its types shown as resolved
    fn render_meth_sig(&self, sig: &MethSig) -> String {
        let show = |tn: &petal_ast::TypeName| match tn.resolved {
            Some(t) => self.program.display(t),
            None => tn.to_string(),
        };
        let parms: Vec<String> = sig.parms.iter().map(show).collect();
        let ret = sig.ret.as_ref().map(show);
        crate::program::render_sig(&sig.sel, &parms, ret.as_deref())
    }

    /// `T &`
    pub(crate) fn ref_type(&mut self, scope: &Scope, target: TypeId, span: &Span) -> Option<TypeId> {
        self.instantiate_type(scope, self.builtins.reference, vec![target], span)
    }

    /// `(P1, .., Pn, R) Fun`
    pub(crate) fn fun_type(
        &mut self,
        scope: &Scope,
        parms: Vec<TypeId>,
        ret: TypeId,
        span: &Span,
    ) -> Option<TypeId> {
        let mut args = parms;
        args.push(ret);
        self.instantiate_type(scope, self.builtins.fun, args, span)
    }
}

fn wrap(expr: &mut Expr, kind: ConvertKind, ty: TypeId) {
    let inner = std::mem::replace(expr, placeholder());
    *expr = Expr {
        span: inner.span.clone(),
        kind: ExprKind::Convert(Convert {
            kind,
            expr: Box::new(inner),
        }),
        ty: Some(ty),
    };
}
