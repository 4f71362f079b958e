//! Call checking
//!
//! A message send is resolved in this order: a virtual method of the
//! receiver's type, the `value:` selectors of a function type, the case switch
//! of an or-type, and finally the methods declared for the receiver's type in
//! its defining module and the calling module. The resolved function is then
//! called either grounded (plain argument checks) or lifted: its type
//! arguments are inferred by unification and the call is redirected to the
//! matching instance.

use super::Checker;
use crate::context::ParmOwner;
use crate::error::{CheckError, ErrorKind};
use crate::program::{Builtin, DefRef, TypeBody};
use crate::scope::Scope;
use crate::unification::{Bindings, Unifier};
use petal_ast::{Call, ExprKind, FunId, Msg, Parm, Span, TypeId};

impl Checker {
    /// Methods with selector `sel` declared on the type of `recv`
    pub(crate) fn find_methods(&self, scope: &Scope, recv: TypeId, sel: &str) -> Vec<FunId> {
        let (base, _) = self.program.ref_base(recv);
        let root = self.program.root(base);
        let mut found = Vec::new();
        for m in scope.lookup_modules(self.program.ty(root).module) {
            for &f in &self.program.module(m).methods {
                let fun = self.program.fun(f);
                if fun.sel == sel && fun.recv_type == Some(root) && !found.contains(&f) {
                    found.push(f);
                }
            }
        }
        found
    }

    /// The function a method call on `recv` runs without inference: the
    /// method itself, or its instance at the receiver's type arguments.
    /// Methods with type parameters of their own have no such function.
    pub(crate) fn method_for(
        &mut self,
        scope: &Scope,
        f: FunId,
        recv: TypeId,
        span: &Span,
    ) -> Option<FunId> {
        let fun = self.program.fun(f);
        if !fun.is_generic() {
            return Some(f);
        }
        if !fun.type_parms.is_empty() {
            return None;
        }
        let (base, _) = self.program.ref_base(recv);
        let args = self.program.ty(base).args.clone();
        self.instantiate_fun(scope, f, args, span).ok()
    }

    pub(crate) fn check_call(&mut self, scope: &Scope, call: &mut Call) -> Option<TypeId> {
        let Some(recv) = call.recv.as_mut() else {
            let mut last = None;
            for msg in call.msgs.iter_mut() {
                last = self.check_fun_call(scope, msg);
            }
            return last;
        };

        let recv_ty = self.infer_expr(scope, recv);
        let mut last = None;
        for msg in call.msgs.iter_mut() {
            last = match recv_ty {
                Some(t) => self.check_method_call(scope, t, msg),
                None => {
                    self.infer_args(scope, msg);
                    None
                }
            };
        }
        last
    }

    fn check_fun_call(&mut self, scope: &Scope, msg: &mut Msg) -> Option<TypeId> {
        match self.lookup(scope, msg.module.as_deref(), &msg.sel, &msg.span) {
            Some(DefRef::Fun(f)) => self.dispatch(scope, f, None, msg),
            Some(other) => {
                let err = CheckError::new(
                    ErrorKind::NotAFunction {
                        kind: other.kind_name(),
                        name: msg.sel.clone(),
                    },
                    self.loc(scope.module, &msg.span),
                )
                .with_note(self.def_loc(other), format!("{} is defined here", msg.sel));
                self.report(err);
                self.infer_args(scope, msg);
                None
            }
            None => {
                self.infer_args(scope, msg);
                None
            }
        }
    }

    fn check_method_call(&mut self, scope: &Scope, recv: TypeId, msg: &mut Msg) -> Option<TypeId> {
        let (base, _) = self.program.ref_base(recv);
        let ty = self.program.ty(base);
        let body = ty.body.clone();
        let ty_args = ty.args.clone();

        // a bounded variable has its bound's methods; any other variable's
        // calls are checked per instance
        if let TypeBody::Var { bound } = body {
            return match bound {
                Some(bound) => self.check_method_call(scope, bound, msg),
                None => {
                    self.infer_args(scope, msg);
                    None
                }
            };
        }

        match &body {
            TypeBody::Virt(sigs) => {
                if let Some(sig) = sigs.iter().find(|s| s.sel == msg.sel) {
                    let parms: Vec<Option<TypeId>> = sig.parms.iter().map(|p| p.resolved).collect();
                    let ret = match &sig.ret {
                        Some(r) => r.resolved,
                        None => Some(self.builtins.nil),
                    };
                    self.check_args(scope, &parms, msg);
                    return ret;
                }
            }
            TypeBody::Builtin(Builtin::Fun) => {
                if let Some((&ret, parms)) = ty_args.split_last() {
                    if msg.sel == value_selector(parms.len()) {
                        let parms: Vec<Option<TypeId>> = parms.iter().copied().map(Some).collect();
                        self.check_args(scope, &parms, msg);
                        return Some(ret);
                    }
                }
            }
            TypeBody::Or(cases) if msg.sel == switch_selector(cases) => {
                return self.check_switch(scope, cases, msg);
            }
            _ => {}
        }

        let found = self.find_methods(scope, base, &msg.sel);
        match found.as_slice() {
            [] => {
                self.error(
                    ErrorKind::MethodUndefined {
                        ty: self.program.display(recv),
                        sel: msg.sel.clone(),
                    },
                    scope.module,
                    &msg.span,
                );
                self.infer_args(scope, msg);
                None
            }
            [f] => self.dispatch(scope, *f, Some(base), msg),
            _ => {
                let mut err = CheckError::new(
                    ErrorKind::Ambiguous {
                        name: msg.sel.clone(),
                    },
                    self.loc(scope.module, &msg.span),
                );
                for &f in &found {
                    err = err.with_note(self.def_loc(DefRef::Fun(f)), format!("{} is defined here", msg.sel));
                }
                self.report(err);
                self.infer_args(scope, msg);
                None
            }
        }
    }

    /// `b ifSome: [:x | ..] ifNone: [..]`: one block per case, taking the
    /// case payload if it has one. The result is the arms' common type, or
    /// `Nil` when they disagree.
    fn check_switch(&mut self, scope: &Scope, cases: &[Parm], msg: &mut Msg) -> Option<TypeId> {
        let mut results = Vec::with_capacity(cases.len());
        for (case, arg) in cases.iter().zip(msg.args.iter_mut()) {
            let payload: Vec<Option<TypeId>> = case
                .ty
                .as_ref()
                .map(|t| t.resolved)
                .into_iter()
                .collect();
            let span = arg.span.clone();
            let arm = match &mut arg.kind {
                ExprKind::Block(block) => {
                    if block.parms.len() != payload.len() {
                        self.error(
                            ErrorKind::ArgCountMismatch {
                                got: block.parms.len(),
                                expected: payload.len(),
                            },
                            scope.module,
                            &span,
                        );
                    }
                    let t = self.check_block_with(scope, block, &payload, None, &span);
                    arg.ty = t;
                    t
                }
                _ => self.infer_expr(scope, arg),
            };
            results.push(arm.and_then(|t| self.fun_result(t)));
        }

        let first = results.first().copied().flatten();
        if first.is_some() && results.iter().all(|&r| r == first) {
            first
        } else {
            Some(self.builtins.nil)
        }
    }

    /// The result type of a function type
    fn fun_result(&self, t: TypeId) -> Option<TypeId> {
        let ty = self.program.ty(t);
        if ty.body == TypeBody::Builtin(Builtin::Fun) {
            ty.args.last().copied()
        } else {
            None
        }
    }

    /// Checks the arguments of a call to `f`, instantiating it first if it is
    /// generic. `recv` is the receiver's type for method calls.
    fn dispatch(
        &mut self,
        scope: &Scope,
        f: FunId,
        recv: Option<TypeId>,
        msg: &mut Msg,
    ) -> Option<TypeId> {
        let fun = self.program.fun(f);
        let expected = fun.parms.len();
        let generic = fun.is_generic();
        let parms = fun.parm_types();
        if msg.args.len() != expected {
            self.error(
                ErrorKind::ArgCountMismatch {
                    got: msg.args.len(),
                    expected,
                },
                scope.module,
                &msg.span,
            );
            self.infer_args(scope, msg);
            return None;
        }
        if generic {
            return self.dispatch_lifted(scope, f, recv, msg);
        }

        let ret = self.ret_type(f);
        self.check_args(scope, &parms, msg);
        msg.fun = Some(f);
        ret
    }

    fn dispatch_lifted(
        &mut self,
        scope: &Scope,
        f: FunId,
        recv: Option<TypeId>,
        msg: &mut Msg,
    ) -> Option<TypeId> {
        let fun = self.program.fun(f);
        let sel = fun.sel.clone();
        let nrecv = fun.recv.as_ref().map_or(0, |r| r.parms.len());
        let nvars = nrecv + fun.type_parms.len();
        let parm_types = fun.parm_types();
        let vars: Vec<TypeId> = (0..nvars).map(|i| self.type_var(ParmOwner::Fun(f), i)).collect();
        let span = msg.span.clone();

        // the receiver's type arguments are known before any argument is seen
        let mut bindings = Bindings::new();
        if let Some(recv) = recv {
            let recv_args = self.program.ty(recv).args.clone();
            for (&var, &arg) in vars.iter().zip(&recv_args) {
                bindings.insert(var, (arg, span.clone()));
            }
        }
        let known = bindings.clone();

        let path = self.program.module(scope.module).path.clone();
        let mut failed = false;
        // an argument typed over an enclosing generic's variables
        let mut vague = false;
        for (arg, parm) in msg.args.iter_mut().zip(parm_types) {
            let Some(parm) = parm else {
                self.infer_expr(scope, arg);
                continue;
            };
            if let Some(ground) = self.ground_under(scope, parm, &known, &span) {
                self.check_expr(scope, arg, Some(ground));
                continue;
            }

            let arg_span = arg.span.clone();
            let got = match &mut arg.kind {
                ExprKind::Block(block) if self.program.builtin(parm) == Some(Builtin::Fun) => {
                    let (hints, result) = self.block_hints(scope, parm, &bindings, &span);
                    let t = self.check_block_with(scope, block, &hints, result, &arg_span);
                    arg.ty = t;
                    t
                }
                _ => self.infer_expr(scope, arg),
            };
            let Some(got) = got else { continue };
            let unified = Unifier::new(&self.program, &path).unify(parm, got, &arg_span, &mut bindings);
            if let Err(err) = unified {
                if self.program.has_vars(got) {
                    vague = true;
                } else {
                    self.report(err);
                    failed = true;
                }
            }
        }
        if vague {
            return None;
        }

        let mut args = Vec::with_capacity(nvars);
        for &var in &vars {
            match bindings.get(&var) {
                Some(&(t, _)) => args.push(t),
                None => {
                    self.error(
                        ErrorKind::CannotInfer {
                            name: self.program.ty(var).name.clone(),
                        },
                        scope.module,
                        &span,
                    );
                    failed = true;
                }
            }
        }
        if failed {
            return None;
        }

        let inst = match self.instantiate_fun(scope, f, args, &span) {
            Ok(inst) => inst,
            Err(causes) => {
                self.cannot_instantiate(scope, sel, &span, causes);
                return None;
            }
        };
        let parms = self.program.fun(inst).parm_types();
        for (arg, parm) in msg.args.iter_mut().zip(parms) {
            if let Some(parm) = parm {
                self.convert_expr(scope, arg, parm);
            }
        }
        msg.fun = Some(inst);
        self.ret_type(inst)
    }

    /// `t` with the bound variables replaced, if that leaves no variable
    fn ground_under(
        &mut self,
        scope: &Scope,
        t: TypeId,
        bindings: &Bindings,
        span: &Span,
    ) -> Option<TypeId> {
        if !self.program.has_vars(t) {
            return Some(t);
        }
        if self.program.is_var(t) {
            return bindings.get(&t).map(|&(bound, _)| bound);
        }
        let ty = self.program.ty(t);
        let root = self.program.root(t);
        let mut args = Vec::with_capacity(ty.args.len());
        for arg in ty.args.clone() {
            args.push(self.ground_under(scope, arg, bindings, span)?);
        }
        self.instantiate_type(scope, root, args, span)
    }

    /// Parameter and result hints for a block passed where a function type
    /// mentioning type variables is expected
    fn block_hints(
        &mut self,
        scope: &Scope,
        fun_ty: TypeId,
        bindings: &Bindings,
        span: &Span,
    ) -> (Vec<Option<TypeId>>, Option<TypeId>) {
        let args = self.program.ty(fun_ty).args.clone();
        let Some((&ret, parms)) = args.split_last() else {
            return (Vec::new(), None);
        };
        let hints = parms
            .iter()
            .map(|&p| self.ground_under(scope, p, bindings, span))
            .collect();
        (hints, self.ground_under(scope, ret, bindings, span))
    }

    /// What a call to `f` yields: its result type, `Nil` if it declares
    /// none, `None` if the declared type did not resolve
    fn ret_type(&self, f: FunId) -> Option<TypeId> {
        match &self.program.fun(f).ret {
            Some(ret) => ret.resolved,
            None => Some(self.builtins.nil),
        }
    }

    fn check_args(&mut self, scope: &Scope, parms: &[Option<TypeId>], msg: &mut Msg) {
        if msg.args.len() != parms.len() {
            self.error(
                ErrorKind::ArgCountMismatch {
                    got: msg.args.len(),
                    expected: parms.len(),
                },
                scope.module,
                &msg.span,
            );
            self.infer_args(scope, msg);
            return;
        }
        for (arg, &parm) in msg.args.iter_mut().zip(parms) {
            self.check_expr(scope, arg, parm);
        }
    }

    /// Checks the arguments of a call that could not be resolved, so their
    /// own errors still surface. Instances they need are not kept.
    fn infer_args(&mut self, scope: &Scope, msg: &mut Msg) {
        self.discarding(|c| {
            for arg in msg.args.iter_mut() {
                c.infer_expr(scope, arg);
            }
        });
    }
}

/// `value`, `value:`, `value:value:`, ..
fn value_selector(parms: usize) -> String {
    match parms {
        0 => "value".to_string(),
        n => "value:".repeat(n),
    }
}

/// `ifTrue:ifFalse:` for `Bool { true | false }`
fn switch_selector(cases: &[Parm]) -> String {
    cases
        .iter()
        .map(|c| {
            let mut chars = c.name.chars();
            let head: String = chars.next().map(|h| h.to_uppercase().collect()).unwrap_or_default();
            format!("if{head}{}:", chars.as_str())
        })
        .collect()
}
