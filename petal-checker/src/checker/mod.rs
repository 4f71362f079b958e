//! The checker and its per-module driver
//!
//! A module is checked in phases: collect its definitions, resolve type
//! definitions, resolve function signatures, type module variables, check the
//! function bodies, then drain the queue of instance bodies that checking
//! produced. A generic body is checked once over its type variables, then
//! again per instance.

mod calls;
mod expressions;
mod literals;
mod statements;

use crate::config::Config;
use crate::context::{CheckerContext, ParmOwner, VarState};
use crate::dependency_graph::{load_modules, ImportResolver};
use crate::error::{CheckError, ErrorKind, Loc};
use crate::intrinsics::{self, Builtins};
use crate::program::{DefRef, Instance, Program, TypeBody, BUILTIN};
use crate::scope::{Binding, Scope};
use petal_ast::{FunId, ModId, Module, Span, TypeId, TypeName, VarId};

/// Result of a checking run: the program (annotated trees plus instances) and
/// every error found, in discovery order
#[derive(Debug)]
pub struct Checked {
    pub program: Program,
    pub errors: Vec<CheckError>,
}

impl Checked {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_result(self) -> Result<Program, Vec<CheckError>> {
        if self.errors.is_empty() {
            Ok(self.program)
        } else {
            Err(self.errors)
        }
    }
}

pub struct Checker {
    pub(crate) config: Config,
    pub(crate) program: Program,
    pub(crate) ctx: CheckerContext,
    pub(crate) errors: Vec<CheckError>,
    pub(crate) builtins: Builtins,
}

impl Checker {
    pub fn new(config: Config) -> Self {
        let mut program = Program::new();
        let builtins = intrinsics::install(&mut program, &config);
        let mut checker = Self {
            config,
            program,
            ctx: CheckerContext::new(),
            errors: Vec::new(),
            builtins,
        };
        let methods = checker.program.module(BUILTIN).methods.clone();
        for f in methods {
            checker.check_fun_sig(f);
        }
        checker
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn errors(&self) -> &[CheckError] {
        &self.errors
    }

    pub fn context(&self) -> &CheckerContext {
        &self.ctx
    }

    /// Loads the root module's imports and checks every module, imports first
    pub fn check(mut self, root: Module, resolver: &mut dyn ImportResolver) -> Checked {
        let loaded = load_modules(root, resolver);
        self.errors.extend(loaded.errors);
        for module in loaded.order {
            self.check_module(module);
        }
        self.finish()
    }

    pub fn finish(self) -> Checked {
        Checked {
            program: self.program,
            errors: self.errors,
        }
    }

    /// Checks one module whose imports have already been checked
    pub fn check_module(&mut self, module: Module) -> ModId {
        let path = module.path.clone();
        let _span = self
            .config
            .trace
            .then(|| tracing::debug_span!("module", path = %path).entered());
        tracing::debug!(path = %path, "checking module");

        let id = self.collect(module);
        let previous = self.ctx.current_module.replace(id);

        let defs = self.program.module(id).defs.clone();
        for def in &defs {
            if let DefRef::Type(t) = *def {
                self.check_type_def(t);
            }
        }

        let mut funs: Vec<FunId> = defs
            .iter()
            .filter_map(|d| match *d {
                DefRef::Fun(f) => Some(f),
                _ => None,
            })
            .collect();
        funs.extend(self.program.module(id).methods.iter().copied());
        for &f in &funs {
            self.check_fun_sig(f);
        }

        for def in &defs {
            if let DefRef::Var(v) = *def {
                self.var_type(v, None);
            }
        }

        for &f in &funs {
            self.check_fun_body(f);
        }
        while let Some(f) = self.ctx.pending_bodies.pop_front() {
            self.check_fun_body(f);
        }

        if self.config.dump_instances {
            self.dump_instances(id);
        }
        self.ctx.current_module = previous;
        id
    }

    fn dump_instances(&self, id: ModId) {
        let module = self.program.module(id);
        tracing::info!(path = %module.path, count = module.instances.len(), "instances");
        for inst in &module.instances {
            match *inst {
                Instance::Type(t) => tracing::info!(ty = %self.program.display(t), "type instance"),
                Instance::Fun(f) => {
                    let fun = self.program.fun(f);
                    let args: Vec<String> =
                        fun.type_args.iter().map(|&a| self.program.display(a)).collect();
                    tracing::info!(
                        sel = %fun.sel,
                        args = %args.join(", "),
                        sig = %self.program.display_fun_sig(f),
                        "function instance"
                    );
                }
            }
        }
    }

    pub(crate) fn loc(&self, module: ModId, span: &Span) -> Loc {
        Loc::new(self.program.module(module).path.clone(), span.clone())
    }

    pub(crate) fn report(&mut self, err: CheckError) {
        self.errors.push(err);
    }

    pub(crate) fn error(&mut self, kind: ErrorKind, module: ModId, span: &Span) {
        let err = CheckError::new(kind, self.loc(module, span));
        self.report(err);
    }

    /// Runs `f`, returning the errors it reported instead of keeping them
    pub(crate) fn capture<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> (R, Vec<CheckError>) {
        let mark = self.errors.len();
        let out = f(self);
        let errs = self.errors.split_off(mark);
        (out, errs)
    }

    /// Runs `f` in a discard context: instances it creates are not kept
    pub(crate) fn discarding<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.ctx.begin_discard();
        let out = f(self);
        self.ctx.end_discard();
        out
    }

    /// Where a definition was written
    pub(crate) fn def_loc(&self, def: DefRef) -> Loc {
        match def {
            DefRef::Type(t) => {
                let ty = self.program.ty(t);
                self.loc(ty.module, &ty.span)
            }
            DefRef::Fun(f) => {
                let fun = self.program.fun(f);
                self.loc(fun.module, &fun.span)
            }
            DefRef::Var(v) => {
                let var = self.program.var(v);
                self.loc(var.module, &var.span)
            }
            DefRef::Import(m, idx) => self.loc(m, &self.program.module(m).imports[idx].span),
        }
    }

    /// The scope of a generic type's definition: its parameters bound to
    /// their type variables
    pub(crate) fn generic_type_scope(&mut self, t: TypeId) -> Scope {
        let ty = self.program.ty(t);
        let mut scope = Scope::module_root(ty.module, ty.sub.clone());
        let names: Vec<String> = ty.parms.iter().map(|p| p.name.clone()).collect();
        for (i, name) in names.iter().enumerate() {
            let var = self.type_var(ParmOwner::Type(t), i);
            scope = scope.push(name, Binding::TypeVar(var));
        }
        scope
    }

    fn check_type_def(&mut self, t: TypeId) {
        let ty = self.program.ty(t);
        let generic = !ty.parms.is_empty();
        let root = Scope::module_root(ty.module, ty.sub.clone());
        let scope = if generic {
            self.generic_type_scope(t)
        } else {
            root
        };

        if generic {
            let mut parms = std::mem::take(&mut self.program.ty_mut(t).parms);
            for (i, parm) in parms.iter_mut().enumerate() {
                if let Some(bound) = parm.ty.as_mut() {
                    let resolved = self.resolve_type_name(&scope, bound);
                    self.set_var_bound(ParmOwner::Type(t), i, resolved);
                }
            }
            self.program.ty_mut(t).parms = parms;
        } else if matches!(self.program.ty(t).body, TypeBody::Alias(_)) {
            self.resolve_alias(t);
            return;
        }

        // instances made while resolving copy the unresolved body and resolve
        // it themselves
        let mut body = self.program.ty(t).body.clone();
        match &mut body {
            TypeBody::Alias(target) => {
                // a generic alias is only resolved through its instances, but
                // its target must still name something
                self.resolve_type_name(&scope, target);
                target.resolved = None;
            }
            TypeBody::And(parms) | TypeBody::Or(parms) => {
                for parm in parms.iter_mut() {
                    if let Some(tn) = parm.ty.as_mut() {
                        self.resolve_type_name(&scope, tn);
                    }
                }
            }
            TypeBody::Virt(sigs) => {
                for sig in sigs.iter_mut() {
                    for tn in sig.parms.iter_mut() {
                        self.resolve_type_name(&scope, tn);
                    }
                    if let Some(ret) = sig.ret.as_mut() {
                        self.resolve_type_name(&scope, ret);
                    }
                }
            }
            _ => {}
        }
        self.program.ty_mut(t).body = body;
    }

    /// The scope a function's signature is resolved in: the module plus the
    /// receiver's and the function's own type parameters
    fn signature_scope(&mut self, f: FunId) -> Scope {
        let fun = self.program.fun(f);
        let mut scope = Scope::module_root(fun.module, fun.sub.clone());
        let mut names: Vec<String> = fun
            .recv
            .iter()
            .flat_map(|r| r.parms.iter().map(|p| p.name.clone()))
            .collect();
        names.extend(fun.type_parms.iter().map(|p| p.name.clone()));
        for (i, name) in names.iter().enumerate() {
            let var = self.type_var(ParmOwner::Fun(f), i);
            scope = scope.push(name, Binding::TypeVar(var));
        }
        scope
    }

    pub(crate) fn check_fun_sig(&mut self, f: FunId) {
        let scope = self.signature_scope(f);

        if let Some(recv) = self.program.fun(f).recv.clone() {
            let root = self.resolve_receiver(&scope, &recv);
            self.program.fun_mut(f).recv_type = root;
            let mut recv = recv;
            for (i, parm) in recv.parms.iter_mut().enumerate() {
                if let Some(bound) = parm.ty.as_mut() {
                    let resolved = self.resolve_type_name(&scope, bound);
                    self.set_var_bound(ParmOwner::Fun(f), i, resolved);
                }
            }
            self.program.fun_mut(f).recv = Some(recv);
        }

        let nrecv = self.program.fun(f).recv.as_ref().map_or(0, |r| r.parms.len());
        let mut type_parms = std::mem::take(&mut self.program.fun_mut(f).type_parms);
        for (j, parm) in type_parms.iter_mut().enumerate() {
            if let Some(bound) = parm.ty.as_mut() {
                let resolved = self.resolve_type_name(&scope, bound);
                self.set_var_bound(ParmOwner::Fun(f), nrecv + j, resolved);
            }
        }
        self.program.fun_mut(f).type_parms = type_parms;

        let mut parms = std::mem::take(&mut self.program.fun_mut(f).parms);
        for parm in parms.iter_mut() {
            match parm.ty.as_mut() {
                Some(tn) => {
                    self.resolve_type_name(&scope, tn);
                }
                None => self.error(
                    ErrorKind::MissingType {
                        name: parm.name.clone(),
                    },
                    scope.module,
                    &parm.span,
                ),
            }
        }
        self.program.fun_mut(f).parms = parms;

        if let Some(mut ret) = self.program.fun_mut(f).ret.take() {
            self.resolve_type_name(&scope, &mut ret);
            self.program.fun_mut(f).ret = Some(ret);
        }
    }

    /// The scope a function body is checked in. Type parameters stand for
    /// the instance's arguments, or for their type variables in a generic body.
    fn body_scope(&mut self, f: FunId) -> Scope {
        let fun = self.program.fun(f);
        let generic = fun.is_generic();
        let span = fun.span.clone();
        let nrecv = fun.recv.as_ref().map_or(0, |r| r.parms.len());
        let mut scope = Scope::module_root(fun.module, fun.sub.clone());
        scope.extra = fun.lookup_mod;
        let names: Vec<String> = fun
            .recv
            .iter()
            .flat_map(|r| r.parms.iter())
            .chain(fun.type_parms.iter())
            .map(|p| p.name.clone())
            .collect();
        let type_args = if generic {
            (0..names.len())
                .map(|i| self.type_var(ParmOwner::Fun(f), i))
                .collect()
        } else {
            self.program.fun(f).type_args.clone()
        };
        for (name, &arg) in names.iter().zip(&type_args) {
            let binding = if generic {
                Binding::TypeVar(arg)
            } else {
                Binding::TypeArg(arg)
            };
            scope = scope.push(name, binding);
        }
        scope = scope.push("", Binding::Fun(f));

        let mut recv = self.program.fun(f).recv_type;
        if let (true, Some(root)) = (generic && nrecv > 0, recv) {
            recv = self.instantiate_type(&scope, root, type_args[..nrecv].to_vec(), &span);
        }
        if let Some(recv) = recv {
            scope = scope.push(
                "self",
                Binding::Local {
                    ty: Some(recv),
                    span: span.clone(),
                },
            );
        }
        for parm in &self.program.fun(f).parms {
            scope = scope.push(
                &parm.name,
                Binding::Local {
                    ty: parm.ty.as_ref().and_then(|t| t.resolved),
                    span: parm.span.clone(),
                },
            );
        }
        scope
    }

    fn check_fun_body(&mut self, f: FunId) {
        let fun = self.program.fun(f);
        if fun.builtin {
            return;
        }
        let generic = fun.is_generic();
        let instance = fun.inst_of.is_some();
        let _span = self
            .config
            .trace
            .then(|| tracing::trace_span!("body", sel = %fun.sel, generic).entered());
        let previous = self.ctx.current_fun.replace(f);

        if generic {
            // checked once over its type variables on a copy; instances are
            // substituted from the unannotated tree
            let mut stmts = self.program.fun(f).stmts.clone();
            self.discarding(|c| {
                let scope = c.body_scope(f);
                c.check_stmts(&scope, &mut stmts, None);
            });
        } else {
            let scope = self.body_scope(f);
            let mut stmts = std::mem::take(&mut self.program.fun_mut(f).stmts);
            let (_, errs) = self.capture(|c| c.check_stmts(&scope, &mut stmts, None));
            self.program.fun_mut(f).stmts = stmts;
            for err in errs {
                // already reported by the generic body
                if !(instance && self.errors.contains(&err)) {
                    self.report(err);
                }
            }
        }
        self.ctx.current_fun = previous;
    }

    /// The type of a module variable, checking its initializer on first use
    pub(crate) fn var_type(&mut self, v: VarId, use_site: Option<(ModId, &Span)>) -> Option<TypeId> {
        match self.ctx.var_states.get(&v) {
            Some(VarState::Done) => return self.program.var(v).resolved,
            Some(VarState::Cycle) => return None,
            Some(VarState::InProgress) => {
                self.ctx.var_states.insert(v, VarState::Cycle);
                let var = self.program.var(v);
                let mut err = CheckError::new(
                    ErrorKind::InitCycle {
                        name: var.name.clone(),
                    },
                    self.loc(var.module, &var.span),
                );
                if let Some((m, span)) = use_site {
                    err = err.with_note(self.loc(m, span), "used here");
                }
                self.report(err);
                return None;
            }
            None => {}
        }

        // a variable's type is permanent even when its first use is inside
        // a discarded call
        let depth = self.ctx.suspend_discard();
        let resolved = self.check_var_init(v);
        self.ctx.resume_discard(depth);
        resolved
    }

    fn check_var_init(&mut self, v: VarId) -> Option<TypeId> {
        self.ctx.var_states.insert(v, VarState::InProgress);
        let var = self.program.var(v);
        let scope = Scope::module_root(var.module, var.sub.clone());
        let mut declared = self.program.var_mut(v).ty.take();
        let want = declared
            .as_mut()
            .and_then(|tn| self.resolve_type_name(&scope, tn));
        let mut init = std::mem::replace(&mut self.program.var_mut(v).init, placeholder());
        let got = self.check_expr(&scope, &mut init, want);

        let resolved = if declared.is_some() { want } else { got };
        let var = self.program.var_mut(v);
        var.ty = declared;
        var.init = init;
        var.resolved = resolved;
        if self.ctx.var_states.get(&v) == Some(&VarState::InProgress) {
            self.ctx.var_states.insert(v, VarState::Done);
        }
        resolved
    }

    /// Records the bound of a type variable once it is resolved
    fn set_var_bound(&mut self, owner: ParmOwner, idx: usize, bound: Option<TypeId>) {
        let var = self.type_var(owner, idx);
        if let TypeBody::Var { bound: b } = &mut self.program.ty_mut(var).body {
            *b = bound;
        }
    }

    /// `Nil` unless a type is given
    pub(crate) fn or_nil(&self, ty: Option<TypeId>) -> TypeId {
        ty.unwrap_or(self.builtins.nil)
    }

    /// A type name already resolved to `ty`, as written back into the tree
    pub(crate) fn resolved_name(&self, ty: TypeId, span: &Span) -> TypeName {
        TypeName {
            span: span.clone(),
            ..TypeName::resolved_as(self.program.display(ty), ty)
        }
    }
}

/// Stand-in left behind while an expression is moved out of the tree
pub(crate) fn placeholder() -> petal_ast::Expr {
    petal_ast::Expr {
        span: Span::default(),
        kind: petal_ast::ExprKind::Block(petal_ast::Block {
            parms: Vec::new(),
            stmts: Vec::new(),
        }),
        ty: None,
    }
}
