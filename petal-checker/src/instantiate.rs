//! Monomorphization
//!
//! Instances are memoized per definition and argument handles. A type instance
//! is registered before its body is substituted, so a recursive reference
//! inside the body (`next: T List`) finds the instance being built. A function
//! instance gets its signature first; its body is substituted alongside and
//! checked later from the pending queue.
//!
//! A definition that reuses itself at arguments grown from its own type
//! parameters (`T Foo { x: T Foo Foo }`) would instantiate forever. That is
//! caught while the growing instance is requested, and the definition is
//! marked so later requests fail at once.

use crate::checker::Checker;
use crate::context::{FunInstKey, ParmOwner, TypeInstKey};
use crate::error::{CheckError, ErrorKind};
use crate::program::{Builtin, DefRef, Fun, Instance, Type, TypeBody};
use crate::scope::Scope;
use crate::subst::Subst;
use petal_ast::{FunId, Parm, Span, TypeId, TypeName};

/// Instances of one definition nested deeper than this are taken to diverge
const MAX_NESTING: usize = 32;

impl Checker {
    /// The instance of generic type `def` at `args`, creating it on first use
    pub(crate) fn instantiate_type(
        &mut self,
        scope: &Scope,
        def: TypeId,
        args: Vec<TypeId>,
        span: &Span,
    ) -> Option<TypeId> {
        let generic = self.program.ty(def);
        let variadic = generic.body == TypeBody::Builtin(Builtin::Fun);
        let expected = if variadic { 1 } else { generic.parms.len() };
        if (variadic && args.is_empty()) || (!variadic && args.len() != expected) {
            self.error(
                ErrorKind::ArgCountMismatch {
                    got: args.len(),
                    expected,
                },
                scope.module,
                span,
            );
            return None;
        }

        let key = TypeInstKey {
            def,
            args: args.clone(),
        };
        if let Some(memo) = self.ctx.type_instance(&key) {
            return match memo.clone() {
                Ok(t) => Some(t),
                Err(causes) => {
                    self.cannot_instantiate(scope, self.applied_name(def, &args), span, causes);
                    None
                }
            };
        }

        if self.type_diverges(def, &args) {
            self.ctx.divergent_types.insert(def);
            let name = self.program.ty(def).name.clone();
            let err = self.infinite_instantiation(scope, &name, DefRef::Type(def), span);
            self.report(err);
            return None;
        }

        let generic = self.program.ty(def).clone();
        let _span = self.config.trace.then(|| {
            tracing::debug_span!("instantiate", ty = %generic.name).entered()
        });
        let t = self.program.add_type(Type {
            args: args.clone(),
            body: TypeBody::Pending,
            inst_of: Some(def),
            ..generic.clone()
        });
        self.ctx.memo_type(key.clone(), Ok(t));
        let ground = !args.iter().any(|&a| self.program.has_vars(a));
        tracing::debug!(ty = %self.program.display(t), ground, "type instance");

        let names: Vec<String> = generic.parms.iter().map(|p| p.name.clone()).collect();
        let subst = self.subst_for(&names, &args);
        let inst_scope = self.instance_scope(generic.module, generic.sub.clone(), &names, &args);

        self.ctx.instantiating.push(key.clone());
        // fields and cases end any alias chain being followed
        let barrier = !matches!(generic.body, TypeBody::Alias(_));
        let aliases = if barrier {
            std::mem::take(&mut self.ctx.alias_path)
        } else {
            Vec::new()
        };
        let (_, mut errs) = self.capture(|c| {
            let parms = subst.parms(&generic.parms);
            c.check_bounds(&inst_scope, &parms, &args, span)
        });
        if errs.is_empty() {
            if ground && !self.ctx.discarding() {
                self.record_instance(scope, Instance::Type(t));
            }
            let (body, body_errs) = self.capture(|c| c.subst_type_body(&inst_scope, &subst, &generic.body));
            self.program.ty_mut(t).body = body;
            errs = body_errs;
        }
        if barrier {
            self.ctx.alias_path = aliases;
        }
        self.ctx.instantiating.pop();
        if errs.is_empty() {
            return Some(t);
        }
        self.ctx.memo_type(key, Err(errs.clone()));
        self.cannot_instantiate(scope, self.applied_name(def, &args), span, errs);
        None
    }

    fn subst_type_body(&mut self, scope: &Scope, subst: &Subst, body: &TypeBody) -> TypeBody {
        match body {
            // resolved by the alias resolver, which tracks cycles
            TypeBody::Alias(target) => TypeBody::Alias(subst.type_name(target)),
            TypeBody::And(fields) => TypeBody::And(self.subst_parms(scope, subst, fields)),
            TypeBody::Or(cases) => TypeBody::Or(self.subst_parms(scope, subst, cases)),
            TypeBody::Virt(sigs) => TypeBody::Virt(
                sigs.iter()
                    .map(|sig| {
                        let mut sig = subst.meth_sig(sig);
                        for tn in sig.parms.iter_mut() {
                            self.resolve_type_name(scope, tn);
                        }
                        if let Some(ret) = sig.ret.as_mut() {
                            self.resolve_type_name(scope, ret);
                        }
                        sig
                    })
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    fn subst_parms(&mut self, scope: &Scope, subst: &Subst, parms: &[Parm]) -> Vec<Parm> {
        let mut out = subst.parms(parms);
        for parm in out.iter_mut() {
            if let Some(tn) = parm.ty.as_mut() {
                self.resolve_type_name(scope, tn);
            }
        }
        out
    }

    /// The instance of generic function `f` with its receiver's type
    /// parameters followed by its own bound to `args`
    pub(crate) fn instantiate_fun(
        &mut self,
        scope: &Scope,
        f: FunId,
        args: Vec<TypeId>,
        span: &Span,
    ) -> Result<FunId, Vec<CheckError>> {
        let key = FunInstKey {
            def: f,
            caller: scope.module,
            args: args.clone(),
        };
        if let Some(memo) = self.ctx.fun_instance(&key) {
            return memo.clone();
        }
        if self.fun_diverges(f, &args) {
            self.ctx.divergent_funs.insert(f);
            let sel = self.program.fun(f).sel.clone();
            return Err(vec![self.infinite_instantiation(scope, &sel, DefRef::Fun(f), span)]);
        }

        let generic = self.program.fun(f).clone();
        let _span = self.config.trace.then(|| {
            tracing::debug_span!("instantiate", sel = %generic.sel).entered()
        });
        let recv_parms: Vec<Parm> = generic.recv.iter().flat_map(|r| r.parms.clone()).collect();
        let names: Vec<String> = recv_parms
            .iter()
            .chain(generic.type_parms.iter())
            .map(|p| p.name.clone())
            .collect();
        let subst = self.subst_for(&names, &args);
        let inst_scope = self.instance_scope(generic.module, generic.sub.clone(), &names, &args);

        let (recv_type, errs) = self.capture(|c| {
            let own = subst.parms(&generic.type_parms);
            c.check_bounds(&inst_scope, &own, &args[recv_parms.len()..], span);
            match generic.recv_type {
                Some(root) if !recv_parms.is_empty() => {
                    c.instantiate_type(&inst_scope, root, args[..recv_parms.len()].to_vec(), span)
                }
                other => other,
            }
        });
        if !errs.is_empty() {
            self.ctx.memo_fun(key, Err(errs.clone()));
            return Err(errs);
        }

        // signature first: the body is substituted against it
        let mut parms = subst.parms(&generic.parms);
        let mut ret = generic.ret.as_ref().map(|r| subst.type_name(r));
        let inst = self.program.add_fun(Fun {
            recv_type,
            parms: Vec::new(),
            ret: None,
            stmts: Vec::new(),
            inst_of: Some(f),
            type_args: args.clone(),
            lookup_mod: Some(scope.module),
            ..generic.clone()
        });
        self.ctx.memo_fun(key.clone(), Ok(inst));
        if let Some(origin) = self.ctx.current_fun {
            self.ctx.fun_origins.insert(inst, origin);
        }
        tracing::debug!(
            sel = %generic.sel,
            args = %args.iter().map(|&a| self.program.display(a)).collect::<Vec<_>>().join(", "),
            "function instance"
        );

        let (_, errs) = self.capture(|c| {
            for parm in parms.iter_mut() {
                if let Some(tn) = parm.ty.as_mut() {
                    c.resolve_type_name(&inst_scope, tn);
                }
            }
            if let Some(ret) = ret.as_mut() {
                c.resolve_type_name(&inst_scope, ret);
            }
        });
        let stmts = subst.stmts(&generic.stmts);
        let fun = self.program.fun_mut(inst);
        fun.parms = parms;
        fun.ret = ret;
        fun.stmts = stmts;
        if !errs.is_empty() {
            self.ctx.memo_fun(key, Err(errs.clone()));
            return Err(errs);
        }

        if !self.ctx.discarding() {
            if !args.iter().any(|&a| self.program.has_vars(a)) {
                self.record_instance(scope, Instance::Fun(inst));
            }
            if !generic.builtin {
                self.ctx.pending_bodies.push_back(inst);
            }
        }
        Ok(inst)
    }

    /// Whether `def` at `args` repeats an instantiation already under way
    /// with a grown argument, or nests too deeply
    fn type_diverges(&self, def: TypeId, args: &[TypeId]) -> bool {
        if self.ctx.divergent_types.contains(&def) {
            return true;
        }
        let open: Vec<&TypeInstKey> = self.ctx.instantiating.iter().filter(|k| k.def == def).collect();
        open.len() >= MAX_NESTING || open.iter().any(|k| self.grows(&k.args, args))
    }

    /// Walks the bodies that led to the current one. Requesting `f` inside
    /// its own generic body or one of its instances at grown arguments
    /// diverges.
    fn fun_diverges(&self, f: FunId, args: &[TypeId]) -> bool {
        if self.ctx.divergent_funs.contains(&f) {
            return true;
        }
        let mut nesting = 0;
        let mut at = self.ctx.current_fun;
        while let Some(g) = at {
            let fun = self.program.fun(g);
            if g == f {
                let vars: Option<Vec<TypeId>> = (0..args.len())
                    .map(|i| self.ctx.type_vars.get(&(ParmOwner::Fun(f), i)).copied())
                    .collect();
                if vars.is_some_and(|vars| self.grows(&vars, args)) {
                    return true;
                }
            } else if fun.inst_of == Some(f) {
                nesting += 1;
                if nesting >= MAX_NESTING || self.grows(&fun.type_args, args) {
                    return true;
                }
            }
            at = self.ctx.fun_origins.get(&g).copied();
        }
        false
    }

    /// Some argument in `inner` strictly contains its counterpart in
    /// `outer`, and that counterpart mentions a type variable
    fn grows(&self, outer: &[TypeId], inner: &[TypeId]) -> bool {
        outer
            .iter()
            .zip(inner)
            .any(|(&o, &i)| o != i && self.program.has_vars(o) && self.program.mentions(i, o))
    }

    fn infinite_instantiation(&self, scope: &Scope, name: &str, def: DefRef, span: &Span) -> CheckError {
        CheckError::new(
            ErrorKind::InfiniteInstantiation {
                name: name.to_string(),
            },
            self.loc(scope.module, span),
        )
        .with_note(self.def_loc(def), format!("{name} is defined here"))
    }

    /// Type parameter bounds: an argument must be the bound itself or
    /// implement it when the bound is virtual
    fn check_bounds(&mut self, scope: &Scope, parms: &[Parm], args: &[TypeId], span: &Span) {
        for (parm, &arg) in parms.iter().zip(args) {
            let Some(mut bound) = parm.ty.clone() else { continue };
            let Some(bound) = self.resolve_type_name(scope, &mut bound) else { continue };
            if arg == bound || self.program.has_vars(arg) {
                continue;
            }
            if self.program.is_virt(bound) {
                if let Err(err) = self.implements(scope, arg, bound, span) {
                    self.report(err);
                }
            } else {
                self.error(
                    ErrorKind::Mismatch {
                        got: self.program.display(arg),
                        want: self.program.display(bound),
                    },
                    scope.module,
                    span,
                );
            }
        }
    }

    fn subst_for(&self, names: &[String], args: &[TypeId]) -> Subst {
        Subst::new(
            names
                .iter()
                .zip(args)
                .map(|(n, &a)| (n.clone(), TypeName::resolved_as(self.program.display(a), a))),
        )
    }

    fn record_instance(&mut self, scope: &Scope, inst: Instance) {
        let module = self.ctx.current_module.unwrap_or(scope.module);
        self.program.module_mut(module).instances.push(inst);
    }

    fn applied_name(&self, def: TypeId, args: &[TypeId]) -> String {
        let name = &self.program.ty(def).name;
        match args.len() {
            0 => name.clone(),
            1 => format!("{} {name}", self.program.display(args[0])),
            _ => {
                let args: Vec<String> = args.iter().map(|&a| self.program.display(a)).collect();
                format!("({}) {name}", args.join(", "))
            }
        }
    }

    pub(crate) fn cannot_instantiate(
        &mut self,
        scope: &Scope,
        name: String,
        span: &Span,
        causes: Vec<CheckError>,
    ) {
        let err = CheckError::new(ErrorKind::CannotInstantiate { name }, self.loc(scope.module, span))
            .with_causes(causes);
        self.report(err);
    }
}
