//! Name lookup and type-name resolution

use crate::checker::Checker;
use crate::context::ParmOwner;
use crate::error::{CheckError, ErrorKind};
use crate::program::{Builtin, DefRef, Entry, Type, TypeBody, BUILTIN};
use crate::scope::Scope;
use petal_ast::{ModId, Span, TypeId, TypeName, TypeNameKind, TypeSig};

impl Checker {
    /// Every definition `name` could refer to, without reporting anything.
    /// An unknown qualifier yields `Err(())` after reporting it.
    fn candidates(
        &mut self,
        scope: &Scope,
        qualifier: Option<&str>,
        name: &str,
        span: &Span,
    ) -> Result<Vec<Entry>, ()> {
        let module = self.program.module(scope.module);
        let mut keys = vec![scope.sub.clone()];
        if scope.sub.is_some() {
            keys.push(None);
        }

        let Some(q) = qualifier else {
            for key in &keys {
                if let Some(es) = module.namespaces.get(key).and_then(|ns| ns.entries.get(name)) {
                    if !es.is_empty() {
                        return Ok(es.clone());
                    }
                }
            }
            return Ok(self.builtin_entries(name));
        };

        for key in &keys {
            let Some(es) = module.namespaces.get(key).and_then(|ns| ns.entries.get(q)) else {
                continue;
            };
            for e in es {
                if let DefRef::Import(m, idx) = e.def {
                    // a failed import was reported where it was written
                    let Some(target) = self.program.module(m).imports[idx].target else {
                        return Err(());
                    };
                    return Ok(self
                        .program
                        .module(target)
                        .namespaces
                        .get(&None)
                        .and_then(|ns| ns.entries.get(name))
                        .map(|es| es.iter().filter(|e| e.import.is_none()).cloned().collect())
                        .unwrap_or_default());
                }
            }
        }
        let sub = Some(q.to_string());
        if let Some(ns) = module.namespaces.get(&sub) {
            return Ok(ns.entries.get(name).cloned().unwrap_or_default());
        }
        self.error(ErrorKind::Undefined { name: q.to_string() }, scope.module, span);
        Err(())
    }

    fn builtin_entries(&self, name: &str) -> Vec<Entry> {
        self.program
            .module(BUILTIN)
            .namespaces
            .get(&None)
            .and_then(|ns| ns.entries.get(name))
            .cloned()
            .unwrap_or_default()
    }

    /// Looks a name up without reporting a miss
    pub(crate) fn lookup_quiet(&mut self, scope: &Scope, name: &str) -> Option<DefRef> {
        match self.candidates(scope, None, name, &Span::default()) {
            Ok(es) if es.len() == 1 => Some(es[0].def),
            _ => None,
        }
    }

    /// Resolves a possibly qualified name to its single definition
    pub(crate) fn lookup(
        &mut self,
        scope: &Scope,
        qualifier: Option<&str>,
        name: &str,
        span: &Span,
    ) -> Option<DefRef> {
        let entries = self.candidates(scope, qualifier, name, span).ok()?;
        match entries.len() {
            0 => {
                self.error(ErrorKind::Undefined { name: name.to_string() }, scope.module, span);
                None
            }
            1 => Some(entries[0].def),
            _ => {
                let mut err = CheckError::new(
                    ErrorKind::Ambiguous { name: name.to_string() },
                    self.loc(scope.module, span),
                );
                for e in &entries {
                    err = err.with_note(self.def_loc(e.def), format!("{name} is defined here"));
                }
                self.report(err);
                None
            }
        }
    }

    /// Looks up a type definition by name, without instantiating it
    pub(crate) fn lookup_type(
        &mut self,
        scope: &Scope,
        qualifier: Option<&str>,
        name: &str,
        span: &Span,
    ) -> Option<TypeId> {
        match self.lookup(scope, qualifier, name, span)? {
            DefRef::Type(t) => Some(t),
            other => {
                let err = CheckError::new(
                    ErrorKind::NotAType {
                        kind: other.kind_name(),
                        name: name.to_string(),
                    },
                    self.loc(scope.module, span),
                )
                .with_note(self.def_loc(other), format!("{name} is defined here"));
                self.report(err);
                None
            }
        }
    }

    /// Resolves a type name in place, instantiating generic types and
    /// following aliases. `None` means an error was reported (or the name
    /// depends on one that was).
    pub(crate) fn resolve_type_name(&mut self, scope: &Scope, name: &mut TypeName) -> Option<TypeId> {
        if name.resolved.is_some() && !name.is_var() && !has_args(name) {
            return name.resolved;
        }
        let span = name.span.clone();
        let resolved = match &mut name.kind {
            TypeNameKind::Var(var) => match scope.find_type_var(var) {
                Some(t) => Some(t),
                None => {
                    self.error(ErrorKind::TypeVarUndefined { name: var.clone() }, scope.module, &span);
                    None
                }
            },
            TypeNameKind::Named { module, name: n, args } => {
                let mut arg_types = Vec::with_capacity(args.len());
                for arg in args.iter_mut() {
                    arg_types.push(self.resolve_type_name(scope, arg));
                }
                let def = self.lookup_type(scope, module.as_deref(), n, &span);
                match (def, arg_types.into_iter().collect::<Option<Vec<_>>>()) {
                    (Some(def), Some(args)) => self.apply_type(scope, def, args, &span),
                    _ => None,
                }
            }
        };
        name.resolved = resolved;
        resolved
    }

    /// Applies a type definition to resolved arguments
    pub(crate) fn apply_type(
        &mut self,
        scope: &Scope,
        def: TypeId,
        args: Vec<TypeId>,
        span: &Span,
    ) -> Option<TypeId> {
        let ty = self.program.ty(def);
        let takes_args = !ty.parms.is_empty() || ty.body == TypeBody::Builtin(Builtin::Fun);
        let t = if takes_args {
            self.instantiate_type(scope, def, args, span)?
        } else if !args.is_empty() {
            self.error(
                ErrorKind::ArgCountMismatch {
                    got: args.len(),
                    expected: 0,
                },
                scope.module,
                span,
            );
            return None;
        } else {
            def
        };
        if matches!(self.program.ty(t).body, TypeBody::Alias(_)) {
            self.resolve_alias(t)
        } else {
            Some(t)
        }
    }

    /// Resolves a method's receiver to the root definition methods attach to.
    /// Receivers name their own parameters, so no instantiation happens here.
    pub(crate) fn resolve_receiver(&mut self, scope: &Scope, recv: &TypeSig) -> Option<TypeId> {
        let mut root = self.lookup_type(scope, None, &recv.name, &recv.span)?;
        let ty = self.program.ty(root);
        if ty.parms.is_empty() && matches!(ty.body, TypeBody::Alias(_)) {
            root = self.resolve_alias(root)?;
            root = self.program.root(root);
        }
        let expected = self.program.ty(root).parms.len();
        if recv.parms.len() != expected {
            self.error(
                ErrorKind::ArgCountMismatch {
                    got: recv.parms.len(),
                    expected,
                },
                scope.module,
                &recv.span,
            );
            return None;
        }
        Some(root)
    }

    /// The synthetic type standing for a type parameter of a generic definition
    pub(crate) fn type_var(&mut self, owner: ParmOwner, idx: usize) -> TypeId {
        if let Some(&t) = self.ctx.type_vars.get(&(owner, idx)) {
            return t;
        }
        let (module, sub, parm) = match owner {
            ParmOwner::Type(t) => {
                let ty = self.program.ty(t);
                (ty.module, ty.sub.clone(), ty.parms[idx].clone())
            }
            ParmOwner::Fun(f) => {
                let fun = self.program.fun(f);
                let parm = fun
                    .recv
                    .iter()
                    .flat_map(|r| r.parms.iter())
                    .chain(fun.type_parms.iter())
                    .nth(idx)
                    .cloned()
                    .unwrap_or_else(|| unreachable!("type parameter {idx} of {}", fun.sel));
                (fun.module, fun.sub.clone(), parm)
            }
        };
        let t = self.program.add_type(Type {
            name: parm.name,
            module,
            sub,
            span: parm.span,
            parms: Vec::new(),
            args: Vec::new(),
            body: TypeBody::Var { bound: None },
            inst_of: None,
        });
        self.ctx.type_vars.insert((owner, idx), t);
        t
    }

    /// Binds the names of `parms` to `args` in a fresh module-level scope
    pub(crate) fn instance_scope(
        &self,
        module: ModId,
        sub: Option<String>,
        names: &[String],
        args: &[TypeId],
    ) -> Scope {
        let mut scope = Scope::module_root(module, sub);
        for (name, &arg) in names.iter().zip(args) {
            scope = scope.push(name, crate::scope::Binding::TypeArg(arg));
        }
        scope
    }
}

fn has_args(name: &TypeName) -> bool {
    matches!(&name.kind, TypeNameKind::Named { args, .. } if !args.is_empty())
}
