//! Definition collection and redefinition checks
//!
//! Moves a parsed module into the program arenas and builds its namespaces,
//! one per sub-module. Collisions follow these rules:
//!
//! - built-in names are shadowed silently (built-ins are looked up last),
//! - a definition replaces a same-named definition spliced in by an earlier
//!   import; an import that splices in a name defined earlier is an error,
//! - a module may be imported into a namespace only once,
//! - names in different sub-modules never collide.
//!
//! Field, case and virtual-method uniqueness are checked per type.

use crate::checker::Checker;
use crate::error::{CheckError, ErrorKind};
use crate::program::{DefRef, Entry, Fun, ImportInfo, Namespace, Type, TypeBody, Var};
use petal_ast::{Def, ModId, Module, Parm, Span};
use std::collections::HashMap;

impl Checker {
    pub(crate) fn collect(&mut self, module: Module) -> ModId {
        let id = self.program.add_module(&module.path);
        for def in module.defs {
            match def {
                Def::Import(import) => self.collect_import(id, import),
                Def::Type(def) => {
                    self.check_members(id, &def.body);
                    let name = def.sig.name.clone();
                    let span = def.span.clone();
                    let t = self.program.add_type(Type {
                        name: def.sig.name,
                        module: id,
                        sub: def.sub.clone(),
                        span: def.span,
                        parms: def.sig.parms,
                        args: Vec::new(),
                        body: match def.body {
                            petal_ast::TypeBody::Alias(target) => TypeBody::Alias(target),
                            petal_ast::TypeBody::And(fields) => TypeBody::And(fields),
                            petal_ast::TypeBody::Or(cases) => TypeBody::Or(cases),
                            petal_ast::TypeBody::Virt(sigs) => TypeBody::Virt(sigs),
                        },
                        inst_of: None,
                    });
                    self.add_local(id, def.sub, &name, DefRef::Type(t), &span);
                }
                Def::Fun(def) => {
                    let sub = def.sub.clone();
                    let span = def.span.clone();
                    let sel = def.sel.clone();
                    let recv_name = def.recv.as_ref().map(|r| r.name.clone());
                    let f = self.program.add_fun(Fun {
                        sel: def.sel,
                        module: id,
                        sub: def.sub,
                        span: def.span,
                        recv: def.recv,
                        recv_type: None,
                        type_parms: def.type_parms,
                        parms: def.parms,
                        ret: def.ret,
                        stmts: def.stmts,
                        builtin: false,
                        inst_of: None,
                        type_args: Vec::new(),
                        lookup_mod: None,
                    });
                    match recv_name {
                        Some(recv) => self.add_method(id, sub, recv, sel, f, &span),
                        None => self.add_local(id, sub, &sel, DefRef::Fun(f), &span),
                    }
                }
                Def::Var(def) => {
                    let sub = def.sub.clone();
                    let span = def.span.clone();
                    let name = def.name.clone();
                    let v = self.program.add_var(Var {
                        name: def.name,
                        module: id,
                        sub: def.sub,
                        span: def.span,
                        ty: def.ty,
                        init: def.init,
                        resolved: None,
                    });
                    self.add_local(id, sub, &name, DefRef::Var(v), &span);
                }
            }
        }
        id
    }

    fn namespace(&mut self, module: ModId, sub: Option<String>) -> &mut Namespace {
        self.program
            .module_mut(module)
            .namespaces
            .entry(sub)
            .or_default()
    }

    fn add_local(&mut self, module: ModId, sub: Option<String>, name: &str, def: DefRef, span: &Span) {
        self.program.module_mut(module).defs.push(def);
        let previous = self
            .namespace(module, sub.clone())
            .entries
            .get(name)
            .and_then(|es| es.iter().find(|e| e.import.is_none()))
            .map(|e| e.def);
        if let Some(previous) = previous {
            let err = CheckError::new(
                ErrorKind::Redefined {
                    name: name.to_string(),
                },
                self.loc(module, span),
            )
            .with_note(self.def_loc(previous), "previous definition");
            self.report(err);
            return;
        }
        // replaces anything spliced in by an earlier import
        self.namespace(module, sub).entries.insert(
            name.to_string(),
            vec![Entry { def, import: None }],
        );
    }

    fn add_method(
        &mut self,
        module: ModId,
        sub: Option<String>,
        recv: String,
        sel: String,
        f: petal_ast::FunId,
        span: &Span,
    ) {
        let key = (recv, sel);
        if let Some(&previous) = self.namespace(module, sub.clone()).methods.get(&key) {
            let err = CheckError::new(
                ErrorKind::Redefined {
                    name: format!("{} {}", key.0, key.1),
                },
                self.loc(module, span),
            )
            .with_note(self.def_loc(DefRef::Fun(previous)), "previous definition");
            self.report(err);
            return;
        }
        self.namespace(module, sub).methods.insert(key, f);
        self.program.module_mut(module).methods.push(f);
    }

    fn collect_import(&mut self, module: ModId, import: petal_ast::Import) {
        let target = self.program.module_by_path(&import.path);
        let idx = self.program.module(module).imports.len();
        self.program.module_mut(module).imports.push(ImportInfo {
            span: import.span.clone(),
            sub: import.sub.clone(),
            path: import.path.clone(),
            name: import.name.clone(),
            splice: import.splice,
            target,
        });

        let previous = self
            .namespace(module, import.sub.clone())
            .imports
            .get(&import.path)
            .cloned();
        if let Some(previous) = previous {
            let err = CheckError::new(
                ErrorKind::ImportedTwice {
                    path: import.path.clone(),
                },
                self.loc(module, &import.span),
            )
            .with_note(self.loc(module, &previous), "previous import");
            self.report(err);
            return;
        }
        self.namespace(module, import.sub.clone())
            .imports
            .insert(import.path.clone(), import.span.clone());

        if !import.splice {
            self.add_local(module, import.sub, &import.name, DefRef::Import(module, idx), &import.span);
            return;
        }
        self.program
            .module_mut(module)
            .defs
            .push(DefRef::Import(module, idx));

        // a failed or cyclic import has nothing to splice
        let Some(target) = target else { return };
        let exported: Vec<(String, DefRef)> = self
            .program
            .module(target)
            .namespaces
            .get(&None)
            .map(|ns| {
                ns.entries
                    .iter()
                    .filter_map(|(name, es)| {
                        es.iter()
                            .find(|e| e.import.is_none())
                            .map(|e| (name.clone(), e.def))
                    })
                    .collect()
            })
            .unwrap_or_default();

        for (name, def) in exported {
            self.splice(module, import.sub.clone(), &name, def, &import.span);
        }
    }

    fn splice(&mut self, module: ModId, sub: Option<String>, name: &str, def: DefRef, at: &Span) {
        let existing: Vec<Entry> = self
            .namespace(module, sub.clone())
            .entries
            .get(name)
            .cloned()
            .unwrap_or_default();
        if let Some(local) = existing.iter().find(|e| e.import.is_none()) {
            let err = CheckError::new(
                ErrorKind::ImportedRedefined {
                    name: name.to_string(),
                },
                self.loc(module, at),
            )
            .with_note(self.def_loc(local.def), "previous definition")
            .with_note(self.def_loc(def), "imported definition");
            self.report(err);
            return;
        }
        if existing.iter().any(|e| e.def == def) {
            return;
        }
        // distinct imported definitions are kept; using the name is ambiguous
        self.namespace(module, sub)
            .entries
            .entry(name.to_string())
            .or_default()
            .push(Entry {
                def,
                import: Some(at.clone()),
            });
    }

    /// Field, case and virtual selector uniqueness within one type
    fn check_members(&mut self, module: ModId, body: &petal_ast::TypeBody) {
        match body {
            petal_ast::TypeBody::And(fields) => {
                self.unique_names(module, fields, |n| n.to_string(), |name| ErrorKind::DuplicateField { name })
            }
            petal_ast::TypeBody::Or(cases) => self.unique_names(
                module,
                cases,
                |n| n.to_lowercase(),
                |name| ErrorKind::DuplicateCase { name },
            ),
            petal_ast::TypeBody::Virt(sigs) => {
                let mut seen: HashMap<&str, &Span> = HashMap::new();
                for sig in sigs {
                    if let Some(previous) = seen.insert(&sig.sel, &sig.span) {
                        let err = CheckError::new(
                            ErrorKind::DuplicateVirtual {
                                sel: sig.sel.clone(),
                            },
                            self.loc(module, &sig.span),
                        )
                        .with_note(self.loc(module, previous), "previous definition");
                        self.report(err);
                    }
                }
            }
            petal_ast::TypeBody::Alias(_) => {}
        }
    }

    fn unique_names(
        &mut self,
        module: ModId,
        parms: &[Parm],
        key: impl Fn(&str) -> String,
        kind: impl Fn(String) -> ErrorKind,
    ) {
        let mut seen: HashMap<String, &Span> = HashMap::new();
        for parm in parms {
            if let Some(previous) = seen.insert(key(&parm.name), &parm.span) {
                let err = CheckError::new(kind(parm.name.clone()), self.loc(module, &parm.span))
                    .with_note(self.loc(module, previous), "previous definition");
                self.report(err);
            }
        }
    }
}
