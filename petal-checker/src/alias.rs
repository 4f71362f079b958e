//! Alias resolution with cycle detection
//!
//! Aliases are resolved lazily, the first time something names them. The
//! aliases currently being resolved form a path; meeting one of them again
//! closes a cycle, which is reported once at the point of discovery. Every
//! member is then marked so later resolutions fail quietly.
//!
//! The path and the cycle marks hold alias definitions, not instances: a
//! cycle between generic aliases is one cycle whatever they are applied to.

use crate::checker::Checker;
use crate::error::{CheckError, ErrorKind};
use crate::program::TypeBody;
use petal_ast::TypeId;

impl Checker {
    /// The type an alias stands for, `None` if it is cyclic or its target
    /// does not resolve
    pub(crate) fn resolve_alias(&mut self, t: TypeId) -> Option<TypeId> {
        if let Some(&target) = self.ctx.alias_targets.get(&t) {
            return target;
        }
        let def = self.program.root(t);
        if self.ctx.alias_cycles.contains(&def) {
            return None;
        }
        if let Some(start) = self.ctx.alias_path.iter().position(|&a| a == def) {
            self.report_alias_cycle(start, def);
            return None;
        }

        let TypeBody::Alias(mut target) = self.program.ty(t).body.clone() else {
            return Some(t);
        };
        tracing::trace!(alias = %self.program.display(t), "resolving alias");
        self.ctx.alias_path.push(def);

        let ty = self.program.ty(t);
        let names: Vec<String> = ty.parms.iter().map(|p| p.name.clone()).collect();
        let scope = self.instance_scope(ty.module, ty.sub.clone(), &names, &ty.args.clone());
        let resolved = self.resolve_type_name(&scope, &mut target);

        self.ctx.alias_path.pop();
        tracing::trace!(alias = %self.program.display(t), "resolved alias");

        let resolved = if self.ctx.alias_cycles.contains(&def) {
            None
        } else {
            resolved
        };
        if let TypeBody::Alias(written) = &mut self.program.ty_mut(t).body {
            written.resolved = resolved;
        }
        self.ctx.alias_targets.insert(t, resolved);
        resolved
    }

    fn report_alias_cycle(&mut self, start: usize, closing: TypeId) {
        let members: Vec<TypeId> = self.ctx.alias_path[start..].to_vec();
        let ty = self.program.ty(closing);
        let mut err = CheckError::new(ErrorKind::AliasCycle, self.loc(ty.module, &ty.span));
        for &m in members.iter().chain(std::iter::once(&closing)) {
            let member = self.program.ty(m);
            err = err.with_note(
                self.loc(member.module, &member.span),
                self.program.display(m),
            );
        }
        self.report(err);
        self.ctx.alias_cycles.extend(members);
    }
}
