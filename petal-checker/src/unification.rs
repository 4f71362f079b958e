//! Unification of generic parameter types against argument types
//!
//! One side is always ground: the pattern is a parameter type of a generic
//! function (possibly mentioning its type variables), the other the type of an
//! argument expression. A variable binds on first sight; later occurrences must
//! see the identical type.

use crate::error::{CheckError, ErrorKind, Loc};
use crate::program::Program;
use indexmap::IndexMap;
use petal_ast::{Span, TypeId};

/// Type variable to bound type and the location of the binding
pub type Bindings = IndexMap<TypeId, (TypeId, Span)>;

pub struct Unifier<'a> {
    program: &'a Program,
    path: &'a str,
}

impl<'a> Unifier<'a> {
    pub fn new(program: &'a Program, path: &'a str) -> Self {
        Self { program, path }
    }

    fn loc(&self, span: &Span) -> Loc {
        Loc::new(self.path, span.clone())
    }

    pub fn unify(
        &self,
        pattern: TypeId,
        concrete: TypeId,
        span: &Span,
        bindings: &mut Bindings,
    ) -> Result<(), CheckError> {
        let program = self.program;
        if program.is_var(pattern) {
            return match bindings.get(&pattern) {
                None => {
                    tracing::trace!(
                        var = %program.ty(pattern).name,
                        ty = %program.display(concrete),
                        "bind type variable"
                    );
                    bindings.insert(pattern, (concrete, span.clone()));
                    Ok(())
                }
                Some((bound, _)) if *bound == concrete => Ok(()),
                Some((bound, at)) => Err(CheckError::new(
                    ErrorKind::UnifyBound {
                        var: program.ty(pattern).name.clone(),
                        bound: program.display(*bound),
                        got: program.display(concrete),
                    },
                    self.loc(span),
                )
                .with_note(self.loc(at), "previous binding")),
            };
        }

        let mismatch = || {
            CheckError::new(
                ErrorKind::UnifyMismatch {
                    pattern: program.display(pattern),
                    got: program.display(concrete),
                },
                self.loc(span),
            )
        };
        if program.root(pattern) != program.root(concrete) {
            return Err(mismatch());
        }

        let pattern_args = &program.ty(pattern).args;
        let concrete_args = &program.ty(concrete).args;
        if pattern_args.len() != concrete_args.len() {
            // only the variadic Fun can disagree here
            return Err(mismatch());
        }
        let causes: Vec<CheckError> = pattern_args
            .iter()
            .zip(concrete_args)
            .filter_map(|(&p, &c)| self.unify(p, c, span, bindings).err())
            .collect();
        if causes.is_empty() {
            Ok(())
        } else {
            Err(mismatch().with_causes(causes))
        }
    }
}
