//! Lexical scope chain
//!
//! A scope is an immutable linked list of name bindings. Pushing returns a new
//! scope sharing its parent, so sibling branches never see each other's names.
//! The chain ends at the module: a miss here falls back to the module
//! namespace, which the checker consults separately.

use petal_ast::{FunId, ModId, Span, TypeId};
use std::rc::Rc;

#[derive(Debug, Clone)]
pub(crate) enum Binding {
    /// Parameter, block parameter, local variable or `self`
    Local { ty: Option<TypeId>, span: Span },
    /// A type parameter bound to its synthetic type-variable type
    TypeVar(TypeId),
    /// A type parameter bound to a concrete argument inside an instance
    TypeArg(TypeId),
    /// Marks the body of a function; never found by name
    Fun(FunId),
}

#[derive(Debug)]
struct Node {
    name: String,
    binding: Binding,
    parent: Option<Rc<Node>>,
}

#[derive(Debug, Clone)]
pub(crate) struct Scope {
    pub module: ModId,
    pub sub: Option<String>,
    /// Additional module searched for methods (the caller of an instance)
    pub extra: Option<ModId>,
    head: Option<Rc<Node>>,
}

impl Scope {
    pub fn module_root(module: ModId, sub: Option<String>) -> Self {
        Self {
            module,
            sub,
            extra: None,
            head: None,
        }
    }

    pub fn push(&self, name: &str, binding: Binding) -> Scope {
        Scope {
            module: self.module,
            sub: self.sub.clone(),
            extra: self.extra,
            head: Some(Rc::new(Node {
                name: name.to_string(),
                binding,
                parent: self.head.clone(),
            })),
        }
    }

    fn nodes(&self) -> impl Iterator<Item = &Node> {
        std::iter::successors(self.head.as_deref(), |n| n.parent.as_deref())
    }

    /// Innermost binding of `name`
    pub fn find(&self, name: &str) -> Option<&Binding> {
        self.nodes()
            .find(|n| n.name == name && !matches!(n.binding, Binding::Fun(_)))
            .map(|n| &n.binding)
    }

    pub fn find_local(&self, name: &str) -> Option<(Option<TypeId>, &Span)> {
        self.nodes().find_map(|n| match &n.binding {
            Binding::Local { ty, span } if n.name == name => Some((*ty, span)),
            _ => None,
        })
    }

    pub fn find_type_var(&self, name: &str) -> Option<TypeId> {
        self.nodes().find_map(|n| match n.binding {
            Binding::TypeVar(t) | Binding::TypeArg(t) if n.name == name => Some(t),
            _ => None,
        })
    }

    /// The function whose body encloses this scope
    pub fn fun(&self) -> Option<FunId> {
        self.nodes().find_map(|n| match n.binding {
            Binding::Fun(f) => Some(f),
            _ => None,
        })
    }

    /// Modules searched for methods, deduplicated, defining module first
    pub fn lookup_modules(&self, defining: ModId) -> Vec<ModId> {
        let mut mods = vec![defining];
        for m in [Some(self.module), self.extra].into_iter().flatten() {
            if !mods.contains(&m) {
                mods.push(m);
            }
        }
        mods
    }
}
