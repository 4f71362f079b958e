//! Petal Checker
//!
//! Semantic analysis for Petal modules: name resolution, redefinition checks,
//! alias cycle detection, type-name resolution with implicit conversions,
//! unification of generic calls and monomorphization of generic types and
//! functions.

// Allow clippy lints for development
#![allow(clippy::uninlined_format_args)]
//!
//! ## Architecture
//!
//! The checker works on parsed trees from `petal_ast` and annotates them in
//! place. Key components:
//!
//! - **Collector**: builds each module's namespaces and reports redefinitions
//! - **Resolver**: looks names up through sub-module, module, imports and the
//!   built-in module, and resolves type names to arena handles
//! - **Instantiation engine**: memoized monomorphization of generic types and
//!   functions, with unification to infer a generic call's type arguments
//! - **Expression checker**: types statements and expressions, inserting
//!   reference and interface conversions where the context wants them
//!
//! ## Integration
//!
//! A front end parses the root module, supplies an [`ImportResolver`] for the
//! modules it imports and receives a [`Checked`] program with every error.

mod alias;
pub mod checker;
mod collect;
pub mod config;
pub mod context;
mod convert;
pub mod dependency_graph;
pub mod error;
mod instantiate;
pub mod intrinsics;
pub mod program;
mod resolve;
mod scope;
mod subst;
pub mod unification;

// Re-export public API
pub use checker::{Checked, Checker};
pub use config::{Config, WordSize};
pub use context::CheckerContext;
pub use dependency_graph::{ImportResolver, MemoryResolver, NoImports};
pub use error::{CheckError, ErrorKind, ImportError, Loc, Note};
pub use intrinsics::Builtins;
pub use program::{DefRef, Instance, Program, BUILTIN};
pub use unification::{Bindings, Unifier};

/// Checks `module` and everything it imports
pub fn check(module: petal_ast::Module, resolver: &mut dyn ImportResolver, config: Config) -> Checked {
    Checker::new(config).check(module, resolver)
}

#[cfg(test)]
mod tests;
