// Petal AST Library
// The parsed-module interface between a front end and the checker

pub mod ast;
pub mod build;

pub use ast::*;

// Version and metadata
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
