//! Scenario tests for the Petal checker
//!
//! Each test builds module trees with `petal_ast::build`, checks them with an
//! in-memory import resolver and inspects the errors and the annotated program.

mod support;

// Namespaces and imports
mod test_collect;
mod test_imports;

// Type definitions
mod test_aliases;

// Generic calls
mod test_unification;

// Statements and expressions
mod test_calls;
mod test_conversions;
mod test_statements;
mod test_variables;
