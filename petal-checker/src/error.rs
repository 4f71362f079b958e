//! Error types for the Petal checker
//!
//! Every user-facing failure is a [`CheckError`]: a located [`ErrorKind`] with
//! optional notes (secondary locations) and nested causes. Errors are plain
//! values collected into a list; the checker never stops at the first one.

use miette::{Diagnostic, LabeledSpan, SourceSpan};
use petal_ast::Span;
use std::fmt;
use thiserror::Error;

/// A source location: module path plus span
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Loc {
    pub path: String,
    pub span: Span,
}

impl Loc {
    pub fn new(path: impl Into<String>, span: Span) -> Self {
        Self {
            path: path.into(),
            span,
        }
    }

    pub fn line(&self) -> Option<usize> {
        self.span.start_line_col.map(|(line, _)| line)
    }
}

impl fmt::Display for Loc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() {
            "<builtin>"
        } else {
            &self.path
        };
        match self.span.start_line_col {
            Some((line, col)) => write!(f, "{path}:{line}:{col}"),
            None => write!(f, "{path}:@{}", self.span.start),
        }
    }
}

/// What went wrong
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
pub enum ErrorKind {
    #[error("{name} is redefined")]
    #[diagnostic(code(petal::check::redefined))]
    Redefined { name: String },

    #[error("imported definition {name} redefined")]
    #[diagnostic(
        code(petal::check::imported_redefined),
        help("move the import above the definition, or rename one of them")
    )]
    ImportedRedefined { name: String },

    #[error("module {path} is imported more than once")]
    #[diagnostic(code(petal::check::imported_twice))]
    ImportedTwice { path: String },

    #[error("module {path} not found")]
    #[diagnostic(code(petal::check::import_not_found))]
    ImportNotFound { path: String },

    #[error("cannot load module {path}: {message}")]
    #[diagnostic(code(petal::check::import_failed))]
    ImportFailed { path: String, message: String },

    #[error("import cycle")]
    #[diagnostic(code(petal::check::import_cycle))]
    ImportCycle,

    #[error("type alias cycle")]
    #[diagnostic(code(petal::check::alias_cycle))]
    AliasCycle,

    #[error("{name} undefined")]
    #[diagnostic(code(petal::check::undefined))]
    Undefined { name: String },

    #[error("type variable {name} undefined")]
    #[diagnostic(code(petal::check::type_var_undefined))]
    TypeVarUndefined { name: String },

    #[error("got {kind} {name}, expected a type")]
    #[diagnostic(code(petal::check::not_a_type))]
    NotAType { kind: &'static str, name: String },

    #[error("got {kind} {name}, expected a function")]
    #[diagnostic(code(petal::check::not_a_function))]
    NotAFunction { kind: &'static str, name: String },

    #[error("got {kind} {name}, expected a value")]
    #[diagnostic(code(petal::check::not_a_value))]
    NotAValue { kind: &'static str, name: String },

    #[error("{name} is ambiguous")]
    #[diagnostic(
        code(petal::check::ambiguous),
        help("qualify the name with its module")
    )]
    Ambiguous { name: String },

    #[error("{name} cannot be instantiated")]
    #[diagnostic(code(petal::check::cannot_instantiate))]
    CannotInstantiate { name: String },

    #[error("instantiation of {name} does not terminate")]
    #[diagnostic(
        code(petal::check::infinite_instantiation),
        help("a generic definition cannot use itself at arguments built from its own parameters")
    )]
    InfiniteInstantiation { name: String },

    #[error("argument count mismatch: got {got}, expected {expected}")]
    #[diagnostic(code(petal::check::arg_count))]
    ArgCountMismatch { got: usize, expected: usize },

    #[error("assignment count mismatch: got {got}, expected {expected}")]
    #[diagnostic(code(petal::check::assign_count))]
    AssignCountMismatch { got: usize, expected: usize },

    #[error("field {name} is redefined")]
    #[diagnostic(code(petal::check::duplicate_field))]
    DuplicateField { name: String },

    #[error("case {name} is redefined")]
    #[diagnostic(
        code(petal::check::duplicate_case),
        help("case names are compared without regard to letter case")
    )]
    DuplicateCase { name: String },

    #[error("virtual method {sel} is redefined")]
    #[diagnostic(code(petal::check::duplicate_virtual))]
    DuplicateVirtual { sel: String },

    #[error("{lit} overflows {ty}")]
    #[diagnostic(code(petal::check::overflow))]
    Overflow { lit: String, ty: String },

    #[error("{lit} is negative, but {ty} is unsigned")]
    #[diagnostic(code(petal::check::negative_unsigned))]
    NegativeUnsigned { lit: String, ty: String },

    #[error("{lit} truncates {ty}")]
    #[diagnostic(
        code(petal::check::truncated),
        help("only floating point literals without a fractional part convert to integers")
    )]
    Truncated { lit: String, ty: String },

    #[error("{lit} is not a valid number")]
    #[diagnostic(code(petal::check::bad_literal))]
    BadLiteral { lit: String },

    #[error("got type {got}, wanted {want}")]
    #[diagnostic(code(petal::check::mismatch))]
    Mismatch { got: String, want: String },

    #[error("{ty} does not implement {iface}")]
    #[diagnostic(code(petal::check::not_implemented))]
    DoesNotImplement { ty: String, iface: String },

    #[error("{sel} has the wrong type")]
    #[diagnostic(code(petal::check::wrong_method_type))]
    WrongMethodType { sel: String },

    #[error("{ty} has no method {sel}")]
    #[diagnostic(code(petal::check::no_method))]
    MethodUndefined { ty: String, sel: String },

    #[error("cannot unify {var}: bound to {bound}, got {got}")]
    #[diagnostic(code(petal::check::unify_bound))]
    UnifyBound {
        var: String,
        bound: String,
        got: String,
    },

    #[error("cannot unify {pattern} with {got}")]
    #[diagnostic(code(petal::check::unify))]
    UnifyMismatch { pattern: String, got: String },

    #[error("cannot infer type of type variable {name}")]
    #[diagnostic(code(petal::check::cannot_infer))]
    CannotInfer { name: String },

    #[error("cannot infer type of block parameter {name}")]
    #[diagnostic(code(petal::check::block_parm))]
    BlockParmType { name: String },

    #[error("{name} has no declared type")]
    #[diagnostic(code(petal::check::missing_type))]
    MissingType { name: String },

    #[error("return outside of a method")]
    #[diagnostic(code(petal::check::return_outside))]
    ReturnOutsideMethod,

    #[error("{sel} is not a constructor of {ty}")]
    #[diagnostic(code(petal::check::bad_ctor))]
    BadCtor { ty: String, sel: String },

    #[error("{name} initialization cycle")]
    #[diagnostic(code(petal::check::init_cycle))]
    InitCycle { name: String },
}

/// A secondary location attached to an error
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
#[error("{loc}: {message}")]
pub struct Note {
    pub loc: Loc,
    pub message: String,
}

impl Note {
    pub fn new(loc: Loc, message: impl Into<String>) -> Self {
        Self {
            loc,
            message: message.into(),
        }
    }
}

/// A located checking error
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{loc}: {kind}")]
pub struct CheckError {
    pub kind: ErrorKind,
    pub loc: Loc,
    pub notes: Vec<Note>,
    pub causes: Vec<CheckError>,
}

impl CheckError {
    pub fn new(kind: ErrorKind, loc: Loc) -> Self {
        Self {
            kind,
            loc,
            notes: Vec::new(),
            causes: Vec::new(),
        }
    }

    pub fn with_note(mut self, loc: Loc, message: impl Into<String>) -> Self {
        self.notes.push(Note::new(loc, message));
        self
    }

    pub fn with_causes(mut self, causes: Vec<CheckError>) -> Self {
        self.causes.extend(causes);
        self
    }

    /// The formatted message without location
    pub fn message(&self) -> String {
        self.kind.to_string()
    }
}

impl Diagnostic for CheckError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.kind.code()
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.kind.help()
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        Some(Box::new(std::iter::once(LabeledSpan::new_with_span(
            None,
            to_source_span(&self.loc.span),
        ))))
    }

    fn related<'a>(&'a self) -> Option<Box<dyn Iterator<Item = &'a dyn Diagnostic> + 'a>> {
        if self.notes.is_empty() && self.causes.is_empty() {
            return None;
        }
        let notes = self.notes.iter().map(|n| n as &dyn Diagnostic);
        let causes = self.causes.iter().map(|c| c as &dyn Diagnostic);
        Some(Box::new(notes.chain(causes)))
    }
}

/// What an import resolver reports when it cannot produce a module
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
pub enum ImportError {
    #[error("module {path} not found")]
    #[diagnostic(code(petal::import::not_found))]
    NotFound { path: String },

    #[error("cannot parse module {path}: {message}")]
    #[diagnostic(code(petal::import::parse))]
    Parse { path: String, message: String },
}

/// Helper for creating source spans from AST spans
pub fn to_source_span(span: &Span) -> SourceSpan {
    SourceSpan::new(span.start.into(), span.end.saturating_sub(span.start))
}
