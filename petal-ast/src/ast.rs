// Petal AST Definitions
// Parsed module trees, annotated in place by the checker

use std::fmt;

/// Source position information for AST nodes
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub start_line_col: Option<(usize, usize)>,
    pub end_line_col: Option<(usize, usize)>,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            start_line_col: None,
            end_line_col: None,
        }
    }

    pub fn with_line_col(
        start: usize,
        end: usize,
        start_line_col: (usize, usize),
        end_line_col: (usize, usize),
    ) -> Self {
        Self {
            start,
            end,
            start_line_col: Some(start_line_col),
            end_line_col: Some(end_line_col),
        }
    }
}

/// Handle of a type definition or instance in the checker's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u32);

/// Handle of a function, method or function instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunId(pub u32);

/// Handle of a module-level variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(pub u32);

/// Handle of a checked module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModId(pub u32);

/// A parsed module: its path and top-level definitions in source order
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub path: String,
    pub defs: Vec<Def>,
    pub span: Span,
}

/// Top-level definitions
#[derive(Debug, Clone, PartialEq)]
pub enum Def {
    Type(TypeDef),
    Fun(FunDef),
    Var(VarDef),
    Import(Import),
}

impl Def {
    pub fn span(&self) -> &Span {
        match self {
            Def::Type(t) => &t.span,
            Def::Fun(f) => &f.span,
            Def::Var(v) => &v.span,
            Def::Import(i) => &i.span,
        }
    }

    /// Sub-module the definition belongs to, `None` for the module root
    pub fn sub(&self) -> Option<&str> {
        match self {
            Def::Type(t) => t.sub.as_deref(),
            Def::Fun(f) => f.sub.as_deref(),
            Def::Var(v) => v.sub.as_deref(),
            Def::Import(i) => i.sub.as_deref(),
        }
    }
}

/// `import "path"` binds `name` as a module qualifier; `Import "path"` (splice)
/// adds every definition of the imported module to the importing namespace.
#[derive(Debug, Clone, PartialEq)]
pub struct Import {
    pub span: Span,
    pub sub: Option<String>,
    pub path: String,
    pub name: String,
    pub splice: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeDef {
    pub span: Span,
    pub sub: Option<String>,
    pub sig: TypeSig,
    pub body: TypeBody,
}

/// The four mutually exclusive shapes of a user type
#[derive(Debug, Clone, PartialEq)]
pub enum TypeBody {
    Alias(TypeName),
    And(Vec<Parm>),     // fields
    Or(Vec<Parm>),      // cases, each with an optional payload type
    Virt(Vec<MethSig>), // virtual method signatures
}

/// A type name plus its type parameters (`(K, V) Map`)
#[derive(Debug, Clone, PartialEq)]
pub struct TypeSig {
    pub span: Span,
    pub name: String,
    pub parms: Vec<Parm>,
}

/// A virtual method signature: `[at: Int put: T ^Bool]`
#[derive(Debug, Clone, PartialEq)]
pub struct MethSig {
    pub span: Span,
    pub sel: String,
    pub parms: Vec<TypeName>,
    pub ret: Option<TypeName>,
}

/// Function or, with a receiver, a method
#[derive(Debug, Clone, PartialEq)]
pub struct FunDef {
    pub span: Span,
    pub sub: Option<String>,
    pub recv: Option<TypeSig>,
    pub type_parms: Vec<Parm>,
    pub sel: String,
    pub parms: Vec<Parm>,
    pub ret: Option<TypeName>,
    pub stmts: Vec<Stmt>,
}

/// Module-level variable
#[derive(Debug, Clone, PartialEq)]
pub struct VarDef {
    pub span: Span,
    pub sub: Option<String>,
    pub name: String,
    pub ty: Option<TypeName>,
    pub init: Expr,
}

/// Parameter, field, case, type parameter or local variable declaration.
/// For type parameters `ty` is the optional bound.
#[derive(Debug, Clone, PartialEq)]
pub struct Parm {
    pub span: Span,
    pub name: String,
    pub ty: Option<TypeName>,
}

/// A reference to a type; `resolved` is filled in by the checker
#[derive(Debug, Clone, PartialEq)]
pub struct TypeName {
    pub span: Span,
    pub kind: TypeNameKind,
    pub resolved: Option<TypeId>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeNameKind {
    Var(String),
    Named {
        module: Option<String>,
        name: String,
        args: Vec<TypeName>,
    },
}

impl TypeName {
    /// A name already bound to a type, used when substituting type variables
    pub fn resolved_as(name: impl Into<String>, ty: TypeId) -> Self {
        Self {
            span: Span::default(),
            kind: TypeNameKind::Named {
                module: None,
                name: name.into(),
                args: Vec::new(),
            },
            resolved: Some(ty),
        }
    }

    pub fn is_var(&self) -> bool {
        matches!(self.kind, TypeNameKind::Var(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Assign(Assign),
    Return(Return),
    Expr(Expr),
}

/// `x := e.`, `x Int := e.` or `x, y := r foo; bar.`
#[derive(Debug, Clone, PartialEq)]
pub struct Assign {
    pub span: Span,
    pub vars: Vec<Parm>,
    pub expr: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Return {
    pub span: Span,
    pub expr: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub span: Span,
    pub kind: ExprKind,
    pub ty: Option<TypeId>, // set by the checker
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Ident(Ident),
    Int(String),   // literal text, sign included
    Float(String), // literal text, sign included
    Rune(char),
    String(String),
    Call(Call),
    Ctor(Ctor),
    Block(Block),
    Convert(Convert),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub var: Option<VarId>, // set when the name is a module variable
}

/// A receiver (absent for function calls) sent one or more messages
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub recv: Option<Box<Expr>>,
    pub msgs: Vec<Msg>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Msg {
    pub span: Span,
    pub module: Option<String>,
    pub sel: String,
    pub args: Vec<Expr>,
    pub fun: Option<FunId>, // set by the checker
}

/// `{Point | x: 1 y: 2}`, `{Bool | true}`, `{Int Array | 1; 2}`
#[derive(Debug, Clone, PartialEq)]
pub struct Ctor {
    pub ty: TypeName,
    pub sel: String,
    pub args: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub parms: Vec<Parm>,
    pub stmts: Vec<Stmt>,
}

/// Implicit conversion inserted by the checker
#[derive(Debug, Clone, PartialEq)]
pub struct Convert {
    pub kind: ConvertKind,
    pub expr: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConvertKind {
    Ref,
    Deref,
    /// Interface construction; one entry per virtual method, `None` when the
    /// source is itself virtual and dispatches dynamically
    Virt(Vec<Option<FunId>>),
}

/// Number of arguments a selector takes
pub fn sel_arity(sel: &str) -> usize {
    let keywords = sel.matches(':').count();
    if keywords > 0 {
        keywords
    } else if sel.is_empty() || sel.starts_with(|c: char| c.is_alphabetic() || c == '_') {
        0
    } else {
        1 // binary operator
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TypeNameKind::Var(name) => write!(f, "{name}"),
            TypeNameKind::Named { module, name, args } => {
                match args.len() {
                    0 => {}
                    1 => write!(f, "{} ", args[0])?,
                    _ => {
                        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
                        write!(f, "({}) ", args.join(", "))?;
                    }
                }
                if let Some(module) = module {
                    write!(f, "#{module} ")?;
                }
                write!(f, "{name}")
            }
        }
    }
}

impl fmt::Display for MethSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        if self.parms.is_empty() {
            write!(f, "{}", self.sel)?;
        } else {
            let labels = keyword_labels(&self.sel);
            for (i, parm) in self.parms.iter().enumerate() {
                if i > 0 {
                    write!(f, " ")?;
                }
                match labels.get(i) {
                    Some(label) => write!(f, "{label} {parm}")?,
                    None => write!(f, "{parm}")?,
                }
            }
        }
        if let Some(ret) = &self.ret {
            write!(f, " ^{ret}")?;
        }
        write!(f, "]")
    }
}

/// Splits `at:put:` into `["at:", "put:"]`; operators come back whole
pub fn keyword_labels(sel: &str) -> Vec<String> {
    if !sel.contains(':') {
        return vec![sel.to_string()];
    }
    sel.split_inclusive(':').map(str::to_string).collect()
}
