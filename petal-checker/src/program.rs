//! The checked program
//!
//! Definitions live in arenas addressed by the handles from `petal_ast`
//! (`TypeId`, `FunId`, `VarId`, `ModId`). Instances are ordinary arena entries
//! with `inst_of` pointing back at their generic definition, so identity of two
//! types is identity of their handles.

use indexmap::IndexMap;
use petal_ast::{Expr, FunId, MethSig, ModId, Parm, Span, Stmt, TypeId, TypeName, TypeSig, VarId};

/// The module holding the built-in types and methods
pub const BUILTIN: ModId = ModId(0);

/// A named top-level definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefRef {
    Type(TypeId),
    Fun(FunId),
    Var(VarId),
    /// A qualified import: importing module and index into its import list
    Import(ModId, usize),
}

impl DefRef {
    pub fn kind_name(self) -> &'static str {
        match self {
            DefRef::Type(_) => "type",
            DefRef::Fun(_) => "function",
            DefRef::Var(_) => "variable",
            DefRef::Import(..) => "module",
        }
    }
}

/// A generated monomorphic copy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instance {
    Type(TypeId),
    Fun(FunId),
}

#[derive(Debug, Clone)]
pub struct ModuleInfo {
    pub path: String,
    pub imports: Vec<ImportInfo>,
    pub defs: Vec<DefRef>,
    pub methods: Vec<FunId>,
    pub instances: Vec<Instance>,
    pub(crate) namespaces: IndexMap<Option<String>, Namespace>,
}

#[derive(Debug, Clone)]
pub struct ImportInfo {
    pub span: Span,
    pub sub: Option<String>,
    pub path: String,
    pub name: String,
    pub splice: bool,
    pub target: Option<ModId>,
}

/// Names visible in one (sub-)module
#[derive(Debug, Clone, Default)]
pub(crate) struct Namespace {
    pub entries: IndexMap<String, Vec<Entry>>,
    pub methods: IndexMap<(String, String), FunId>,
    /// Imported module paths and where they were imported
    pub imports: IndexMap<String, Span>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Entry {
    pub def: DefRef,
    /// Location of the splicing import this entry arrived through
    pub import: Option<Span>,
}

#[derive(Debug, Clone)]
pub struct Type {
    pub name: String,
    pub module: ModId,
    pub sub: Option<String>,
    pub span: Span,
    pub parms: Vec<Parm>,
    /// Resolved type arguments of an instance
    pub args: Vec<TypeId>,
    pub body: TypeBody,
    pub inst_of: Option<TypeId>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeBody {
    Alias(TypeName),
    And(Vec<Parm>),
    Or(Vec<Parm>),
    Virt(Vec<MethSig>),
    Builtin(Builtin),
    /// A type parameter seen as a nameless, method-less type
    Var { bound: Option<TypeId> },
    /// An instance whose body has not been substituted yet
    Pending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Int { signed: bool, bits: u32 },
    Float { bits: u32 },
    String,
    Ref,
    Array,
    Fun,
}

#[derive(Debug, Clone)]
pub struct Fun {
    pub sel: String,
    pub module: ModId,
    pub sub: Option<String>,
    pub span: Span,
    pub recv: Option<TypeSig>,
    /// Receiver type: the root definition for ordinary methods, the
    /// instantiated receiver for instances
    pub recv_type: Option<TypeId>,
    pub type_parms: Vec<Parm>,
    pub parms: Vec<Parm>,
    pub ret: Option<TypeName>,
    pub stmts: Vec<Stmt>,
    pub builtin: bool,
    pub inst_of: Option<FunId>,
    pub type_args: Vec<TypeId>,
    /// Extra module consulted for method lookup in an instance body
    pub lookup_mod: Option<ModId>,
}

impl Fun {
    pub fn is_method(&self) -> bool {
        self.recv.is_some()
    }

    pub fn is_generic(&self) -> bool {
        self.inst_of.is_none()
            && (!self.type_parms.is_empty()
                || self.recv.as_ref().is_some_and(|r| !r.parms.is_empty()))
    }

    pub fn parm_types(&self) -> Vec<Option<TypeId>> {
        self.parms
            .iter()
            .map(|p| p.ty.as_ref().and_then(|t| t.resolved))
            .collect()
    }

    pub fn ret_type(&self) -> Option<TypeId> {
        self.ret.as_ref().and_then(|t| t.resolved)
    }
}

#[derive(Debug, Clone)]
pub struct Var {
    pub name: String,
    pub module: ModId,
    pub sub: Option<String>,
    pub span: Span,
    pub ty: Option<TypeName>,
    pub init: Expr,
    pub resolved: Option<TypeId>,
}

#[derive(Debug, Clone, Default)]
pub struct Program {
    pub modules: Vec<ModuleInfo>,
    pub types: Vec<Type>,
    pub funs: Vec<Fun>,
    pub vars: Vec<Var>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_module(&mut self, path: &str) -> ModId {
        let id = ModId(self.modules.len() as u32);
        let mut namespaces = IndexMap::new();
        namespaces.insert(None, Namespace::default());
        self.modules.push(ModuleInfo {
            path: path.to_string(),
            imports: Vec::new(),
            defs: Vec::new(),
            methods: Vec::new(),
            instances: Vec::new(),
            namespaces,
        });
        id
    }

    pub fn add_type(&mut self, ty: Type) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(ty);
        id
    }

    pub fn add_fun(&mut self, fun: Fun) -> FunId {
        let id = FunId(self.funs.len() as u32);
        self.funs.push(fun);
        id
    }

    pub fn add_var(&mut self, var: Var) -> VarId {
        let id = VarId(self.vars.len() as u32);
        self.vars.push(var);
        id
    }

    pub fn module(&self, id: ModId) -> &ModuleInfo {
        &self.modules[id.0 as usize]
    }

    pub fn module_mut(&mut self, id: ModId) -> &mut ModuleInfo {
        &mut self.modules[id.0 as usize]
    }

    pub fn ty(&self, id: TypeId) -> &Type {
        &self.types[id.0 as usize]
    }

    pub fn ty_mut(&mut self, id: TypeId) -> &mut Type {
        &mut self.types[id.0 as usize]
    }

    pub fn fun(&self, id: FunId) -> &Fun {
        &self.funs[id.0 as usize]
    }

    pub fn fun_mut(&mut self, id: FunId) -> &mut Fun {
        &mut self.funs[id.0 as usize]
    }

    pub fn var(&self, id: VarId) -> &Var {
        &self.vars[id.0 as usize]
    }

    pub fn var_mut(&mut self, id: VarId) -> &mut Var {
        &mut self.vars[id.0 as usize]
    }

    pub fn module_by_path(&self, path: &str) -> Option<ModId> {
        self.modules
            .iter()
            .position(|m| m.path == path)
            .map(|i| ModId(i as u32))
    }

    /// The uninstantiated definition behind a type
    pub fn root(&self, id: TypeId) -> TypeId {
        self.ty(id).inst_of.unwrap_or(id)
    }

    pub fn builtin(&self, id: TypeId) -> Option<Builtin> {
        match self.ty(id).body {
            TypeBody::Builtin(b) => Some(b),
            _ => None,
        }
    }

    pub fn is_var(&self, id: TypeId) -> bool {
        matches!(self.ty(id).body, TypeBody::Var { .. })
    }

    pub fn is_virt(&self, id: TypeId) -> bool {
        matches!(self.ty(id).body, TypeBody::Virt(_))
    }

    pub fn is_numeric(&self, id: TypeId) -> bool {
        matches!(
            self.builtin(id),
            Some(Builtin::Int { .. } | Builtin::Float { .. })
        )
    }

    /// Strips reference types: `Int & &` is `(Int, 2)`
    pub fn ref_base(&self, mut id: TypeId) -> (TypeId, usize) {
        let mut depth = 0;
        while self.builtin(id) == Some(Builtin::Ref) && self.ty(id).args.len() == 1 {
            id = self.ty(id).args[0];
            depth += 1;
        }
        (id, depth)
    }

    /// Whether a type mentions a type variable anywhere in its arguments
    pub fn has_vars(&self, id: TypeId) -> bool {
        self.is_var(id) || self.ty(id).args.iter().any(|&a| self.has_vars(a))
    }

    /// Whether `inner` occurs in `outer`, or is `outer`
    pub fn mentions(&self, outer: TypeId, inner: TypeId) -> bool {
        outer == inner || self.ty(outer).args.iter().any(|&a| self.mentions(a, inner))
    }

    /// Renders a type the way it is written: `Int Array List`, `(String, Int) Map`
    pub fn display(&self, id: TypeId) -> String {
        let ty = self.ty(id);
        match ty.args.len() {
            0 => ty.name.clone(),
            1 => format!("{} {}", self.display(ty.args[0]), ty.name),
            _ => {
                let args: Vec<String> = ty.args.iter().map(|&a| self.display(a)).collect();
                format!("({}) {}", args.join(", "), ty.name)
            }
        }
    }

    pub fn display_opt(&self, id: Option<TypeId>) -> String {
        id.map(|id| self.display(id))
            .unwrap_or_else(|| "<unknown>".to_string())
    }

    /// Renders a method's signature as a virtual method signature
    pub fn display_fun_sig(&self, id: FunId) -> String {
        let fun = self.fun(id);
        let parms: Vec<String> = fun
            .parms
            .iter()
            .map(|p| match p.ty.as_ref() {
                Some(t) => t.resolved.map(|r| self.display(r)).unwrap_or_else(|| t.to_string()),
                None => "?".to_string(),
            })
            .collect();
        let ret = fun
            .ret
            .as_ref()
            .map(|t| t.resolved.map(|r| self.display(r)).unwrap_or_else(|| t.to_string()));
        render_sig(&fun.sel, &parms, ret.as_deref())
    }

    /// Looks up a top-level definition by module path and name
    pub fn find_def(&self, path: &str, name: &str) -> Option<DefRef> {
        let module = self.module(self.module_by_path(path)?);
        module
            .namespaces
            .values()
            .filter_map(|ns| ns.entries.get(name))
            .flatten()
            .find(|e| e.import.is_none())
            .map(|e| e.def)
    }

    pub fn find_type(&self, path: &str, name: &str) -> Option<TypeId> {
        match self.find_def(path, name)? {
            DefRef::Type(t) => Some(t),
            _ => None,
        }
    }

    pub fn find_fun(&self, path: &str, sel: &str) -> Option<FunId> {
        match self.find_def(path, sel)? {
            DefRef::Fun(f) => Some(f),
            _ => None,
        }
    }

    pub fn find_var(&self, path: &str, name: &str) -> Option<VarId> {
        match self.find_def(path, name)? {
            DefRef::Var(v) => Some(v),
            _ => None,
        }
    }

    /// Finds a method by receiver type name and selector
    pub fn find_method(&self, path: &str, recv: &str, sel: &str) -> Option<FunId> {
        let module = self.module(self.module_by_path(path)?);
        module
            .methods
            .iter()
            .copied()
            .find(|&f| {
                let fun = self.fun(f);
                fun.sel == sel && fun.recv.as_ref().is_some_and(|r| r.name == recv)
            })
    }

    pub fn instances(&self, path: &str) -> &[Instance] {
        match self.module_by_path(path) {
            Some(m) => &self.module(m).instances,
            None => &[],
        }
    }

    /// Instances of the given generic type, in creation order
    pub fn type_instances_of(&self, generic: TypeId) -> Vec<TypeId> {
        (0..self.types.len() as u32)
            .map(TypeId)
            .filter(|&t| self.ty(t).inst_of == Some(generic))
            .collect()
    }

    /// Instances of the given generic function, in creation order
    pub fn fun_instances_of(&self, generic: FunId) -> Vec<FunId> {
        (0..self.funs.len() as u32)
            .map(FunId)
            .filter(|&f| self.fun(f).inst_of == Some(generic))
            .collect()
    }

    /// Field or case types of an and/or type, by name
    pub fn member_type(&self, id: TypeId, name: &str) -> Option<TypeId> {
        let parms = match &self.ty(id).body {
            TypeBody::And(parms) | TypeBody::Or(parms) => parms,
            _ => return None,
        };
        parms
            .iter()
            .find(|p| p.name == name)
            .and_then(|p| p.ty.as_ref())
            .and_then(|t| t.resolved)
    }
}

pub(crate) fn render_sig(sel: &str, parms: &[String], ret: Option<&str>) -> String {
    let mut out = String::from("[");
    if parms.is_empty() {
        out.push_str(sel);
    } else {
        let labels = petal_ast::keyword_labels(sel);
        for (i, parm) in parms.iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            match labels.get(i) {
                Some(label) => out.push_str(&format!("{label} {parm}")),
                None => out.push_str(parm),
            }
        }
    }
    if let Some(ret) = ret {
        out.push_str(&format!(" ^{ret}"));
    }
    out.push(']');
    out
}
