// Tree construction helpers
// Used by front ends that produce trees programmatically, and by tests

pub use crate::ast::*;

/// A span pointing at the start of `line`
pub fn line(n: usize) -> Span {
    Span::with_line_col(0, 0, (n, 1), (n, 1))
}

pub fn module(path: &str, defs: Vec<Def>) -> Module {
    Module {
        path: path.to_string(),
        defs,
        span: Span::default(),
    }
}

/// `Name`
pub fn ty(name: &str) -> TypeName {
    ty_app(Vec::new(), name)
}

/// `(A, B) Name`
pub fn ty_app(args: Vec<TypeName>, name: &str) -> TypeName {
    TypeName {
        span: Span::default(),
        kind: TypeNameKind::Named {
            module: None,
            name: name.to_string(),
            args,
        },
        resolved: None,
    }
}

/// `#module Name`
pub fn ty_in(module: &str, name: &str, args: Vec<TypeName>) -> TypeName {
    TypeName {
        span: Span::default(),
        kind: TypeNameKind::Named {
            module: Some(module.to_string()),
            name: name.to_string(),
            args,
        },
        resolved: None,
    }
}

pub fn tvar(name: &str) -> TypeName {
    TypeName {
        span: Span::default(),
        kind: TypeNameKind::Var(name.to_string()),
        resolved: None,
    }
}

/// `T &`
pub fn ref_of(target: TypeName) -> TypeName {
    ty_app(vec![target], "&")
}

pub fn parm(name: &str, ty: TypeName) -> Parm {
    Parm {
        span: Span::default(),
        name: name.to_string(),
        ty: Some(ty),
    }
}

pub fn untyped(name: &str) -> Parm {
    Parm {
        span: Span::default(),
        name: name.to_string(),
        ty: None,
    }
}

pub fn type_parm(name: &str) -> Parm {
    untyped(name)
}

pub fn bounded(name: &str, bound: TypeName) -> Parm {
    parm(name, bound)
}

impl TypeSig {
    pub fn new(name: &str, parms: Vec<Parm>) -> Self {
        Self {
            span: Span::default(),
            name: name.to_string(),
            parms,
        }
    }
}

impl MethSig {
    pub fn new(sel: &str, parms: Vec<TypeName>, ret: Option<TypeName>) -> Self {
        Self {
            span: Span::default(),
            sel: sel.to_string(),
            parms,
            ret,
        }
    }
}

impl TypeDef {
    fn with_body(name: &str, body: TypeBody) -> Self {
        Self {
            span: Span::default(),
            sub: None,
            sig: TypeSig::new(name, Vec::new()),
            body,
        }
    }

    pub fn alias(name: &str, target: TypeName) -> Self {
        Self::with_body(name, TypeBody::Alias(target))
    }

    pub fn and(name: &str, fields: Vec<Parm>) -> Self {
        Self::with_body(name, TypeBody::And(fields))
    }

    pub fn or(name: &str, cases: Vec<Parm>) -> Self {
        Self::with_body(name, TypeBody::Or(cases))
    }

    pub fn virt(name: &str, sigs: Vec<MethSig>) -> Self {
        Self::with_body(name, TypeBody::Virt(sigs))
    }

    pub fn with_parms(mut self, parms: Vec<Parm>) -> Self {
        self.sig.parms = parms;
        self
    }

    pub fn in_sub(mut self, sub: &str) -> Self {
        self.sub = Some(sub.to_string());
        self
    }

    pub fn at(mut self, n: usize) -> Self {
        self.span = line(n);
        self.sig.span = line(n);
        self
    }
}

impl FunDef {
    pub fn function(sel: &str) -> Self {
        Self {
            span: Span::default(),
            sub: None,
            recv: None,
            type_parms: Vec::new(),
            sel: sel.to_string(),
            parms: Vec::new(),
            ret: None,
            stmts: Vec::new(),
        }
    }

    pub fn method(recv: TypeSig, sel: &str) -> Self {
        Self {
            recv: Some(recv),
            ..Self::function(sel)
        }
    }

    pub fn parm(mut self, name: &str, ty: TypeName) -> Self {
        self.parms.push(parm(name, ty));
        self
    }

    pub fn type_parm(mut self, parm: Parm) -> Self {
        self.type_parms.push(parm);
        self
    }

    pub fn returns(mut self, ty: TypeName) -> Self {
        self.ret = Some(ty);
        self
    }

    pub fn body(mut self, stmts: Vec<Stmt>) -> Self {
        self.stmts = stmts;
        self
    }

    pub fn in_sub(mut self, sub: &str) -> Self {
        self.sub = Some(sub.to_string());
        self
    }

    pub fn at(mut self, n: usize) -> Self {
        self.span = line(n);
        self
    }
}

impl VarDef {
    pub fn new(name: &str, init: Expr) -> Self {
        Self {
            span: Span::default(),
            sub: None,
            name: name.to_string(),
            ty: None,
            init,
        }
    }

    pub fn typed(mut self, ty: TypeName) -> Self {
        self.ty = Some(ty);
        self
    }

    pub fn at(mut self, n: usize) -> Self {
        self.span = line(n);
        self
    }
}

impl Import {
    /// `import "a/b"`, usable as `#b`
    pub fn qualified(path: &str) -> Self {
        let name = path.rsplit('/').next().unwrap_or(path).to_string();
        Self {
            span: Span::default(),
            sub: None,
            path: path.to_string(),
            name,
            splice: false,
        }
    }

    /// `Import "a/b"`
    pub fn splice(path: &str) -> Self {
        Self {
            splice: true,
            ..Self::qualified(path)
        }
    }

    pub fn at(mut self, n: usize) -> Self {
        self.span = line(n);
        self
    }
}

impl From<TypeDef> for Def {
    fn from(def: TypeDef) -> Self {
        Def::Type(def)
    }
}

impl From<FunDef> for Def {
    fn from(def: FunDef) -> Self {
        Def::Fun(def)
    }
}

impl From<VarDef> for Def {
    fn from(def: VarDef) -> Self {
        Def::Var(def)
    }
}

impl From<Import> for Def {
    fn from(def: Import) -> Self {
        Def::Import(def)
    }
}

fn expr(kind: ExprKind) -> Expr {
    Expr {
        span: Span::default(),
        kind,
        ty: None,
    }
}

impl Expr {
    pub fn at(mut self, n: usize) -> Self {
        self.span = line(n);
        self
    }
}

pub fn ident(name: &str) -> Expr {
    expr(ExprKind::Ident(Ident {
        name: name.to_string(),
        var: None,
    }))
}

pub fn int(text: &str) -> Expr {
    expr(ExprKind::Int(text.to_string()))
}

pub fn float(text: &str) -> Expr {
    expr(ExprKind::Float(text.to_string()))
}

pub fn rune(c: char) -> Expr {
    expr(ExprKind::Rune(c))
}

pub fn string(text: &str) -> Expr {
    expr(ExprKind::String(text.to_string()))
}

pub fn msg(sel: &str, args: Vec<Expr>) -> Msg {
    Msg {
        span: Span::default(),
        module: None,
        sel: sel.to_string(),
        args,
        fun: None,
    }
}

/// `recv sel args`
pub fn send(recv: Expr, sel: &str, args: Vec<Expr>) -> Expr {
    cascade(recv, vec![msg(sel, args)])
}

/// `recv m1; m2; ...`
pub fn cascade(recv: Expr, msgs: Vec<Msg>) -> Expr {
    expr(ExprKind::Call(Call {
        recv: Some(Box::new(recv)),
        msgs,
    }))
}

/// Function call without a receiver
pub fn call(sel: &str, args: Vec<Expr>) -> Expr {
    expr(ExprKind::Call(Call {
        recv: None,
        msgs: vec![msg(sel, args)],
    }))
}

/// `#module sel args`
pub fn call_in(module: &str, sel: &str, args: Vec<Expr>) -> Expr {
    let mut m = msg(sel, args);
    m.module = Some(module.to_string());
    expr(ExprKind::Call(Call {
        recv: None,
        msgs: vec![m],
    }))
}

pub fn ctor(ty: TypeName, sel: &str, args: Vec<Expr>) -> Expr {
    expr(ExprKind::Ctor(Ctor {
        ty,
        sel: sel.to_string(),
        args,
    }))
}

pub fn block(parms: Vec<Parm>, stmts: Vec<Stmt>) -> Expr {
    expr(ExprKind::Block(Block { parms, stmts }))
}

pub fn let_(name: &str, value: Expr) -> Stmt {
    assign(vec![untyped(name)], value)
}

pub fn let_typed(name: &str, ty: TypeName, value: Expr) -> Stmt {
    assign(vec![parm(name, ty)], value)
}

pub fn assign(vars: Vec<Parm>, value: Expr) -> Stmt {
    Stmt::Assign(Assign {
        span: value.span.clone(),
        vars,
        expr: value,
    })
}

pub fn ret(value: Expr) -> Stmt {
    Stmt::Return(Return {
        span: value.span.clone(),
        expr: Some(value),
    })
}

pub fn ret_none() -> Stmt {
    Stmt::Return(Return {
        span: Span::default(),
        expr: None,
    })
}

pub fn stmt(value: Expr) -> Stmt {
    Stmt::Expr(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_type_name_display() {
        let list = ty_app(vec![ty_app(vec![ty("Int")], "Array")], "List");
        assert_eq!(list.to_string(), "Int Array List");

        let map = ty_app(vec![ty("String"), tvar("V")], "Map");
        assert_eq!(map.to_string(), "(String, V) Map");

        assert_eq!(ty_in("geo", "Point", vec![]).to_string(), "#geo Point");
    }

    #[test]
    fn test_selector_arity() {
        assert_eq!(sel_arity("size"), 0);
        assert_eq!(sel_arity("+"), 1);
        assert_eq!(sel_arity("at:put:"), 2);
        assert_eq!(sel_arity(""), 0);
    }

    #[test]
    fn test_meth_sig_display() {
        let sig = MethSig::new("at:put:", vec![ty("Int"), tvar("T")], Some(ty("Bool")));
        assert_eq!(sig.to_string(), "[at: Int put: T ^Bool]");

        let unary = MethSig::new("foo", vec![], Some(ty("Bool")));
        assert_eq!(unary.to_string(), "[foo ^Bool]");
    }

    #[test]
    fn test_import_name_is_last_path_segment() {
        let import = Import::qualified("geo/shapes");
        assert_eq!(import.name, "shapes");
        assert!(!import.splice);
        assert!(Import::splice("geo").splice);
    }

    #[test]
    fn test_assignment_takes_value_span() {
        let s = let_("x", int("1").at(4));
        match s {
            Stmt::Assign(a) => assert_eq!(a.span, line(4)),
            other => panic!("expected assignment, got {other:?}"),
        }
    }
}
