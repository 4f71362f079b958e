//! Generic substitution
//!
//! A uniform tree copy that rewrites type variables to the type names they are
//! bound to. Named applications with arguments lose their cached resolution so
//! that resolving the copy goes back through the instance memo (`T Array`
//! under `T = Int` becomes the memoized `Int Array`). Checker annotations are
//! dropped; the copy is checked afresh.

use petal_ast::{
    Assign, Block, Call, Convert, Ctor, Expr, ExprKind, Ident, MethSig, Msg, Parm, Return, Stmt,
    TypeName, TypeNameKind,
};
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub(crate) struct Subst {
    map: HashMap<String, TypeName>,
}

impl Subst {
    pub fn new(bindings: impl IntoIterator<Item = (String, TypeName)>) -> Self {
        Self {
            map: bindings.into_iter().collect(),
        }
    }

    pub fn type_name(&self, name: &TypeName) -> TypeName {
        match &name.kind {
            // unbound variables belong to an enclosing definition
            TypeNameKind::Var(var) => match self.map.get(var) {
                Some(bound) => TypeName {
                    span: name.span.clone(),
                    ..bound.clone()
                },
                None => name.clone(),
            },
            TypeNameKind::Named { module, name: n, args } => TypeName {
                span: name.span.clone(),
                kind: TypeNameKind::Named {
                    module: module.clone(),
                    name: n.clone(),
                    args: args.iter().map(|a| self.type_name(a)).collect(),
                },
                resolved: if args.is_empty() { name.resolved } else { None },
            },
        }
    }

    fn opt_type_name(&self, name: &Option<TypeName>) -> Option<TypeName> {
        name.as_ref().map(|n| self.type_name(n))
    }

    pub fn parm(&self, parm: &Parm) -> Parm {
        Parm {
            span: parm.span.clone(),
            name: parm.name.clone(),
            ty: self.opt_type_name(&parm.ty),
        }
    }

    pub fn parms(&self, parms: &[Parm]) -> Vec<Parm> {
        parms.iter().map(|p| self.parm(p)).collect()
    }

    pub fn meth_sig(&self, sig: &MethSig) -> MethSig {
        MethSig {
            span: sig.span.clone(),
            sel: sig.sel.clone(),
            parms: sig.parms.iter().map(|p| self.type_name(p)).collect(),
            ret: self.opt_type_name(&sig.ret),
        }
    }

    pub fn stmts(&self, stmts: &[Stmt]) -> Vec<Stmt> {
        stmts.iter().map(|s| self.stmt(s)).collect()
    }

    fn stmt(&self, stmt: &Stmt) -> Stmt {
        match stmt {
            Stmt::Assign(a) => Stmt::Assign(Assign {
                span: a.span.clone(),
                vars: self.parms(&a.vars),
                expr: self.expr(&a.expr),
            }),
            Stmt::Return(r) => Stmt::Return(Return {
                span: r.span.clone(),
                expr: r.expr.as_ref().map(|e| self.expr(e)),
            }),
            Stmt::Expr(e) => Stmt::Expr(self.expr(e)),
        }
    }

    pub fn expr(&self, expr: &Expr) -> Expr {
        let kind = match &expr.kind {
            ExprKind::Ident(id) => ExprKind::Ident(Ident {
                name: id.name.clone(),
                var: None,
            }),
            ExprKind::Int(text) => ExprKind::Int(text.clone()),
            ExprKind::Float(text) => ExprKind::Float(text.clone()),
            ExprKind::Rune(c) => ExprKind::Rune(*c),
            ExprKind::String(text) => ExprKind::String(text.clone()),
            ExprKind::Call(call) => ExprKind::Call(Call {
                recv: call.recv.as_ref().map(|r| Box::new(self.expr(r))),
                msgs: call.msgs.iter().map(|m| self.msg(m)).collect(),
            }),
            ExprKind::Ctor(ctor) => ExprKind::Ctor(Ctor {
                ty: self.type_name(&ctor.ty),
                sel: ctor.sel.clone(),
                args: ctor.args.iter().map(|a| self.expr(a)).collect(),
            }),
            ExprKind::Block(block) => ExprKind::Block(Block {
                parms: self.parms(&block.parms),
                stmts: self.stmts(&block.stmts),
            }),
            ExprKind::Convert(conv) => ExprKind::Convert(Convert {
                kind: conv.kind.clone(),
                expr: Box::new(self.expr(&conv.expr)),
            }),
        };
        Expr {
            span: expr.span.clone(),
            kind,
            ty: None,
        }
    }

    fn msg(&self, msg: &Msg) -> Msg {
        Msg {
            span: msg.span.clone(),
            module: msg.module.clone(),
            sel: msg.sel.clone(),
            args: msg.args.iter().map(|a| self.expr(a)).collect(),
            fun: None,
        }
    }
}
