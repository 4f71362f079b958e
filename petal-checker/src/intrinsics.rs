//! The built-in module
//!
//! Installs module 0 (path `""`) with the primitive types, the word-size
//! dependent aliases and the compiler-implemented methods. Built-in methods
//! are ordinary `Fun`s flagged `builtin`; their signatures go through the same
//! resolution as user signatures.

use crate::config::Config;
use crate::program::{Builtin, DefRef, Entry, Fun, Program, Type, TypeBody, BUILTIN};
use lazy_static::lazy_static;
use petal_ast::build::{parm, tvar, ty, type_parm, untyped};
use petal_ast::{Parm, Span, TypeId, TypeName, TypeSig};

/// Handles of the built-in types the checker refers to directly
#[derive(Debug, Clone, Copy)]
pub struct Builtins {
    /// The target of `Int`
    pub int: TypeId,
    pub float: TypeId,
    pub rune: TypeId,
    pub string: TypeId,
    pub nil: TypeId,
    pub bool: TypeId,
    pub reference: TypeId,
    pub array: TypeId,
    pub fun: TypeId,
}

/// Operand of a built-in method: none, or one of the receiver's own type
#[derive(Debug, Clone, Copy, PartialEq)]
enum Operand {
    None,
    Same,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Yields {
    Same,
    Bool,
}

struct NumericMethod {
    sel: &'static str,
    operand: Operand,
    yields: Yields,
    int_only: bool,
}

const fn method(sel: &'static str, operand: Operand, yields: Yields, int_only: bool) -> NumericMethod {
    NumericMethod {
        sel,
        operand,
        yields,
        int_only,
    }
}

lazy_static! {
    static ref INT_TYPES: Vec<(&'static str, bool, u32)> = vec![
        ("Int8", true, 8),
        ("Int16", true, 16),
        ("Int32", true, 32),
        ("Int64", true, 64),
        ("UInt8", false, 8),
        ("UInt16", false, 16),
        ("UInt32", false, 32),
        ("UInt64", false, 64),
    ];

    static ref FLOAT_TYPES: Vec<(&'static str, u32)> = vec![("Float32", 32), ("Float64", 64)];

    static ref NUMERIC_METHODS: Vec<NumericMethod> = vec![
        method("+", Operand::Same, Yields::Same, false),
        method("-", Operand::Same, Yields::Same, false),
        method("*", Operand::Same, Yields::Same, false),
        method("/", Operand::Same, Yields::Same, false),
        method("%", Operand::Same, Yields::Same, true),
        method("<", Operand::Same, Yields::Bool, false),
        method("<=", Operand::Same, Yields::Bool, false),
        method(">", Operand::Same, Yields::Bool, false),
        method(">=", Operand::Same, Yields::Bool, false),
        method("=", Operand::Same, Yields::Bool, false),
        method("!=", Operand::Same, Yields::Bool, false),
        method("neg", Operand::None, Yields::Same, false),
    ];
}

struct Installer<'a> {
    program: &'a mut Program,
}

impl Installer<'_> {
    fn add_type(&mut self, name: &str, parms: Vec<Parm>, body: TypeBody) -> TypeId {
        let id = self.program.add_type(Type {
            name: name.to_string(),
            module: BUILTIN,
            sub: None,
            span: Span::default(),
            parms,
            args: Vec::new(),
            body,
            inst_of: None,
        });
        let module = self.program.module_mut(BUILTIN);
        module.defs.push(DefRef::Type(id));
        module
            .namespaces
            .entry(None)
            .or_default()
            .entries
            .insert(
                name.to_string(),
                vec![Entry {
                    def: DefRef::Type(id),
                    import: None,
                }],
            );
        id
    }

    fn add_alias(&mut self, name: &str, target: &str, id: TypeId) -> TypeId {
        self.add_type(name, Vec::new(), TypeBody::Alias(TypeName::resolved_as(target, id)))
    }

    fn add_method(
        &mut self,
        recv: TypeSig,
        recv_type: TypeId,
        sel: &str,
        parms: Vec<Parm>,
        ret: Option<TypeName>,
    ) {
        let key = (recv.name.clone(), sel.to_string());
        let id = self.program.add_fun(Fun {
            sel: sel.to_string(),
            module: BUILTIN,
            sub: None,
            span: Span::default(),
            recv: Some(recv),
            recv_type: Some(recv_type),
            type_parms: Vec::new(),
            parms,
            ret,
            stmts: Vec::new(),
            builtin: true,
            inst_of: None,
            type_args: Vec::new(),
            lookup_mod: None,
        });
        let module = self.program.module_mut(BUILTIN);
        module.methods.push(id);
        module
            .namespaces
            .entry(None)
            .or_default()
            .methods
            .insert(key, id);
    }

    fn numeric_methods(&mut self, name: &str, id: TypeId, is_int: bool, bool_id: TypeId) {
        for m in NUMERIC_METHODS.iter().filter(|m| is_int || !m.int_only) {
            let parms = match m.operand {
                Operand::None => Vec::new(),
                Operand::Same => vec![parm("x", TypeName::resolved_as(name, id))],
            };
            let ret = match m.yields {
                Yields::Same => TypeName::resolved_as(name, id),
                Yields::Bool => TypeName::resolved_as("Bool", bool_id),
            };
            self.add_method(TypeSig::new(name, Vec::new()), id, m.sel, parms, Some(ret));
        }
    }
}

/// Creates the built-in module; must run before any user module is added
pub fn install(program: &mut Program, config: &Config) -> Builtins {
    let module = program.add_module("");
    debug_assert_eq!(module, BUILTIN);
    let mut inst = Installer { program };

    let ints: Vec<(&str, TypeId)> = INT_TYPES
        .iter()
        .map(|&(name, signed, bits)| {
            (name, inst.add_type(name, Vec::new(), TypeBody::Builtin(Builtin::Int { signed, bits })))
        })
        .collect();
    let floats: Vec<(&str, TypeId)> = FLOAT_TYPES
        .iter()
        .map(|&(name, bits)| {
            (name, inst.add_type(name, Vec::new(), TypeBody::Builtin(Builtin::Float { bits })))
        })
        .collect();
    let int_named = |name: &str| {
        ints.iter()
            .find(|(n, _)| *n == name)
            .map(|&(_, id)| id)
            .unwrap_or_else(|| unreachable!("{name} is a built-in integer type"))
    };

    let string = inst.add_type("String", Vec::new(), TypeBody::Builtin(Builtin::String));
    let nil = inst.add_type("Nil", Vec::new(), TypeBody::And(Vec::new()));
    let bool_ = inst.add_type("Bool", Vec::new(), TypeBody::Or(vec![untyped("true"), untyped("false")]));
    let reference = inst.add_type("&", vec![type_parm("T")], TypeBody::Builtin(Builtin::Ref));
    let array = inst.add_type("Array", vec![type_parm("T")], TypeBody::Builtin(Builtin::Array));
    let fun = inst.add_type("Fun", Vec::new(), TypeBody::Builtin(Builtin::Fun));

    let (int_target, uint_target) = match config.word_size.bits() {
        32 => ("Int32", "UInt32"),
        _ => ("Int64", "UInt64"),
    };
    let int = int_named(int_target);
    inst.add_alias("Int", int_target, int);
    inst.add_alias("UInt", uint_target, int_named(uint_target));
    let rune = int_named("Int32");
    inst.add_alias("Rune", "Int32", rune);
    inst.add_alias("Byte", "UInt8", int_named("UInt8"));

    for &(name, id) in &ints {
        inst.numeric_methods(name, id, true, bool_);
    }
    for &(name, id) in &floats {
        inst.numeric_methods(name, id, false, bool_);
    }

    let string_sig = || TypeSig::new("String", Vec::new());
    let string_name = || TypeName::resolved_as("String", string);
    inst.add_method(string_sig(), string, "+", vec![parm("x", string_name())], Some(string_name()));
    inst.add_method(
        string_sig(),
        string,
        "=",
        vec![parm("x", string_name())],
        Some(TypeName::resolved_as("Bool", bool_)),
    );
    inst.add_method(string_sig(), string, "size", Vec::new(), Some(ty("Int")));

    // generic in the receiver's element type
    let array_sig = || TypeSig::new("Array", vec![type_parm("T")]);
    inst.add_method(array_sig(), array, "size", Vec::new(), Some(ty("Int")));
    inst.add_method(array_sig(), array, "at:", vec![parm("i", ty("Int"))], Some(tvar("T")));
    inst.add_method(
        array_sig(),
        array,
        "at:put:",
        vec![parm("i", ty("Int")), parm("x", tvar("T"))],
        None,
    );

    tracing::debug!(
        types = inst.program.types.len(),
        methods = inst.program.module(BUILTIN).methods.len(),
        "installed built-in module"
    );

    Builtins {
        int,
        float: floats[1].1,
        rune,
        string,
        nil,
        bool: bool_,
        reference,
        array,
        fun,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WordSize;

    #[test]
    fn test_int_alias_follows_word_size() {
        let mut program = Program::new();
        let b = install(&mut program, &Config::new().word_size(WordSize::W32));
        assert_eq!(program.ty(b.int).name, "Int32");

        let mut program = Program::new();
        let b = install(&mut program, &Config::default());
        assert_eq!(program.ty(b.int).name, "Int64");
        assert_eq!(program.ty(b.rune).name, "Int32");
    }

    #[test]
    fn test_modulo_only_on_integers() {
        let mut program = Program::new();
        install(&mut program, &Config::default());
        assert!(program.find_method("", "Int8", "%").is_some());
        assert!(program.find_method("", "Float64", "%").is_none());
        assert!(program.find_method("", "Float64", "<=").is_some());
        assert!(program.find_method("", "Array", "at:put:").is_some());
    }
}
