use super::support::*;
use crate::intrinsics::{self, Builtins};
use crate::program::{Type, TypeBody};
use crate::{Bindings, Config, ErrorKind, Program, Unifier, BUILTIN};
use petal_ast::build::*;
use petal_ast::{Span, TypeId};
use pretty_assertions::assert_eq;

fn program() -> (Program, Builtins) {
    let mut program = Program::new();
    let builtins = intrinsics::install(&mut program, &Config::default());
    (program, builtins)
}

fn add(program: &mut Program, name: &str, body: TypeBody, args: Vec<TypeId>, inst_of: Option<TypeId>) -> TypeId {
    program.add_type(Type {
        name: name.to_string(),
        module: BUILTIN,
        sub: None,
        span: Span::default(),
        parms: Vec::new(),
        args,
        body,
        inst_of,
    })
}

fn var(program: &mut Program, name: &str) -> TypeId {
    add(program, name, TypeBody::Var { bound: None }, Vec::new(), None)
}

fn array_of(program: &mut Program, b: &Builtins, elem: TypeId) -> TypeId {
    add(program, "Array", TypeBody::Pending, vec![elem], Some(b.array))
}

#[test]
fn test_variable_binds_on_first_sight() {
    let (mut program, b) = program();
    let x = var(&mut program, "X");
    let unifier = Unifier::new(&program, APP);
    let mut bindings = Bindings::new();

    unifier.unify(x, b.int, &Span::default(), &mut bindings).unwrap();
    unifier.unify(x, b.int, &Span::default(), &mut bindings).unwrap();
    assert_eq!(bindings.get(&x).map(|(t, _)| *t), Some(b.int));

    let err = unifier
        .unify(x, b.string, &Span::default(), &mut bindings)
        .unwrap_err();
    assert_eq!(err.message(), "cannot unify X: bound to Int64, got String");
    assert_eq!(err.notes[0].message, "previous binding");
}

#[test]
fn test_structure_is_matched_through_arguments() {
    let (mut program, b) = program();
    let x = var(&mut program, "X");
    let x_array = array_of(&mut program, &b, x);
    let int_array = array_of(&mut program, &b, b.int);
    let unifier = Unifier::new(&program, APP);
    let mut bindings = Bindings::new();

    unifier
        .unify(x_array, int_array, &Span::default(), &mut bindings)
        .unwrap();
    assert_eq!(bindings.get(&x).map(|(t, _)| *t), Some(b.int));

    let err = unifier
        .unify(x_array, b.string, &Span::default(), &mut Bindings::new())
        .unwrap_err();
    assert_eq!(
        err.kind,
        ErrorKind::UnifyMismatch {
            pattern: "X Array".to_string(),
            got: "String".to_string(),
        }
    );
}

#[test]
fn test_nested_failure_is_a_cause() {
    let (mut program, b) = program();
    let x = var(&mut program, "X");
    let x_array = array_of(&mut program, &b, x);
    let string_array = array_of(&mut program, &b, b.string);
    let unifier = Unifier::new(&program, APP);
    let mut bindings = Bindings::new();
    bindings.insert(x, (b.int, Span::default()));

    let err = unifier
        .unify(x_array, string_array, &Span::default(), &mut bindings)
        .unwrap_err();
    assert_eq!(err.message(), "cannot unify X Array with String Array");
    let causes: Vec<String> = err.causes.iter().map(|c| c.message()).collect();
    assert_eq!(causes, vec!["cannot unify X: bound to Int64, got String"]);
}

fn same_and() -> petal_ast::Def {
    FunDef::function("same:and:")
        .type_parm(type_parm("X"))
        .parm("a", tvar("X"))
        .parm("b", tvar("X"))
        .returns(tvar("X"))
        .body(vec![ret(ident("a"))])
        .into()
}

#[test]
fn test_call_arguments_must_agree() {
    let checked = check_main(
        vec![same_and()],
        vec![stmt(call("same:and:", vec![int("1"), string("s")]))],
    );
    assert_eq!(
        messages(&checked),
        vec!["cannot unify X: bound to Int64, got String"]
    );
}

#[test]
fn test_inferred_call_yields_the_bound_type() {
    let checked = check_main(
        vec![same_and()],
        vec![let_("x", call("same:and:", vec![int("1"), int("2")]))],
    );
    assert_clean(&checked);
    assert_eq!(local_type(&checked, 0), Some("Int64".to_string()));

    let generic = checked.program.find_fun(APP, "same:and:").unwrap();
    let instances = checked.program.fun_instances_of(generic);
    assert_eq!(instances.len(), 1);
    assert_eq!(checked.program.fun(instances[0]).type_args, vec![checked.program.find_type("", "Int64").unwrap()]);
}

#[test]
fn test_unbound_type_variable_cannot_be_inferred() {
    let checked = check_main(
        vec![FunDef::function("make")
            .type_parm(type_parm("T"))
            .returns(ty_app(vec![tvar("T")], "Array"))
            .body(vec![ret(ctor(ty_app(vec![tvar("T")], "Array"), "", vec![]))])
            .into()],
        vec![stmt(call("make", vec![]))],
    );
    assert_eq!(messages(&checked), vec!["cannot infer type of type variable T"]);
}
