use super::support::*;
use petal_ast::build::*;
use petal_ast::ExprKind;
use pretty_assertions::assert_eq;

fn var_type(checked: &crate::Checked, name: &str) -> Option<String> {
    let v = checked.program.find_var(APP, name)?;
    checked.program.var(v).resolved.map(|t| checked.program.display(t))
}

#[test]
fn test_initialization_cycle_reported_once() {
    let checked = check_defs(vec![
        VarDef::new("x", ident("y")).at(1).into(),
        VarDef::new("y", ident("x")).at(2).into(),
    ]);
    assert_eq!(messages(&checked), vec!["x initialization cycle"]);
    assert_eq!(checked.errors[0].notes[0].message, "used here");
}

#[test]
fn test_self_referential_initializer() {
    let checked = check_defs(vec![VarDef::new("x", send(ident("x"), "+", vec![int("1")])).into()]);
    assert_eq!(messages(&checked), vec!["x initialization cycle"]);
}

#[test]
fn test_type_inferred_from_initializer() {
    let checked = check_defs(vec![VarDef::new("n", send(int("1"), "+", vec![int("2")])).into()]);
    assert_clean(&checked);
    assert_eq!(var_type(&checked, "n"), Some("Int64".to_string()));
}

#[test]
fn test_forward_reference_checks_on_demand() {
    let checked = check_defs(vec![
        VarDef::new("a", ident("b")).into(),
        VarDef::new("b", int("1")).typed(ty("Int8")).into(),
    ]);
    assert_clean(&checked);
    assert_eq!(var_type(&checked, "a"), Some("Int8".to_string()));
}

#[test]
fn test_variable_used_in_a_function() {
    let checked = check_defs(vec![
        FunDef::function("get").returns(ty("Int")).body(vec![ret(ident("g"))]).into(),
        VarDef::new("g", int("3")).into(),
    ]);
    assert_clean(&checked);
}

#[test]
fn test_type_is_not_a_value() {
    let checked = check_defs(vec![
        TypeDef::and("Point", vec![]).into(),
        VarDef::new("v", ident("Point")).into(),
    ]);
    assert_eq!(messages(&checked), vec!["got type Point, expected a value"]);
}

#[test]
fn test_unary_function_name_is_a_call() {
    let checked = check_defs(vec![
        FunDef::function("answer").returns(ty("Int")).body(vec![ret(int("42"))]).into(),
        VarDef::new("v", ident("answer")).into(),
    ]);
    assert_clean(&checked);
    assert_eq!(var_type(&checked, "v"), Some("Int64".to_string()));

    let v = checked.program.find_var(APP, "v").unwrap();
    let answer = checked.program.find_fun(APP, "answer");
    match &checked.program.var(v).init.kind {
        ExprKind::Call(c) => assert_eq!(c.msgs[0].fun, answer),
        other => panic!("expected a call, got {other:?}"),
    }
}

#[test]
fn test_undefined_name() {
    let checked = check_defs(vec![VarDef::new("v", ident("nope")).into()]);
    assert_eq!(messages(&checked), vec!["nope undefined"]);
}

#[test]
fn test_variable_first_used_in_an_unresolved_call() {
    let ints = || ty_app(vec![ty("Int")], "Array");
    let checked = check_main(
        vec![
            VarDef::new("w", call("nope:", vec![ident("v")])).into(),
            VarDef::new("v", ctor(ints(), "", vec![int("1")])).into(),
        ],
        vec![let_typed("x", ints(), ident("v"))],
    );
    assert_eq!(messages(&checked), vec!["nope: undefined"]);
    assert_eq!(var_type(&checked, "v"), Some("Int64 Array".to_string()));

    let v = checked.program.find_var(APP, "v").unwrap();
    let array = checked.program.var(v).resolved.unwrap();
    assert!(checked.program.instances(APP).contains(&crate::Instance::Type(array)));
    assert_eq!(local_type(&checked, 0), Some("Int64 Array".to_string()));
}
