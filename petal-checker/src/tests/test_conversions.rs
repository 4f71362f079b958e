use super::support::*;
use petal_ast::build::*;
use petal_ast::{ConvertKind, Expr, ExprKind, Stmt};
use pretty_assertions::assert_eq;

fn assigned(stmt: &Stmt) -> &Expr {
    match stmt {
        Stmt::Assign(a) => &a.expr,
        other => panic!("expected an assignment, got {other:?}"),
    }
}

fn conversion(expr: &Expr) -> Option<&ConvertKind> {
    match &expr.kind {
        ExprKind::Convert(c) => Some(&c.kind),
        _ => None,
    }
}

fn fooer() -> petal_ast::Def {
    TypeDef::virt("Fooer", vec![MethSig::new("foo", vec![], Some(ty("Bool")))]).into()
}

#[test]
fn test_argument_is_referenced() {
    let checked = check_main(
        vec![FunDef::function("bump:").parm("p", ref_of(ty("Int"))).into()],
        vec![stmt(call("bump:", vec![int("5")]))],
    );
    assert_clean(&checked);

    let Stmt::Expr(call) = &main_stmts(&checked)[0] else {
        panic!("expected an expression statement");
    };
    let ExprKind::Call(c) = &call.kind else {
        panic!("expected a call");
    };
    let arg = &c.msgs[0].args[0];
    assert_eq!(conversion(arg), Some(&ConvertKind::Ref));
    assert_eq!(checked.program.display(arg.ty.unwrap()), "Int64 &");
}

#[test]
fn test_reference_is_dereferenced() {
    let int_ref = || ref_of(ty("Int"));
    let checked = check_main(
        vec![],
        vec![
            let_("r", ctor(int_ref(), "", vec![int("5")])),
            let_typed("x", ty("Int"), ident("r")),
        ],
    );
    assert_clean(&checked);
    assert_eq!(local_type(&checked, 0), Some("Int64 &".to_string()));

    let value = assigned(&main_stmts(&checked)[1]);
    assert_eq!(conversion(value), Some(&ConvertKind::Deref));
    assert_eq!(checked.program.display(value.ty.unwrap()), "Int64");
}

#[test]
fn test_unrelated_types_mismatch() {
    let checked = check_main(vec![], vec![let_typed("x", ty("Int"), string("s"))]);
    assert_eq!(messages(&checked), vec!["got type String, wanted Int64"]);
}

#[test]
fn test_missing_virtual_method() {
    let checked = check_main(vec![fooer()], vec![let_typed("x", ty("Fooer"), int("5"))]);

    assert_eq!(messages(&checked), vec!["Int64 does not implement Fooer"]);
    let causes: Vec<String> = checked.errors[0].causes.iter().map(|c| c.message()).collect();
    assert_eq!(causes, vec!["foo undefined"]);
}

#[test]
fn test_virtual_conversion_records_implementations() {
    let checked = check_main(
        vec![
            fooer(),
            FunDef::method(TypeSig::new("Int", vec![]), "foo")
                .returns(ty("Bool"))
                .body(vec![ret(ctor(ty("Bool"), "true", vec![]))])
                .into(),
        ],
        vec![let_typed("x", ty("Fooer"), int("5"))],
    );
    assert_clean(&checked);

    let foo = checked.program.find_method(APP, "Int", "foo");
    let value = assigned(&main_stmts(&checked)[0]);
    assert_eq!(conversion(value), Some(&ConvertKind::Virt(vec![foo])));
}

#[test]
fn test_virtual_method_with_wrong_type() {
    let checked = check_main(
        vec![
            fooer(),
            FunDef::method(TypeSig::new("Int", vec![]), "foo")
                .returns(ty("Int"))
                .body(vec![ret(int("1"))])
                .into(),
        ],
        vec![let_typed("x", ty("Fooer"), int("5"))],
    );

    assert_eq!(messages(&checked), vec!["Int64 does not implement Fooer"]);
    let cause = &checked.errors[0].causes[0];
    assert_eq!(cause.message(), "foo has the wrong type");
    let notes: Vec<&str> = cause.notes.iter().map(|n| n.message.as_str()).collect();
    assert_eq!(notes, vec!["expected [foo ^Bool]", "got [foo ^Int64]"]);
}

#[test]
fn test_ambiguous_virtual_method() {
    let point_foo = |value: &str| -> petal_ast::Def {
        FunDef::method(TypeSig::new("Point", vec![]), "foo")
            .returns(ty("Bool"))
            .body(vec![ret(ctor(ty("Bool"), value, vec![]))])
            .into()
    };
    let geo = module(
        "geo",
        vec![TypeDef::and("Point", vec![]).into(), point_foo("true")],
    );
    let root = module(
        APP,
        vec![
            Import::splice("geo").into(),
            fooer(),
            point_foo("false"),
            FunDef::function("main")
                .body(vec![let_typed("x", ty("Fooer"), ctor(ty("Point"), "", vec![]))])
                .into(),
        ],
    );
    let checked = check_with(root, vec![geo]);

    assert_eq!(messages(&checked), vec!["Point does not implement Fooer"]);
    let cause = &checked.errors[0].causes[0];
    assert_eq!(cause.message(), "foo is ambiguous");
    let notes: Vec<&str> = cause.notes.iter().map(|n| n.message.as_str()).collect();
    assert_eq!(notes, vec!["foo is defined here", "foo is defined here"]);
}
