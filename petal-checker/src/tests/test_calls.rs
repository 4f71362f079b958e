use super::support::*;
use petal_ast::build::*;
use pretty_assertions::assert_eq;

#[test]
fn test_method_undefined() {
    let checked = check_main(vec![], vec![stmt(send(int("1"), "frob", vec![]))]);
    assert_eq!(messages(&checked), vec!["Int64 has no method frob"]);
}

#[test]
fn test_builtin_operator() {
    let checked = check_main(
        vec![],
        vec![
            let_("sum", send(int("1"), "+", vec![int("2")])),
            let_("less", send(float("1.5"), "<", vec![float("2")])),
        ],
    );
    assert_clean(&checked);
    assert_eq!(local_type(&checked, 0), Some("Int64".to_string()));
    assert_eq!(local_type(&checked, 1), Some("Bool".to_string()));
}

#[test]
fn test_not_a_function() {
    let checked = check_main(
        vec![TypeDef::and("Point", vec![]).at(1).into()],
        vec![stmt(call("Point", vec![]))],
    );
    assert_eq!(messages(&checked), vec!["got type Point, expected a function"]);
    assert_eq!(checked.errors[0].notes[0].message, "Point is defined here");
}

#[test]
fn test_function_argument_count() {
    let checked = check_main(
        vec![FunDef::function("twice:").parm("n", ty("Int")).into()],
        vec![stmt(call("twice:", vec![int("1"), int("2")]))],
    );
    assert_eq!(messages(&checked), vec!["argument count mismatch: got 2, expected 1"]);
}

#[test]
fn test_user_method_resolves_and_records_target() {
    let checked = check_main(
        vec![
            TypeDef::and("Point", vec![parm("x", ty("Int"))]).into(),
            FunDef::method(TypeSig::new("Point", vec![]), "norm")
                .returns(ty("Int"))
                .body(vec![ret(int("0"))])
                .into(),
        ],
        vec![let_("n", send(ctor(ty("Point"), "x:", vec![int("3")]), "norm", vec![]))],
    );
    assert_clean(&checked);
    assert_eq!(local_type(&checked, 0), Some("Int64".to_string()));

    let norm = checked.program.find_method(APP, "Point", "norm");
    let target = match &main_stmts(&checked)[0] {
        petal_ast::Stmt::Assign(a) => match &a.expr.kind {
            petal_ast::ExprKind::Call(c) => c.msgs[0].fun,
            _ => None,
        },
        _ => None,
    };
    assert_eq!(target, norm);
}

#[test]
fn test_element_literals_take_the_receiver_element_type() {
    let bytes = || ty_app(vec![ty("Int8")], "Array");
    let checked = check_main(
        vec![],
        vec![
            let_typed("a", bytes(), ctor(bytes(), "", vec![int("1")])),
            stmt(send(ident("a"), "at:put:", vec![int("0"), int("5")])),
            stmt(send(ident("a"), "at:put:", vec![int("0"), int("300")])),
            let_("e", send(ident("a"), "at:", vec![int("0")])),
        ],
    );
    assert_eq!(messages(&checked), vec!["300 overflows Int8"]);
    assert_eq!(local_type(&checked, 1), Some("Int8".to_string()));
}

#[test]
fn test_virtual_method_call() {
    let checked = check_defs(vec![
        TypeDef::virt("Shape", vec![MethSig::new("area", vec![], Some(ty("Int")))]).into(),
        FunDef::function("measure:")
            .parm("s", ty("Shape"))
            .returns(ty("Int"))
            .body(vec![ret(send(ident("s"), "area", vec![]))])
            .into(),
    ]);
    assert_clean(&checked);
}

#[test]
fn test_bool_switch_yields_common_arm_type() {
    let checked = check_main(
        vec![],
        vec![let_(
            "x",
            send(
                ctor(ty("Bool"), "true", vec![]),
                "ifTrue:ifFalse:",
                vec![block(vec![], vec![stmt(int("1"))]), block(vec![], vec![stmt(int("2"))])],
            ),
        )],
    );
    assert_clean(&checked);
    assert_eq!(local_type(&checked, 0), Some("Int64".to_string()));
}

#[test]
fn test_switch_arms_disagreeing_yield_nil() {
    let checked = check_main(
        vec![],
        vec![let_(
            "x",
            send(
                ctor(ty("Bool"), "false", vec![]),
                "ifTrue:ifFalse:",
                vec![block(vec![], vec![stmt(int("1"))]), block(vec![], vec![stmt(string("s"))])],
            ),
        )],
    );
    assert_clean(&checked);
    assert_eq!(local_type(&checked, 0), Some("Nil".to_string()));
}

#[test]
fn test_switch_arm_receives_case_payload() {
    let checked = check_main(
        vec![TypeDef::or("Maybe", vec![parm("some", ty("String")), untyped("none")]).into()],
        vec![
            let_typed("m", ty("Maybe"), ctor(ty("Maybe"), "some:", vec![string("s")])),
            let_(
                "n",
                send(
                    ident("m"),
                    "ifSome:ifNone:",
                    vec![
                        block(vec![untyped("s")], vec![stmt(send(ident("s"), "size", vec![]))]),
                        block(vec![], vec![stmt(int("0"))]),
                    ],
                ),
            ),
        ],
    );
    assert_clean(&checked);
    assert_eq!(local_type(&checked, 1), Some("Int64".to_string()));
}

#[test]
fn test_block_value() {
    let checked = check_main(
        vec![],
        vec![
            let_(
                "f",
                block(
                    vec![parm("x", ty("Int"))],
                    vec![stmt(send(ident("x"), "+", vec![int("1")]))],
                ),
            ),
            let_("y", send(ident("f"), "value:", vec![int("2")])),
        ],
    );
    assert_clean(&checked);
    assert_eq!(local_type(&checked, 0), Some("(Int64, Int64) Fun".to_string()));
    assert_eq!(local_type(&checked, 1), Some("Int64".to_string()));
}

#[test]
fn test_untyped_block_parameter() {
    let checked = check_main(vec![], vec![let_("f", block(vec![untyped("x")], vec![]))]);
    assert_eq!(messages(&checked), vec!["cannot infer type of block parameter x"]);
}
