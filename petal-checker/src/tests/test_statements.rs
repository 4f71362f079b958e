use super::support::*;
use petal_ast::build::*;
use petal_ast::Stmt;
use pretty_assertions::assert_eq;

fn assigned_names(checked: &crate::Checked) -> Vec<String> {
    main_stmts(checked)
        .iter()
        .filter_map(|s| match s {
            Stmt::Assign(a) => Some(a.vars[0].name.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn test_cascade_assignment_is_split() {
    let checked = check_main(
        vec![],
        vec![assign(
            vec![untyped("a"), untyped("b")],
            cascade(string("x"), vec![msg("size", vec![]), msg("+", vec![string("y")])]),
        )],
    );
    assert_clean(&checked);

    let names = assigned_names(&checked);
    assert_eq!(names.len(), 3);
    assert!(names[0].starts_with("$t"));
    assert_eq!(&names[1..], &["a".to_string(), "b".to_string()]);

    assert_eq!(local_type(&checked, 0), Some("String".to_string()));
    assert_eq!(local_type(&checked, 1), Some("Int64".to_string()));
    assert_eq!(local_type(&checked, 2), Some("String".to_string()));
}

#[test]
fn test_assignment_count_mismatch() {
    let checked = check_main(
        vec![],
        vec![
            assign(
                vec![untyped("a"), untyped("b"), untyped("c")],
                cascade(string("x"), vec![msg("size", vec![]), msg("size", vec![])]),
            ),
            assign(vec![untyped("d"), untyped("e")], int("1")),
        ],
    );
    assert_eq!(
        messages(&checked),
        vec![
            "assignment count mismatch: got 2, expected 3",
            "assignment count mismatch: got 1, expected 2",
        ]
    );
}

#[test]
fn test_return_outside_of_a_method() {
    let checked = check_defs(vec![VarDef::new("x", block(vec![], vec![ret(int("1"))])).into()]);
    assert_eq!(messages(&checked), vec!["return outside of a method"]);
}

#[test]
fn test_return_from_a_block_inside_a_method() {
    let checked = check_defs(vec![FunDef::function("pick")
        .returns(ty("Int"))
        .body(vec![
            stmt(send(
                ctor(ty("Bool"), "true", vec![]),
                "ifTrue:ifFalse:",
                vec![block(vec![], vec![ret(int("1"))]), block(vec![], vec![])],
            )),
            ret(int("2")),
        ])
        .into()]);
    assert_clean(&checked);
}

#[test]
fn test_return_type_checked_against_result() {
    let checked = check_defs(vec![
        FunDef::function("one")
            .returns(ty("Int"))
            .body(vec![ret(string("one"))])
            .into(),
        FunDef::function("two").returns(ty("Int")).body(vec![ret_none()]).into(),
        FunDef::function("three").body(vec![ret_none()]).into(),
    ]);
    assert_eq!(
        messages(&checked),
        vec!["got type String, wanted Int64", "got type Nil, wanted Int64"]
    );
}

#[test]
fn test_reassignment_keeps_the_first_type() {
    let checked = check_main(
        vec![],
        vec![let_("x", int("1")), let_("x", string("s"))],
    );
    assert_eq!(messages(&checked), vec!["got type String, wanted Int64"]);
}

#[test]
fn test_assignment_to_module_variable() {
    let checked = check_main(
        vec![VarDef::new("g", int("0")).typed(ty("Int")).into()],
        vec![let_("g", int("3")), let_("g", string("s"))],
    );
    assert_eq!(messages(&checked), vec!["got type String, wanted Int64"]);
}

#[test]
fn test_declared_local_type() {
    let checked = check_main(
        vec![],
        vec![let_typed("x", ty("UInt8"), int("7")), let_("y", ident("x"))],
    );
    assert_clean(&checked);
    assert_eq!(local_type(&checked, 0), Some("UInt8".to_string()));
    assert_eq!(local_type(&checked, 1), Some("UInt8".to_string()));
}
