use super::support::*;
use crate::ErrorKind;
use petal_ast::build::*;
use pretty_assertions::assert_eq;

#[test]
fn test_redefined_type_reported_once_with_note() {
    let checked = check_defs(vec![
        TypeDef::and("Xyz", vec![]).at(1).into(),
        TypeDef::and("Xyz", vec![]).at(2).into(),
    ]);

    assert_eq!(messages(&checked), vec!["Xyz is redefined"]);
    let err = &checked.errors[0];
    assert_eq!(err.loc.line(), Some(2));
    assert_eq!(err.notes.len(), 1);
    assert_eq!(err.notes[0].message, "previous definition");
    assert_eq!(err.notes[0].loc.line(), Some(1));
}

#[test]
fn test_sub_modules_do_not_conflict() {
    let checked = check_defs(vec![
        TypeDef::and("Xyz", vec![]).in_sub("a").at(1).into(),
        TypeDef::and("Xyz", vec![]).in_sub("b").at(2).into(),
    ]);
    assert_clean(&checked);
}

#[test]
fn test_redefinition_ignores_kind() {
    let checked = check_defs(vec![
        TypeDef::and("thing", vec![]).at(1).into(),
        FunDef::function("thing").at(2).into(),
    ]);
    assert_eq!(messages(&checked), vec!["thing is redefined"]);
}

#[test]
fn test_builtin_names_are_shadowed_silently() {
    let checked = check_main(
        vec![TypeDef::and("String", vec![parm("chars", ty("Int"))]).into()],
        vec![let_(
            "s",
            ctor(ty("String"), "chars:", vec![int("3")]),
        )],
    );
    assert_clean(&checked);
    assert_eq!(local_type(&checked, 0), Some("String".to_string()));
    let s = checked.program.find_type(APP, "String");
    assert!(s.is_some());
}

#[test]
fn test_duplicate_method_on_same_receiver() {
    let checked = check_defs(vec![
        FunDef::method(TypeSig::new("Int", vec![]), "twice").at(1).into(),
        FunDef::method(TypeSig::new("Int", vec![]), "twice").at(2).into(),
    ]);
    assert_eq!(messages(&checked), vec!["Int twice is redefined"]);
}

#[test]
fn test_member_uniqueness() {
    let checked = check_defs(vec![
        TypeDef::and("Point", vec![parm("x", ty("Int")), parm("x", ty("Int"))]).into(),
        TypeDef::or("Answer", vec![untyped("yes"), untyped("Yes")]).into(),
        TypeDef::virt(
            "Shape",
            vec![
                MethSig::new("area", vec![], Some(ty("Int"))),
                MethSig::new("area", vec![], None),
            ],
        )
        .into(),
    ]);

    let kinds: Vec<ErrorKind> = checked.errors.iter().map(|e| e.kind.clone()).collect();
    assert_eq!(
        kinds,
        vec![
            ErrorKind::DuplicateField { name: "x".to_string() },
            ErrorKind::DuplicateCase { name: "Yes".to_string() },
            ErrorKind::DuplicateVirtual { sel: "area".to_string() },
        ]
    );
    assert!(checked.errors.iter().all(|e| e.notes.len() == 1));
}
