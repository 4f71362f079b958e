use super::support::*;
use crate::{Checker, Config, MemoryResolver};
use petal_ast::build::*;
use pretty_assertions::assert_eq;

fn geometry() -> petal_ast::Module {
    module(
        "geo",
        vec![TypeDef::and("Point", vec![parm("x", ty("Int")), parm("y", ty("Int"))]).into()],
    )
}

fn point(args: (&str, &str)) -> petal_ast::Expr {
    ctor(ty("Point"), "x:y:", vec![int(args.0), int(args.1)])
}

#[test]
fn test_splice_import_makes_definitions_visible() {
    let root = module(
        APP,
        vec![
            Import::splice("geo").at(1).into(),
            VarDef::new("origin", point(("0", "0"))).at(2).into(),
        ],
    );
    let checked = check_with(root, vec![geometry()]);
    assert_clean(&checked);

    let origin = checked.program.find_var(APP, "origin").unwrap();
    let point = checked.program.find_type("geo", "Point");
    assert_eq!(checked.program.var(origin).resolved, point);
}

#[test]
fn test_qualified_import() {
    let root = module(
        APP,
        vec![
            Import::qualified("lib/geo").at(1).into(),
            VarDef::new("origin", ctor(ty_in("geo", "Point", vec![]), "x:y:", vec![int("0"), int("0")]))
                .at(2)
                .into(),
        ],
    );
    let mut lib = geometry();
    lib.path = "lib/geo".to_string();
    let checked = check_with(root, vec![lib]);
    assert_clean(&checked);
}

#[test]
fn test_unqualified_name_through_qualified_import_is_undefined() {
    let root = module(
        APP,
        vec![
            Import::qualified("geo").at(1).into(),
            VarDef::new("origin", point(("0", "0"))).at(2).into(),
        ],
    );
    let checked = check_with(root, vec![geometry()]);
    assert_eq!(messages(&checked), vec!["Point undefined"]);
}

#[test]
fn test_definition_after_import_shadows_it() {
    let root = module(
        APP,
        vec![
            Import::splice("geo").at(1).into(),
            TypeDef::and("Point", vec![]).at(2).into(),
        ],
    );
    let checked = check_with(root, vec![geometry()]);
    assert_clean(&checked);
}

#[test]
fn test_import_after_definition_is_imported_redefined() {
    let root = module(
        APP,
        vec![
            TypeDef::and("Point", vec![]).at(1).into(),
            Import::splice("geo").at(2).into(),
        ],
    );
    let checked = check_with(root, vec![geometry()]);

    assert_eq!(messages(&checked), vec!["imported definition Point redefined"]);
    let err = &checked.errors[0];
    assert_eq!(err.loc.line(), Some(2));
    let notes: Vec<&str> = err.notes.iter().map(|n| n.message.as_str()).collect();
    assert_eq!(notes, vec!["previous definition", "imported definition"]);
}

#[test]
fn test_module_imported_twice() {
    let root = module(
        APP,
        vec![
            Import::splice("geo").at(1).into(),
            Import::qualified("geo").at(2).into(),
        ],
    );
    let checked = check_with(root, vec![geometry()]);
    assert_eq!(messages(&checked), vec!["module geo is imported more than once"]);
    assert_eq!(checked.errors[0].notes[0].loc.line(), Some(1));
}

#[test]
fn test_same_name_from_two_imports_is_ambiguous() {
    let other = module("draw", vec![TypeDef::and("Point", vec![]).into()]);
    let root = module(
        APP,
        vec![
            Import::splice("geo").at(1).into(),
            Import::splice("draw").at(2).into(),
            VarDef::new("p", ctor(ty("Point"), "", vec![])).at(3).into(),
        ],
    );
    let checked = check_with(root, vec![geometry(), other]);

    assert_eq!(messages(&checked), vec!["Point is ambiguous"]);
    assert_eq!(checked.errors[0].notes.len(), 2);
}

#[test]
fn test_missing_import() {
    let root = module(APP, vec![Import::qualified("nowhere").at(3).into()]);
    let checked = check_with(root, vec![]);
    assert_eq!(messages(&checked), vec!["module nowhere not found"]);
    assert_eq!(checked.errors[0].loc.line(), Some(3));
}

#[test]
fn test_import_cycle_reported_once() {
    let a = module(APP, vec![Import::qualified("b").at(1).into()]);
    let b = module("b", vec![Import::qualified("app").at(1).into()]);
    let checked = check_with(a, vec![b]);

    assert_eq!(messages(&checked), vec!["import cycle"]);
    assert_eq!(checked.errors[0].notes.len(), 2);
}

#[test]
fn test_imports_resolved_once_per_path() {
    let lib = module("lib", vec![Import::qualified("base").into()]);
    let base = module("base", vec![]);
    let root = module(
        APP,
        vec![Import::qualified("lib").into(), Import::qualified("base").into()],
    );

    let mut resolver = MemoryResolver::new().with(lib).with(base);
    let checked = Checker::new(Config::default()).check(root, &mut resolver);
    assert_clean(&checked);
    assert_eq!(resolver.requests(), &["lib".to_string(), "base".to_string()]);
}
