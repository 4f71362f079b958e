use super::support::*;
use petal_ast::build::*;
use pretty_assertions::assert_eq;

#[test]
fn test_alias_cycle_reported_exactly_once() {
    let checked = check_defs(vec![
        TypeDef::alias("A", ty("B")).at(1).into(),
        TypeDef::alias("B", ty("C")).at(2).into(),
        TypeDef::alias("C", ty("A")).at(3).into(),
    ]);

    assert_eq!(messages(&checked), vec!["type alias cycle"]);
    let notes: Vec<&str> = checked.errors[0].notes.iter().map(|n| n.message.as_str()).collect();
    assert_eq!(notes, vec!["A", "B", "C", "A"]);
}

#[test]
fn test_alias_cycle_found_from_a_use_site() {
    // the variable is checked after the aliases, which already reported
    let checked = check_defs(vec![
        TypeDef::alias("Loop", ty("Loop")).at(1).into(),
        VarDef::new("x", int("1")).typed(ty("Loop")).at(2).into(),
    ]);
    assert_eq!(messages(&checked), vec!["type alias cycle"]);
}

#[test]
fn test_alias_chain_resolves_to_target() {
    let checked = check_defs(vec![
        TypeDef::alias("Count", ty("Size")).into(),
        TypeDef::alias("Size", ty("Int")).into(),
        VarDef::new("n", int("1")).typed(ty("Count")).into(),
    ]);
    assert_clean(&checked);

    let n = checked.program.find_var(APP, "n").unwrap();
    let resolved = checked.program.var(n).resolved.unwrap();
    assert_eq!(checked.program.display(resolved), "Int64");
}

#[test]
fn test_generic_alias_instantiates_its_target() {
    let checked = check_defs(vec![
        TypeDef::alias("Row", ty_app(vec![tvar("T")], "Array"))
            .with_parms(vec![type_parm("T")])
            .into(),
        VarDef::new("r", ctor(ty_app(vec![ty("String")], "Array"), "", vec![string("a")]))
            .typed(ty_app(vec![ty("String")], "Row"))
            .into(),
    ]);
    assert_clean(&checked);

    let r = checked.program.find_var(APP, "r").unwrap();
    let resolved = checked.program.var(r).resolved.unwrap();
    assert_eq!(checked.program.display(resolved), "String Array");
}

#[test]
fn test_alias_to_undefined_name() {
    let checked = check_defs(vec![TypeDef::alias("Thing", ty("Nothing")).into()]);
    assert_eq!(messages(&checked), vec!["Nothing undefined"]);
}

#[test]
fn test_alias_cycle_entered_through_a_member() {
    // the field reaches the cycle at B before any alias is checked
    let checked = check_defs(vec![
        TypeDef::and("Holder", vec![parm("b", ty("B"))]).into(),
        TypeDef::alias("A", ty("B")).at(1).into(),
        TypeDef::alias("B", ty("C")).at(2).into(),
        TypeDef::alias("C", ty("A")).at(3).into(),
        VarDef::new("c", int("1")).typed(ty("C")).into(),
    ]);

    assert_eq!(messages(&checked), vec!["type alias cycle"]);
    let notes: Vec<&str> = checked.errors[0].notes.iter().map(|n| n.message.as_str()).collect();
    assert_eq!(notes, vec!["B", "C", "A", "B"]);
}

#[test]
fn test_generic_alias_cycle_reported_once() {
    let checked = check_defs(vec![
        TypeDef::alias("A", ty_app(vec![tvar("T")], "B"))
            .with_parms(vec![type_parm("T")])
            .into(),
        TypeDef::alias("B", ty_app(vec![tvar("T")], "A"))
            .with_parms(vec![type_parm("T")])
            .into(),
        TypeDef::and("Use", vec![parm("a", ty_app(vec![ty("Int")], "A"))]).into(),
    ]);
    assert_eq!(messages(&checked), vec!["type alias cycle"]);
}
