use crate::{Checked, Checker, Config, MemoryResolver};
use petal_ast::build::{module, FunDef};
use petal_ast::{Def, FunId, Module, Stmt};

/// Path of the module under test
pub const APP: &str = "app";

/// Checks `root` with `imports` available to the resolver
pub fn check_with(root: Module, imports: Vec<Module>) -> Checked {
    let mut resolver = imports
        .into_iter()
        .fold(MemoryResolver::new(), |r, m| r.with(m));
    Checker::new(Config::default()).check(root, &mut resolver)
}

pub fn check_defs(defs: Vec<Def>) -> Checked {
    check_with(module(APP, defs), Vec::new())
}

/// `main` with the given body
pub fn main(stmts: Vec<Stmt>) -> Def {
    FunDef::function("main").body(stmts).into()
}

/// Checks `main` (plus `defs`) and returns the result
pub fn check_main(defs: Vec<Def>, stmts: Vec<Stmt>) -> Checked {
    let mut defs = defs;
    defs.push(main(stmts));
    check_defs(defs)
}

pub fn messages(checked: &Checked) -> Vec<String> {
    checked.errors.iter().map(|e| e.message()).collect()
}

pub fn main_fun(checked: &Checked) -> FunId {
    checked
        .program
        .find_fun(APP, "main")
        .expect("main should be collected")
}

pub fn main_stmts(checked: &Checked) -> &[Stmt] {
    &checked.program.fun(main_fun(checked)).stmts
}

/// Type of the `i`th local assigned in `main`, as written back by the checker
pub fn local_type(checked: &Checked, i: usize) -> Option<String> {
    let assigns: Vec<_> = main_stmts(checked)
        .iter()
        .filter_map(|s| match s {
            Stmt::Assign(a) => Some(a),
            _ => None,
        })
        .collect();
    let tn = assigns.get(i)?.vars[0].ty.as_ref()?;
    tn.resolved.map(|t| checked.program.display(t))
}

pub fn assert_clean(checked: &Checked) {
    assert!(checked.is_ok(), "unexpected errors: {:#?}", messages(checked));
}
