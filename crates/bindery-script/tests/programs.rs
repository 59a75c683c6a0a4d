use bindery_core::{Table, Value};
use bindery_script::{CallTarget, FnDef, FnPath, Program, ROOT, ScriptError};
use proptest::prelude::*;

const UNITS: &str = r#"
// Conversions shared by the dashboard.
fn to_celsius(f: float) -> float = (f - 32.0) * 5.0 / 9.0
fn clamp(x: float, lo: float = 0.0, hi: float = 100.0) -> float {
    if x < lo { lo } else if x > hi { hi } else { x }
}
"#;

const LABELS: &str = r#"
use units::to_celsius;
use units::clamp;

fn label(temp: float, unit: str = "C") -> str {
    let value = if unit == "C" { to_celsius(temp) } else { temp };
    str(round(clamp(value))) + " " + unit
}
"#;

fn dashboard() -> Program {
    let mut program = Program::new();
    program.load_module("units", UNITS).unwrap();
    program.load_module("labels", LABELS).unwrap();
    program
}

#[test]
fn imported_helpers_run_with_defaults() {
    let program = dashboard();
    let label = FnPath::parse("labels::label");
    assert_eq!(
        program.call(&label, vec![Value::Float(212.0)]).unwrap(),
        Value::from("100 C")
    );
    assert_eq!(
        program
            .call(&label, vec![Value::Float(500.0), Value::from("F")])
            .unwrap(),
        Value::from("100 F")
    );
}

#[test]
fn definition_survives_serde_and_runs_elsewhere() {
    let program = dashboard();
    let def = program.lookup(&FnPath::parse("units::clamp")).unwrap();
    let json = serde_json::to_string(def).unwrap();
    let back: FnDef = serde_json::from_str(&json).unwrap();
    assert_eq!(&back, def);

    let elsewhere = Program::from_root_functions([back]).unwrap();
    let out = elsewhere
        .call(&FnPath::root("clamp"), vec![Value::Float(150.0)])
        .unwrap();
    assert_eq!(out, Value::Float(100.0));
}

#[test]
fn detached_definition_falls_back_to_root() {
    let program = dashboard();
    let mut label = program
        .lookup(&FnPath::parse("labels::label"))
        .unwrap()
        .clone();
    label.module = ROOT.to_string();

    // Without the helpers in root the call cannot resolve.
    let bare = Program::new();
    let err = bare.invoke(&label, vec![Value::Float(50.0)]).unwrap_err();
    assert_eq!(err, ScriptError::UnknownFunction("to_celsius".into()));

    let helpers = ["to_celsius", "clamp"].map(|name| {
        let src = program
            .lookup(&FnPath::new("units", name))
            .and_then(|d| d.source.clone())
            .unwrap();
        FnDef::compile(&src, ROOT).unwrap()
    });
    let rehomed = Program::from_root_functions(helpers).unwrap();
    assert_eq!(
        rehomed.resolve_call(ROOT, "clamp"),
        CallTarget::Root("clamp".into())
    );
    assert_eq!(
        rehomed.invoke(&label, vec![Value::Float(50.0)]).unwrap(),
        Value::from("10 C")
    );
}

#[test]
fn tables_flow_through_builtins() {
    let mut table = Table::new(["city", "temp"]).unwrap();
    table.push_row(vec![Value::from("Oslo"), Value::Int(4)]).unwrap();
    table.push_row(vec![Value::from("Rome"), Value::Int(21)]).unwrap();

    let mut program = Program::new();
    program
        .load_root("fn warmest(t: table) -> int = max(column(t, \"temp\"))")
        .unwrap();
    let out = program
        .call(&FnPath::root("warmest"), vec![Value::Table(table)])
        .unwrap();
    assert_eq!(out, Value::Int(21));
}

#[test]
fn user_function_shadows_builtin() {
    let mut program = Program::new();
    program.load_root("fn len(x: any) -> int = 7").unwrap();
    program.load_module("m", "fn f() -> int = len([1])").unwrap();
    assert_eq!(
        program.call(&FnPath::parse("m::f"), vec![]).unwrap(),
        Value::Int(7)
    );
}

proptest! {
    #[test]
    fn int_arithmetic_matches_native(a in -10_000i64..10_000, b in -10_000i64..10_000) {
        let mut program = Program::new();
        program
            .load_root("fn f(a: int, b: int) -> list = [a + b, a - b, a * b]")
            .unwrap();
        let out = program
            .call(&FnPath::root("f"), vec![Value::Int(a), Value::Int(b)])
            .unwrap();
        prop_assert_eq!(
            out,
            Value::List(vec![Value::Int(a + b), Value::Int(a - b), Value::Int(a * b)])
        );
    }

    #[test]
    fn call_table_lists_every_called_name(names in proptest::collection::btree_set("[a-z]{1,6}", 1..5)) {
        let body = names
            .iter()
            .map(|n| format!("x{n}()"))
            .collect::<Vec<_>>()
            .join(" + ");
        let def = FnDef::compile(&format!("fn f() -> any = {body}"), ROOT).unwrap();
        let expected: Vec<String> = names.iter().map(|n| format!("x{n}")).collect();
        prop_assert_eq!(def.calls.into_iter().collect::<Vec<_>>(), expected);
    }
}
