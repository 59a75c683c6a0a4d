#![forbid(unsafe_code)]

//! Portability transform: make a bound function self-contained.
//!
//! A function in some module may call helpers from its own module or from
//! imports. Those names do not exist on the executing side, which only sees
//! the shared root namespace. [`rehome`] walks the static call tables from
//! the bound function outward, recompiles every reachable non-root helper
//! from its source into the root namespace, and continues into that
//! helper's own calls until no unvisited helper remains. [`capture`] then
//! collects the bound function plus every root function it can reach into
//! one [`PortableBody`].
//!
//! A bound function that calls itself, directly or through its helpers, is
//! reachable from its own call table and is rehomed like any helper.
//!
//! # Invariants
//!
//! 1. Each helper is visited at most once per walk.
//! 2. A root function with the helper's name is never replaced.
//! 3. Builtins are never rehomed.
//!
//! # Failure Modes
//!
//! - A helper without source, whose source no longer compiles, or that
//!   cannot be installed is skipped with a [`PortabilityWarning`]. The walk
//!   still descends into its calls.

use std::collections::{BTreeSet, VecDeque};

use bindery_core::{NodeId, Value};
use bindery_script::{CallTarget, FnDef, FnPath, Program, ROOT, ScriptError};
use serde::{Deserialize, Serialize};

use super::adapt::ReturnWrap;
use super::error::{PortabilityWarning, RehomeFailure};

/// A bound function and everything it needs to run in a fresh process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortableBody {
    /// The bound function, with its origin moved to the root namespace.
    pub entry: FnDef,
    /// Root functions reachable from `entry`.
    pub helpers: Vec<FnDef>,
    pub wrap: ReturnWrap,
    pub target: NodeId,
}

impl PortableBody {
    /// A program holding exactly the captured helpers in its root namespace.
    pub fn program(&self, max_depth: usize) -> Result<Program, ScriptError> {
        Ok(Program::from_root_functions(self.helpers.iter().cloned())?.with_max_depth(max_depth))
    }

    /// Run the entry function with already-prepared arguments.
    pub fn invoke(&self, args: Vec<Value>, max_depth: usize) -> Result<Value, ScriptError> {
        self.program(max_depth)?.invoke(&self.entry, args)
    }
}

/// Rehome every non-root helper reachable from `entry` into the root
/// namespace of `program`.
pub fn rehome(program: &mut Program, entry: &FnDef) -> Vec<PortabilityWarning> {
    let mut warnings = Vec::new();
    let mut visited: BTreeSet<FnPath> = BTreeSet::new();
    let mut frontier: VecDeque<(String, String)> = entry
        .calls
        .iter()
        .map(|name| (entry.module.clone(), name.clone()))
        .collect();

    while let Some((module, name)) = frontier.pop_front() {
        let path = match program.resolve_call(&module, &name) {
            CallTarget::Builtin(_) => continue,
            CallTarget::Unknown => {
                let function = FnPath::new(module, name);
                if visited.insert(function.clone()) {
                    tracing::warn!(%function, "called name does not resolve");
                    warnings.push(PortabilityWarning {
                        function,
                        reason: RehomeFailure::Unresolved,
                    });
                }
                continue;
            }
            CallTarget::Root(name) => FnPath::root(name),
            CallTarget::Module(path) => path,
        };
        if !visited.insert(path.clone()) {
            continue;
        }
        let Some(helper) = program.lookup(&path).cloned() else {
            continue;
        };
        frontier.extend(
            helper
                .calls
                .iter()
                .map(|called| (path.module.clone(), called.clone())),
        );
        if path.is_root() {
            continue;
        }
        if program.root().contains(&path.name) {
            tracing::debug!(helper = %path, "root already defines this name");
            continue;
        }
        let rehomed = if path == entry.path() {
            // Recursion back into the bound function: it ships as-is.
            let mut def = helper;
            def.module = ROOT.to_string();
            Ok(def)
        } else {
            recompile(&helper)
        };
        match rehomed.and_then(|def| {
            program
                .root_mut()
                .install(def)
                .map_err(RehomeFailure::Install)
        }) {
            Ok(()) => tracing::debug!(helper = %path, "helper rehomed"),
            Err(reason) => {
                tracing::warn!(helper = %path, %reason, "helper not rehomed");
                warnings.push(PortabilityWarning {
                    function: path,
                    reason,
                });
            }
        }
    }
    warnings
}

fn recompile(helper: &FnDef) -> Result<FnDef, RehomeFailure> {
    let source = helper
        .source
        .as_deref()
        .ok_or(RehomeFailure::SourceUnavailable)?;
    let def = FnDef::compile(source, ROOT).map_err(|e| match e {
        ScriptError::Install(_) => RehomeFailure::Install(e),
        other => RehomeFailure::Compile(other),
    })?;
    if def.name != helper.name {
        return Err(RehomeFailure::Install(ScriptError::Install(format!(
            "source defines '{}', expected '{}'",
            def.name, helper.name
        ))));
    }
    Ok(def)
}

/// Collect `entry` and the root functions it reaches.
#[must_use]
pub fn capture(program: &Program, entry: &FnDef, wrap: ReturnWrap, target: NodeId) -> PortableBody {
    let mut entry = entry.clone();
    entry.module = ROOT.to_string();

    let mut seen: BTreeSet<String> = BTreeSet::new();
    let mut helpers = Vec::new();
    let mut frontier: VecDeque<String> = entry.calls.iter().cloned().collect();
    while let Some(name) = frontier.pop_front() {
        let CallTarget::Root(name) = program.resolve_call(ROOT, &name) else {
            continue;
        };
        if !seen.insert(name.clone()) {
            continue;
        }
        if let Some(def) = program.root().function(&name) {
            frontier.extend(def.calls.iter().cloned());
            helpers.push(def.clone());
        }
    }
    PortableBody {
        entry,
        helpers,
        wrap,
        target,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNITS: &str = "\
fn to_c(f: float) -> float = (f - 32.0) * scale()
fn scale() -> float = 5.0 / 9.0
";

    fn program() -> Program {
        let mut p = Program::new();
        p.load_module("units", UNITS).unwrap();
        p.load_module(
            "fmt",
            "use units::to_c;\nfn label(f: float) -> str = str(round(to_c(f)))",
        )
        .unwrap();
        p
    }

    fn label(p: &Program) -> FnDef {
        p.lookup(&FnPath::parse("fmt::label")).unwrap().clone()
    }

    #[test]
    fn transitive_helpers_land_in_root() {
        let mut p = program();
        let entry = label(&p);
        let warnings = rehome(&mut p, &entry);
        assert!(warnings.is_empty(), "{warnings:?}");
        assert!(p.root().contains("to_c"));
        assert!(p.root().contains("scale"));
        assert_eq!(p.root().function("scale").unwrap().module, ROOT);
    }

    #[test]
    fn captured_body_runs_alone() {
        let mut p = program();
        let entry = label(&p);
        rehome(&mut p, &entry);
        let body = capture(&p, &entry, ReturnWrap::Native, NodeId::new("t"));
        assert_eq!(body.entry.module, ROOT);
        let names: BTreeSet<_> = body.helpers.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, BTreeSet::from(["scale", "to_c"]));
        let out = body.invoke(vec![Value::Float(212.0)], 64).unwrap();
        assert_eq!(out, Value::from("100"));
    }

    #[test]
    fn missing_source_warns_but_continues() {
        let mut p = Program::new();
        let mut helper = FnDef::compile("fn h() -> int = deep()", "lib").unwrap();
        helper.source = None;
        p.define(helper).unwrap();
        p.load_module("lib", "fn deep() -> int = 1").unwrap();
        p.load_module("app", "use lib::h;\nfn f() -> int = h() + nope()")
            .unwrap();
        let entry = p.lookup(&FnPath::parse("app::f")).unwrap().clone();

        let warnings = rehome(&mut p, &entry);
        let reasons: Vec<_> = warnings.iter().map(|w| (w.function.to_string(), w.reason.clone())).collect();
        assert!(reasons.contains(&("lib::h".to_string(), RehomeFailure::SourceUnavailable)));
        assert!(reasons.contains(&("app::nope".to_string(), RehomeFailure::Unresolved)));
        // The walk still reached h's own callee.
        assert!(p.root().contains("deep"));
        assert!(!p.root().contains("h"));
    }

    #[test]
    fn recursive_entry_reaches_root() {
        let mut p = Program::new();
        p.load_module(
            "m",
            "fn fact(n: int) -> int = if n <= 1 { 1 } else { n * fact(n - 1) }",
        )
        .unwrap();
        let entry = p.lookup(&FnPath::parse("m::fact")).unwrap().clone();

        let warnings = rehome(&mut p, &entry);
        assert!(warnings.is_empty(), "{warnings:?}");
        assert_eq!(p.root().function("fact").unwrap().module, ROOT);

        let body = capture(&p, &entry, ReturnWrap::Native, NodeId::new("t"));
        assert_eq!(body.helpers.len(), 1);
        assert_eq!(body.invoke(vec![Value::Int(5)], 64).unwrap(), Value::Int(120));
    }

    #[test]
    fn non_recursive_entry_stays_out_of_root() {
        let mut p = program();
        let entry = label(&p);
        rehome(&mut p, &entry);
        assert!(!p.root().contains("label"));
    }

    #[test]
    fn root_names_are_not_replaced() {
        let mut p = program();
        p.load_root("fn scale() -> float = 1.0").unwrap();
        let entry = label(&p);
        let warnings = rehome(&mut p, &entry);
        assert!(warnings.is_empty());
        assert!(matches!(
            p.root().function("scale").unwrap().body,
            bindery_script::Expr::Lit(Value::Float(f)) if f == 1.0
        ));
    }
}
