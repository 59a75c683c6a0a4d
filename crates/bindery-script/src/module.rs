//! Namespaces: modules, the shared root namespace, and call resolution.
//!
//! # Invariants
//!
//! 1. A function name is unique within a module.
//! 2. Calls resolve in a fixed order: the caller's module, its imports, the
//!    root namespace, builtins.
//! 3. `FnDef::calls` is computed once from the body and never edited.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use bindery_core::{TypeName, Value};
use serde::{Deserialize, Serialize};

use crate::ast::{Expr, FnDecl, Param};
use crate::builtins;
use crate::error::ScriptError;
use crate::interp::Interpreter;
use crate::parser::parse_module;

/// Name of the shared root namespace.
pub const ROOT: &str = "root";

/// Default interpreter call-depth limit.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// A function definition placed in a module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FnDef {
    pub name: String,
    /// Origin marker: the module this definition lives in.
    pub module: String,
    pub params: Vec<Param>,
    pub result: TypeName,
    pub body: Expr,
    /// Original source text of the item, when known.
    pub source: Option<String>,
    /// Names this function calls (static call-reference table).
    pub calls: BTreeSet<String>,
}

impl FnDef {
    /// Build a definition from a parsed item.
    #[must_use]
    pub fn from_decl(decl: FnDecl, module: impl Into<String>, source: Option<String>) -> Self {
        let mut calls = BTreeSet::new();
        decl.body.collect_calls(&mut calls);
        Self {
            name: decl.name,
            module: module.into(),
            params: decl.params,
            result: decl.result,
            body: decl.body,
            source,
            calls,
        }
    }

    /// Build a definition without source text (for generated code).
    #[must_use]
    pub fn synthetic(
        name: impl Into<String>,
        module: impl Into<String>,
        params: Vec<Param>,
        result: TypeName,
        body: Expr,
    ) -> Self {
        let mut calls = BTreeSet::new();
        body.collect_calls(&mut calls);
        Self {
            name: name.into(),
            module: module.into(),
            params,
            result,
            body,
            source: None,
            calls,
        }
    }

    /// Compile a single-function source into a definition in `module`.
    ///
    /// The source must contain exactly one `fn` item and no imports.
    pub fn compile(source: &str, module: impl Into<String>) -> Result<Self, ScriptError> {
        let parsed = parse_module(source)?;
        if !parsed.imports.is_empty() {
            return Err(ScriptError::Install(
                "function source must not contain imports".into(),
            ));
        }
        let mut functions = parsed.functions;
        if functions.len() != 1 {
            return Err(ScriptError::Install(format!(
                "expected exactly one function, found {}",
                functions.len()
            )));
        }
        let decl = functions.remove(0);
        let text = source[decl.span.clone()].to_string();
        Ok(Self::from_decl(decl, module, Some(text)))
    }

    #[must_use]
    pub fn path(&self) -> FnPath {
        FnPath::new(self.module.clone(), self.name.clone())
    }
}

/// Qualified function name: `name` (root) or `module::name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FnPath {
    pub module: String,
    pub name: String,
}

impl FnPath {
    #[must_use]
    pub fn new(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            name: name.into(),
        }
    }

    #[must_use]
    pub fn root(name: impl Into<String>) -> Self {
        Self::new(ROOT, name)
    }

    /// Parse `"name"` or `"module::name"`.
    #[must_use]
    pub fn parse(path: &str) -> Self {
        match path.split_once("::") {
            Some((module, name)) => Self::new(module, name),
            None => Self::root(path),
        }
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.module == ROOT
    }
}

impl fmt::Display for FnPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}::{}", self.module, self.name)
        }
    }
}

/// A named namespace of functions and imports.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Module {
    name: String,
    functions: BTreeMap<String, FnDef>,
    imports: BTreeMap<String, FnPath>,
}

impl Module {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn function(&self, name: &str) -> Option<&FnDef> {
        self.functions.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    #[must_use]
    pub fn import(&self, name: &str) -> Option<&FnPath> {
        self.imports.get(name)
    }

    pub fn functions(&self) -> impl Iterator<Item = &FnDef> {
        self.functions.values()
    }

    /// Add a definition; fails if the name is already taken.
    pub fn install(&mut self, def: FnDef) -> Result<(), ScriptError> {
        if self.functions.contains_key(&def.name) {
            return Err(ScriptError::Install(format!(
                "'{}' is already defined in module '{}'",
                def.name, self.name
            )));
        }
        self.functions.insert(def.name.clone(), def);
        Ok(())
    }

    fn load(&mut self, source: &str) -> Result<Vec<String>, ScriptError> {
        let parsed = parse_module(source)?;
        let mut staged = self.clone();
        let mut names = Vec::with_capacity(parsed.functions.len());
        for import in parsed.imports {
            staged
                .imports
                .insert(import.name.clone(), FnPath::new(import.module, import.name));
        }
        for decl in parsed.functions {
            let text = source[decl.span.clone()].to_string();
            names.push(decl.name.clone());
            staged.install(FnDef::from_decl(decl, self.name.clone(), Some(text)))?;
        }
        *self = staged;
        tracing::debug!(module = %self.name, functions = names.len(), "module loaded");
        Ok(names)
    }
}

/// Where a call from some module lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallTarget {
    /// A user function outside the root namespace.
    Module(FnPath),
    /// A function defined in the root namespace.
    Root(String),
    Builtin(String),
    Unknown,
}

/// The root namespace plus named modules.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    root: Module,
    modules: BTreeMap<String, Module>,
    max_depth: usize,
}

impl Default for Program {
    fn default() -> Self {
        Self::new()
    }
}

impl Program {
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Module::new(ROOT),
            modules: BTreeMap::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// A program whose root namespace holds exactly `defs`.
    pub fn from_root_functions(defs: impl IntoIterator<Item = FnDef>) -> Result<Self, ScriptError> {
        let mut program = Self::new();
        for mut def in defs {
            def.module = ROOT.to_string();
            program.root.install(def)?;
        }
        Ok(program)
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn set_max_depth(&mut self, max_depth: usize) {
        self.max_depth = max_depth;
    }

    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Parse `source` into the root namespace. Returns the defined names.
    ///
    /// Atomic: on error the namespace is unchanged.
    pub fn load_root(&mut self, source: &str) -> Result<Vec<String>, ScriptError> {
        self.root.load(source)
    }

    /// Parse `source` into module `name`, creating it if needed.
    pub fn load_module(&mut self, name: &str, source: &str) -> Result<Vec<String>, ScriptError> {
        if name == ROOT {
            return self.load_root(source);
        }
        self.modules
            .entry(name.to_string())
            .or_insert_with(|| Module::new(name))
            .load(source)
    }

    /// Add a definition to its origin module, creating the module if needed.
    pub fn define(&mut self, def: FnDef) -> Result<(), ScriptError> {
        if def.module == ROOT {
            return self.root.install(def);
        }
        self.modules
            .entry(def.module.clone())
            .or_insert_with(|| Module::new(def.module.clone()))
            .install(def)
    }

    #[must_use]
    pub fn root(&self) -> &Module {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Module {
        &mut self.root
    }

    #[must_use]
    pub fn module(&self, name: &str) -> Option<&Module> {
        if name == ROOT {
            Some(&self.root)
        } else {
            self.modules.get(name)
        }
    }

    #[must_use]
    pub fn lookup(&self, path: &FnPath) -> Option<&FnDef> {
        self.module(&path.module)?.function(&path.name)
    }

    /// Resolve a call to `name` made from code in `module`.
    #[must_use]
    pub fn resolve_call(&self, module: &str, name: &str) -> CallTarget {
        if let Some(m) = self.module(module) {
            if m.contains(name) {
                return if module == ROOT {
                    CallTarget::Root(name.to_string())
                } else {
                    CallTarget::Module(FnPath::new(module, name))
                };
            }
            if let Some(target) = m.import(name) {
                if self.lookup(target).is_some() {
                    return if target.is_root() {
                        CallTarget::Root(target.name.clone())
                    } else {
                        CallTarget::Module(target.clone())
                    };
                }
            }
        }
        if self.root.contains(name) {
            return CallTarget::Root(name.to_string());
        }
        if builtins::is_builtin(name) {
            return CallTarget::Builtin(name.to_string());
        }
        CallTarget::Unknown
    }

    /// Call the function at `path` with positional arguments.
    pub fn call(&self, path: &FnPath, args: Vec<Value>) -> Result<Value, ScriptError> {
        let def = self
            .lookup(path)
            .ok_or_else(|| ScriptError::UnknownFunction(path.to_string()))?;
        self.invoke(def, args)
    }

    /// Run `def` against this program's namespaces. `def` need not be
    /// installed; its calls resolve from its origin module.
    pub fn invoke(&self, def: &FnDef, args: Vec<Value>) -> Result<Value, ScriptError> {
        Interpreter::new(self).call_def(def, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn program() -> Program {
        let mut p = Program::new();
        p.load_module("units", "fn to_c(f: float) -> float = (f - 32.0) * 5.0 / 9.0")
            .unwrap();
        p.load_module(
            "fmt",
            "use units::to_c;\nfn label(f: float) -> str = str(round(to_c(f))) + \" C\"",
        )
        .unwrap();
        p.load_root("fn twice(n: int) -> int = n * 2").unwrap();
        p
    }

    #[test]
    fn resolution_order() {
        let p = program();
        assert_eq!(
            p.resolve_call("fmt", "to_c"),
            CallTarget::Module(FnPath::new("units", "to_c"))
        );
        assert_eq!(p.resolve_call("fmt", "twice"), CallTarget::Root("twice".into()));
        assert_eq!(p.resolve_call("fmt", "round"), CallTarget::Builtin("round".into()));
        assert_eq!(p.resolve_call("fmt", "nope"), CallTarget::Unknown);
        assert_eq!(p.resolve_call(ROOT, "twice"), CallTarget::Root("twice".into()));
    }

    #[test]
    fn call_table_is_static() {
        let p = program();
        let label = p.lookup(&FnPath::parse("fmt::label")).unwrap();
        let calls: Vec<_> = label.calls.iter().cloned().collect();
        assert_eq!(calls, vec!["round", "str", "to_c"]);
        assert!(label.source.as_deref().unwrap().starts_with("fn label"));
    }

    #[test]
    fn calls_across_modules() {
        let p = program();
        let out = p
            .call(&FnPath::parse("fmt::label"), vec![Value::Float(212.0)])
            .unwrap();
        assert_eq!(out, Value::from("100 C"));
    }

    #[test]
    fn load_is_atomic() {
        let mut p = program();
        let err = p
            .load_root("fn fresh() -> int = 1\nfn twice(n: int) -> int = n")
            .unwrap_err();
        assert!(matches!(err, ScriptError::Install(_)));
        assert!(!p.root().contains("fresh"));
    }

    #[test]
    fn compile_requires_single_function() {
        assert!(FnDef::compile("fn a() -> int = 1", ROOT).is_ok());
        assert!(FnDef::compile("fn a() -> int = 1 fn b() -> int = 2", ROOT).is_err());
        assert!(FnDef::compile("use m::a;", ROOT).is_err());
    }

    #[test]
    fn path_parse_and_display() {
        assert_eq!(FnPath::parse("twice"), FnPath::root("twice"));
        assert_eq!(FnPath::parse("m::f").to_string(), "m::f");
        assert_eq!(FnPath::root("f").to_string(), "f");
    }
}
