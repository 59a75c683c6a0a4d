#![forbid(unsafe_code)]

//! Portable function language for Bindery bindings.
//!
//! Bound functions have to run in a different process from the one that
//! authored them, so they are written in a small expression language rather
//! than as native closures:
//!
//! ```text
//! use units::to_celsius;
//!
//! fn label(temp: float, unit: str = "C") -> str {
//!     let value = if unit == "C" { to_celsius(temp) } else { temp };
//!     str(round(value)) + " " + unit
//! }
//! ```
//!
//! Source is grouped into modules. A [`Program`] holds the shared root
//! namespace plus named modules; every [`FnDef`] keeps its original source
//! and a static table of the names it calls, which is what the binding
//! engine walks to make a function self-contained.

pub mod ast;
pub mod builtins;
pub mod error;
mod interp;
pub mod lexer;
pub mod module;
pub mod parser;

pub use ast::{BinaryOp, Expr, Param, Span, UnaryOp};
pub use error::ScriptError;
pub use module::{CallTarget, DEFAULT_MAX_DEPTH, FnDef, FnPath, Module, Program, ROOT};
pub use parser::{parse_module, ModuleAst};
