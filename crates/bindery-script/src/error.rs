//! Script errors.

use std::fmt;

use crate::ast::Span;

/// Errors from lexing, parsing, installing or running script code.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptError {
    /// Unrecognised input.
    Lex { span: Span },
    /// Malformed source.
    Parse { message: String, span: Span },
    /// A call named no local, imported, root or builtin function.
    UnknownFunction(String),
    /// A name that is not a parameter or `let` binding in scope.
    UnknownVariable(String),
    /// Wrong number of arguments.
    Arity {
        function: String,
        expected: usize,
        received: usize,
    },
    /// An operation got operands of the wrong type.
    Type(String),
    DivisionByZero,
    /// Index out of range or missing key.
    Index(String),
    /// Call depth exceeded.
    Depth(usize),
    /// A definition could not be added to a namespace.
    Install(String),
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lex { span } => write!(f, "unexpected input at {}..{}", span.start, span.end),
            Self::Parse { message, span } => {
                write!(f, "parse error at {}..{}: {message}", span.start, span.end)
            }
            Self::UnknownFunction(name) => write!(f, "unknown function '{name}'"),
            Self::UnknownVariable(name) => write!(f, "unknown variable '{name}'"),
            Self::Arity {
                function,
                expected,
                received,
            } => write!(
                f,
                "function '{function}' expects {expected} arguments, received {received}"
            ),
            Self::Type(msg) => write!(f, "type error: {msg}"),
            Self::DivisionByZero => write!(f, "division by zero"),
            Self::Index(msg) => write!(f, "index error: {msg}"),
            Self::Depth(limit) => write!(f, "call depth limit {limit} exceeded"),
            Self::Install(msg) => write!(f, "cannot install function: {msg}"),
        }
    }
}

impl std::error::Error for ScriptError {}
