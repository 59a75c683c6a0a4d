#![forbid(unsafe_code)]

//! Error taxonomy for binding (authoring time) and execution (remote time).

use std::fmt;

use bindery_core::{AdapterError, Adapter, ArtifactId, CoercionError, NodeId, NodeKind, TypeName};
use bindery_script::{FnPath, ScriptError};

use super::codec::CodecError;
use super::record::BodyId;

/// Errors that abort a `bind` call. The target node is left unchanged.
#[derive(Debug)]
pub enum BindError {
    /// More positional arguments than declared parameters.
    Arity {
        function: String,
        expected: usize,
        received: usize,
    },
    UnknownFunction(String),
    UnknownNode(NodeId),
    /// The declared result type is neither native nor in the node's
    /// compatibility set.
    IncompatibleReturnType { result: TypeName, kind: NodeKind },
    /// The result type needs an adapter the node kind does not implement.
    UnsupportedAdapter {
        result: TypeName,
        kind: NodeKind,
        adapter: Option<Adapter>,
    },
    /// `via` already has a binding triggered by `target`.
    TriggerCycle { target: NodeId, via: NodeId },
    /// `target` already owns a binding triggered by `trigger`.
    TriggerOverlap { target: NodeId, trigger: NodeId },
    /// The portable body or a literal argument could not be encoded.
    Serialize(CodecError),
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Arity {
                function,
                expected,
                received,
            } => write!(
                f,
                "'{function}' takes {expected} arguments but {received} were supplied"
            ),
            Self::UnknownFunction(name) => write!(f, "unknown function '{name}'"),
            Self::UnknownNode(id) => write!(f, "unknown node '{id}'"),
            Self::IncompatibleReturnType { result, kind } => {
                write!(f, "result type {result} is not compatible with {kind}")
            }
            Self::UnsupportedAdapter {
                result,
                kind,
                adapter,
            } => match adapter {
                Some(adapter) => write!(f, "{kind} has no {adapter} adapter for result type {result}"),
                None => write!(f, "result type {result} has no adapter for {kind}"),
            },
            Self::TriggerCycle { target, via } => write!(
                f,
                "trigger loop: '{via}' already reacts to '{target}'"
            ),
            Self::TriggerOverlap { target, trigger } => write!(
                f,
                "trigger loop: '{target}' already has a binding triggered by '{trigger}'"
            ),
            Self::Serialize(e) => write!(f, "cannot encode binding: {e}"),
        }
    }
}

impl std::error::Error for BindError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Serialize(e) => Some(e),
            _ => None,
        }
    }
}

impl From<CodecError> for BindError {
    fn from(e: CodecError) -> Self {
        Self::Serialize(e)
    }
}

/// Errors executing a binding. Reported to the caller of the executor,
/// never raised into authoring code.
#[derive(Debug)]
pub enum ExecError {
    /// A referenced node has no current value and the parameter has no
    /// default.
    MissingDependencyValue { parameter: String, node: NodeId },
    /// Neither an argument nor a default for a parameter.
    MissingArgument(String),
    Coercion {
        parameter: String,
        source: CoercionError,
    },
    Script(ScriptError),
    UnknownBody(BodyId),
    UnknownNode(NodeId),
    UnknownArtifact(ArtifactId),
    Adapter(AdapterError),
    Decode(CodecError),
}

impl fmt::Display for ExecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingDependencyValue { parameter, node } => write!(
                f,
                "parameter '{parameter}' depends on node '{node}', which has no value"
            ),
            Self::MissingArgument(parameter) => {
                write!(f, "no value for parameter '{parameter}'")
            }
            Self::Coercion { parameter, source } => {
                write!(f, "parameter '{parameter}': {source}")
            }
            Self::Script(e) => write!(f, "{e}"),
            Self::UnknownBody(id) => write!(f, "no function registered under '{id}'"),
            Self::UnknownNode(id) => write!(f, "unknown node '{id}'"),
            Self::UnknownArtifact(id) => write!(f, "unknown artifact '{id}'"),
            Self::Adapter(e) => write!(f, "{e}"),
            Self::Decode(e) => write!(f, "cannot decode: {e}"),
        }
    }
}

impl std::error::Error for ExecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Coercion { source, .. } => Some(source),
            Self::Script(e) => Some(e),
            Self::Adapter(e) => Some(e),
            Self::Decode(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ScriptError> for ExecError {
    fn from(e: ScriptError) -> Self {
        Self::Script(e)
    }
}

impl From<AdapterError> for ExecError {
    fn from(e: AdapterError) -> Self {
        Self::Adapter(e)
    }
}

impl From<CodecError> for ExecError {
    fn from(e: CodecError) -> Self {
        Self::Decode(e)
    }
}

/// Why a helper could not be moved into the root namespace.
#[derive(Debug, Clone, PartialEq)]
pub enum RehomeFailure {
    /// The helper has no source text to recompile.
    SourceUnavailable,
    /// The source no longer compiles on its own.
    Compile(ScriptError),
    /// The compiled helper could not be added to the root namespace.
    Install(ScriptError),
    /// A called name resolves to nothing.
    Unresolved,
}

impl fmt::Display for RehomeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SourceUnavailable => f.write_str("source unavailable"),
            Self::Compile(e) => write!(f, "compile failed: {e}"),
            Self::Install(e) => write!(f, "install failed: {e}"),
            Self::Unresolved => f.write_str("name does not resolve"),
        }
    }
}

/// Non-fatal diagnostic: the binding was created but its portable body may
/// fail remotely if `function` is actually called.
#[derive(Debug, Clone, PartialEq)]
pub struct PortabilityWarning {
    pub function: FnPath,
    pub reason: RehomeFailure,
}

impl fmt::Display for PortabilityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "helper '{}' not made portable: {}", self.function, self.reason)
    }
}
