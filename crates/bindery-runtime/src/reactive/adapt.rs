#![forbid(unsafe_code)]

//! Return wrapping: how a raw result reaches the target node.
//!
//! # Invariants
//!
//! 1. `Native` is chosen only when the declared result type is the node's
//!    own kind.
//! 2. `Adapted` always names an adapter present in the node's adapter set at
//!    bind time.

use bindery_core::{Adapter, AdapterError, Node, NodeState, TypeName, Value, adapt_with};
use serde::{Deserialize, Serialize};

use super::error::BindError;

/// Decided once at bind time and shipped with the portable body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ReturnWrap {
    /// The function produces the node's native state.
    Native,
    /// The raw value goes through the node's adapter.
    Adapted { adapter: Adapter },
}

impl ReturnWrap {
    /// Choose the wrap for a function returning `result` into `node`.
    pub fn plan(result: &TypeName, node: &dyn Node) -> Result<Self, BindError> {
        let kind = node.kind();
        if result.is_native_for(&kind) {
            return Ok(Self::Native);
        }
        if !node.compatibility().contains(result) {
            return Err(BindError::IncompatibleReturnType {
                result: result.clone(),
                kind,
            });
        }
        match result.adapter() {
            Some(adapter) if node.adapters().contains(&adapter) => Ok(Self::Adapted { adapter }),
            adapter => Err(BindError::UnsupportedAdapter {
                result: result.clone(),
                kind,
                adapter,
            }),
        }
    }

    /// Turn a raw result into a state patch for `node`.
    pub fn apply(self, node: &dyn Node, raw: Value) -> Result<NodeState, AdapterError> {
        match self {
            Self::Native => Ok(NodeState::from_native(raw)),
            Self::Adapted { adapter } => adapt_with(node, adapter, raw),
        }
    }
}
