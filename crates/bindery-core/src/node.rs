//! The node capability contract.
//!
//! A node is an addressable value holder in an application graph (a slider,
//! a text label, a table view). The binding engine never knows concrete node
//! kinds; it talks to them only through [`Node`].
//!
//! # Invariants
//!
//! 1. `adapters()` is fixed per node kind and never changes at runtime.
//! 2. `apply_adapter` is a pure conversion; state only changes through
//!    `replace_widget`.
//! 3. `replace_widget` merges: keys absent from the patch keep their value.

use std::borrow::Cow;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{Adapter, TypeName};
use crate::value::Value;

/// Conventional state key holding a node's primary value.
pub const VALUE_KEY: &str = "value";

/// Unique node identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh random (v4) id.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind tag of a node (`"Slider"`, `"Text"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeKind(Cow<'static, str>);

impl NodeKind {
    #[must_use]
    pub fn new(kind: impl Into<String>) -> Self {
        Self(Cow::Owned(kind.into()))
    }

    /// Kind from a static name, usable in constants.
    #[must_use]
    pub const fn from_static(kind: &'static str) -> Self {
        Self(Cow::Borrowed(kind))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An ordered set of node properties, used both as full state and as a
/// patch to merge into a node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeState {
    props: IndexMap<String, Value>,
}

impl NodeState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A patch that only sets the primary value.
    #[must_use]
    pub fn with_value(value: Value) -> Self {
        Self::new().with(VALUE_KEY, value)
    }

    /// Interpret a raw function result as native state: maps become
    /// property patches, anything else becomes the primary value.
    #[must_use]
    pub fn from_native(raw: Value) -> Self {
        match raw {
            Value::Map(props) => Self { props },
            other => Self::with_value(other),
        }
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.props.insert(key.into(), value);
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.props.get(key)
    }

    /// The primary value, if set.
    #[must_use]
    pub fn value(&self) -> Option<&Value> {
        self.get(VALUE_KEY)
    }

    /// Overwrite keys present in `patch`, keep the rest.
    pub fn merge(&mut self, patch: NodeState) {
        for (k, v) in patch.props {
            self.props.insert(k, v);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.props.iter()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }

    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.props
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }
}

/// Failures converting a value through a node's adapter.
#[derive(Debug, Clone, PartialEq)]
pub enum AdapterError {
    /// The node kind does not implement the adapter.
    Unsupported { kind: NodeKind, adapter: Adapter },
    /// The adapter exists but rejected the value.
    Rejected { adapter: Adapter, reason: String },
}

impl fmt::Display for AdapterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported { kind, adapter } => {
                write!(f, "node kind {kind} does not implement {adapter}")
            }
            Self::Rejected { adapter, reason } => write!(f, "{adapter} rejected value: {reason}"),
        }
    }
}

impl std::error::Error for AdapterError {}

/// Capabilities every node kind provides to the binding engine.
pub trait Node: fmt::Debug {
    fn id(&self) -> &NodeId;

    fn kind(&self) -> NodeKind;

    /// Types this node can consume as a bound result.
    fn compatibility(&self) -> &[TypeName];

    /// The closed adapter set of this node kind.
    fn adapters(&self) -> &[Adapter];

    /// Current value, or `None` if the node has none yet.
    fn current_value(&self) -> Option<Value>;

    /// Convert a typed value into a state patch for this node.
    ///
    /// Callers go through [`adapt_with`], which checks [`Node::adapters`]
    /// first; implementations may assume `adapter` is one of theirs.
    fn apply_adapter(&self, adapter: Adapter, value: Value) -> Result<NodeState, AdapterError>;

    /// Merge `state` into this node in place.
    fn replace_widget(&mut self, state: NodeState);

    /// JSON description of the node for the front end.
    fn to_dict_widget(&self) -> serde_json::Value;

    /// User-interaction path: set the primary value directly.
    fn set_value(&mut self, value: Value) {
        self.replace_widget(NodeState::with_value(value));
    }
}

/// Run `adapter` on `node`, failing if the node kind does not implement it.
pub fn adapt_with(node: &dyn Node, adapter: Adapter, value: Value) -> Result<NodeState, AdapterError> {
    if !node.adapters().contains(&adapter) {
        return Err(AdapterError::Unsupported {
            kind: node.kind(),
            adapter,
        });
    }
    node.apply_adapter(adapter, value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Gauge {
        id: NodeId,
        state: NodeState,
    }

    const GAUGE_COMPAT: &[TypeName] = &[TypeName::Int];

    impl Node for Gauge {
        fn id(&self) -> &NodeId {
            &self.id
        }
        fn kind(&self) -> NodeKind {
            NodeKind::new("Gauge")
        }
        fn compatibility(&self) -> &[TypeName] {
            GAUGE_COMPAT
        }
        fn adapters(&self) -> &[Adapter] {
            &[Adapter::FromInt]
        }
        fn current_value(&self) -> Option<Value> {
            self.state.value().cloned()
        }
        fn apply_adapter(&self, _: Adapter, value: Value) -> Result<NodeState, AdapterError> {
            Ok(NodeState::with_value(value))
        }
        fn replace_widget(&mut self, state: NodeState) {
            self.state.merge(state);
        }
        fn to_dict_widget(&self) -> serde_json::Value {
            serde_json::json!({ "id": self.id.as_str(), "type": "Gauge" })
        }
    }

    fn gauge() -> Gauge {
        Gauge {
            id: NodeId::new("g1"),
            state: NodeState::new().with("title", Value::from("Load")),
        }
    }

    #[test]
    fn adapt_with_checks_adapter_set() {
        let g = gauge();
        let err = adapt_with(&g, Adapter::FromString, Value::from("x")).unwrap_err();
        assert_eq!(
            err,
            AdapterError::Unsupported {
                kind: NodeKind::new("Gauge"),
                adapter: Adapter::FromString
            }
        );
        assert!(adapt_with(&g, Adapter::FromInt, Value::Int(3)).is_ok());
    }

    #[test]
    fn replace_widget_merges() {
        let mut g = gauge();
        g.set_value(Value::Int(9));
        assert_eq!(g.current_value(), Some(Value::Int(9)));
        assert_eq!(g.state.get("title"), Some(&Value::from("Load")));
    }

    #[test]
    fn native_maps_become_patches() {
        let mut props = IndexMap::new();
        props.insert("title".to_string(), Value::from("Hot"));
        let state = NodeState::from_native(Value::Map(props));
        assert_eq!(state.get("title"), Some(&Value::from("Hot")));
        assert_eq!(state.value(), None);

        let state = NodeState::from_native(Value::Int(1));
        assert_eq!(state.value(), Some(&Value::Int(1)));
    }

    #[test]
    fn generated_ids_are_distinct() {
        assert_ne!(NodeId::generate(), NodeId::generate());
    }
}
