#![forbid(unsafe_code)]

//! State and JSON layout shared by every widget kind.
//!
//! # Invariants
//!
//! 1. The `properties` object of [`WidgetBase::to_dict`] mirrors the node
//!    state exactly, in insertion order.
//! 2. Layout flags (`draggable`, `resizable`, `filterable`, `disabled`) are
//!    authoring-time settings and never touched by bindings.

use bindery_core::{NodeId, NodeKind, NodeState, Value};

/// Fields common to all widget kinds.
#[derive(Debug, Clone)]
pub struct WidgetBase {
    id: NodeId,
    kind: NodeKind,
    state: NodeState,
    pub draggable: bool,
    pub resizable: bool,
    pub filterable: bool,
    pub disabled: bool,
}

impl WidgetBase {
    #[must_use]
    pub fn new(kind: NodeKind) -> Self {
        Self {
            id: NodeId::generate(),
            kind,
            state: NodeState::new(),
            draggable: false,
            resizable: false,
            filterable: false,
            disabled: false,
        }
    }

    #[must_use]
    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn set_id(&mut self, id: NodeId) {
        self.id = id;
    }

    #[must_use]
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    #[must_use]
    pub fn state(&self) -> &NodeState {
        &self.state
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.state.set(key, value.into());
    }

    pub fn merge(&mut self, patch: NodeState) {
        self.state.merge(patch);
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.state.get(key)
    }

    #[must_use]
    pub fn value(&self) -> Option<Value> {
        self.state.value().filter(|v| !v.is_null()).cloned()
    }

    #[must_use]
    pub fn to_dict(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id.as_str(),
            "type": self.kind.as_str(),
            "draggable": self.draggable,
            "resizable": self.resizable,
            "filterable": self.filterable,
            "disabled": self.disabled,
            "properties": self.state.to_json(),
        })
    }
}

/// Implement [`bindery_core::Node`] for a widget struct holding a `base:
/// WidgetBase` field and an inherent `adapt(&self, Adapter, Value)` method.
macro_rules! widget_node {
    ($ty:ty, $compat:expr, $adapters:expr) => {
        impl bindery_core::Node for $ty {
            fn id(&self) -> &bindery_core::NodeId {
                self.base.id()
            }

            fn kind(&self) -> bindery_core::NodeKind {
                self.base.kind().clone()
            }

            fn compatibility(&self) -> &[bindery_core::TypeName] {
                $compat
            }

            fn adapters(&self) -> &[bindery_core::Adapter] {
                $adapters
            }

            fn current_value(&self) -> Option<bindery_core::Value> {
                self.base.value()
            }

            fn apply_adapter(
                &self,
                adapter: bindery_core::Adapter,
                value: bindery_core::Value,
            ) -> Result<bindery_core::NodeState, bindery_core::AdapterError> {
                self.adapt(adapter, value)
            }

            fn replace_widget(&mut self, state: bindery_core::NodeState) {
                self.base.merge(state);
            }

            fn to_dict_widget(&self) -> serde_json::Value {
                self.base.to_dict()
            }
        }
    };
}

pub(crate) use widget_node;

/// Common builder methods.
macro_rules! widget_builders {
    ($ty:ty) => {
        impl $ty {
            /// Use a caller-chosen id instead of a generated one.
            #[must_use]
            pub fn with_id(mut self, id: impl Into<String>) -> Self {
                self.base.set_id(bindery_core::NodeId::new(id));
                self
            }

            #[must_use]
            pub fn title(mut self, title: impl Into<String>) -> Self {
                self.base.set("title", bindery_core::Value::Str(title.into()));
                self
            }

            #[must_use]
            pub fn disabled(mut self, disabled: bool) -> Self {
                self.base.disabled = disabled;
                self
            }

            #[must_use]
            pub fn base(&self) -> &$crate::base::WidgetBase {
                &self.base
            }
        }
    };
}

pub(crate) use widget_builders;

pub(crate) fn rejected(adapter: bindery_core::Adapter, reason: impl Into<String>) -> bindery_core::AdapterError {
    bindery_core::AdapterError::Rejected {
        adapter,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dict_mirrors_state() {
        let mut base = WidgetBase::new(NodeKind::from_static("Probe"));
        base.set_id(NodeId::new("p1"));
        base.set("title", "Load");
        base.set("value", 3);
        let dict = base.to_dict();
        assert_eq!(dict["id"], "p1");
        assert_eq!(dict["type"], "Probe");
        assert_eq!(dict["disabled"], false);
        assert_eq!(dict["properties"]["title"], "Load");
        assert_eq!(dict["properties"]["value"], 3);
    }

    #[test]
    fn null_value_reads_as_absent() {
        let mut base = WidgetBase::new(NodeKind::from_static("Probe"));
        assert_eq!(base.value(), None);
        base.set("value", Value::Null);
        assert_eq!(base.value(), None);
        base.set("value", 1);
        assert_eq!(base.value(), Some(Value::Int(1)));
    }
}
