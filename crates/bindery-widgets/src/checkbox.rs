//! Boolean checkbox.

use bindery_core::{Adapter, AdapterError, NodeKind, NodeState, TypeName, Value};

use crate::base::{WidgetBase, rejected, widget_builders, widget_node};

pub const CHECKBOX: NodeKind = NodeKind::from_static("Checkbox");

const COMPAT: &[TypeName] = &[
    TypeName::Bool,
    TypeName::Int,
    TypeName::Str,
    TypeName::Node(CHECKBOX),
];

const ADAPTERS: &[Adapter] = &[Adapter::FromBool, Adapter::FromInt, Adapter::FromString];

#[derive(Debug, Clone)]
pub struct Checkbox {
    base: WidgetBase,
}

impl Checkbox {
    #[must_use]
    pub fn new(checked: bool) -> Self {
        let mut base = WidgetBase::new(CHECKBOX);
        base.set("value", checked);
        Self { base }
    }

    fn adapt(&self, adapter: Adapter, value: Value) -> Result<NodeState, AdapterError> {
        match (adapter, &value) {
            (Adapter::FromBool, Value::Bool(_))
            | (Adapter::FromInt, Value::Int(_))
            | (Adapter::FromString, Value::Str(_)) => TypeName::Bool
                .coerce(value)
                .map(NodeState::with_value)
                .map_err(|e| rejected(adapter, e.to_string())),
            _ => Err(rejected(
                adapter,
                format!("unexpected {}", value.type_label()),
            )),
        }
    }
}

widget_builders!(Checkbox);
widget_node!(Checkbox, COMPAT, ADAPTERS);

#[cfg(test)]
mod tests {
    use super::*;
    use bindery_core::{Node, adapt_with};

    #[test]
    fn truthy_inputs() {
        let mut c = Checkbox::new(false);
        let patch = adapt_with(&c, Adapter::FromString, Value::from("yes")).unwrap();
        c.replace_widget(patch);
        assert_eq!(c.current_value(), Some(Value::Bool(true)));
        let patch = adapt_with(&c, Adapter::FromInt, Value::Int(0)).unwrap();
        assert_eq!(patch.value(), Some(&Value::Bool(false)));
        assert!(adapt_with(&c, Adapter::FromString, Value::from("maybe")).is_err());
    }
}
