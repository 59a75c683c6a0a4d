//! Numeric input box.

use bindery_core::{Adapter, AdapterError, NodeKind, NodeState, TypeName, Value};

use crate::base::{WidgetBase, rejected, widget_builders, widget_node};

pub const NUMBER_INPUT: NodeKind = NodeKind::from_static("NumberInput");

const COMPAT: &[TypeName] = &[
    TypeName::Int,
    TypeName::Float,
    TypeName::Str,
    TypeName::Node(NUMBER_INPUT),
];

const ADAPTERS: &[Adapter] = &[Adapter::FromInt, Adapter::FromFloat, Adapter::FromString];

#[derive(Debug, Clone)]
pub struct NumberInput {
    base: WidgetBase,
}

impl Default for NumberInput {
    fn default() -> Self {
        Self::new()
    }
}

impl NumberInput {
    #[must_use]
    pub fn new() -> Self {
        Self {
            base: WidgetBase::new(NUMBER_INPUT),
        }
    }

    #[must_use]
    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.base.set("value", value);
        self
    }

    #[must_use]
    pub fn bounds(mut self, min: impl Into<Value>, max: impl Into<Value>) -> Self {
        self.base.set("min", min);
        self.base.set("max", max);
        self
    }

    fn adapt(&self, adapter: Adapter, value: Value) -> Result<NodeState, AdapterError> {
        let number = match (adapter, value) {
            (Adapter::FromInt, v @ Value::Int(_)) => v,
            (Adapter::FromFloat, Value::Int(i)) => Value::Float(i as f64),
            (Adapter::FromFloat, v @ Value::Float(_)) => v,
            (Adapter::FromString, Value::Str(s)) => {
                let ty = if s.contains(['.', 'e', 'E']) {
                    TypeName::Float
                } else {
                    TypeName::Int
                };
                ty.coerce(Value::Str(s))
                    .map_err(|e| rejected(adapter, e.to_string()))?
            }
            (adapter, other) => {
                return Err(rejected(
                    adapter,
                    format!("unexpected {}", other.type_label()),
                ));
            }
        };
        Ok(NodeState::with_value(number))
    }
}

widget_builders!(NumberInput);
widget_node!(NumberInput, COMPAT, ADAPTERS);

#[cfg(test)]
mod tests {
    use super::*;
    use bindery_core::adapt_with;

    #[test]
    fn strings_parse_to_numbers() {
        let n = NumberInput::new();
        let patch = adapt_with(&n, Adapter::FromString, Value::from(" 42 ")).unwrap();
        assert_eq!(patch.value(), Some(&Value::Int(42)));
        let patch = adapt_with(&n, Adapter::FromString, Value::from("2.5")).unwrap();
        assert_eq!(patch.value(), Some(&Value::Float(2.5)));
        assert!(adapt_with(&n, Adapter::FromString, Value::from("many")).is_err());
    }
}
