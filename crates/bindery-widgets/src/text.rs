//! Read-only text label.

use bindery_core::{Adapter, AdapterError, NodeKind, NodeState, TypeName, Value};

use crate::base::{WidgetBase, rejected, widget_builders, widget_node};

pub const TEXT: NodeKind = NodeKind::from_static("Text");

const COMPAT: &[TypeName] = &[
    TypeName::Str,
    TypeName::Int,
    TypeName::Float,
    TypeName::Bool,
    TypeName::List,
    TypeName::DateTime,
    TypeName::Node(TEXT),
];

const ADAPTERS: &[Adapter] = &[
    Adapter::FromString,
    Adapter::FromInt,
    Adapter::FromFloat,
    Adapter::FromBool,
    Adapter::FromList,
    Adapter::FromDateTime,
];

/// A text label. Scalars are stored as-is; lists are joined for display.
#[derive(Debug, Clone)]
pub struct Text {
    base: WidgetBase,
}

impl Text {
    #[must_use]
    pub fn new(text: impl Into<Value>) -> Self {
        let mut base = WidgetBase::new(TEXT);
        base.set("value", text);
        Self { base }
    }

    /// A label with no text yet.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            base: WidgetBase::new(TEXT),
        }
    }

    #[must_use]
    pub fn markdown(mut self, markdown: bool) -> Self {
        self.base.set("markdown", markdown);
        self
    }

    fn adapt(&self, adapter: Adapter, value: Value) -> Result<NodeState, AdapterError> {
        let accepted = match (adapter, &value) {
            (Adapter::FromString, Value::Str(_))
            | (Adapter::FromInt, Value::Int(_))
            | (Adapter::FromFloat, Value::Float(_) | Value::Int(_))
            | (Adapter::FromBool, Value::Bool(_))
            | (Adapter::FromDateTime, Value::DateTime(_)) => true,
            (Adapter::FromList, Value::List(items)) => {
                let joined = items
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                return Ok(NodeState::with_value(Value::Str(joined)));
            }
            _ => false,
        };
        if accepted {
            Ok(NodeState::with_value(value))
        } else {
            Err(rejected(
                adapter,
                format!("unexpected {}", value.type_label()),
            ))
        }
    }
}

widget_builders!(Text);
widget_node!(Text, COMPAT, ADAPTERS);

#[cfg(test)]
mod tests {
    use super::*;
    use bindery_core::{Node, adapt_with};

    #[test]
    fn scalars_keep_their_type() {
        let t = Text::empty();
        let patch = adapt_with(&t, Adapter::FromInt, Value::Int(10)).unwrap();
        assert_eq!(patch.value(), Some(&Value::Int(10)));
        let patch = adapt_with(&t, Adapter::FromString, Value::from("hi")).unwrap();
        assert_eq!(patch.value(), Some(&Value::from("hi")));
    }

    #[test]
    fn lists_are_joined() {
        let t = Text::empty();
        let patch = adapt_with(
            &t,
            Adapter::FromList,
            Value::List(vec![Value::Int(1), Value::from("b")]),
        )
        .unwrap();
        assert_eq!(patch.value(), Some(&Value::from("1, b")));
    }

    #[test]
    fn mismatched_payload_is_rejected() {
        let t = Text::empty();
        assert!(matches!(
            adapt_with(&t, Adapter::FromInt, Value::from("10")),
            Err(AdapterError::Rejected { .. })
        ));
        assert_eq!(t.current_value(), None);
        assert!(!t.adapters().contains(&Adapter::FromTable));
    }
}
