//! Numeric slider.

use bindery_core::{Adapter, AdapterError, NodeKind, NodeState, TypeName, Value};

use crate::base::{WidgetBase, rejected, widget_builders, widget_node};

pub const SLIDER: NodeKind = NodeKind::from_static("Slider");

const COMPAT: &[TypeName] = &[
    TypeName::Int,
    TypeName::Float,
    TypeName::List,
    TypeName::Node(SLIDER),
];

const ADAPTERS: &[Adapter] = &[Adapter::FromInt, Adapter::FromFloat, Adapter::FromList];

/// A slider over a numeric range.
///
/// `fromList` takes a `[min, max]` pair and moves the range, keeping the
/// current value.
#[derive(Debug, Clone)]
pub struct Slider {
    base: WidgetBase,
}

impl Default for Slider {
    fn default() -> Self {
        Self::new()
    }
}

impl Slider {
    #[must_use]
    pub fn new() -> Self {
        let mut base = WidgetBase::new(SLIDER);
        base.set("min", 0);
        base.set("max", 100);
        base.set("step", 1);
        Self { base }
    }

    #[must_use]
    pub fn range(mut self, min: impl Into<Value>, max: impl Into<Value>) -> Self {
        self.base.set("min", min);
        self.base.set("max", max);
        self
    }

    #[must_use]
    pub fn step(mut self, step: impl Into<Value>) -> Self {
        self.base.set("step", step);
        self
    }

    #[must_use]
    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.base.set("value", value);
        self
    }

    fn adapt(&self, adapter: Adapter, value: Value) -> Result<NodeState, AdapterError> {
        match (adapter, value) {
            (Adapter::FromInt, v @ Value::Int(_)) | (Adapter::FromFloat, v @ Value::Float(_)) => {
                Ok(NodeState::with_value(v))
            }
            (Adapter::FromFloat, Value::Int(i)) => Ok(NodeState::with_value(Value::Float(i as f64))),
            (Adapter::FromList, Value::List(items)) => match items.as_slice() {
                [lo, hi] if lo.as_f64().is_some() && hi.as_f64().is_some() => Ok(NodeState::new()
                    .with("min", lo.clone())
                    .with("max", hi.clone())),
                _ => Err(rejected(adapter, "expected a [min, max] pair")),
            },
            (adapter, other) => Err(rejected(
                adapter,
                format!("unexpected {}", other.type_label()),
            )),
        }
    }
}

widget_builders!(Slider);
widget_node!(Slider, COMPAT, ADAPTERS);

#[cfg(test)]
mod tests {
    use super::*;
    use bindery_core::{Node, adapt_with};

    #[test]
    fn int_result_moves_value() {
        let mut s = Slider::new().with_id("s").value(3);
        let patch = adapt_with(&s, Adapter::FromInt, Value::Int(7)).unwrap();
        s.replace_widget(patch);
        assert_eq!(s.current_value(), Some(Value::Int(7)));
        assert_eq!(s.base().get("max"), Some(&Value::Int(100)));
    }

    #[test]
    fn list_result_sets_range() {
        let mut s = Slider::new().value(5);
        let patch = adapt_with(
            &s,
            Adapter::FromList,
            Value::List(vec![Value::Int(-10), Value::Int(10)]),
        )
        .unwrap();
        s.replace_widget(patch);
        assert_eq!(s.base().get("min"), Some(&Value::Int(-10)));
        assert_eq!(s.current_value(), Some(Value::Int(5)));

        assert!(adapt_with(&s, Adapter::FromList, Value::List(vec![])).is_err());
    }

    #[test]
    fn string_adapter_is_not_offered() {
        let s = Slider::new();
        assert!(matches!(
            adapt_with(&s, Adapter::FromString, Value::from("1")),
            Err(AdapterError::Unsupported { .. })
        ));
        assert!(s.compatibility().contains(&TypeName::Node(SLIDER)));
    }
}
