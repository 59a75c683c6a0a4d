//! Single-choice selector over a list of options.

use bindery_core::{Adapter, AdapterError, NodeKind, NodeState, TypeName, Value};

use crate::base::{WidgetBase, rejected, widget_builders, widget_node};

pub const SELECTOR: NodeKind = NodeKind::from_static("Selector");

const COMPAT: &[TypeName] = &[
    TypeName::List,
    TypeName::Str,
    TypeName::Int,
    TypeName::Node(SELECTOR),
];

const ADAPTERS: &[Adapter] = &[Adapter::FromList, Adapter::FromString, Adapter::FromInt];

/// `fromList` replaces the options (clearing a selection that is no longer
/// offered); `fromString`/`fromInt` select one of them.
#[derive(Debug, Clone)]
pub struct Selector {
    base: WidgetBase,
}

impl Selector {
    #[must_use]
    pub fn new(options: Vec<Value>) -> Self {
        let mut base = WidgetBase::new(SELECTOR);
        base.set("options", Value::List(options));
        Self { base }
    }

    #[must_use]
    pub fn selected(mut self, value: impl Into<Value>) -> Self {
        self.base.set("value", value);
        self
    }

    fn options(&self) -> &[Value] {
        self.base
            .get("options")
            .and_then(Value::as_list)
            .unwrap_or_default()
    }

    fn adapt(&self, adapter: Adapter, value: Value) -> Result<NodeState, AdapterError> {
        match (adapter, value) {
            (Adapter::FromList, Value::List(options)) => {
                let mut patch = NodeState::new();
                if let Some(current) = self.base.value() {
                    if !options.contains(&current) {
                        patch.set("value", Value::Null);
                    }
                }
                patch.set("options", Value::List(options));
                Ok(patch)
            }
            (Adapter::FromString, v @ Value::Str(_)) | (Adapter::FromInt, v @ Value::Int(_)) => {
                let options = self.options();
                if options.is_empty() || options.contains(&v) {
                    Ok(NodeState::with_value(v))
                } else {
                    Err(rejected(adapter, format!("{v} is not one of the options")))
                }
            }
            (adapter, other) => Err(rejected(
                adapter,
                format!("unexpected {}", other.type_label()),
            )),
        }
    }
}

widget_builders!(Selector);
widget_node!(Selector, COMPAT, ADAPTERS);

#[cfg(test)]
mod tests {
    use super::*;
    use bindery_core::{Node, adapt_with};

    fn colours() -> Selector {
        Selector::new(vec![Value::from("red"), Value::from("blue")]).selected("red")
    }

    #[test]
    fn selection_must_be_an_option() {
        let s = colours();
        assert!(adapt_with(&s, Adapter::FromString, Value::from("blue")).is_ok());
        assert!(adapt_with(&s, Adapter::FromString, Value::from("green")).is_err());
    }

    #[test]
    fn new_options_drop_stale_selection() {
        let mut s = colours();
        let patch = adapt_with(
            &s,
            Adapter::FromList,
            Value::List(vec![Value::from("green")]),
        )
        .unwrap();
        s.replace_widget(patch);
        assert_eq!(s.current_value(), None);
        assert_eq!(s.options(), &[Value::from("green")]);
    }
}
