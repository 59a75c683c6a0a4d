use bindery_core::{Adapter, AdapterError, Node, TypeName, Value, adapt_with};
use bindery_widgets::{Checkbox, NumberInput, Selector, Slider, TableView, Text};
use proptest::prelude::*;

fn every_kind() -> Vec<Box<dyn Node>> {
    vec![
        Box::new(Slider::new()),
        Box::new(Text::empty()),
        Box::new(NumberInput::new()),
        Box::new(Checkbox::new(false)),
        Box::new(Selector::new(vec![])),
        Box::new(TableView::new()),
    ]
}

#[test]
fn compatible_types_have_an_adapter() {
    for node in every_kind() {
        for ty in node.compatibility() {
            if ty.is_native_for(&node.kind()) {
                continue;
            }
            let adapter = ty.adapter();
            assert!(
                adapter.is_some_and(|a| node.adapters().contains(&a)),
                "{} accepts {ty} without an adapter",
                node.kind()
            );
        }
    }
}

proptest! {
    #[test]
    fn slider_takes_any_int_and_keeps_its_range(i in any::<i64>()) {
        let mut slider = Slider::new().range(-5, 5).value(0);
        let patch = adapt_with(&slider, Adapter::FromInt, Value::Int(i)).unwrap();
        slider.replace_widget(patch);
        prop_assert_eq!(slider.current_value(), Some(Value::Int(i)));
        prop_assert_eq!(slider.base().get("min"), Some(&Value::Int(-5)));
        prop_assert_eq!(slider.base().get("max"), Some(&Value::Int(5)));
    }

    #[test]
    fn text_stores_strings_verbatim(s in ".*") {
        let mut text = Text::new("old");
        let patch = adapt_with(&text, Adapter::FromString, Value::from(s.as_str())).unwrap();
        text.replace_widget(patch);
        prop_assert_eq!(text.current_value(), Some(Value::Str(s)));
    }

    #[test]
    fn number_input_parses_rendered_ints(i in any::<i64>()) {
        let input = NumberInput::new();
        let patch = adapt_with(&input, Adapter::FromString, Value::Str(i.to_string())).unwrap();
        prop_assert_eq!(patch.value(), Some(&Value::Int(i)));
    }

    #[test]
    fn selector_only_selects_offered_options(
        options in proptest::collection::btree_set("[a-z]{1,6}", 1..6),
        pick in any::<prop::sample::Index>(),
        stranger in "[A-Z]{1,6}",
    ) {
        let options: Vec<Value> = options.into_iter().map(Value::Str).collect();
        let chosen = pick.get(&options).clone();
        let selector = Selector::new(options);
        let patch = adapt_with(&selector, Adapter::FromString, chosen.clone()).unwrap();
        prop_assert_eq!(patch.value(), Some(&chosen));
        prop_assert!(adapt_with(&selector, Adapter::FromString, Value::Str(stranger)).is_err());
    }

    #[test]
    fn missing_adapters_are_unsupported(s in ".*", b in any::<bool>()) {
        let slider = Slider::new();
        let unsupported = matches!(
            adapt_with(&slider, Adapter::FromString, Value::Str(s)),
            Err(AdapterError::Unsupported { .. })
        );
        prop_assert!(unsupported);
        let view = TableView::new();
        let unsupported = matches!(
            adapt_with(&view, Adapter::FromBool, Value::Bool(b)),
            Err(AdapterError::Unsupported { .. })
        );
        prop_assert!(unsupported);
        prop_assert!(!view.compatibility().contains(&TypeName::Bool));
    }
}
