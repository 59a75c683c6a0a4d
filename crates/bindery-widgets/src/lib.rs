#![forbid(unsafe_code)]

//! Node kinds for Bindery applications.
//!
//! Each kind implements [`bindery_core::Node`] with a fixed compatibility
//! list and adapter set:
//!
//! | Kind | Consumes | Adapters |
//! |------|----------|----------|
//! | [`Slider`] | int, float, list | fromInt, fromFloat, fromList |
//! | [`Text`] | str, int, float, bool, list, datetime | all but fromTable |
//! | [`NumberInput`] | int, float, str | fromInt, fromFloat, fromString |
//! | [`Checkbox`] | bool, int, str | fromBool, fromInt, fromString |
//! | [`Selector`] | list, str, int | fromList, fromString, fromInt |
//! | [`TableView`] | table, list | fromTable, fromList |
//!
//! Every kind also accepts its own native state (`-> Slider`, `-> Text`).

pub mod base;
pub mod checkbox;
pub mod number_input;
pub mod selector;
pub mod slider;
pub mod table_view;
pub mod text;

pub use base::WidgetBase;
pub use checkbox::{CHECKBOX, Checkbox};
pub use number_input::{NUMBER_INPUT, NumberInput};
pub use selector::{SELECTOR, Selector};
pub use slider::{SLIDER, Slider};
pub use table_view::{TABLE_VIEW, TableView};
pub use text::{TEXT, Text};
