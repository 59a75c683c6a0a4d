//! Tabular data view.

use bindery_core::{Adapter, AdapterError, NodeKind, NodeState, Table, TypeName, Value};

use crate::base::{WidgetBase, rejected, widget_builders, widget_node};

pub const TABLE_VIEW: NodeKind = NodeKind::from_static("TableView");

const COMPAT: &[TypeName] = &[TypeName::Table, TypeName::List, TypeName::Node(TABLE_VIEW)];

const ADAPTERS: &[Adapter] = &[Adapter::FromTable, Adapter::FromList];

/// Shows a table. `fromList` accepts a list of records (maps); columns come
/// from the first record's keys.
#[derive(Debug, Clone)]
pub struct TableView {
    base: WidgetBase,
}

impl Default for TableView {
    fn default() -> Self {
        Self::new()
    }
}

impl TableView {
    #[must_use]
    pub fn new() -> Self {
        Self {
            base: WidgetBase::new(TABLE_VIEW),
        }
    }

    #[must_use]
    pub fn table(mut self, table: Table) -> Self {
        self.base.set("value", table);
        self
    }

    fn adapt(&self, adapter: Adapter, value: Value) -> Result<NodeState, AdapterError> {
        match (adapter, value) {
            (Adapter::FromTable, v @ Value::Table(_)) => Ok(NodeState::with_value(v)),
            (Adapter::FromList, Value::List(records)) => records_to_table(&records)
                .map(|t| NodeState::with_value(Value::Table(t)))
                .map_err(|reason| rejected(adapter, reason)),
            (adapter, other) => Err(rejected(
                adapter,
                format!("unexpected {}", other.type_label()),
            )),
        }
    }
}

fn records_to_table(records: &[Value]) -> Result<Table, String> {
    let columns: Vec<String> = match records.first() {
        Some(Value::Map(first)) => first.keys().cloned().collect(),
        Some(other) => return Err(format!("expected records, found {}", other.type_label())),
        None => Vec::new(),
    };
    let mut table = Table::new(columns.clone()).map_err(|e| e.to_string())?;
    for record in records {
        let Value::Map(map) = record else {
            return Err(format!("expected records, found {}", record.type_label()));
        };
        let row = columns
            .iter()
            .map(|c| map.get(c).cloned().unwrap_or_default())
            .collect();
        table.push_row(row).map_err(|e| e.to_string())?;
    }
    Ok(table)
}

widget_builders!(TableView);
widget_node!(TableView, COMPAT, ADAPTERS);

#[cfg(test)]
mod tests {
    use super::*;
    use bindery_core::adapt_with;

    fn record(city: &str, temp: i64) -> Value {
        Value::from_json(&serde_json::json!({ "city": city, "temp": temp }))
    }

    #[test]
    fn records_become_rows() {
        let view = TableView::new();
        let patch = adapt_with(
            &view,
            Adapter::FromList,
            Value::List(vec![record("Oslo", 4), record("Rome", 21)]),
        )
        .unwrap();
        let Some(Value::Table(t)) = patch.value() else {
            panic!("expected a table");
        };
        assert_eq!(t.columns(), &["city".to_string(), "temp".to_string()]);
        assert_eq!(t.num_rows(), 2);
    }

    #[test]
    fn non_records_are_rejected() {
        let view = TableView::new();
        assert!(adapt_with(&view, Adapter::FromList, Value::List(vec![Value::Int(1)])).is_err());
    }
}
