#![forbid(unsafe_code)]

//! Binding records and their wire shape.
//!
//! ```json
//! {
//!   "bodyId": "9b2f...",
//!   "result": "int",
//!   "parameters": [{"name": "n", "type": "int", "default": null}],
//!   "triggers": ["slider-1"],
//!   "references": [{"ref": "slider-1"}]
//! }
//! ```
//!
//! # Invariants
//!
//! 1. A record is never mutated after construction.
//! 2. `references.len() <= parameters.len()`; missing trailing references
//!    fall back to parameter defaults at execution time.
//! 3. Every live node reference appears in `triggers` unless it was muted.

use std::fmt;

use bindery_core::{NodeId, TypeName, Value};
use bindery_script::Param;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of one bound function body. Distinct per `bind` call even
/// when the same function is bound twice.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BodyId(String);

impl BodyId {
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One declared parameter as shipped on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeName,
    pub default: Option<Value>,
}

impl From<&Param> for Parameter {
    fn from(p: &Param) -> Self {
        Self {
            name: p.name.clone(),
            ty: p.ty.clone(),
            default: p.default.clone(),
        }
    }
}

/// An element of a sequence argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SeqItem {
    Node {
        #[serde(rename = "ref")]
        id: NodeId,
    },
    /// Tagged literal kept in place.
    Literal(Value),
}

/// How one argument reaches the function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reference {
    /// Live node reference.
    Node {
        #[serde(rename = "ref")]
        id: NodeId,
    },
    /// Sequence mixing node references and literals.
    Sequence {
        #[serde(rename = "ref")]
        items: Vec<SeqItem>,
    },
    /// Opaquely serialized literal.
    Literal { value: String, pickled: bool },
}

impl Reference {
    /// Node ids this reference reads, in order.
    #[must_use]
    pub fn node_ids(&self) -> Vec<&NodeId> {
        match self {
            Self::Node { id } => vec![id],
            Self::Sequence { items } => items
                .iter()
                .filter_map(|item| match item {
                    SeqItem::Node { id } => Some(id),
                    SeqItem::Literal(_) => None,
                })
                .collect(),
            Self::Literal { .. } => Vec::new(),
        }
    }
}

/// The unit of reactivity attached to a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindingRecord {
    pub body_id: BodyId,
    pub result: TypeName,
    pub parameters: Vec<Parameter>,
    pub triggers: Vec<NodeId>,
    pub references: Vec<Reference>,
    /// Encoded portable body; shipped through the function table, not the
    /// record.
    #[serde(skip)]
    pub portable_body: String,
}

impl BindingRecord {
    #[must_use]
    pub fn is_triggered_by(&self, id: &NodeId) -> bool {
        self.triggers.contains(id)
    }
}

/// A node attribute fed by another node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
    pub id: NodeId,
    pub target: String,
}

/// An entry of a node's bind list.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeBinding {
    Function(BindingRecord),
    /// Raw property expression, passed to the front end untouched.
    Props(serde_json::Value),
}

impl NodeBinding {
    #[must_use]
    pub fn as_record(&self) -> Option<&BindingRecord> {
        match self {
            Self::Function(record) => Some(record),
            Self::Props(_) => None,
        }
    }

    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            Self::Function(record) => serde_json::to_value(record),
            Self::Props(props) => Ok(props.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn references_use_the_documented_shape() {
        let node = Reference::Node {
            id: NodeId::new("a"),
        };
        assert_eq!(serde_json::to_value(&node).unwrap(), serde_json::json!({"ref": "a"}));

        let seq = Reference::Sequence {
            items: vec![
                SeqItem::Node { id: NodeId::new("a") },
                SeqItem::Literal(Value::Int(3)),
            ],
        };
        assert_eq!(
            serde_json::to_value(&seq).unwrap(),
            serde_json::json!({"ref": [{"ref": "a"}, {"Int": 3}]})
        );

        let lit = Reference::Literal {
            value: "e30=".into(),
            pickled: true,
        };
        assert_eq!(
            serde_json::to_value(&lit).unwrap(),
            serde_json::json!({"value": "e30=", "pickled": true})
        );
    }

    #[test]
    fn untagged_references_parse_back() {
        let json = r#"[{"ref": "a"}, {"ref": [{"ref": "b"}, {"Str": "x"}]}, {"value": "AA==", "pickled": true}]"#;
        let refs: Vec<Reference> = serde_json::from_str(json).unwrap();
        assert!(matches!(refs[0], Reference::Node { .. }));
        assert!(matches!(refs[1], Reference::Sequence { ref items } if items.len() == 2));
        assert!(matches!(refs[2], Reference::Literal { pickled: true, .. }));
        let ids: Vec<_> = refs[1].node_ids().into_iter().map(NodeId::as_str).collect();
        assert_eq!(ids, vec!["b"]);
    }

    #[test]
    fn record_keys_are_camel_case_and_skip_body() {
        let record = BindingRecord {
            body_id: BodyId::new("b1"),
            result: TypeName::Int,
            parameters: vec![Parameter {
                name: "n".into(),
                ty: TypeName::Int,
                default: None,
            }],
            triggers: vec![NodeId::new("s")],
            references: vec![Reference::Node { id: NodeId::new("s") }],
            portable_body: "opaque".into(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["bodyId"], "b1");
        assert_eq!(json["result"], "int");
        assert_eq!(json["parameters"][0]["type"], "int");
        assert!(json.get("portableBody").is_none());
    }
}
