#![forbid(unsafe_code)]

//! Per-application function table: `bodyId -> {parameters, result, serBody}`.
//!
//! Append-only during authoring; cleared only when the application is
//! deleted.

use bindery_core::TypeName;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::codec::{CodecError, decode_body};
use super::portability::PortableBody;
use super::record::{BodyId, Parameter};

/// One function table entry, in its wire shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionEntry {
    pub body: BodyId,
    pub parameters: Vec<Parameter>,
    pub result: TypeName,
    pub ser_body: String,
}

impl FunctionEntry {
    /// Decode the shipped body.
    pub fn portable(&self) -> Result<PortableBody, CodecError> {
        decode_body(&self.ser_body)
    }

    /// The entry without its body, as exported in application specs.
    #[must_use]
    pub fn summary(&self) -> serde_json::Value {
        serde_json::json!({
            "body": self.body,
            "parameters": self.parameters,
            "result": self.result,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FunctionTable {
    entries: IndexMap<BodyId, FunctionEntry>,
}

impl FunctionTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entry: FunctionEntry) {
        self.entries.insert(entry.body.clone(), entry);
    }

    #[must_use]
    pub fn get(&self, id: &BodyId) -> Option<&FunctionEntry> {
        self.entries.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: &BodyId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &BodyId> {
        self.entries.keys()
    }

    pub fn entries(&self) -> impl Iterator<Item = &FunctionEntry> {
        self.entries.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove every entry, returning the removed ids.
    pub fn clear(&mut self) -> Vec<BodyId> {
        self.entries.drain(..).map(|(id, _)| id).collect()
    }

    /// `{bodyId: {body, parameters, result}}` without serialized bodies.
    #[must_use]
    pub fn to_json_stripped(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.entries
                .iter()
                .map(|(id, entry)| (id.to_string(), entry.summary()))
                .collect(),
        )
    }
}

impl FromIterator<FunctionEntry> for FunctionTable {
    fn from_iter<I: IntoIterator<Item = FunctionEntry>>(iter: I) -> Self {
        let mut table = Self::new();
        for entry in iter {
            table.insert(entry);
        }
        table
    }
}
