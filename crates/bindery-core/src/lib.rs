#![forbid(unsafe_code)]

//! Core value model and node contract for Bindery.
//!
//! Everything that both the authoring side and the executing side of a
//! binding must agree on lives here:
//!
//! - [`Value`]: the dynamic value flowing through bindings.
//! - [`TypeName`] and [`Adapter`]: the closed set of declared types and the
//!   per-type adapter operation a node must implement to consume them.
//! - [`Node`]: the capability trait every node kind implements.
//! - [`Table`] and [`ArtifactStore`]: materialised tabular artifacts.

pub mod artifact;
pub mod node;
pub mod types;
pub mod value;

pub use artifact::{ArtifactId, ArtifactStore, MemoryArtifacts, Table, TableError};
pub use node::{AdapterError, Node, NodeId, NodeKind, NodeState, VALUE_KEY, adapt_with};
pub use types::{Adapter, CoercionError, TypeName};
pub use value::Value;
