#![forbid(unsafe_code)]

//! Remote executor: run one binding against the current node graph.
//!
//! The executor sees only the function table and node values. It never
//! consults the authoring program; everything the body needs travels in
//! the serialized [`PortableBody`].
//!
//! # Invariants
//!
//! 1. The target node is written only after the body returned and the
//!    wrap produced a state patch.
//! 2. A failed execution leaves every node unchanged.
//!
//! # Failure Modes
//!
//! All failures surface as [`ExecError`]; nothing panics on bad input.

use bindery_core::{ArtifactStore, Node, NodeId, NodeState, Value};
use bindery_script::DEFAULT_MAX_DEPTH;

use super::codec::decode_literal;
use super::coerce::{ArgValue, coerce_args};
use super::error::ExecError;
use super::portability::PortableBody;
use super::record::{BindingRecord, Reference, SeqItem};
use super::table::FunctionTable;

/// Read and write access to nodes by id.
pub trait NodeGraph {
    fn node(&self, id: &NodeId) -> Option<&dyn Node>;
    fn node_mut(&mut self, id: &NodeId) -> Option<&mut dyn Node>;

    /// Current value of `id`, `None` if the node is unknown or empty.
    fn value_of(&self, id: &NodeId) -> Option<Value> {
        self.node(id).and_then(Node::current_value)
    }
}

/// Executes bindings from a function table.
#[derive(Clone, Copy)]
pub struct Executor<'a> {
    table: &'a FunctionTable,
    artifacts: &'a dyn ArtifactStore,
    max_depth: usize,
}

impl std::fmt::Debug for Executor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("functions", &self.table.len())
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

impl<'a> Executor<'a> {
    #[must_use]
    pub fn new(table: &'a FunctionTable, artifacts: &'a dyn ArtifactStore) -> Self {
        Self {
            table,
            artifacts,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Compute the state patch `record` would apply, without applying it.
    pub fn evaluate(
        &self,
        graph: &dyn NodeGraph,
        record: &BindingRecord,
    ) -> Result<(NodeId, NodeState), ExecError> {
        let entry = self
            .table
            .get(&record.body_id)
            .ok_or_else(|| ExecError::UnknownBody(record.body_id.clone()))?;
        let body = entry.portable()?;
        let args = gather(graph, record)?;
        let args = coerce_args(&entry.parameters, args, self.artifacts)?;
        let raw = body.invoke(args, self.max_depth)?;
        let patch = wrap_result(graph, &body, raw)?;
        Ok((body.target, patch))
    }

    /// Run `record` and write the result into its target node.
    pub fn execute(
        &self,
        graph: &mut dyn NodeGraph,
        record: &BindingRecord,
    ) -> Result<NodeState, ExecError> {
        let span = tracing::debug_span!("execute", body = %record.body_id);
        let _guard = span.enter();
        let (target, patch) = self.evaluate(graph, record)?;
        let node = graph
            .node_mut(&target)
            .ok_or(ExecError::UnknownNode(target))?;
        node.replace_widget(patch.clone());
        tracing::debug!(node = %node.id(), "binding applied");
        Ok(patch)
    }
}

/// Turn the body's raw result into a patch for its target node.
pub(crate) fn wrap_result(
    graph: &dyn NodeGraph,
    body: &PortableBody,
    raw: Value,
) -> Result<NodeState, ExecError> {
    let node = graph
        .node(&body.target)
        .ok_or_else(|| ExecError::UnknownNode(body.target.clone()))?;
    Ok(body.wrap.apply(node, raw)?)
}

pub(crate) fn gather(graph: &dyn NodeGraph, record: &BindingRecord) -> Result<Vec<ArgValue>, ExecError> {
    record
        .references
        .iter()
        .enumerate()
        .map(|(i, reference)| match reference {
            Reference::Node { id } => Ok(match graph.value_of(id) {
                Some(v) => ArgValue::Present(v),
                None => ArgValue::MissingNode(id.clone()),
            }),
            Reference::Sequence { items } => {
                let values = items
                    .iter()
                    .map(|item| match item {
                        SeqItem::Literal(v) => Ok(v.clone()),
                        SeqItem::Node { id } => {
                            graph
                                .value_of(id)
                                .ok_or_else(|| ExecError::MissingDependencyValue {
                                    parameter: parameter_name(record, i),
                                    node: id.clone(),
                                })
                        }
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(ArgValue::Present(Value::List(values)))
            }
            Reference::Literal { value, .. } => Ok(ArgValue::Present(decode_literal(value)?)),
        })
        .collect()
}

pub(crate) fn parameter_name(record: &BindingRecord, index: usize) -> String {
    record
        .parameters
        .get(index)
        .map_or_else(|| format!("#{index}"), |p| p.name.clone())
}
