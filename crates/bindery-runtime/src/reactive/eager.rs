#![forbid(unsafe_code)]

//! Eager evaluation: run a fresh binding once at authoring time.
//!
//! Best effort. Failures never reach the caller of `bind`; they are logged
//! and reported back as [`EagerOutcome::Failed`].
//!
//! Unlike remote execution, a referenced node without a current value is
//! a failure even if the parameter declares a default.

use bindery_core::ArtifactStore;

use super::coerce::{ArgValue, coerce_args};
use super::error::ExecError;
use super::executor::{NodeGraph, gather, parameter_name, wrap_result};
use super::portability::PortableBody;
use super::record::BindingRecord;

/// What happened to the eager run of a binding.
#[derive(Debug, Default)]
pub enum EagerOutcome {
    /// Eager evaluation was not requested.
    #[default]
    Skipped,
    Applied,
    Failed(ExecError),
}

impl EagerOutcome {
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }

    #[must_use]
    pub fn error(&self) -> Option<&ExecError> {
        match self {
            Self::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// Evaluate `record` with the current node values and merge the result
/// into its target.
pub fn evaluate(
    graph: &mut dyn NodeGraph,
    record: &BindingRecord,
    body: &PortableBody,
    artifacts: &dyn ArtifactStore,
    max_depth: usize,
) -> EagerOutcome {
    match run(graph, record, body, artifacts, max_depth) {
        Ok(()) => {
            tracing::debug!(body = %record.body_id, "eager evaluation applied");
            EagerOutcome::Applied
        }
        Err(error) => {
            tracing::warn!(body = %record.body_id, %error, "eager evaluation failed");
            EagerOutcome::Failed(error)
        }
    }
}

fn run(
    graph: &mut dyn NodeGraph,
    record: &BindingRecord,
    body: &PortableBody,
    artifacts: &dyn ArtifactStore,
    max_depth: usize,
) -> Result<(), ExecError> {
    let args = gather(&*graph, record)?
        .into_iter()
        .enumerate()
        .map(|(i, arg)| match arg {
            ArgValue::MissingNode(node) => Err(ExecError::MissingDependencyValue {
                parameter: parameter_name(record, i),
                node,
            }),
            other => Ok(other),
        })
        .collect::<Result<Vec<_>, _>>()?;
    let args = coerce_args(&record.parameters, args, artifacts)?;
    let raw = body.invoke(args, max_depth)?;
    let patch = wrap_result(&*graph, body, raw)?;
    let node = graph
        .node_mut(&body.target)
        .ok_or_else(|| ExecError::UnknownNode(body.target.clone()))?;
    node.replace_widget(patch);
    Ok(())
}
