#![forbid(unsafe_code)]

//! Execution-side argument preparation: defaults, dependency checks and
//! coercion to declared parameter types.

use bindery_core::{ArtifactId, ArtifactStore, NodeId, TypeName, Value};

use super::error::ExecError;
use super::record::Parameter;

/// A raw argument as it arrives at the executor.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Present(Value),
    /// A referenced node that currently has no value.
    MissingNode(NodeId),
    /// No reference was recorded for this position.
    Omitted,
}

/// Prepare `args` (parallel to `params`, possibly shorter) for invocation.
pub fn coerce_args(
    params: &[Parameter],
    mut args: Vec<ArgValue>,
    artifacts: &dyn ArtifactStore,
) -> Result<Vec<Value>, ExecError> {
    args.resize(params.len(), ArgValue::Omitted);
    params
        .iter()
        .zip(args)
        .map(|(param, arg)| {
            let raw = match arg {
                ArgValue::Present(v) => v,
                ArgValue::MissingNode(node) => match &param.default {
                    Some(default) => default.clone(),
                    None => {
                        return Err(ExecError::MissingDependencyValue {
                            parameter: param.name.clone(),
                            node,
                        });
                    }
                },
                ArgValue::Omitted => param
                    .default
                    .clone()
                    .ok_or_else(|| ExecError::MissingArgument(param.name.clone()))?,
            };
            coerce_one(param, raw, artifacts)
        })
        .collect()
}

fn coerce_one(param: &Parameter, raw: Value, artifacts: &dyn ArtifactStore) -> Result<Value, ExecError> {
    let raw = match (&param.ty, raw) {
        (TypeName::Table, Value::Artifact(id)) => load(artifacts, id)?,
        (TypeName::Table, Value::Str(id)) => load(artifacts, ArtifactId::new(id))?,
        (_, raw) => raw,
    };
    param.ty.coerce(raw).map_err(|source| ExecError::Coercion {
        parameter: param.name.clone(),
        source,
    })
}

fn load(artifacts: &dyn ArtifactStore, id: ArtifactId) -> Result<Value, ExecError> {
    artifacts
        .load(&id)
        .map(Value::Table)
        .ok_or(ExecError::UnknownArtifact(id))
}
