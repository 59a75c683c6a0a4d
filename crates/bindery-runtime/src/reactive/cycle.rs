#![forbid(unsafe_code)]

//! One-hop trigger cycle guard.
//!
//! Two shapes are rejected:
//!
//! - Back edge: a new binding on `target` triggered by `t` closes a loop when
//!   `t` already carries a binding triggered by `target`.
//! - Overlap: `target` already owns a binding triggered by one of the new
//!   triggers, so a single change would fire both into the same node.
//!
//! Loops through three or more nodes are not detected.

use bindery_core::NodeId;

use super::error::BindError;
use super::record::BindingRecord;

/// Reject `triggers` for a new binding on `target` if any one of them
/// already reacts to `target`, or already drives a binding on `target`.
///
/// `bindings_on` yields the records currently attached to a node.
pub fn check<'a, F, I>(
    target: &NodeId,
    triggers: &[NodeId],
    self_trigger_is_cycle: bool,
    bindings_on: F,
) -> Result<(), BindError>
where
    F: Fn(&NodeId) -> I,
    I: IntoIterator<Item = &'a BindingRecord>,
{
    if let Some(trigger) = bindings_on(target)
        .into_iter()
        .find_map(|record| triggers.iter().find(|t| record.is_triggered_by(t)))
    {
        return Err(BindError::TriggerOverlap {
            target: target.clone(),
            trigger: trigger.clone(),
        });
    }
    for via in triggers {
        if via == target {
            if self_trigger_is_cycle {
                return Err(BindError::TriggerCycle {
                    target: target.clone(),
                    via: via.clone(),
                });
            }
            continue;
        }
        if bindings_on(via)
            .into_iter()
            .any(|record| record.is_triggered_by(target))
        {
            return Err(BindError::TriggerCycle {
                target: target.clone(),
                via: via.clone(),
            });
        }
    }
    Ok(())
}
