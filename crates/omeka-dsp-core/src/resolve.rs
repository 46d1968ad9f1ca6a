//! Binds changes to the value nodes they act on.

use crate::error::{Result, SyncError};
use crate::fields::Cardinality;
use crate::operation::{Change, ChangeAction, Operation};
use crate::target::{TargetRecord, TypedValue};

/// Resolve a change against the snapshot it was computed from.
///
/// Creates need no node. Updates and deletes on a scalar field address the
/// field's single value; on a set field they address the value whose decoded
/// form equals the old value. A change with no addressable node fails with
/// [`SyncError::StaleSnapshot`].
pub fn resolve(change: &Change, target: &TargetRecord) -> Result<Operation> {
    match &change.action {
        ChangeAction::Create { new } => Ok(Operation::create(&change.field, change.kind, new.as_str())),
        ChangeAction::Update { old, new } => {
            let node = find_node(change, target, old)?;
            Ok(Operation::update(&change.field, change.kind, node.node_id(), new.as_str()))
        }
        ChangeAction::Delete { old } => {
            let node = find_node(change, target, old)?;
            Ok(Operation::delete(&change.field, change.kind, node.node_id(), old.as_str()))
        }
    }
}

/// Resolve every change, logging and dropping the ones that fail.
pub fn resolve_all(identifier: &str, changes: &[Change], target: &TargetRecord) -> Vec<Operation> {
    changes
        .iter()
        .filter_map(|change| match resolve(change, target) {
            Ok(op) => Some(op),
            Err(e) => {
                tracing::error!("{}: dropping '{}': {}", identifier, change, e);
                None
            }
        })
        .collect()
}

fn find_node<'a>(change: &Change, target: &'a TargetRecord, old: &str) -> Result<&'a TypedValue> {
    let values = target.values(&change.field);
    let node = match change.cardinality {
        Cardinality::Scalar => values.first(),
        Cardinality::Set => values
            .iter()
            .find(|v| v.kind() == change.kind && v.decoded() == old),
    };

    node.ok_or_else(|| SyncError::StaleSnapshot {
        field: change.field.clone(),
        value: old.to_string(),
    })
}
