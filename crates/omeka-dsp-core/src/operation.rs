//! Changes computed by the differ and the operations they resolve to.
//!
//! A [`Change`] describes what has to happen to one field value in terms of
//! decoded values. Resolving it against the target snapshot yields an
//! [`Operation`], which additionally addresses the value node to act on.
//! Update and delete operations always carry a node id; create operations
//! never do.

use serde::{Deserialize, Serialize};

use crate::fields::Cardinality;
use crate::target::ValueKind;

/// What an operation does to a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Update,
    Delete,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Create => write!(f, "create"),
            Action::Update => write!(f, "update"),
            Action::Delete => write!(f, "delete"),
        }
    }
}

/// Decoded before/after values of a change.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeAction {
    Create { new: String },
    Update { old: String, new: String },
    Delete { old: String },
}

/// An unresolved field change.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Change {
    pub field: String,
    pub kind: ValueKind,
    pub cardinality: Cardinality,
    pub action: ChangeAction,
}

impl Change {
    pub fn create(field: &str, kind: ValueKind, cardinality: Cardinality, new: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            kind,
            cardinality,
            action: ChangeAction::Create { new: new.into() },
        }
    }

    pub fn update(
        field: &str,
        kind: ValueKind,
        cardinality: Cardinality,
        old: impl Into<String>,
        new: impl Into<String>,
    ) -> Self {
        Self {
            field: field.to_string(),
            kind,
            cardinality,
            action: ChangeAction::Update {
                old: old.into(),
                new: new.into(),
            },
        }
    }

    pub fn delete(field: &str, kind: ValueKind, cardinality: Cardinality, old: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            kind,
            cardinality,
            action: ChangeAction::Delete { old: old.into() },
        }
    }

    pub fn action(&self) -> Action {
        match self.action {
            ChangeAction::Create { .. } => Action::Create,
            ChangeAction::Update { .. } => Action::Update,
            ChangeAction::Delete { .. } => Action::Delete,
        }
    }

    /// The value the change writes, if any.
    pub fn new_value(&self) -> Option<&str> {
        match &self.action {
            ChangeAction::Create { new } | ChangeAction::Update { new, .. } => Some(new),
            ChangeAction::Delete { .. } => None,
        }
    }

    /// The target value the change was computed against, if any.
    pub fn old_value(&self) -> Option<&str> {
        match &self.action {
            ChangeAction::Update { old, .. } | ChangeAction::Delete { old } => Some(old),
            ChangeAction::Create { .. } => None,
        }
    }
}

impl std::fmt::Display for Change {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.action {
            ChangeAction::Create { new } => write!(f, "create {} '{}'", self.field, new),
            ChangeAction::Update { old, new } => {
                write!(f, "update {} '{}' -> '{}'", self.field, old, new)
            }
            ChangeAction::Delete { old } => write!(f, "delete {} '{}'", self.field, old),
        }
    }
}

/// Resolved action, addressing a value node where required.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationAction {
    Create { value: String },
    Update { node_id: String, value: String },
    Delete { node_id: String, old: String },
}

/// A change bound to the value node it acts on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Operation {
    pub field: String,
    pub kind: ValueKind,
    pub action: OperationAction,
}

impl Operation {
    pub fn create(field: &str, kind: ValueKind, value: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            kind,
            action: OperationAction::Create {
                value: value.into(),
            },
        }
    }

    pub fn update(
        field: &str,
        kind: ValueKind,
        node_id: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            field: field.to_string(),
            kind,
            action: OperationAction::Update {
                node_id: node_id.into(),
                value: value.into(),
            },
        }
    }

    pub fn delete(
        field: &str,
        kind: ValueKind,
        node_id: impl Into<String>,
        old: impl Into<String>,
    ) -> Self {
        Self {
            field: field.to_string(),
            kind,
            action: OperationAction::Delete {
                node_id: node_id.into(),
                old: old.into(),
            },
        }
    }

    pub fn action(&self) -> Action {
        match self.action {
            OperationAction::Create { .. } => Action::Create,
            OperationAction::Update { .. } => Action::Update,
            OperationAction::Delete { .. } => Action::Delete,
        }
    }

    pub fn new_value(&self) -> Option<&str> {
        match &self.action {
            OperationAction::Create { value } | OperationAction::Update { value, .. } => {
                Some(value)
            }
            OperationAction::Delete { .. } => None,
        }
    }

    pub fn target_node_id(&self) -> Option<&str> {
        match &self.action {
            OperationAction::Update { node_id, .. } | OperationAction::Delete { node_id, .. } => {
                Some(node_id)
            }
            OperationAction::Create { .. } => None,
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.action {
            OperationAction::Create { value } => write!(f, "created {} '{}'", self.field, value),
            OperationAction::Update { value, .. } => {
                write!(f, "updated {} '{}'", self.field, value)
            }
            OperationAction::Delete { old, .. } => write!(f, "deleted {} '{}'", self.field, old),
        }
    }
}
