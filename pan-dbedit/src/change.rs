//! Typed change operations built from changeset rows.

use crate::field::FieldMap;
use crate::kind::{Action, ChangeKey, ObjectKind, Rulebase};
use crate::objects::{ConfigObject, DynamicIp};

/// One mutation requested by a changeset row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeOperation {
    Create(ConfigObject),
    Delete {
        name: String,
        kind: ObjectKind,
        rulebase: Option<Rulebase>,
    },
    /// Sparse patch; fields absent from `patch` keep their live value.
    Edit {
        name: String,
        kind: ObjectKind,
        rulebase: Option<Rulebase>,
        patch: FieldMap,
    },
    ModifyGroup {
        name: String,
        kind: ObjectKind,
        members: Vec<String>,
        action: GroupAction,
        description: Option<String>,
    },
    RegisterIp(DynamicIp),
    UnregisterIp(DynamicIp),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupAction {
    Add,
    Remove,
}

impl ChangeOperation {
    /// Name logged and recorded for this operation.
    pub fn name(&self) -> String {
        match self {
            ChangeOperation::Create(object) => object.name().to_string(),
            ChangeOperation::Delete { name, .. }
            | ChangeOperation::Edit { name, .. }
            | ChangeOperation::ModifyGroup { name, .. } => name.clone(),
            ChangeOperation::RegisterIp(dip) | ChangeOperation::UnregisterIp(dip) => dip.identity(),
        }
    }

    pub fn kind(&self) -> ObjectKind {
        match self {
            ChangeOperation::Create(object) => object.kind(),
            ChangeOperation::Delete { kind, .. }
            | ChangeOperation::Edit { kind, .. }
            | ChangeOperation::ModifyGroup { kind, .. } => *kind,
            ChangeOperation::RegisterIp(_) | ChangeOperation::UnregisterIp(_) => {
                ObjectKind::DynamicIp
            }
        }
    }

    pub fn action(&self) -> Action {
        match self {
            ChangeOperation::Create(_) | ChangeOperation::RegisterIp(_) => Action::Create,
            ChangeOperation::Delete { .. } | ChangeOperation::UnregisterIp(_) => Action::Delete,
            ChangeOperation::Edit { .. } => Action::Edit,
            ChangeOperation::ModifyGroup {
                action: GroupAction::Add,
                ..
            } => Action::AddToGroup,
            ChangeOperation::ModifyGroup {
                action: GroupAction::Remove,
                ..
            } => Action::RemoveFromGroup,
        }
    }
}

/// Where a built operation is filed in the changeset index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filed {
    pub vendor: String,
    pub location: String,
    pub key: ChangeKey,
    pub operation: ChangeOperation,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_operations_report_their_action() {
        let op = ChangeOperation::ModifyGroup {
            name: "grpA".into(),
            kind: ObjectKind::AddressGroup,
            members: vec!["web2".into()],
            action: GroupAction::Remove,
            description: None,
        };
        assert_eq!(op.action(), Action::RemoveFromGroup);
        assert_eq!(op.kind(), ObjectKind::AddressGroup);
        assert_eq!(op.name(), "grpA");
    }

    #[test]
    fn dynamic_ip_operations_are_named_by_identity() {
        let op = ChangeOperation::UnregisterIp(DynamicIp {
            ips: vec!["10.1.1.5".into()],
            tags: vec!["blocked".into()],
        });
        assert_eq!(op.name(), "10.1.1.5-blocked");
        assert_eq!(op.action(), Action::Delete);
    }
}
