use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The fixed vocabulary of authorization actions, in generation order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "camelCase")]
pub enum PolicyAction {
    ViewAny,
    View,
    Create,
    Update,
    Delete,
    Restore,
    ForceDelete,
    DeleteAny,
    RestoreAny,
    ForceDeleteAny,
}

impl PolicyAction {
    pub const ALL: [PolicyAction; 10] = [
        PolicyAction::ViewAny,
        PolicyAction::View,
        PolicyAction::Create,
        PolicyAction::Update,
        PolicyAction::Delete,
        PolicyAction::Restore,
        PolicyAction::ForceDelete,
        PolicyAction::DeleteAny,
        PolicyAction::RestoreAny,
        PolicyAction::ForceDeleteAny,
    ];

    /// Method name in the generated policy class.
    pub fn method_name(self) -> &'static str {
        match self {
            PolicyAction::ViewAny => "viewAny",
            PolicyAction::View => "view",
            PolicyAction::Create => "create",
            PolicyAction::Update => "update",
            PolicyAction::Delete => "delete",
            PolicyAction::Restore => "restore",
            PolicyAction::ForceDelete => "forceDelete",
            PolicyAction::DeleteAny => "deleteAny",
            PolicyAction::RestoreAny => "restoreAny",
            PolicyAction::ForceDeleteAny => "forceDeleteAny",
        }
    }

    /// Record-level actions receive the model instance as a second parameter.
    pub fn takes_record(self) -> bool {
        matches!(
            self,
            PolicyAction::View
                | PolicyAction::Update
                | PolicyAction::Delete
                | PolicyAction::Restore
                | PolicyAction::ForceDelete
        )
    }

    /// Verb phrase used in the generated method's doc comment.
    pub fn verb_phrase(self) -> &'static str {
        match self {
            PolicyAction::ViewAny | PolicyAction::View => "view",
            PolicyAction::Create => "create",
            PolicyAction::Update => "update",
            PolicyAction::Delete | PolicyAction::DeleteAny => "delete",
            PolicyAction::Restore | PolicyAction::RestoreAny => "restore",
            PolicyAction::ForceDelete | PolicyAction::ForceDeleteAny => "permanently delete",
        }
    }
}

impl fmt::Display for PolicyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method_name())
    }
}

/// Role name to the set of actions that role may perform.
///
/// Backed by ordered collections so generated role lists are stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct RolePermissions(pub BTreeMap<String, BTreeSet<PolicyAction>>);

impl RolePermissions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(mut self, role: impl Into<String>, actions: &[PolicyAction]) -> Self {
        self.0
            .entry(role.into())
            .or_default()
            .extend(actions.iter().copied());
        self
    }

    /// Roles whose permission set contains `action`, in role-name order.
    pub fn roles_for(&self, action: PolicyAction) -> Vec<&str> {
        self.0
            .iter()
            .filter(|(_, actions)| actions.contains(&action))
            .map(|(role, _)| role.as_str())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}
