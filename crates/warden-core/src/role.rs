//! Roles, their rank order, and the role to action grant tables.
//!
//! Grants are listed incrementally: a role is allowed everything in its own row
//! plus everything allowed to any lower-ranked role of the same kind. The
//! derived sets are therefore monotonic in rank by construction.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::LazyLock;

use crate::action::{Action, DocAction, WorkspaceAction};
use crate::error::AccessError;
use crate::resource::ResourceKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkspaceRole {
    None,
    Collaborator,
    Admin,
    Owner,
}

impl WorkspaceRole {
    pub const ALL: [WorkspaceRole; 4] = [
        WorkspaceRole::None,
        WorkspaceRole::Collaborator,
        WorkspaceRole::Admin,
        WorkspaceRole::Owner,
    ];

    pub fn rank(&self) -> i16 {
        match self {
            WorkspaceRole::None => 0,
            WorkspaceRole::Collaborator => 10,
            WorkspaceRole::Admin => 20,
            WorkspaceRole::Owner => 99,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            WorkspaceRole::None => "None",
            WorkspaceRole::Collaborator => "Collaborator",
            WorkspaceRole::Admin => "Admin",
            WorkspaceRole::Owner => "Owner",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocRole {
    None,
    Reader,
    Collaborator,
    Admin,
    Owner,
}

impl DocRole {
    pub const ALL: [DocRole; 5] = [
        DocRole::None,
        DocRole::Reader,
        DocRole::Collaborator,
        DocRole::Admin,
        DocRole::Owner,
    ];

    pub fn rank(&self) -> i16 {
        match self {
            DocRole::None => 0,
            DocRole::Reader => 10,
            DocRole::Collaborator => 20,
            DocRole::Admin => 30,
            DocRole::Owner => 99,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DocRole::None => "None",
            DocRole::Reader => "Reader",
            DocRole::Collaborator => "Collaborator",
            DocRole::Admin => "Admin",
            DocRole::Owner => "Owner",
        }
    }
}

/// Role a workspace member holds on the workspace's documents when the
/// document carries no grant of its own.
impl From<WorkspaceRole> for DocRole {
    fn from(role: WorkspaceRole) -> Self {
        match role {
            WorkspaceRole::None => DocRole::None,
            WorkspaceRole::Collaborator => DocRole::Collaborator,
            WorkspaceRole::Admin => DocRole::Admin,
            WorkspaceRole::Owner => DocRole::Owner,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Workspace(WorkspaceRole),
    Document(DocRole),
}

impl Role {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Role::Workspace(_) => ResourceKind::Workspace,
            Role::Document(_) => ResourceKind::Document,
        }
    }

    pub fn rank(&self) -> i16 {
        match self {
            Role::Workspace(r) => r.rank(),
            Role::Document(r) => r.rank(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Role::Workspace(r) => r.name(),
            Role::Document(r) => r.name(),
        }
    }

    pub fn parse(kind: ResourceKind, name: &str) -> Result<Role, AccessError> {
        role_model()
            .roles(kind)
            .iter()
            .find(|r| r.name().eq_ignore_ascii_case(name))
            .copied()
            .ok_or_else(|| AccessError::UnknownRole {
                kind,
                role: name.to_string(),
            })
    }
}

impl From<WorkspaceRole> for Role {
    fn from(role: WorkspaceRole) -> Self {
        Role::Workspace(role)
    }
}

impl From<DocRole> for Role {
    fn from(role: DocRole) -> Self {
        Role::Document(role)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

const WORKSPACE_GRANTS: &[(WorkspaceRole, &[WorkspaceAction])] = &[
    (WorkspaceRole::None, &[]),
    (WorkspaceRole::Collaborator, &[WorkspaceAction::Read]),
    (WorkspaceRole::Admin, &[WorkspaceAction::Write]),
    (
        WorkspaceRole::Owner,
        &[WorkspaceAction::Manage, WorkspaceAction::Delete],
    ),
];

const DOCUMENT_GRANTS: &[(DocRole, &[DocAction])] = &[
    (DocRole::None, &[]),
    (DocRole::Reader, &[DocAction::Read]),
    (DocRole::Collaborator, &[DocAction::Comment]),
    (
        DocRole::Admin,
        &[DocAction::Write, DocAction::Publish, DocAction::Manage],
    ),
    (DocRole::Owner, &[DocAction::Delete]),
];

static ROLE_MODEL: LazyLock<RoleModel> = LazyLock::new(RoleModel::build);

/// Process-wide role model, derived on first use and never mutated.
pub fn role_model() -> &'static RoleModel {
    &ROLE_MODEL
}

#[derive(Debug)]
pub struct RoleModel {
    roles: HashMap<ResourceKind, Vec<Role>>,
    allowed: HashMap<Role, HashSet<Action>>,
}

impl RoleModel {
    fn build() -> Self {
        let workspace: Vec<(Role, Vec<Action>)> = WORKSPACE_GRANTS
            .iter()
            .map(|(role, actions)| {
                let actions = actions.iter().copied().map(Action::Workspace).collect();
                (Role::Workspace(*role), actions)
            })
            .collect();
        let document: Vec<(Role, Vec<Action>)> = DOCUMENT_GRANTS
            .iter()
            .map(|(role, actions)| {
                let actions = actions.iter().copied().map(Action::Document).collect();
                (Role::Document(*role), actions)
            })
            .collect();

        let mut model = Self {
            roles: HashMap::new(),
            allowed: HashMap::new(),
        };
        model.accumulate(ResourceKind::Workspace, workspace);
        model.accumulate(ResourceKind::Document, document);
        model
    }

    fn accumulate(&mut self, kind: ResourceKind, mut grants: Vec<(Role, Vec<Action>)>) {
        grants.sort_by_key(|(role, _)| role.rank());

        let mut inherited = HashSet::new();
        let mut ordered = Vec::with_capacity(grants.len());
        for (role, actions) in grants {
            inherited.extend(actions);
            self.allowed.insert(role, inherited.clone());
            ordered.push(role);
        }
        self.roles.insert(kind, ordered);
    }

    /// Roles of `kind` from least to most privileged.
    pub fn roles(&self, kind: ResourceKind) -> &[Role] {
        self.roles.get(&kind).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn rank(&self, kind: ResourceKind, role: &str) -> Result<i16, AccessError> {
        Ok(Role::parse(kind, role)?.rank())
    }

    pub fn compare(&self, kind: ResourceKind, a: &str, b: &str) -> Result<Ordering, AccessError> {
        Ok(self.rank(kind, a)?.cmp(&self.rank(kind, b)?))
    }

    /// Roles and actions of different kinds never allow.
    pub fn allows(&self, role: Role, action: Action) -> bool {
        role.kind() == action.kind()
            && self
                .allowed
                .get(&role)
                .is_some_and(|actions| actions.contains(&action))
    }

    pub fn allowed_actions(&self, role: Role) -> Vec<Action> {
        let mut actions: Vec<Action> = self
            .allowed
            .get(&role)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        actions.sort();
        actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionRegistry;

    #[test]
    fn every_role_has_a_grant_row() {
        let model = role_model();

        assert_eq!(
            model.roles(ResourceKind::Workspace).len(),
            WorkspaceRole::ALL.len()
        );
        assert_eq!(model.roles(ResourceKind::Document).len(), DocRole::ALL.len());
    }

    #[test]
    fn roles_are_listed_in_rank_order() {
        for kind in ResourceKind::ALL {
            let ranks: Vec<i16> = role_model().roles(kind).iter().map(Role::rank).collect();
            let mut sorted = ranks.clone();
            sorted.sort();
            sorted.dedup();
            assert_eq!(ranks, sorted, "ranks of {kind} must be strictly increasing");
        }
    }

    #[test]
    fn higher_roles_allow_everything_lower_roles_allow() {
        let model = role_model();

        for kind in ResourceKind::ALL {
            for low in model.roles(kind) {
                for high in model.roles(kind) {
                    if low.rank() >= high.rank() {
                        continue;
                    }
                    for action in ActionRegistry::catalog(kind) {
                        if model.allows(*low, *action) {
                            assert!(
                                model.allows(*high, *action),
                                "{high} must allow {action} because {low} does"
                            );
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn workspace_grant_table_matches_product_roles() {
        let model = role_model();
        let allowed = |role| model.allowed_actions(Role::Workspace(role));

        assert!(allowed(WorkspaceRole::None).is_empty());
        assert_eq!(
            allowed(WorkspaceRole::Collaborator),
            vec![Action::Workspace(WorkspaceAction::Read)]
        );
        assert_eq!(
            allowed(WorkspaceRole::Admin),
            vec![
                Action::Workspace(WorkspaceAction::Read),
                Action::Workspace(WorkspaceAction::Write)
            ]
        );
        assert_eq!(allowed(WorkspaceRole::Owner).len(), 4);
    }

    #[test]
    fn document_owner_allows_every_document_action() {
        let model = role_model();

        for action in ActionRegistry::catalog(ResourceKind::Document) {
            assert!(model.allows(Role::Document(DocRole::Owner), *action));
        }
    }

    #[test]
    fn allows_rejects_mismatched_kinds() {
        let model = role_model();

        assert!(!model.allows(
            Role::Workspace(WorkspaceRole::Owner),
            Action::Document(DocAction::Read)
        ));
    }

    #[test]
    fn rank_and_compare_by_name() {
        let model = role_model();

        assert_eq!(model.rank(ResourceKind::Workspace, "Owner").unwrap(), 99);
        assert_eq!(
            model
                .compare(ResourceKind::Document, "reader", "Admin")
                .unwrap(),
            Ordering::Less
        );
        assert_eq!(
            model
                .compare(ResourceKind::Workspace, "Admin", "admin")
                .unwrap(),
            Ordering::Equal
        );
    }

    #[test]
    fn rank_rejects_role_of_other_kind() {
        let err = role_model()
            .rank(ResourceKind::Workspace, "Reader")
            .unwrap_err();
        assert!(
            matches!(err, AccessError::UnknownRole { kind: ResourceKind::Workspace, ref role } if role == "Reader"),
            "expected UnknownRole, got: {err}"
        );
    }

    #[test]
    fn inherited_document_role_keeps_the_workspace_name() {
        for role in WorkspaceRole::ALL {
            assert_eq!(DocRole::from(role).name(), role.name());
        }
    }
}
