//! Closed action catalogs per resource kind.
//!
//! Adding an action means extending one of the enums below and granting it to
//! a role in [`crate::role`]; nothing else consults the variants directly.

use std::fmt;

use crate::error::AccessError;
use crate::resource::ResourceKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WorkspaceAction {
    Read,
    Write,
    Manage,
    Delete,
}

impl WorkspaceAction {
    pub const ALL: [WorkspaceAction; 4] = [
        WorkspaceAction::Read,
        WorkspaceAction::Write,
        WorkspaceAction::Manage,
        WorkspaceAction::Delete,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            WorkspaceAction::Read => "Read",
            WorkspaceAction::Write => "Write",
            WorkspaceAction::Manage => "Manage",
            WorkspaceAction::Delete => "Delete",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DocAction {
    Read,
    Comment,
    Write,
    Publish,
    Manage,
    Delete,
}

impl DocAction {
    pub const ALL: [DocAction; 6] = [
        DocAction::Read,
        DocAction::Comment,
        DocAction::Write,
        DocAction::Publish,
        DocAction::Manage,
        DocAction::Delete,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DocAction::Read => "Read",
            DocAction::Comment => "Comment",
            DocAction::Write => "Write",
            DocAction::Publish => "Publish",
            DocAction::Manage => "Manage",
            DocAction::Delete => "Delete",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Action {
    Workspace(WorkspaceAction),
    Document(DocAction),
}

impl Action {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Action::Workspace(_) => ResourceKind::Workspace,
            Action::Document(_) => ResourceKind::Document,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Action::Workspace(a) => a.name(),
            Action::Document(a) => a.name(),
        }
    }

    /// Parses a bare (`Read`) or qualified (`Workspace.Read`, `Doc.Read`) action name.
    pub fn parse(kind: ResourceKind, name: &str) -> Result<Action, AccessError> {
        let bare = match name.split_once('.') {
            Some((prefix, rest)) if qualifier(kind).eq_ignore_ascii_case(prefix) => rest,
            Some(_) => return Err(invalid(kind, name)),
            None => name,
        };

        ActionRegistry::catalog(kind)
            .iter()
            .find(|a| a.name().eq_ignore_ascii_case(bare))
            .copied()
            .ok_or_else(|| invalid(kind, name))
    }

    /// Rejects an action that belongs to a different resource kind.
    pub fn require_kind(self, kind: ResourceKind) -> Result<Action, AccessError> {
        if self.kind() == kind {
            Ok(self)
        } else {
            Err(AccessError::InvalidAction {
                kind,
                action: self.to_string(),
            })
        }
    }
}

impl From<WorkspaceAction> for Action {
    fn from(action: WorkspaceAction) -> Self {
        Action::Workspace(action)
    }
}

impl From<DocAction> for Action {
    fn from(action: DocAction) -> Self {
        Action::Document(action)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", qualifier(self.kind()), self.name())
    }
}

fn qualifier(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::Workspace => "Workspace",
        ResourceKind::Document => "Doc",
    }
}

fn invalid(kind: ResourceKind, name: &str) -> AccessError {
    AccessError::InvalidAction {
        kind,
        action: name.to_string(),
    }
}

const WORKSPACE_CATALOG: [Action; WorkspaceAction::ALL.len()] = {
    let mut catalog = [Action::Workspace(WorkspaceAction::Read); WorkspaceAction::ALL.len()];
    let mut i = 0;
    while i < catalog.len() {
        catalog[i] = Action::Workspace(WorkspaceAction::ALL[i]);
        i += 1;
    }
    catalog
};

const DOCUMENT_CATALOG: [Action; DocAction::ALL.len()] = {
    let mut catalog = [Action::Document(DocAction::Read); DocAction::ALL.len()];
    let mut i = 0;
    while i < catalog.len() {
        catalog[i] = Action::Document(DocAction::ALL[i]);
        i += 1;
    }
    catalog
};

pub struct ActionRegistry;

impl ActionRegistry {
    pub fn catalog(kind: ResourceKind) -> &'static [Action] {
        match kind {
            ResourceKind::Workspace => &WORKSPACE_CATALOG,
            ResourceKind::Document => &DOCUMENT_CATALOG,
        }
    }

    pub fn actions(kind: &str) -> Result<&'static [Action], AccessError> {
        let kind: ResourceKind = kind.parse()?;
        Ok(Self::catalog(kind))
    }

    pub fn is_valid_action(kind: ResourceKind, name: &str) -> bool {
        Action::parse(kind, name).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogs_list_every_variant() {
        assert_eq!(
            ActionRegistry::catalog(ResourceKind::Workspace).len(),
            WorkspaceAction::ALL.len()
        );
        assert_eq!(
            ActionRegistry::catalog(ResourceKind::Document).len(),
            DocAction::ALL.len()
        );
        for action in ActionRegistry::catalog(ResourceKind::Document) {
            assert_eq!(action.kind(), ResourceKind::Document);
        }
    }

    #[test]
    fn catalogs_follow_variant_order() {
        let workspace: Vec<Action> = WorkspaceAction::ALL.into_iter().map(Action::from).collect();
        let document: Vec<Action> = DocAction::ALL.into_iter().map(Action::from).collect();

        assert_eq!(ActionRegistry::catalog(ResourceKind::Workspace), workspace.as_slice());
        assert_eq!(ActionRegistry::catalog(ResourceKind::Document), document.as_slice());
    }

    #[test]
    fn actions_by_name_rejects_unknown_kind() {
        let err = ActionRegistry::actions("folder").unwrap_err();
        assert!(
            matches!(err, AccessError::UnknownResourceKind(ref k) if k == "folder"),
            "expected UnknownResourceKind, got: {err}"
        );
    }

    #[test]
    fn is_valid_action_checks_membership_per_kind() {
        assert!(ActionRegistry::is_valid_action(ResourceKind::Workspace, "Read"));
        assert!(ActionRegistry::is_valid_action(ResourceKind::Document, "Publish"));
        assert!(!ActionRegistry::is_valid_action(ResourceKind::Workspace, "Publish"));
        assert!(!ActionRegistry::is_valid_action(ResourceKind::Document, "Fly"));
    }

    #[test]
    fn parse_accepts_bare_and_qualified_names() {
        assert_eq!(
            Action::parse(ResourceKind::Workspace, "read").unwrap(),
            Action::Workspace(WorkspaceAction::Read)
        );
        assert_eq!(
            Action::parse(ResourceKind::Document, "Doc.Comment").unwrap(),
            Action::Document(DocAction::Comment)
        );
    }

    #[test]
    fn parse_rejects_qualifier_of_other_kind() {
        let err = Action::parse(ResourceKind::Document, "Workspace.Read").unwrap_err();
        assert!(matches!(
            err,
            AccessError::InvalidAction { kind: ResourceKind::Document, .. }
        ));
    }

    #[test]
    fn require_kind_rejects_foreign_action() {
        let action = Action::Document(DocAction::Write);

        assert!(action.require_kind(ResourceKind::Document).is_ok());
        let err = action.require_kind(ResourceKind::Workspace).unwrap_err();
        assert_eq!(err.to_string(), "action 'Doc.Write' is not valid for workspace");
    }

    #[test]
    fn display_is_qualified() {
        assert_eq!(
            Action::from(WorkspaceAction::Manage).to_string(),
            "Workspace.Manage"
        );
        assert_eq!(Action::from(DocAction::Read).to_string(), "Doc.Read");
    }
}
