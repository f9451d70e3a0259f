use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use warden_core::resource::{ResourceId, ResourceKind, ResourceRef, UserId};

use crate::traits::{AssignmentStore, StorageError};

type AssignmentKey = (ResourceKind, UserId, ResourceId);

#[derive(Debug, Default)]
struct InnerState {
    assignments: HashMap<AssignmentKey, String>,
    parents: HashMap<ResourceId, ResourceId>,
}

impl InnerState {
    fn children_of(&self, workspace: &ResourceId) -> Vec<ResourceId> {
        self.parents
            .iter()
            .filter(|(_, parent)| *parent == workspace)
            .map(|(child, _)| child.clone())
            .collect()
    }

    fn remove_where<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&AssignmentKey) -> bool,
    {
        let before = self.assignments.len();
        self.assignments.retain(|key, _| !predicate(key));
        before - self.assignments.len()
    }
}

/// Documents are the only resources with a parent, and their parent is
/// always a workspace.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<InnerState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assignment_count(&self) -> Result<usize, StorageError> {
        Ok(self.lock()?.assignments.len())
    }

    fn lock(&self) -> Result<MutexGuard<'_, InnerState>, StorageError> {
        self.state
            .lock()
            .map_err(|e| StorageError::Internal(format!("state lock poisoned: {e}")))
    }
}

impl AssignmentStore for InMemoryStore {
    async fn find_role(
        &self,
        kind: ResourceKind,
        user: &UserId,
        resource: &ResourceId,
    ) -> Result<Option<String>, StorageError> {
        let state = self.lock()?;
        Ok(state
            .assignments
            .get(&(kind, user.clone(), resource.clone()))
            .cloned())
    }

    async fn find_parent(
        &self,
        kind: ResourceKind,
        resource: &ResourceId,
    ) -> Result<Option<ResourceRef>, StorageError> {
        if kind != ResourceKind::Document {
            return Ok(None);
        }
        let state = self.lock()?;
        Ok(state.parents.get(resource).map(|parent| ResourceRef {
            kind: ResourceKind::Workspace,
            id: parent.clone(),
        }))
    }

    async fn assign(
        &self,
        kind: ResourceKind,
        user: &UserId,
        resource: &ResourceId,
        role: &str,
    ) -> Result<Option<String>, StorageError> {
        let mut state = self.lock()?;
        Ok(state
            .assignments
            .insert((kind, user.clone(), resource.clone()), role.to_string()))
    }

    async fn unassign(
        &self,
        kind: ResourceKind,
        user: &UserId,
        resource: &ResourceId,
    ) -> Result<Option<String>, StorageError> {
        let mut state = self.lock()?;
        Ok(state
            .assignments
            .remove(&(kind, user.clone(), resource.clone())))
    }

    async fn remove_member(
        &self,
        user: &UserId,
        workspace: &ResourceId,
    ) -> Result<usize, StorageError> {
        let mut state = self.lock()?;
        let documents = state.children_of(workspace);

        Ok(state.remove_where(|(kind, assigned, resource)| {
            assigned == user
                && match kind {
                    ResourceKind::Workspace => resource == workspace,
                    ResourceKind::Document => documents.contains(resource),
                }
        }))
    }

    async fn attach(
        &self,
        child: &ResourceRef,
        parent: &ResourceRef,
    ) -> Result<Option<ResourceRef>, StorageError> {
        if child.kind != ResourceKind::Document || parent.kind != ResourceKind::Workspace {
            return Err(StorageError::InvalidParent {
                child: child.clone(),
                parent: parent.clone(),
            });
        }

        let mut state = self.lock()?;
        Ok(state
            .parents
            .insert(child.id.clone(), parent.id.clone())
            .map(|previous| ResourceRef {
                kind: ResourceKind::Workspace,
                id: previous,
            }))
    }

    async fn delete_resource(&self, resource: &ResourceRef) -> Result<usize, StorageError> {
        let mut state = self.lock()?;

        match resource.kind {
            ResourceKind::Document => {
                state.parents.remove(&resource.id);
                Ok(state.remove_where(|(kind, _, id)| {
                    *kind == ResourceKind::Document && *id == resource.id
                }))
            }
            ResourceKind::Workspace => {
                let documents = state.children_of(&resource.id);
                for doc in &documents {
                    state.parents.remove(doc);
                }
                Ok(state.remove_where(|(kind, _, id)| match kind {
                    ResourceKind::Workspace => *id == resource.id,
                    ResourceKind::Document => documents.contains(id),
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u(id: &str) -> UserId {
        UserId::new(id)
    }

    fn r(id: &str) -> ResourceId {
        ResourceId::new(id)
    }

    async fn seeded_store() -> InMemoryStore {
        let store = InMemoryStore::new();
        store
            .attach(&ResourceRef::document("d1"), &ResourceRef::workspace("w1"))
            .await
            .unwrap();
        store
            .attach(&ResourceRef::document("d2"), &ResourceRef::workspace("w2"))
            .await
            .unwrap();
        for (kind, user, resource, role) in [
            (ResourceKind::Workspace, "u1", "w1", "Collaborator"),
            (ResourceKind::Workspace, "u2", "w1", "Owner"),
            (ResourceKind::Workspace, "u1", "w2", "Admin"),
            (ResourceKind::Document, "u1", "d1", "Admin"),
            (ResourceKind::Document, "u2", "d1", "Reader"),
            (ResourceKind::Document, "u1", "d2", "Reader"),
        ] {
            store.assign(kind, &u(user), &r(resource), role).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn assign_then_find_role() {
        let store = InMemoryStore::new();

        let previous = store
            .assign(ResourceKind::Workspace, &u("u1"), &r("w1"), "Admin")
            .await
            .unwrap();

        assert_eq!(previous, None);
        assert_eq!(
            store
                .find_role(ResourceKind::Workspace, &u("u1"), &r("w1"))
                .await
                .unwrap()
                .as_deref(),
            Some("Admin")
        );
    }

    #[tokio::test]
    async fn assign_replaces_previous_role() {
        let store = InMemoryStore::new();
        store
            .assign(ResourceKind::Workspace, &u("u1"), &r("w1"), "Collaborator")
            .await
            .unwrap();

        let previous = store
            .assign(ResourceKind::Workspace, &u("u1"), &r("w1"), "Owner")
            .await
            .unwrap();

        assert_eq!(previous.as_deref(), Some("Collaborator"));
        assert_eq!(store.assignment_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn kinds_do_not_share_assignments() {
        let store = InMemoryStore::new();
        store
            .assign(ResourceKind::Workspace, &u("u1"), &r("x"), "Owner")
            .await
            .unwrap();

        let role = store
            .find_role(ResourceKind::Document, &u("u1"), &r("x"))
            .await
            .unwrap();

        assert_eq!(role, None);
    }

    #[tokio::test]
    async fn unassign_returns_removed_role() {
        let store = seeded_store().await;

        let removed = store
            .unassign(ResourceKind::Document, &u("u1"), &r("d1"))
            .await
            .unwrap();
        let again = store
            .unassign(ResourceKind::Document, &u("u1"), &r("d1"))
            .await
            .unwrap();

        assert_eq!(removed.as_deref(), Some("Admin"));
        assert_eq!(again, None);
    }

    #[tokio::test]
    async fn find_parent_only_for_documents() {
        let store = seeded_store().await;

        assert_eq!(
            store.find_parent(ResourceKind::Document, &r("d1")).await.unwrap(),
            Some(ResourceRef::workspace("w1"))
        );
        assert_eq!(
            store.find_parent(ResourceKind::Workspace, &r("w1")).await.unwrap(),
            None
        );
        assert_eq!(
            store.find_parent(ResourceKind::Document, &r("nope")).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn attach_returns_previous_parent() {
        let store = seeded_store().await;

        let previous = store
            .attach(&ResourceRef::document("d1"), &ResourceRef::workspace("w2"))
            .await
            .unwrap();

        assert_eq!(previous, Some(ResourceRef::workspace("w1")));
        assert_eq!(
            store.find_parent(ResourceKind::Document, &r("d1")).await.unwrap(),
            Some(ResourceRef::workspace("w2"))
        );
    }

    #[tokio::test]
    async fn attach_rejects_invalid_hierarchy() {
        let store = InMemoryStore::new();

        let err = store
            .attach(&ResourceRef::workspace("w1"), &ResourceRef::workspace("w2"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidParent { .. }));

        let err = store
            .attach(&ResourceRef::document("d1"), &ResourceRef::document("d2"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "document:d1 cannot be attached to document:d2");
    }

    #[tokio::test]
    async fn remove_member_drops_workspace_and_document_assignments_of_user() {
        let store = seeded_store().await;

        let removed = store.remove_member(&u("u1"), &r("w1")).await.unwrap();

        assert_eq!(removed, 2);
        assert_eq!(
            store
                .find_role(ResourceKind::Document, &u("u2"), &r("d1"))
                .await
                .unwrap()
                .as_deref(),
            Some("Reader")
        );
        assert_eq!(
            store
                .find_role(ResourceKind::Document, &u("u1"), &r("d2"))
                .await
                .unwrap()
                .as_deref(),
            Some("Reader")
        );
    }

    #[tokio::test]
    async fn delete_workspace_cascades_to_documents() {
        let store = seeded_store().await;

        let removed = store
            .delete_resource(&ResourceRef::workspace("w1"))
            .await
            .unwrap();

        assert_eq!(removed, 4);
        assert_eq!(
            store.find_parent(ResourceKind::Document, &r("d1")).await.unwrap(),
            None
        );
        assert_eq!(store.assignment_count().unwrap(), 2);
    }

    #[tokio::test]
    async fn delete_document_keeps_workspace_assignments() {
        let store = seeded_store().await;

        let removed = store
            .delete_resource(&ResourceRef::document("d1"))
            .await
            .unwrap();

        assert_eq!(removed, 2);
        assert_eq!(
            store
                .find_role(ResourceKind::Workspace, &u("u1"), &r("w1"))
                .await
                .unwrap()
                .as_deref(),
            Some("Collaborator")
        );
    }
}
