use std::sync::Arc;

use warden_core::engine::RoleReader;
use warden_core::error::AccessError;
use warden_core::resource::{ResourceId, ResourceKind, ResourceRef, UserId};
use warden_core::role::Role;
use warden_storage::{AssignmentStore, StorageError};

fn unavailable(e: StorageError) -> AccessError {
    AccessError::Unavailable(e.to_string())
}

pub struct StoreRoleReader<S: AssignmentStore> {
    store: Arc<S>,
}

impl<S: AssignmentStore> StoreRoleReader<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

impl<S: AssignmentStore> RoleReader for StoreRoleReader<S> {
    async fn find_role_assignment(
        &self,
        kind: ResourceKind,
        user: &UserId,
        resource: &ResourceId,
    ) -> Result<Option<Role>, AccessError> {
        let stored = self
            .store
            .find_role(kind, user, resource)
            .await
            .map_err(unavailable)?;

        stored.map(|name| Role::parse(kind, &name)).transpose()
    }

    async fn find_parent_resource(
        &self,
        kind: ResourceKind,
        resource: &ResourceId,
    ) -> Result<Option<ResourceRef>, AccessError> {
        self.store
            .find_parent(kind, resource)
            .await
            .map_err(unavailable)
    }
}
