use warden_core::resource::{ResourceId, ResourceKind, ResourceRef, UserId};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    #[error("{child} cannot be attached to {parent}")]
    InvalidParent {
        child: ResourceRef,
        parent: ResourceRef,
    },
    #[error("internal storage error: {0}")]
    Internal(String),
}

/// Persistence of role assignments and the resource hierarchy.
///
/// Roles are stored by name; interpreting them is up to the caller.
pub trait AssignmentStore: Send + Sync {
    fn find_role(
        &self,
        kind: ResourceKind,
        user: &UserId,
        resource: &ResourceId,
    ) -> impl Future<Output = Result<Option<String>, StorageError>> + Send;

    fn find_parent(
        &self,
        kind: ResourceKind,
        resource: &ResourceId,
    ) -> impl Future<Output = Result<Option<ResourceRef>, StorageError>> + Send;

    /// Stores `role` for the user, returning the role it replaced.
    fn assign(
        &self,
        kind: ResourceKind,
        user: &UserId,
        resource: &ResourceId,
        role: &str,
    ) -> impl Future<Output = Result<Option<String>, StorageError>> + Send;

    fn unassign(
        &self,
        kind: ResourceKind,
        user: &UserId,
        resource: &ResourceId,
    ) -> impl Future<Output = Result<Option<String>, StorageError>> + Send;

    /// Removes the user's assignments on the workspace and on its documents.
    /// Returns the number of assignments removed.
    fn remove_member(
        &self,
        user: &UserId,
        workspace: &ResourceId,
    ) -> impl Future<Output = Result<usize, StorageError>> + Send;

    /// Sets the parent of `child`, returning the previous parent.
    fn attach(
        &self,
        child: &ResourceRef,
        parent: &ResourceRef,
    ) -> impl Future<Output = Result<Option<ResourceRef>, StorageError>> + Send;

    /// Deletes every assignment on the resource. Deleting a workspace also
    /// deletes its documents. Returns the number of assignments removed.
    fn delete_resource(
        &self,
        resource: &ResourceRef,
    ) -> impl Future<Output = Result<usize, StorageError>> + Send;
}
