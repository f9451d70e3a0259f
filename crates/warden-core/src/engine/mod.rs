mod builder;
mod document;
mod workspace;

pub use builder::{AccessController, ResourceController, ResourceScope, UserScope};
pub use document::DocAccessController;
pub use workspace::WorkspaceAccessController;

use std::future::Future;

use crate::error::AccessError;
use crate::resource::{ResourceId, ResourceKind, ResourceRef, UserId};
use crate::role::Role;

/// Read side of the role assignment persistence, as the controllers see it.
///
/// Implementations must be side-effect free. Infrastructure failures are
/// reported as [`AccessError::Unavailable`], never as a missing assignment.
pub trait RoleReader: Send + Sync {
    fn find_role_assignment(
        &self,
        kind: ResourceKind,
        user: &UserId,
        resource: &ResourceId,
    ) -> impl Future<Output = Result<Option<Role>, AccessError>> + Send;

    fn find_parent_resource(
        &self,
        kind: ResourceKind,
        resource: &ResourceId,
    ) -> impl Future<Output = Result<Option<ResourceRef>, AccessError>> + Send;
}
