use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use warden_core::cache::{CacheConfig, DecisionCache};
use warden_core::engine::AccessController;
use warden_core::events::{self, DomainEvent, EventPublisher};
use warden_core::invalidation::InvalidationListener;
use warden_core::resource::{ResourceId, ResourceKind, ResourceRef, UserId};
use warden_core::action::WorkspaceAction;
use warden_core::error::AccessError;
use warden_core::role::Role;
use warden_storage::AssignmentStore;

use crate::adapter::StoreRoleReader;
use crate::error::ServiceError;
use crate::sweep::spawn_sweeper;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub cache: CacheConfig,
    pub sweep_interval: Duration,
    pub channel_capacity: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            sweep_interval: Duration::from_secs(60),
            channel_capacity: 256,
        }
    }
}

/// Wires a store to the access controllers, the decision cache and its
/// background tasks.
///
/// Every membership operation writes the store first, then waits until the
/// invalidation listener has evicted the affected decisions, so a check issued
/// after the call returns observes the change.
pub struct AuthzService<S: AssignmentStore> {
    store: Arc<S>,
    cache: Arc<DecisionCache>,
    access: AccessController<StoreRoleReader<S>>,
    publisher: EventPublisher,
    listener: JoinHandle<()>,
    sweeper: JoinHandle<()>,
}

impl<S: AssignmentStore> AuthzService<S> {
    /// Must be called from within a Tokio runtime.
    pub fn start(store: Arc<S>, config: &ServiceConfig) -> Self {
        let cache = Arc::new(DecisionCache::new(config.cache.clone()));
        let reader = Arc::new(StoreRoleReader::new(Arc::clone(&store)));
        let access = AccessController::new(reader, Arc::clone(&cache));

        let (publisher, events) = events::channel(config.channel_capacity);
        let listener = InvalidationListener::new(Arc::clone(&cache)).spawn(events);
        let sweeper = spawn_sweeper(Arc::clone(&cache), config.sweep_interval);

        tracing::info!(
            ttl_secs = config.cache.ttl.as_secs(),
            sweep_interval_secs = config.sweep_interval.as_secs(),
            channel_capacity = config.channel_capacity,
            "authorization service started"
        );

        Self {
            store,
            cache,
            access,
            publisher,
            listener,
            sweeper,
        }
    }

    pub fn access(&self) -> &AccessController<StoreRoleReader<S>> {
        &self.access
    }

    pub fn cache(&self) -> &Arc<DecisionCache> {
        &self.cache
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Minimal membership test: whether `user` may read `workspace`.
    pub async fn is_workspace_member(
        &self,
        workspace: &ResourceId,
        user: &UserId,
    ) -> Result<bool, AccessError> {
        self.access
            .user(user)
            .workspace(workspace)
            .can(WorkspaceAction::Read)
            .await
    }

    /// Assigns `role` (parsed for the resource's kind) and returns it.
    pub async fn grant_role(
        &self,
        user: &UserId,
        resource: &ResourceRef,
        role: &str,
    ) -> Result<Role, ServiceError> {
        let role = Role::parse(resource.kind, role)?;
        let previous = self
            .store
            .assign(resource.kind, user, &resource.id, role.name())
            .await?;

        let removed = self
            .publisher
            .publish_and_wait(DomainEvent::role_granted(user.clone(), resource.clone()))
            .await?;

        tracing::info!(
            user = %user,
            resource = %resource,
            role = %role,
            previous = previous.as_deref().unwrap_or("-"),
            evicted = removed,
            "role granted"
        );
        Ok(role)
    }

    /// Returns whether an assignment existed.
    pub async fn revoke_role(
        &self,
        user: &UserId,
        resource: &ResourceRef,
    ) -> Result<bool, ServiceError> {
        let previous = self
            .store
            .unassign(resource.kind, user, &resource.id)
            .await?;

        let removed = self
            .publisher
            .publish_and_wait(DomainEvent::role_revoked(user.clone(), resource.clone()))
            .await?;

        tracing::info!(
            user = %user,
            resource = %resource,
            existed = previous.is_some(),
            evicted = removed,
            "role revoked"
        );
        Ok(previous.is_some())
    }

    /// Removes the user from the workspace and from its documents. Returns the
    /// number of assignments deleted.
    pub async fn remove_member(
        &self,
        user: &UserId,
        workspace: &ResourceId,
    ) -> Result<usize, ServiceError> {
        let deleted = self.store.remove_member(user, workspace).await?;

        let removed = self
            .publisher
            .publish_and_wait(DomainEvent::membership_removed(
                user.clone(),
                workspace.clone(),
            ))
            .await?;

        tracing::info!(
            user = %user,
            workspace = %workspace,
            assignments = deleted,
            evicted = removed,
            "member removed"
        );
        Ok(deleted)
    }

    pub async fn delete_resource(&self, resource: &ResourceRef) -> Result<usize, ServiceError> {
        let deleted = self.store.delete_resource(resource).await?;

        let removed = self
            .publisher
            .publish_and_wait(DomainEvent::resource_deleted(resource.clone()))
            .await?;

        tracing::info!(
            resource = %resource,
            assignments = deleted,
            evicted = removed,
            "resource deleted"
        );
        Ok(deleted)
    }

    /// Places `doc` under `workspace`, returning its previous workspace.
    pub async fn attach_document(
        &self,
        doc: &ResourceId,
        workspace: &ResourceId,
    ) -> Result<Option<ResourceId>, ServiceError> {
        let child = ResourceRef {
            kind: ResourceKind::Document,
            id: doc.clone(),
        };
        let parent = ResourceRef {
            kind: ResourceKind::Workspace,
            id: workspace.clone(),
        };
        let previous = self.store.attach(&child, &parent).await?;

        let removed = self
            .publisher
            .publish_and_wait(DomainEvent::resource_moved(child))
            .await?;

        tracing::debug!(
            document = %doc,
            workspace = %workspace,
            evicted = removed,
            "document attached"
        );
        Ok(previous.map(|p| p.id))
    }

    /// Stops the sweeper and waits for the listener to drain pending events.
    pub async fn shutdown(self) {
        let Self {
            publisher,
            listener,
            sweeper,
            ..
        } = self;

        sweeper.abort();
        drop(publisher);
        if let Err(e) = listener.await {
            tracing::error!(error = %e, "invalidation listener failed");
        }
    }
}
