use std::collections::HashMap;
use std::sync::Arc;

use crate::action::Action;
use crate::cache::DecisionCache;
use crate::decision::Decision;
use crate::error::AccessError;
use crate::resource::{ResourceId, ResourceKind, UserId};
use crate::role::Role;

use super::{DocAccessController, RoleReader, WorkspaceAccessController};

pub enum ResourceController<R: RoleReader> {
    Workspace(WorkspaceAccessController<R>),
    Document(DocAccessController<R>),
}

impl<R: RoleReader> ResourceController<R> {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceController::Workspace(_) => ResourceKind::Workspace,
            ResourceController::Document(_) => ResourceKind::Document,
        }
    }

    pub async fn role_of(
        &self,
        user: &UserId,
        resource: &ResourceId,
    ) -> Result<Option<Role>, AccessError> {
        match self {
            ResourceController::Workspace(c) => {
                Ok(c.role_of(user, resource).await?.map(Role::Workspace))
            }
            ResourceController::Document(c) => {
                Ok(c.role_of(user, resource).await?.map(Role::Document))
            }
        }
    }

    pub async fn check(
        &self,
        user: &UserId,
        resource: &ResourceId,
        via: Option<&ResourceId>,
        action: Action,
    ) -> Result<Decision, AccessError> {
        match self {
            ResourceController::Workspace(c) => {
                if via.is_some() {
                    action.require_kind(ResourceKind::Workspace)?;
                    return Ok(Decision::out_of_scope());
                }
                c.check(user, resource, action).await
            }
            ResourceController::Document(c) => c.check_in(user, via, resource, action).await,
        }
    }
}

/// Single query surface over the per-kind controllers.
///
/// ```ignore
/// access.user(&user).workspace(&workspace).can(WorkspaceAction::Read).await?;
/// access.user(&user).doc(&doc).via(&workspace).can(DocAction::Write).await?;
/// ```
pub struct AccessController<R: RoleReader> {
    controllers: HashMap<ResourceKind, ResourceController<R>>,
}

impl<R: RoleReader> AccessController<R> {
    /// Registers a controller for every resource kind.
    pub fn new(reader: Arc<R>, cache: Arc<DecisionCache>) -> Self {
        Self::empty()
            .register(ResourceController::Workspace(WorkspaceAccessController::new(
                Arc::clone(&reader),
                Arc::clone(&cache),
            )))
            .register(ResourceController::Document(DocAccessController::new(
                reader, cache,
            )))
    }

    pub fn empty() -> Self {
        Self {
            controllers: HashMap::new(),
        }
    }

    pub fn register(mut self, controller: ResourceController<R>) -> Self {
        self.controllers.insert(controller.kind(), controller);
        self
    }

    pub fn controller(&self, kind: ResourceKind) -> Result<&ResourceController<R>, AccessError> {
        self.controllers
            .get(&kind)
            .ok_or(AccessError::UnsupportedResourceKind(kind))
    }

    pub fn user<'a>(&'a self, user: &'a UserId) -> UserScope<'a, R> {
        UserScope { access: self, user }
    }

    pub async fn check(
        &self,
        user: &UserId,
        kind: ResourceKind,
        resource: &ResourceId,
        via: Option<&ResourceId>,
        action: Action,
    ) -> Result<Decision, AccessError> {
        self.controller(kind)?
            .check(user, resource, via, action)
            .await
    }

    pub async fn can(
        &self,
        user: &UserId,
        kind: ResourceKind,
        resource: &ResourceId,
        action: Action,
    ) -> Result<bool, AccessError> {
        Ok(self.check(user, kind, resource, None, action).await?.allowed)
    }

    pub async fn role_of(
        &self,
        user: &UserId,
        kind: ResourceKind,
        resource: &ResourceId,
    ) -> Result<Option<Role>, AccessError> {
        self.controller(kind)?.role_of(user, resource).await
    }
}

pub struct UserScope<'a, R: RoleReader> {
    access: &'a AccessController<R>,
    user: &'a UserId,
}

impl<'a, R: RoleReader> UserScope<'a, R> {
    pub fn on(self, kind: ResourceKind, resource: &'a ResourceId) -> ResourceScope<'a, R> {
        ResourceScope {
            access: self.access,
            user: self.user,
            kind,
            resource,
            via: None,
        }
    }

    pub fn on_named(
        self,
        kind: &str,
        resource: &'a ResourceId,
    ) -> Result<ResourceScope<'a, R>, AccessError> {
        Ok(self.on(kind.parse()?, resource))
    }

    pub fn workspace(self, workspace: &'a ResourceId) -> ResourceScope<'a, R> {
        self.on(ResourceKind::Workspace, workspace)
    }

    pub fn doc(self, doc: &'a ResourceId) -> ResourceScope<'a, R> {
        self.on(ResourceKind::Document, doc)
    }
}

pub struct ResourceScope<'a, R: RoleReader> {
    access: &'a AccessController<R>,
    user: &'a UserId,
    kind: ResourceKind,
    resource: &'a ResourceId,
    via: Option<&'a ResourceId>,
}

impl<'a, R: RoleReader> ResourceScope<'a, R> {
    /// Restricts the query to resources under `parent`.
    pub fn via(mut self, parent: &'a ResourceId) -> Self {
        self.via = Some(parent);
        self
    }

    pub async fn check(&self, action: impl Into<Action>) -> Result<Decision, AccessError> {
        self.access
            .check(self.user, self.kind, self.resource, self.via, action.into())
            .await
    }

    pub async fn can(&self, action: impl Into<Action>) -> Result<bool, AccessError> {
        Ok(self.check(action).await?.allowed)
    }

    /// Fail-closed form of [`can`](Self::can): any error is logged and denies.
    pub async fn permits(&self, action: impl Into<Action>) -> bool {
        let action = action.into();
        match self.check(action).await {
            Ok(decision) => decision.allowed,
            Err(err) if err.is_retryable() => {
                tracing::warn!(
                    user = %self.user,
                    kind = %self.kind,
                    resource = %self.resource,
                    action = %action,
                    error = %err,
                    "access check unavailable, denying"
                );
                false
            }
            Err(err) => {
                tracing::error!(
                    user = %self.user,
                    kind = %self.kind,
                    resource = %self.resource,
                    action = %action,
                    error = %err,
                    "invalid access check, denying"
                );
                false
            }
        }
    }

    pub async fn role(&self) -> Result<Option<Role>, AccessError> {
        self.access.role_of(self.user, self.kind, self.resource).await
    }
}
