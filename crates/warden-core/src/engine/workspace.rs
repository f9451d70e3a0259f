use std::sync::Arc;

use crate::action::Action;
use crate::cache::{CachedDecision, DecisionCache, DecisionKey};
use crate::decision::Decision;
use crate::error::AccessError;
use crate::resource::{ResourceId, ResourceKind, UserId};
use crate::role::{Role, WorkspaceRole};

use super::RoleReader;

pub struct WorkspaceAccessController<R: RoleReader> {
    reader: Arc<R>,
    cache: Arc<DecisionCache>,
}

impl<R: RoleReader> WorkspaceAccessController<R> {
    pub fn new(reader: Arc<R>, cache: Arc<DecisionCache>) -> Self {
        Self { reader, cache }
    }

    /// Explicit workspace role of `user`, bypassing the cache.
    pub async fn role_of(
        &self,
        user: &UserId,
        workspace: &ResourceId,
    ) -> Result<Option<WorkspaceRole>, AccessError> {
        let role = self
            .reader
            .find_role_assignment(ResourceKind::Workspace, user, workspace)
            .await?;

        match role {
            None => Ok(None),
            Some(Role::Workspace(role)) => Ok(Some(role)),
            Some(other) => Err(AccessError::UnknownRole {
                kind: ResourceKind::Workspace,
                role: other.name().to_string(),
            }),
        }
    }

    /// Decides without consulting or filling the cache.
    pub async fn evaluate(
        &self,
        user: &UserId,
        workspace: &ResourceId,
        action: Action,
    ) -> Result<Decision, AccessError> {
        let action = action.require_kind(ResourceKind::Workspace)?;
        let role = self.role_of(user, workspace).await?;
        Ok(Decision::evaluate(role.map(Role::Workspace), action))
    }

    pub async fn check(
        &self,
        user: &UserId,
        workspace: &ResourceId,
        action: Action,
    ) -> Result<Decision, AccessError> {
        let action = action.require_kind(ResourceKind::Workspace)?;
        let key = DecisionKey::new(user.clone(), workspace.clone(), action);

        let cached = self
            .cache
            .get_or_resolve(key, || async {
                let decision = self.evaluate(user, workspace, action).await?;
                Ok::<_, AccessError>(CachedDecision {
                    decision,
                    parent: None,
                })
            })
            .await?;

        tracing::debug!(
            user = %user,
            workspace = %workspace,
            action = %action,
            allowed = cached.decision.allowed,
            reason = %cached.decision.reason,
            "workspace access checked"
        );
        Ok(cached.decision)
    }

    pub async fn can(
        &self,
        user: &UserId,
        workspace: &ResourceId,
        action: Action,
    ) -> Result<bool, AccessError> {
        Ok(self.check(user, workspace, action).await?.allowed)
    }
}
