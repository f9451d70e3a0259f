use std::sync::Arc;

use crate::action::Action;
use crate::cache::{CachedDecision, DecisionCache, DecisionKey};
use crate::decision::Decision;
use crate::error::AccessError;
use crate::resource::{ResourceId, ResourceKind, UserId};
use crate::role::{DocRole, Role};

use super::{RoleReader, WorkspaceAccessController};

struct Resolution {
    role: Option<DocRole>,
    parent: Option<ResourceId>,
}

/// Resolves document access. A document-level assignment replaces whatever
/// the user holds on the parent workspace; without one, the workspace role
/// carries over under the same name.
pub struct DocAccessController<R: RoleReader> {
    reader: Arc<R>,
    cache: Arc<DecisionCache>,
    workspace: WorkspaceAccessController<R>,
}

impl<R: RoleReader> DocAccessController<R> {
    pub fn new(reader: Arc<R>, cache: Arc<DecisionCache>) -> Self {
        let workspace = WorkspaceAccessController::new(Arc::clone(&reader), Arc::clone(&cache));
        Self {
            reader,
            cache,
            workspace,
        }
    }

    /// Effective document role of `user`, bypassing the cache.
    pub async fn role_of(
        &self,
        user: &UserId,
        doc: &ResourceId,
    ) -> Result<Option<DocRole>, AccessError> {
        Ok(self.resolve(user, doc).await?.role)
    }

    /// Decides without consulting or filling the cache.
    pub async fn evaluate(
        &self,
        user: &UserId,
        doc: &ResourceId,
        action: Action,
    ) -> Result<Decision, AccessError> {
        let action = action.require_kind(ResourceKind::Document)?;
        let resolution = self.resolve(user, doc).await?;
        Ok(Decision::evaluate(resolution.role.map(Role::Document), action))
    }

    pub async fn check(
        &self,
        user: &UserId,
        doc: &ResourceId,
        action: Action,
    ) -> Result<Decision, AccessError> {
        self.check_in(user, None, doc, action).await
    }

    /// Like [`check`](Self::check), but when `workspace` is given the document
    /// must belong to it.
    pub async fn check_in(
        &self,
        user: &UserId,
        workspace: Option<&ResourceId>,
        doc: &ResourceId,
        action: Action,
    ) -> Result<Decision, AccessError> {
        let action = action.require_kind(ResourceKind::Document)?;
        let key = DecisionKey::new(user.clone(), doc.clone(), action);

        let cached = self
            .cache
            .get_or_resolve(key, || async {
                let resolution = self.resolve(user, doc).await?;
                Ok::<_, AccessError>(CachedDecision {
                    decision: Decision::evaluate(resolution.role.map(Role::Document), action),
                    parent: resolution.parent,
                })
            })
            .await?;

        if let Some(workspace) = workspace
            && cached.parent.as_ref() != Some(workspace)
        {
            tracing::debug!(
                user = %user,
                document = %doc,
                workspace = %workspace,
                "document is outside the queried workspace"
            );
            return Ok(Decision::out_of_scope());
        }

        tracing::debug!(
            user = %user,
            document = %doc,
            action = %action,
            allowed = cached.decision.allowed,
            reason = %cached.decision.reason,
            "document access checked"
        );
        Ok(cached.decision)
    }

    pub async fn can(
        &self,
        user: &UserId,
        doc: &ResourceId,
        action: Action,
    ) -> Result<bool, AccessError> {
        Ok(self.check(user, doc, action).await?.allowed)
    }

    async fn resolve(&self, user: &UserId, doc: &ResourceId) -> Result<Resolution, AccessError> {
        let (explicit, parent) = tokio::try_join!(
            self.reader
                .find_role_assignment(ResourceKind::Document, user, doc),
            self.parent_workspace(doc),
        )?;

        if let Some(role) = explicit {
            let role = match role {
                Role::Document(role) => role,
                other => {
                    return Err(AccessError::UnknownRole {
                        kind: ResourceKind::Document,
                        role: other.name().to_string(),
                    });
                }
            };
            return Ok(Resolution {
                role: Some(role),
                parent,
            });
        }

        let role = match parent {
            Some(ref workspace) => self
                .workspace
                .role_of(user, workspace)
                .await?
                .map(DocRole::from),
            None => None,
        };
        Ok(Resolution { role, parent })
    }

    async fn parent_workspace(&self, doc: &ResourceId) -> Result<Option<ResourceId>, AccessError> {
        let parent = self
            .reader
            .find_parent_resource(ResourceKind::Document, doc)
            .await?;

        match parent {
            Some(parent) if parent.kind == ResourceKind::Workspace => Ok(Some(parent.id)),
            Some(parent) => {
                tracing::warn!(
                    document = %doc,
                    parent = %parent,
                    "document parent is not a workspace, ignoring it"
                );
                Ok(None)
            }
            None => Ok(None),
        }
    }
}
