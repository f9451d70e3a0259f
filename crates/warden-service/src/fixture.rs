use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use warden_core::resource::{ResourceId, ResourceKind, ResourceRef, UserId};
use warden_storage::AssignmentStore;

use crate::error::ServiceError;
use crate::service::AuthzService;

/// Resources and role assignments to seed a store with.
///
/// ```toml
/// [[workspace]]
/// id = "w1"
///
/// [[document]]
/// id = "d1"
/// workspace = "w1"
///
/// [[assignment]]
/// user = "u1"
/// kind = "workspace"
/// resource = "w1"
/// role = "Collaborator"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Fixture {
    pub workspace: Vec<WorkspaceEntry>,
    pub document: Vec<DocumentEntry>,
    pub assignment: Vec<AssignmentEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkspaceEntry {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentEntry {
    pub id: String,
    pub workspace: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssignmentEntry {
    pub user: String,
    pub kind: String,
    pub resource: String,
    pub role: String,
}

#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("failed to read fixture '{0}': {1}")]
    ReadFile(String, String),

    #[error("failed to parse fixture: {0}")]
    ParseToml(String),

    #[error("document '{document}' references undeclared workspace '{workspace}'")]
    UndeclaredWorkspace { document: String, workspace: String },

    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl Fixture {
    pub fn load(path: &Path) -> Result<Self, FixtureError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| FixtureError::ReadFile(path.display().to_string(), e.to_string()))?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self, FixtureError> {
        let fixture: Fixture =
            toml::from_str(contents).map_err(|e| FixtureError::ParseToml(e.to_string()))?;
        fixture.validate()?;
        Ok(fixture)
    }

    fn validate(&self) -> Result<(), FixtureError> {
        let workspaces: HashSet<&str> = self.workspace.iter().map(|w| w.id.as_str()).collect();
        for doc in &self.document {
            if !workspaces.contains(doc.workspace.as_str()) {
                return Err(FixtureError::UndeclaredWorkspace {
                    document: doc.id.clone(),
                    workspace: doc.workspace.clone(),
                });
            }
        }
        Ok(())
    }

    /// Attaches every document, then grants every assignment. Returns the
    /// number of assignments granted.
    pub async fn apply<S: AssignmentStore>(
        &self,
        service: &AuthzService<S>,
    ) -> Result<usize, FixtureError> {
        for doc in &self.document {
            service
                .attach_document(
                    &ResourceId::new(doc.id.as_str()),
                    &ResourceId::new(doc.workspace.as_str()),
                )
                .await?;
        }

        for entry in &self.assignment {
            let kind: ResourceKind = entry.kind.parse().map_err(ServiceError::from)?;
            service
                .grant_role(
                    &UserId::new(entry.user.as_str()),
                    &ResourceRef::new(kind, entry.resource.as_str()),
                    &entry.role,
                )
                .await?;
        }

        tracing::info!(
            workspaces = self.workspace.len(),
            documents = self.document.len(),
            assignments = self.assignment.len(),
            "fixture loaded"
        );
        Ok(self.assignment.len())
    }
}
