use crate::resource::ResourceKind;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    #[error("unknown resource kind: {0}")]
    UnknownResourceKind(String),

    #[error("role '{role}' is not defined for {kind}")]
    UnknownRole { kind: ResourceKind, role: String },

    #[error("action '{action}' is not valid for {kind}")]
    InvalidAction { kind: ResourceKind, action: String },

    #[error("no access controller registered for {0}")]
    UnsupportedResourceKind(ResourceKind),

    #[error("access check unavailable: {0}")]
    Unavailable(String),
}

impl AccessError {
    /// The caller passed a kind, role or action outside the closed enumerations.
    pub fn is_contract_violation(&self) -> bool {
        !self.is_retryable()
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, AccessError::Unavailable(_))
    }
}
