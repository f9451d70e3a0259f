use warden_core::error::AccessError;
use warden_core::events::EventChannelClosed;
use warden_storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("access error: {0}")]
    Access(#[from] AccessError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("invalidation failed: {0}")]
    Invalidation(#[from] EventChannelClosed),
}

impl ServiceError {
    /// Whether retrying the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ServiceError::Access(e) => e.is_retryable(),
            ServiceError::Storage(StorageError::Internal(_)) => true,
            ServiceError::Storage(_) | ServiceError::Invalidation(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_core::resource::{ResourceKind, ResourceRef};

    #[test]
    fn service_error_from_access_error() {
        let err: ServiceError = AccessError::UnknownRole {
            kind: ResourceKind::Workspace,
            role: "Reader".to_string(),
        }
        .into();

        assert!(
            err.to_string().contains("Reader"),
            "expected 'Reader' in error message, got: {err}"
        );
        assert!(!err.is_retryable());
    }

    #[test]
    fn service_error_from_storage_error() {
        let err: ServiceError = StorageError::InvalidParent {
            child: ResourceRef::workspace("w1"),
            parent: ResourceRef::workspace("w2"),
        }
        .into();

        assert!(
            err.to_string().contains("cannot be attached"),
            "expected 'cannot be attached' in error message, got: {err}"
        );
    }

    #[test]
    fn internal_storage_errors_are_retryable() {
        let err: ServiceError = StorageError::Internal("timeout".to_string()).into();
        assert!(err.is_retryable());
    }

    #[test]
    fn service_error_from_closed_channel() {
        let err: ServiceError = EventChannelClosed.into();
        assert_eq!(err.to_string(), "invalidation failed: event channel closed");
    }
}
