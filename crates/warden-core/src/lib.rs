pub mod action;
pub mod cache;
pub mod decision;
pub mod engine;
pub mod error;
pub mod events;
pub mod invalidation;
pub mod resource;
pub mod role;

pub use action::{Action, ActionRegistry, DocAction, WorkspaceAction};
pub use cache::{CacheConfig, CachedDecision, DecisionCache, DecisionFilter, DecisionKey};
pub use decision::{Decision, DecisionReason};
pub use engine::{AccessController, RoleReader};
pub use error::AccessError;
pub use events::{DomainEvent, EventKind, EventPublisher};
pub use invalidation::InvalidationListener;
pub use resource::{ResourceId, ResourceKind, ResourceRef, UserId};
pub use role::{DocRole, Role, WorkspaceRole, role_model};
