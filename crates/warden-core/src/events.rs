use std::fmt;

use tokio::sync::{mpsc, oneshot};

use crate::resource::{ResourceId, ResourceKind, ResourceRef, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    RoleGranted,
    RoleRevoked,
    MembershipRemoved,
    ResourceDeleted,
    ResourceMoved,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventKind::RoleGranted => "role_granted",
            EventKind::RoleRevoked => "role_revoked",
            EventKind::MembershipRemoved => "membership_removed",
            EventKind::ResourceDeleted => "resource_deleted",
            EventKind::ResourceMoved => "resource_moved",
        };
        f.write_str(s)
    }
}

/// A change to role assignments or resources that may affect cached decisions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainEvent {
    pub kind: EventKind,
    /// `None` means the event concerns every user of the resource.
    pub user_id: Option<UserId>,
    pub resource: ResourceRef,
}

impl DomainEvent {
    pub fn role_granted(user_id: UserId, resource: ResourceRef) -> Self {
        Self {
            kind: EventKind::RoleGranted,
            user_id: Some(user_id),
            resource,
        }
    }

    pub fn role_revoked(user_id: UserId, resource: ResourceRef) -> Self {
        Self {
            kind: EventKind::RoleRevoked,
            user_id: Some(user_id),
            resource,
        }
    }

    pub fn membership_removed(user_id: UserId, workspace: ResourceId) -> Self {
        Self {
            kind: EventKind::MembershipRemoved,
            user_id: Some(user_id),
            resource: ResourceRef {
                kind: ResourceKind::Workspace,
                id: workspace,
            },
        }
    }

    pub fn resource_deleted(resource: ResourceRef) -> Self {
        Self {
            kind: EventKind::ResourceDeleted,
            user_id: None,
            resource,
        }
    }

    /// A resource was attached to a new parent.
    pub fn resource_moved(resource: ResourceRef) -> Self {
        Self {
            kind: EventKind::ResourceMoved,
            user_id: None,
            resource,
        }
    }
}

impl fmt::Display for DomainEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.resource)?;
        if let Some(ref user_id) = self.user_id {
            write!(f, " user={user_id}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("event channel closed")]
pub struct EventChannelClosed;

#[derive(Debug)]
pub struct EventEnvelope {
    pub event: DomainEvent,
    applied: Option<oneshot::Sender<usize>>,
}

impl EventEnvelope {
    pub fn new(event: DomainEvent) -> Self {
        Self {
            event,
            applied: None,
        }
    }

    /// Reports how many cache entries the event removed to a waiting publisher.
    pub fn acknowledge(self, removed: usize) {
        if let Some(tx) = self.applied {
            let _ = tx.send(removed);
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventPublisher {
    tx: mpsc::Sender<EventEnvelope>,
}

impl EventPublisher {
    pub async fn publish(&self, event: DomainEvent) -> Result<(), EventChannelClosed> {
        self.tx
            .send(EventEnvelope::new(event))
            .await
            .map_err(|_| EventChannelClosed)
    }

    /// Publishes and waits until the listener has applied the event. Returns
    /// the number of cache entries it removed.
    pub async fn publish_and_wait(&self, event: DomainEvent) -> Result<usize, EventChannelClosed> {
        let (ack_tx, ack_rx) = oneshot::channel();
        let envelope = EventEnvelope {
            event,
            applied: Some(ack_tx),
        };
        self.tx.send(envelope).await.map_err(|_| EventChannelClosed)?;
        ack_rx.await.map_err(|_| EventChannelClosed)
    }
}

pub fn channel(capacity: usize) -> (EventPublisher, mpsc::Receiver<EventEnvelope>) {
    let (tx, rx) = mpsc::channel(capacity);
    (EventPublisher { tx }, rx)
}
