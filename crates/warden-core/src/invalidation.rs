use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::cache::{DecisionCache, DecisionFilter};
use crate::events::{DomainEvent, EventEnvelope, EventKind};
use crate::resource::ResourceKind;

/// Evicts cached decisions affected by domain events.
///
/// Filters may cover more entries than strictly necessary but never fewer:
/// a stale grant surviving an event is a security bug, an extra cache miss
/// is not.
pub struct InvalidationListener {
    cache: Arc<DecisionCache>,
}

impl InvalidationListener {
    pub fn new(cache: Arc<DecisionCache>) -> Self {
        Self { cache }
    }

    pub fn filters_for(event: &DomainEvent) -> Vec<DecisionFilter> {
        let resource = &event.resource;
        let user_id = event.user_id.clone();

        let exact = DecisionFilter {
            kind: Some(resource.kind),
            user_id: user_id.clone(),
            resource_id: Some(resource.id.clone()),
            parent_id: None,
        };

        match (event.kind, resource.kind) {
            (_, ResourceKind::Document) => vec![exact],
            (EventKind::ResourceDeleted | EventKind::ResourceMoved, ResourceKind::Workspace) => vec![
                DecisionFilter {
                    user_id: None,
                    ..exact
                },
                DecisionFilter {
                    kind: Some(ResourceKind::Document),
                    parent_id: Some(resource.id.clone()),
                    ..Default::default()
                },
            ],
            (
                EventKind::RoleGranted | EventKind::RoleRevoked | EventKind::MembershipRemoved,
                ResourceKind::Workspace,
            ) => vec![
                exact,
                DecisionFilter {
                    kind: Some(ResourceKind::Document),
                    user_id,
                    resource_id: None,
                    parent_id: Some(resource.id.clone()),
                },
            ],
        }
    }

    pub fn apply(&self, event: &DomainEvent) -> usize {
        let filters = Self::filters_for(event);
        let removed = self
            .cache
            .invalidate(|key, value| filters.iter().any(|f| f.matches(key, value)));

        tracing::debug!(
            event = %event.kind,
            resource = %event.resource,
            removed = removed,
            "cached decisions invalidated"
        );
        removed
    }

    pub async fn run(self, mut events: mpsc::Receiver<EventEnvelope>) {
        while let Some(envelope) = events.recv().await {
            let removed = self.apply(&envelope.event);
            envelope.acknowledge(removed);
        }
        tracing::info!("event channel closed, invalidation listener stopped");
    }

    pub fn spawn(self, events: mpsc::Receiver<EventEnvelope>) -> JoinHandle<()> {
        tokio::spawn(self.run(events))
    }
}
